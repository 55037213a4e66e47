#![forbid(unsafe_code)]

mod constants;
mod keyboard;
mod mapping;
mod overlay;
mod pointer;
mod preset;
mod render;
mod shutdown;
mod state;
mod surface;
mod x11_utils;

use tracing::{Level as TraceLevel, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use x11rb::connection::Connection;

use constants::capacity;
use overlay::Overlay;
use preset::Preset;
use state::SharedInput;
use x11_utils::CachedAtoms;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let (conn, screen_num) = x11rb::connect(None)?;
    let screen = &conn.setup().roots[screen_num];
    info!(
        "successfully connected to x11: screen={screen_num}, dimensions={}x{}",
        screen.width_in_pixels, screen.height_in_pixels
    );

    let mut preset = Preset::load();
    info!("preset={:#?}", preset);

    // Pre-cache atoms once at startup (eliminates roundtrip overhead)
    let atoms = CachedAtoms::new(&conn)?;

    let state = SharedInput::new(capacity::RECENT_KEYS, capacity::RECENT_CLICKS);
    let mut overlay = Overlay::create(&conn, screen, &atoms, state, &preset)?;
    overlay.set_opacity(preset.alpha)?;

    // Interrupt and terminate both land on the shared stop flag
    signal_hook::flag::register(signal_hook::consts::SIGINT, overlay.shutdown_flag())?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, overlay.shutdown_flag())?;

    overlay.start(preset.exclusive_capture);
    overlay.run()?;
    info!("Stop requested, shutting down");

    // Persist current geometry + opacity; failures degrade to a log line
    match overlay.geometry() {
        Ok((pos, size)) => {
            preset.window_pos = pos;
            preset.window_size = size;
        }
        Err(e) => warn!(error = %e, "Could not read final overlay geometry"),
    }
    if let Err(e) = preset.save() {
        error!(error = %e, "Failed to save preset");
    }

    overlay.close()?;
    Ok(())
}
