//! Overlay controller
//!
//! Owns the click-through window, the presentation canvas, and the lifecycle
//! of both input observers and the render scheduler.

use anyhow::{Context, Result};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::shape::{self, ConnectionExt as ShapeExt};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::constants::{colors, elements, layout, x11};
use crate::keyboard;
use crate::mapping::{PadMapping, PadRect};
use crate::pointer;
use crate::preset::Preset;
use crate::render::{RenderScheduler, keyboard_bounds};
use crate::shutdown::Shutdown;
use crate::state::SharedInput;
use crate::surface::{Bounds, Canvas};
use crate::x11_utils::{CachedAtoms, set_window_opacity};

pub struct Overlay<'a> {
    conn: &'a RustConnection,
    atoms: &'a CachedAtoms,
    window: Window,
    canvas: Canvas<'a>,
    state: SharedInput,
    shutdown: Shutdown,
    mapping: PadMapping,
    tick: Duration,
    pointer_handle: Option<thread::JoinHandle<()>>,
}

impl<'a> Overlay<'a> {
    /// Create the overlay window with its always-on-top, opacity, and
    /// click-through capabilities, and place the static scene.
    ///
    /// A server without the SHAPE extension cannot give us click-through, so
    /// construction fails rather than producing an overlay that would swallow
    /// the input it is supposed to visualize.
    pub fn create(
        conn: &'a RustConnection,
        screen: &'a Screen,
        atoms: &'a CachedAtoms,
        state: SharedInput,
        preset: &Preset,
    ) -> Result<Self> {
        conn.extension_information(shape::X11_EXTENSION_NAME)
            .context("Failed to query SHAPE extension")?
            .ok_or_else(|| {
                anyhow::anyhow!("X server lacks the SHAPE extension, click-through is unavailable")
            })?;

        let (x, y) = preset.window_pos;
        let (width, height) = preset.window_size;
        let window = Self::create_window(conn, screen, x, y, width, height)?;
        Self::setup_window_properties(conn, atoms, window)?;

        conn.shape_rectangles(
            shape::SO::SET,
            shape::SK::INPUT,
            ClipOrdering::UNSORTED,
            window,
            0,
            0,
            &[],
        )
        .context("Failed to clear the input shape for click-through")?;

        conn.map_window(window)
            .context("Failed to map overlay window")?;
        conn.flush()
            .context("Failed to flush after overlay window setup")?;
        info!(window = window, width = width, height = height, "Mapped overlay window");

        let mut canvas = Canvas::new(conn, screen, window, width, height)?;
        Self::place_scene(&mut canvas);

        let mapping = PadMapping::new(
            screen.width_in_pixels,
            screen.height_in_pixels,
            PadRect {
                x0: layout::PAD_X0,
                y0: layout::PAD_Y0,
                x1: layout::PAD_X1,
                y1: layout::PAD_Y1,
            },
        );

        Ok(Self {
            conn,
            atoms,
            window,
            canvas,
            state,
            shutdown: Shutdown::new(),
            mapping,
            tick: Duration::from_millis(preset.tick_ms),
            pointer_handle: None,
        })
    }

    fn create_window(
        conn: &RustConnection,
        screen: &Screen,
        x: i16,
        y: i16,
        width: u16,
        height: u16,
    ) -> Result<Window> {
        let window = conn
            .generate_id()
            .context("Failed to generate X11 window ID")?;
        conn.create_window(
            screen.root_depth,
            window,
            screen.root,
            x,
            y,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &CreateWindowAux::new()
                .override_redirect(x11::OVERRIDE_REDIRECT)
                .background_pixel(colors::BACKGROUND),
        )
        .context("Failed to create overlay window")?;
        Ok(window)
    }

    /// Setup window properties (WM_CLASS, always-on-top)
    fn setup_window_properties(
        conn: &RustConnection,
        atoms: &CachedAtoms,
        window: Window,
    ) -> Result<()> {
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            x11::WM_CLASS,
        )
        .context("Failed to set WM_CLASS on overlay window")?;

        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.net_wm_state,
            AtomEnum::ATOM,
            &[atoms.net_wm_state_above],
        )
        .context("Failed to set overlay window always-on-top")?;

        Ok(())
    }

    /// Static scene, bottom-up: pad, avatar, keyboard base, pointer marker,
    /// text lines. Placeholder primitives stand in for image assets.
    fn place_scene(canvas: &mut Canvas<'_>) {
        canvas.place_rect(
            elements::PAD,
            Bounds::from_corners(layout::PAD_X0, layout::PAD_Y0, layout::PAD_X1, layout::PAD_Y1),
            colors::PAD,
        );
        canvas.place_marker(
            elements::AVATAR,
            Bounds::from_corners(
                layout::AVATAR_X0,
                layout::AVATAR_Y0,
                layout::AVATAR_X1,
                layout::AVATAR_Y1,
            ),
            colors::AVATAR,
        );
        canvas.place_rect(elements::KEYBOARD, keyboard_bounds(), colors::KEYBOARD);
        canvas.place_marker(
            elements::MARKER,
            Bounds::centered(
                (layout::PAD_X0 + layout::PAD_X1) / 2,
                (layout::PAD_Y0 + layout::PAD_Y1) / 2,
                layout::MARKER_RADIUS,
            ),
            colors::MARKER,
        );
        canvas.place_text(
            elements::LOG_TEXT,
            layout::LOG_TEXT_X,
            layout::LOG_TEXT_Y,
            "",
            colors::TEXT,
        );
        canvas.place_text(
            elements::RATE_TEXT,
            layout::RATE_TEXT_X,
            layout::RATE_TEXT_Y,
            "0/s",
            colors::TEXT,
        );

        // Pad at the bottom, text lines on top
        canvas.lower(elements::PAD);
        canvas.raise(elements::LOG_TEXT);
        canvas.raise(elements::RATE_TEXT);
    }

    /// Start both observers. Keyboard capture degrades to a warning when the
    /// input devices are unreadable; the pointer observer always starts.
    pub fn start(&mut self, exclusive: bool) {
        if keyboard::check_permissions() {
            match keyboard::spawn_observer(self.state.clone(), self.shutdown.clone(), exclusive) {
                Ok(handles) => {
                    info!(threads = handles.len(), "Keyboard capture enabled");
                    // Blocking reads are abandoned at shutdown, not joined
                    drop(handles);
                }
                Err(e) => {
                    error!(error = %e, "Failed to start keyboard observer");
                    keyboard::print_permission_error();
                }
            }
        } else {
            keyboard::print_permission_error();
        }

        self.pointer_handle = Some(pointer::spawn_observer(
            self.state.clone(),
            self.shutdown.clone(),
        ));
    }

    /// Drive the render scheduler until `stop()` is observed.
    pub fn run(&mut self) -> Result<()> {
        let scheduler = RenderScheduler::new(
            &mut self.canvas,
            self.state.clone(),
            self.mapping,
            self.tick,
        );
        scheduler.run(&self.shutdown)
    }

    /// Signal both observer loops and the render loop to exit. Idempotent and
    /// callable from any thread.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// Inner stop flag for process signal registration.
    pub fn shutdown_flag(&self) -> std::sync::Arc<std::sync::atomic::AtomicBool> {
        self.shutdown.flag()
    }

    /// Rewrite the opacity capability on the live window.
    pub fn set_opacity(&self, alpha: f32) -> Result<()> {
        set_window_opacity(self.conn, self.atoms, self.window, alpha)
    }

    /// Current window position and size, for preset persistence.
    pub fn geometry(&self) -> Result<((i16, i16), (u16, u16))> {
        let geom = self
            .conn
            .get_geometry(self.window)
            .context("Failed to query overlay geometry")?
            .reply()
            .context("Failed to get overlay geometry reply")?;
        Ok(((geom.x, geom.y), (geom.width, geom.height)))
    }

    /// Tear the overlay down: reap the pointer observer and destroy the
    /// window. Keyboard threads stay parked in their blocking reads and end
    /// with the process.
    pub fn close(mut self) -> Result<()> {
        self.stop();
        if let Some(handle) = self.pointer_handle.take()
            && handle.join().is_err()
        {
            warn!("Pointer observer panicked before shutdown");
        }

        self.conn
            .unmap_window(self.window)
            .context("Failed to unmap overlay window")?;
        self.conn
            .destroy_window(self.window)
            .context("Failed to destroy overlay window")?;
        self.conn
            .flush()
            .context("Failed to flush overlay teardown")?;
        info!("Overlay closed");
        Ok(())
    }
}
