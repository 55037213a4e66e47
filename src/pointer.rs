use anyhow::{Context, Result};
use evdev::{Device, EventType, InputEventKind, Key};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::ConnectionExt;

use crate::constants::{devices, input, timing};
use crate::shutdown::Shutdown;
use crate::state::SharedInput;

/// Find all devices that report mouse buttons
fn find_all_mouse_devices() -> Result<Vec<Device>> {
    let mut found = Vec::new();

    for entry in std::fs::read_dir(devices::DEV_INPUT).context(format!(
        "Failed to read {} - are you in the '{}' group?",
        devices::DEV_INPUT,
        devices::INPUT_GROUP
    ))? {
        let entry = entry?;
        let path = entry.path();

        if let Ok(device) = Device::open(&path)
            && let Some(keys) = device.supported_keys()
            && keys.contains(Key::BTN_LEFT)
        {
            info!(device_path = %path.display(), name = ?device.name(), "Found mouse device");
            found.push(device);
        }
    }

    Ok(found)
}

/// Spawn the pointer observer.
///
/// Button transitions are read by one blocking thread per mouse device and
/// queued on a channel; the polling thread reads the cursor position from its
/// own X11 connection on a fixed interval and drains the queued clicks, so
/// every click since the previous poll lands in the recent log. The polling
/// thread wakes every interval and is joined at shutdown; the button threads
/// follow the same fire-and-forget policy as the keyboard observer.
pub fn spawn_observer(state: SharedInput, shutdown: Shutdown) -> thread::JoinHandle<()> {
    let (tx, rx) = mpsc::channel();

    match find_all_mouse_devices() {
        Ok(mice) if mice.is_empty() => {
            warn!("No mouse device found, clicks will not be logged");
        }
        Ok(mice) => {
            info!(count = mice.len(), "Listening on mouse device(s)");
            for device in mice {
                let tx = tx.clone();
                let shutdown = shutdown.clone();
                thread::spawn(move || {
                    if let Err(e) = listen_for_buttons(device, tx, shutdown) {
                        error!(error = %e, "Button listener error");
                    }
                });
            }
        }
        Err(e) => {
            warn!(error = %e, "Cannot scan mouse devices, clicks will not be logged");
        }
    }

    thread::spawn(move || {
        info!("Pointer observer started");
        if let Err(e) = observe_pointer(state, shutdown, rx) {
            error!(error = %e, "Pointer observer error");
        }
    })
}

/// Queue button-down transitions from a single device until told to stop
fn listen_for_buttons(mut device: Device, sender: Sender<Key>, shutdown: Shutdown) -> Result<()> {
    loop {
        if shutdown.requested() {
            return Ok(());
        }

        let events = device.fetch_events().context("Failed to fetch events")?;

        for event in events {
            if event.event_type() == EventType::KEY
                && let InputEventKind::Key(key) = event.kind()
                && is_button(key)
                && event.value() == input::KEY_PRESS
            {
                if sender.send(key).is_err() {
                    // Consumer gone, the overlay is shutting down
                    return Ok(());
                }
            }
        }
    }
}

/// Poll the cursor position and drain pending clicks until told to stop
fn observe_pointer(state: SharedInput, shutdown: Shutdown, buttons: Receiver<Key>) -> Result<()> {
    let (conn, screen_num) =
        x11rb::connect(None).context("Failed to connect to X11 for pointer polling")?;
    let root = conn.setup().roots[screen_num].root;
    let interval = Duration::from_millis(timing::POINTER_POLL_MS);

    loop {
        if shutdown.requested() {
            info!("Pointer observer stopping");
            return Ok(());
        }

        let pointer = conn
            .query_pointer(root)
            .context("Failed to query pointer")?
            .reply()
            .context("Failed to get pointer reply")?;
        // Written unconditionally; the scheduler always sees the latest read
        state.set_pointer(pointer.root_x, pointer.root_y);

        while let Ok(button) = buttons.try_recv() {
            state.button_down(click_entry(button));
        }

        thread::sleep(interval);
    }
}

fn is_button(key: Key) -> bool {
    format!("{key:?}").starts_with("BTN_")
}

/// Recent-log entry for a button-down transition
pub fn click_entry(button: Key) -> String {
    let label = match button {
        Key::BTN_LEFT => "left",
        Key::BTN_RIGHT => "right",
        Key::BTN_MIDDLE => "middle",
        Key::BTN_SIDE => "side",
        Key::BTN_EXTRA => "extra",
        other => return format!("click: {other:?}"),
    };
    format!("click: {label}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_entry_names_common_buttons() {
        assert_eq!(click_entry(Key::BTN_LEFT), "click: left");
        assert_eq!(click_entry(Key::BTN_RIGHT), "click: right");
        assert_eq!(click_entry(Key::BTN_MIDDLE), "click: middle");
    }

    #[test]
    fn test_click_entry_falls_back_to_debug_name() {
        assert_eq!(click_entry(Key::BTN_TASK), "click: BTN_TASK");
    }

    #[test]
    fn test_is_button_separates_keys_from_buttons() {
        assert!(is_button(Key::BTN_LEFT));
        assert!(!is_button(Key::KEY_ENTER));
    }

    #[test]
    fn test_poll_drains_all_queued_clicks() {
        let state = SharedInput::new(5, 5);
        let (tx, rx) = mpsc::channel();
        tx.send(Key::BTN_LEFT).unwrap();
        tx.send(Key::BTN_RIGHT).unwrap();

        // The drain step of the poll loop, in isolation
        while let Ok(button) = rx.try_recv() {
            state.button_down(click_entry(button));
        }

        let snap = state.observe(std::time::Instant::now());
        assert_eq!(snap.clicks, vec!["click: left", "click: right"]);
    }
}
