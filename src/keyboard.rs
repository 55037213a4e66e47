use anyhow::{Context, Result};
use evdev::{Device, EventType, InputEventKind, Key};
use std::thread;
use tracing::{debug, error, info, warn};

use crate::constants::{devices, input};
use crate::shutdown::Shutdown;
use crate::state::SharedInput;

/// Find all devices that look like keyboards
fn find_all_keyboard_devices() -> Result<Vec<Device>> {
    info!(path = %devices::DEV_INPUT, "Scanning for keyboard devices...");

    let mut found = Vec::new();

    for entry in std::fs::read_dir(devices::DEV_INPUT).context(format!(
        "Failed to read {} - are you in the '{}' group?",
        devices::DEV_INPUT,
        devices::INPUT_GROUP
    ))? {
        let entry = entry?;
        let path = entry.path();

        // Try to open device
        if let Ok(device) = Device::open(&path) {
            // Check if it has Enter key (indicates keyboard)
            if let Some(keys) = device.supported_keys() {
                if keys.contains(Key::KEY_ENTER) {
                    let key_count = keys.iter().count();
                    info!(device_path = %path.display(), name = ?device.name(), key_count = key_count, "Found keyboard device");
                    found.push(device);
                }
            }
        }
    }

    if found.is_empty() {
        anyhow::bail!(
            "No keyboard device found. Ensure you're in '{}' group:\n\
             {}\n\
             Then log out and back in.",
            devices::INPUT_GROUP,
            devices::ADD_TO_INPUT_GROUP
        )
    }

    info!(count = found.len(), "Listening on keyboard device(s)");

    Ok(found)
}

/// Spawn one observer thread per keyboard device.
///
/// The threads block in `fetch_events` and re-check the stop flag before each
/// read; after `stop()` they are abandoned rather than interrupted, so the
/// returned handles are fire-and-forget.
pub fn spawn_observer(
    state: SharedInput,
    shutdown: Shutdown,
    exclusive: bool,
) -> Result<Vec<thread::JoinHandle<()>>> {
    let keyboards = find_all_keyboard_devices()?;
    let mut handles = Vec::new();

    for mut device in keyboards {
        if exclusive {
            match device.grab() {
                Ok(()) => info!(device = ?device.name(), "Exclusive capture enabled"),
                Err(e) => {
                    warn!(device = ?device.name(), error = %e, "Grab failed, observing without suppression")
                }
            }
        }

        let state = state.clone();
        let shutdown = shutdown.clone();
        let handle = thread::spawn(move || {
            info!(device = ?device.name(), "Keyboard observer started");
            if let Err(e) = observe_device(device, state, shutdown) {
                error!(error = %e, "Keyboard observer error");
            }
        });
        handles.push(handle);
    }

    Ok(handles)
}

/// Consume key transitions from a single device until told to stop
fn observe_device(mut device: Device, state: SharedInput, shutdown: Shutdown) -> Result<()> {
    loop {
        if shutdown.requested() {
            info!(device = ?device.name(), "Keyboard observer stopping");
            return Ok(());
        }

        // Fetch events (blocks until available)
        let events = device.fetch_events().context("Failed to fetch events")?;

        for event in events {
            // Only care about key events
            if event.event_type() != EventType::KEY {
                continue;
            }

            if let InputEventKind::Key(key) = event.kind() {
                let Some(label) = key_label(key) else {
                    continue; // mouse buttons belong to the pointer observer
                };

                debug!(key = %label, value = event.value(), "Key event");

                match event.value() {
                    input::KEY_PRESS => state.key_down(&label),
                    input::KEY_RELEASE => state.key_up(&label),
                    // Autorepeat is not a transition
                    input::KEY_REPEAT => {}
                    _ => {}
                }
            }
        }
    }
}

/// Display label for a keyboard key; `None` for non-keyboard codes.
pub fn key_label(key: Key) -> Option<String> {
    let name = format!("{key:?}");
    name.strip_prefix("KEY_").map(str::to_ascii_lowercase)
}

/// Check if input observation is available (user has input group permissions)
pub fn check_permissions() -> bool {
    std::fs::read_dir(devices::DEV_INPUT).is_ok()
}

/// Print helpful error message if permissions missing
pub fn print_permission_error() {
    error!(path = %devices::DEV_INPUT, "Cannot access input devices");
    error!(group = %devices::INPUT_GROUP, "Input capture requires group membership");
    error!(command = %devices::ADD_TO_INPUT_GROUP, "Add user to input group");
    error!("  Then log out and back in");
    warn!(continuing = true, "Continuing without keyboard capture...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_label_lowercases_key_names() {
        assert_eq!(key_label(Key::KEY_A), Some("a".to_string()));
        assert_eq!(key_label(Key::KEY_LEFTSHIFT), Some("leftshift".to_string()));
        assert_eq!(key_label(Key::KEY_SPACE), Some("space".to_string()));
    }

    #[test]
    fn test_key_label_skips_button_codes() {
        assert_eq!(key_label(Key::BTN_LEFT), None);
        assert_eq!(key_label(Key::BTN_RIGHT), None);
    }
}
