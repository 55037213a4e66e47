//! Application-wide constants
//!
//! This module contains the magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// X11 protocol constants
pub mod x11 {
    /// Override redirect flag for unmanaged windows
    pub const OVERRIDE_REDIRECT: u32 = 1;

    /// Server-side core font used for all overlay text
    pub const CORE_FONT: &[u8] = b"fixed";

    /// WM_CLASS instance/class pair for the overlay window
    pub const WM_CLASS: &[u8] = b"input-overlay\0input-overlay\0";
}

/// Input event constants (from evdev)
pub mod input {
    /// Key press event value
    pub const KEY_PRESS: i32 = 1;

    /// Key release event value
    pub const KEY_RELEASE: i32 = 0;

    /// Key repeat event value
    pub const KEY_REPEAT: i32 = 2;
}

/// Bounded recent-log capacities
pub mod capacity {
    /// Most-recent pressed keys kept for display
    pub const RECENT_KEYS: usize = 5;

    /// Most-recent click entries kept for display
    pub const RECENT_CLICKS: usize = 5;
}

/// Timing constants
pub mod timing {
    /// Default render tick interval in milliseconds
    pub const DEFAULT_TICK_MS: u64 = 100;

    /// Pointer position poll interval in milliseconds
    pub const POINTER_POLL_MS: u64 = 20;

    /// Events-per-second sampling window in milliseconds
    pub const RATE_WINDOW_MS: u64 = 1000;
}

/// Overlay scene layout (overlay-local coordinates)
pub mod layout {
    /// Default overlay window width
    pub const WINDOW_WIDTH: u16 = 800;

    /// Default overlay window height
    pub const WINDOW_HEIGHT: u16 = 300;

    /// Pad rectangle corners: raw pointer coordinates map into this region
    pub const PAD_X0: i16 = 50;
    pub const PAD_Y0: i16 = 100;
    pub const PAD_X1: i16 = 750;
    pub const PAD_Y1: i16 = 250;

    /// Keyboard base rectangle corners
    pub const KEYBOARD_X0: i16 = 150;
    pub const KEYBOARD_Y0: i16 = 150;
    pub const KEYBOARD_X1: i16 = 350;
    pub const KEYBOARD_Y1: i16 = 200;

    /// Rim width drawn around the keyboard base while any key is active
    pub const HIGHLIGHT_RIM: i16 = 4;

    /// Baseline origin of the recent-input text line
    pub const LOG_TEXT_X: i16 = 150;
    pub const LOG_TEXT_Y: i16 = 130;

    /// Baseline origin of the events-per-second readout
    pub const RATE_TEXT_X: i16 = 700;
    pub const RATE_TEXT_Y: i16 = 60;

    /// Pointer marker radius on the pad
    pub const MARKER_RADIUS: i16 = 10;

    /// Decorative avatar ellipse corners
    pub const AVATAR_X0: i16 = 50;
    pub const AVATAR_Y0: i16 = 40;
    pub const AVATAR_X1: i16 = 100;
    pub const AVATAR_Y1: i16 = 90;
}

/// Scene colors (0x00RRGGBB pixel values)
pub mod colors {
    pub const BACKGROUND: u32 = 0x000000;
    pub const PAD: u32 = 0x808080;
    pub const KEYBOARD: u32 = 0xffffff;
    pub const HIGHLIGHT: u32 = 0xffff00;
    pub const MARKER: u32 = 0xff0000;
    pub const AVATAR: u32 = 0x0000ff;
    pub const TEXT: u32 = 0xffffff;
}

/// Canvas element identifiers
pub mod elements {
    pub const PAD: &str = "pad";
    pub const AVATAR: &str = "avatar";
    pub const KEYBOARD: &str = "keyboard";
    pub const HIGHLIGHT: &str = "highlight";
    pub const MARKER: &str = "marker";
    pub const LOG_TEXT: &str = "log-text";
    pub const RATE_TEXT: &str = "rate-text";
}

/// Configuration file locations
pub mod config {
    /// Subdirectory under the user config dir
    pub const APP_DIR: &str = "input-overlay";

    /// Preset file name
    pub const FILENAME: &str = "preset.json";
}

/// Input device discovery
pub mod devices {
    /// Directory scanned for evdev character devices
    pub const DEV_INPUT: &str = "/dev/input";

    /// Group membership normally required to read evdev devices
    pub const INPUT_GROUP: &str = "input";

    /// Command hint printed when device access is denied
    pub const ADD_TO_INPUT_GROUP: &str = "sudo usermod -aG input $USER";
}

/// Validation bounds applied after loading a preset
pub mod validation {
    pub const MIN_ALPHA: f32 = 0.0;
    pub const MAX_ALPHA: f32 = 1.0;
    pub const MIN_DIMENSION: u16 = 50;
    pub const MAX_DIMENSION: u16 = 4096;
    pub const MIN_TICK_MS: u64 = 10;
    pub const MAX_TICK_MS: u64 = 1000;
}
