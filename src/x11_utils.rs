use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub net_wm_state: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_window_opacity: Atom,
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            net_wm_state: conn
                .intern_atom(false, b"_NET_WM_STATE")
                .context("Failed to intern _NET_WM_STATE atom")?
                .reply()
                .context("Failed to get reply for _NET_WM_STATE atom")?
                .atom,
            net_wm_state_above: conn
                .intern_atom(false, b"_NET_WM_STATE_ABOVE")
                .context("Failed to intern _NET_WM_STATE_ABOVE atom")?
                .reply()
                .context("Failed to get reply for _NET_WM_STATE_ABOVE atom")?
                .atom,
            net_wm_window_opacity: conn
                .intern_atom(false, b"_NET_WM_WINDOW_OPACITY")
                .context("Failed to intern _NET_WM_WINDOW_OPACITY atom")?
                .reply()
                .context("Failed to get reply for _NET_WM_WINDOW_OPACITY atom")?
                .atom,
        })
    }
}

/// Convert a fractional opacity into the `_NET_WM_WINDOW_OPACITY` cardinal.
pub fn opacity_cardinal(alpha: f32) -> u32 {
    (f64::from(alpha.clamp(0.0, 1.0)) * f64::from(u32::MAX)).round() as u32
}

/// Rewrite the opacity property on a live window; compositors apply it
/// without a remap.
pub fn set_window_opacity(
    conn: &RustConnection,
    atoms: &CachedAtoms,
    window: Window,
    alpha: f32,
) -> Result<()> {
    conn.change_property32(
        PropMode::REPLACE,
        window,
        atoms.net_wm_window_opacity,
        AtomEnum::CARDINAL,
        &[opacity_cardinal(alpha)],
    )
    .context("Failed to set window opacity")?;
    conn.flush().context("Failed to flush after opacity change")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_cardinal_endpoints() {
        assert_eq!(opacity_cardinal(0.0), 0);
        assert_eq!(opacity_cardinal(1.0), u32::MAX);
    }

    #[test]
    fn test_opacity_cardinal_clamps() {
        assert_eq!(opacity_cardinal(-2.0), 0);
        assert_eq!(opacity_cardinal(3.5), u32::MAX);
    }

    #[test]
    fn test_opacity_cardinal_midpoint() {
        let half = opacity_cardinal(0.5);
        let expected = u32::MAX / 2;
        assert!(half.abs_diff(expected) <= 1);
    }
}
