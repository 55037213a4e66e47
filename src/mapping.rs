/// Destination pad region in overlay-local coordinates
#[derive(Debug, Clone, Copy)]
pub struct PadRect {
    pub x0: i16,
    pub y0: i16,
    pub x1: i16,
    pub y1: i16,
}

/// Maps raw screen-space pointer coordinates onto the pad rectangle.
#[derive(Debug, Clone, Copy)]
pub struct PadMapping {
    pub screen_width: u16,
    pub screen_height: u16,
    pub pad: PadRect,
}

impl PadMapping {
    pub fn new(screen_width: u16, screen_height: u16, pad: PadRect) -> Self {
        Self {
            screen_width,
            screen_height,
            pad,
        }
    }

    /// Linear map of `(raw_x, raw_y)` into the pad rectangle.
    ///
    /// Raw coordinates are clamped into `[0, screen]` first, so out-of-range
    /// input (negative multi-head coordinates, stale reads past the edge)
    /// saturates at the pad border instead of leaving it.
    pub fn map(&self, raw_x: i16, raw_y: i16) -> (i16, i16) {
        let x = map_axis(raw_x, self.screen_width, self.pad.x0, self.pad.x1);
        let y = map_axis(raw_y, self.screen_height, self.pad.y0, self.pad.y1);
        (x, y)
    }
}

fn map_axis(raw: i16, screen: u16, lo: i16, hi: i16) -> i16 {
    // A zero-sized screen cannot happen on a live X display; treat it as a
    // single pixel rather than dividing by zero.
    let screen = f64::from(screen.max(1));
    let raw = f64::from(raw).clamp(0.0, screen);
    let mapped = f64::from(lo) + (raw / screen) * f64::from(hi - lo);
    mapped.round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> PadMapping {
        PadMapping::new(
            1920,
            1080,
            PadRect {
                x0: 100,
                y0: 150,
                x1: 900,
                y1: 350,
            },
        )
    }

    #[test]
    fn test_origin_maps_to_pad_origin() {
        assert_eq!(mapping().map(0, 0), (100, 150));
    }

    #[test]
    fn test_screen_extent_maps_to_pad_extent() {
        assert_eq!(mapping().map(1920, 1080), (900, 350));
    }

    #[test]
    fn test_midpoint_maps_to_pad_midpoint() {
        assert_eq!(mapping().map(960, 540), (500, 250));
    }

    #[test]
    fn test_quarter_point_is_linear() {
        assert_eq!(mapping().map(480, 270), (300, 200));
    }

    #[test]
    fn test_out_of_range_clamps_to_pad_border() {
        let m = mapping();
        assert_eq!(m.map(-200, -5), (100, 150));
        assert_eq!(m.map(5000, 9000), (900, 350));
        assert_eq!(m.map(-1, 1080), (100, 350));
    }

    #[test]
    fn test_unit_screen_degenerate() {
        let m = PadMapping::new(
            1,
            1,
            PadRect {
                x0: 10,
                y0: 20,
                x1: 30,
                y1: 40,
            },
        );
        assert_eq!(m.map(0, 0), (10, 20));
        assert_eq!(m.map(1, 1), (30, 40));
    }
}
