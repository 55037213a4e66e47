//! Render scheduler
//!
//! Fixed-cadence consumer of the shared input state. Each tick takes one
//! snapshot, derives the visuals, and pushes idempotent element updates to
//! the canvas; it never waits on the observers beyond the state lock.

use anyhow::Result;
use std::thread;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::constants::{colors, elements, layout};
use crate::mapping::PadMapping;
use crate::shutdown::Shutdown;
use crate::state::SharedInput;
use crate::surface::{Bounds, Canvas};

pub struct RenderScheduler<'c, 'x> {
    canvas: &'c mut Canvas<'x>,
    state: SharedInput,
    mapping: PadMapping,
    interval: Duration,
}

impl<'c, 'x> RenderScheduler<'c, 'x> {
    pub fn new(
        canvas: &'c mut Canvas<'x>,
        state: SharedInput,
        mapping: PadMapping,
        interval: Duration,
    ) -> Self {
        Self {
            canvas,
            state,
            mapping,
            interval,
        }
    }

    /// Tick until the stop flag is raised.
    pub fn run(mut self, shutdown: &Shutdown) -> Result<()> {
        while !shutdown.requested() {
            self.tick(Instant::now())?;
            thread::sleep(self.interval);
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) -> Result<()> {
        let snapshot = self.state.observe(now);
        trace!(keys = snapshot.keys.len(), clicks = snapshot.clicks.len(), "tick");

        // Highlight rim around the keyboard base while any key is active,
        // kept directly beneath it so only the rim shows
        if snapshot.keys.is_empty() {
            self.canvas.remove(elements::HIGHLIGHT);
        } else if !self.canvas.contains(elements::HIGHLIGHT) {
            self.canvas.place_rect(
                elements::HIGHLIGHT,
                keyboard_bounds().grown(layout::HIGHLIGHT_RIM),
                colors::HIGHLIGHT,
            );
            self.canvas
                .lower_below(elements::HIGHLIGHT, elements::KEYBOARD);
        }

        self.canvas
            .set_text(elements::LOG_TEXT, &snapshot.display_line());

        let (marker_x, marker_y) = self.mapping.map(snapshot.pointer.0, snapshot.pointer.1);
        self.canvas.move_to(
            elements::MARKER,
            Bounds::centered(marker_x, marker_y, layout::MARKER_RADIUS),
        );

        // The rate sample only surfaces once per elapsed window; the readout
        // keeps the previous value in between
        if let Some(rate) = snapshot.rate {
            self.canvas
                .set_text(elements::RATE_TEXT, &format!("{rate}/s"));
        }

        self.canvas.present()
    }
}

pub fn keyboard_bounds() -> Bounds {
    Bounds::from_corners(
        layout::KEYBOARD_X0,
        layout::KEYBOARD_Y0,
        layout::KEYBOARD_X1,
        layout::KEYBOARD_Y1,
    )
}
