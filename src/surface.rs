//! Presentation surface
//!
//! Retained-element canvas over an off-screen pixmap. The render scheduler
//! places, moves, and retextures named elements every tick; `present` redraws
//! the whole scene back-to-front and blits it to the overlay window, so every
//! operation is safe to repeat each tick.

use anyhow::{Context, Result};
use std::collections::HashMap;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::{colors, x11};

/// Overlay-local element bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds spanning two corner points; corners may be given in any order.
    pub fn from_corners(x0: i16, y0: i16, x1: i16, y1: i16) -> Self {
        let (left, right) = (x0.min(x1), x0.max(x1));
        let (top, bottom) = (y0.min(y1), y0.max(y1));
        Self {
            x: left,
            y: top,
            width: (right - left) as u16,
            height: (bottom - top) as u16,
        }
    }

    /// Square bounds centered on a point.
    pub fn centered(cx: i16, cy: i16, radius: i16) -> Self {
        Self {
            x: cx - radius,
            y: cy - radius,
            width: (radius as u16) * 2,
            height: (radius as u16) * 2,
        }
    }

    /// Bounds grown outward by `rim` pixels on every side.
    pub fn grown(&self, rim: i16) -> Self {
        Self {
            x: self.x - rim,
            y: self.y - rim,
            width: self.width.saturating_add((rim as u16) * 2),
            height: self.height.saturating_add((rim as u16) * 2),
        }
    }
}

#[derive(Debug)]
enum Shape {
    Rect { fill: u32 },
    Marker { fill: u32 },
    Text { content: String, fill: u32 },
}

#[derive(Debug)]
struct Element {
    bounds: Bounds,
    shape: Shape,
}

/// Canvas drawing into an overlay window via a backing pixmap.
pub struct Canvas<'a> {
    conn: &'a RustConnection,
    window: Window,
    pixmap: Pixmap,
    gc: Gcontext,
    width: u16,
    height: u16,
    elements: HashMap<&'static str, Element>,
    stacking: Vec<&'static str>,
}

impl<'a> Canvas<'a> {
    pub fn new(
        conn: &'a RustConnection,
        screen: &Screen,
        window: Window,
        width: u16,
        height: u16,
    ) -> Result<Self> {
        let pixmap = conn
            .generate_id()
            .context("Failed to generate ID for canvas pixmap")?;
        conn.create_pixmap(screen.root_depth, pixmap, window, width, height)
            .context("Failed to create canvas pixmap")?;

        let font = conn
            .generate_id()
            .context("Failed to generate ID for canvas font")?;
        conn.open_font(font, x11::CORE_FONT)
            .context("Failed to open core font for canvas text")?;

        let gc = conn
            .generate_id()
            .context("Failed to generate ID for canvas graphics context")?;
        conn.create_gc(
            gc,
            pixmap,
            &CreateGCAux::new()
                .foreground(colors::TEXT)
                .background(colors::BACKGROUND)
                .font(font),
        )
        .context("Failed to create canvas graphics context")?;
        conn.close_font(font)
            .context("Failed to close core font handle")?;

        Ok(Self {
            conn,
            window,
            pixmap,
            gc,
            width,
            height,
            elements: HashMap::new(),
            stacking: Vec::new(),
        })
    }

    fn place(&mut self, id: &'static str, element: Element) {
        if self.elements.insert(id, element).is_none() {
            self.stacking.push(id);
        }
    }

    pub fn place_rect(&mut self, id: &'static str, bounds: Bounds, fill: u32) {
        self.place(
            id,
            Element {
                bounds,
                shape: Shape::Rect { fill },
            },
        );
    }

    pub fn place_marker(&mut self, id: &'static str, bounds: Bounds, fill: u32) {
        self.place(
            id,
            Element {
                bounds,
                shape: Shape::Marker { fill },
            },
        );
    }

    /// `(x, y)` is the text baseline origin.
    pub fn place_text(&mut self, id: &'static str, x: i16, y: i16, content: &str, fill: u32) {
        self.place(
            id,
            Element {
                bounds: Bounds::new(x, y, 0, 0),
                shape: Shape::Text {
                    content: content.to_string(),
                    fill,
                },
            },
        );
    }

    /// Reposition an existing element; unknown ids are ignored.
    pub fn move_to(&mut self, id: &str, bounds: Bounds) {
        if let Some(element) = self.elements.get_mut(id) {
            element.bounds = bounds;
        }
    }

    /// Replace the content of an existing text element; non-text ids are
    /// ignored.
    pub fn set_text(&mut self, id: &str, content: &str) {
        if let Some(element) = self.elements.get_mut(id)
            && let Shape::Text { content: current, .. } = &mut element.shape
        {
            content.clone_into(current);
        }
    }

    pub fn remove(&mut self, id: &str) {
        if self.elements.remove(id).is_some() {
            self.stacking.retain(|e| *e != id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    /// Move an element to the top of the stacking order.
    pub fn raise(&mut self, id: &str) {
        if let Some(pos) = self.stacking.iter().position(|e| *e == id) {
            let id = self.stacking.remove(pos);
            self.stacking.push(id);
        }
    }

    /// Move an element to the bottom of the stacking order.
    pub fn lower(&mut self, id: &str) {
        if let Some(pos) = self.stacking.iter().position(|e| *e == id) {
            let id = self.stacking.remove(pos);
            self.stacking.insert(0, id);
        }
    }

    /// Move an element directly beneath another one.
    pub fn lower_below(&mut self, id: &str, anchor: &str) {
        if let Some(pos) = self.stacking.iter().position(|e| *e == id) {
            let id = self.stacking.remove(pos);
            let anchor_pos = self
                .stacking
                .iter()
                .position(|e| *e == anchor)
                .unwrap_or(0);
            self.stacking.insert(anchor_pos, id);
        }
    }

    /// Redraw the scene bottom-up into the pixmap and blit it to the window.
    pub fn present(&self) -> Result<()> {
        self.fill(
            colors::BACKGROUND,
            Bounds::new(0, 0, self.width, self.height),
        )?;

        for id in &self.stacking {
            let element = &self.elements[id];
            match &element.shape {
                Shape::Rect { fill } => self.fill(*fill, element.bounds)?,
                Shape::Marker { fill } => {
                    self.set_foreground(*fill)?;
                    let b = element.bounds;
                    self.conn
                        .poly_fill_arc(
                            self.pixmap,
                            self.gc,
                            &[Arc {
                                x: b.x,
                                y: b.y,
                                width: b.width,
                                height: b.height,
                                angle1: 0,
                                angle2: 360 * 64,
                            }],
                        )
                        .context("Failed to draw marker")?;
                }
                Shape::Text { content, fill } => {
                    self.set_foreground(*fill)?;
                    // ImageText8 carries at most 255 glyphs per request
                    let bytes = content.as_bytes();
                    let bytes = &bytes[..bytes.len().min(255)];
                    self.conn
                        .image_text8(self.pixmap, self.gc, element.bounds.x, element.bounds.y, bytes)
                        .context("Failed to draw text")?;
                }
            }
        }

        self.conn
            .copy_area(
                self.pixmap,
                self.window,
                self.gc,
                0,
                0,
                0,
                0,
                self.width,
                self.height,
            )
            .context("Failed to present canvas to window")?;
        self.conn.flush().context("Failed to flush canvas present")?;
        Ok(())
    }

    fn set_foreground(&self, pixel: u32) -> Result<()> {
        self.conn
            .change_gc(self.gc, &ChangeGCAux::new().foreground(pixel))
            .context("Failed to change GC foreground")?;
        Ok(())
    }

    fn fill(&self, pixel: u32, bounds: Bounds) -> Result<()> {
        self.set_foreground(pixel)?;
        self.conn
            .poly_fill_rectangle(
                self.pixmap,
                self.gc,
                &[Rectangle {
                    x: bounds.x,
                    y: bounds.y,
                    width: bounds.width,
                    height: bounds.height,
                }],
            )
            .context("Failed to fill rectangle")?;
        Ok(())
    }
}

impl Drop for Canvas<'_> {
    fn drop(&mut self) {
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.free_pixmap(self.pixmap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes_order() {
        let b = Bounds::from_corners(750, 250, 50, 100);
        assert_eq!(b, Bounds::new(50, 100, 700, 150));
    }

    #[test]
    fn test_centered_spans_diameter() {
        let b = Bounds::centered(400, 175, 10);
        assert_eq!(b, Bounds::new(390, 165, 20, 20));
    }

    #[test]
    fn test_grown_expands_every_side() {
        let b = Bounds::new(150, 150, 200, 50).grown(4);
        assert_eq!(b, Bounds::new(146, 146, 208, 58));
    }
}
