//! Pixel geometry shared by the render pipeline and logo compositing.

/// Axis-aligned pixel rectangle: a logo footprint, its padded area, or one
/// module cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// A `side` square in the middle of a `container` square.
    pub fn centered(container: u32, side: u32) -> Self {
        let offset = container.saturating_sub(side) / 2;
        Self::new(offset, offset, side, side)
    }

    /// Exclusive.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Grows the rectangle by `margin` on every side, saturating at the origin.
    pub fn inflate(&self, margin: u32) -> Self {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        Self::new(
            x,
            y,
            self.right() + margin - x,
            self.bottom() + margin - y,
        )
    }

    /// True if the two rectangles share a pixel.
    pub fn intersects(&self, other: &RectPx) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True if any point of the rectangle lies strictly inside the circle.
    pub fn intersects_circle(&self, cx: f32, cy: f32, r: f32) -> bool {
        let nearest_x = cx.clamp(self.x as f32, self.right() as f32);
        let nearest_y = cy.clamp(self.y as f32, self.bottom() as f32);
        let dx = cx - nearest_x;
        let dy = cy - nearest_y;
        dx * dx + dy * dy < r * r
    }
}
