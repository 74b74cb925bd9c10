// 整数ピクセル座標の矩形演算（マスク・クロップ共通）

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page pixel space.
///
/// `x`/`y` is the top-left corner; `width`/`height` the extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Expand by `pad` on all four sides. The top-left saturates at the
    /// page origin; clamping the far edges is the caller's job via
    /// [`Rect::clamp_to`].
    pub fn inflate(&self, pad: u32) -> Self {
        let x = self.x.saturating_sub(pad);
        let y = self.y.saturating_sub(pad);
        Self {
            x,
            y,
            width: self.width + (self.x - x) + pad,
            height: self.height + (self.y - y) + pad,
        }
    }

    /// Clamp to the page bounds `[0, page_w) x [0, page_h)`.
    ///
    /// A rectangle entirely outside the page collapses to zero extent.
    pub fn clamp_to(&self, page_w: u32, page_h: u32) -> Self {
        let x = self.x.min(page_w);
        let y = self.y.min(page_h);
        let right = self.right().min(page_w);
        let bottom = self.bottom().min(page_h);
        Self {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn contains_point(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}
