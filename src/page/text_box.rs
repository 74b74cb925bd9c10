use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Font attributes of a text box. `size_pt: None` means "auto-fit to the
/// box", resolved by the (external) rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    pub family: String,
    pub size_pt: Option<u32>,
    pub bold: bool,
}

impl Default for FontStyle {
    fn default() -> Self {
        FontStyle {
            family: "Microsoft YaHei".to_string(),
            size_pt: None,
            bold: false,
        }
    }
}

/// One editable text box on a page.
///
/// Identity is the box's index within the page's sequence; insertion order
/// carries z-order and copy/paste ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text: String,
    #[serde(default)]
    pub font: FontStyle,
    /// Optional per-box background fill.
    #[serde(default)]
    pub bg_color: Option<[u8; 3]>,
    #[serde(default = "default_bg_alpha")]
    pub bg_alpha: u8,
}

fn default_bg_alpha() -> u8 {
    120
}

impl TextBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32, text: impl Into<String>) -> Self {
        TextBox {
            x,
            y,
            width,
            height,
            text: text.into(),
            font: FontStyle::default(),
            bg_color: None,
            bg_alpha: default_bg_alpha(),
        }
    }

    /// Integer pixel rect of the box, clamped to the page bounds.
    ///
    /// Fractional positions round outward so the rect always covers the
    /// rendered glyphs.
    pub fn pixel_rect(&self, page_w: u32, page_h: u32) -> Rect {
        let x = self.x.max(0.0).floor() as u32;
        let y = self.y.max(0.0).floor() as u32;
        let right = (self.x.max(0.0) + self.width.max(0.0)).ceil() as u32;
        let bottom = (self.y.max(0.0) + self.height.max(0.0)).ceil() as u32;
        Rect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y)).clamp_to(page_w, page_h)
    }
}
