pub mod builder;

pub use builder::build_mask;

use image::GrayImage;

use crate::geometry::Rect;

/// Binary raster over a pixel coordinate space; 255 = "needs repair".
///
/// Built transiently per regeneration request from OCR boxes and strokes;
/// never persisted (the stroke input that produced it is what history
/// retains).
#[derive(Debug, Clone, PartialEq)]
pub struct MaskRegion {
    raster: GrayImage,
}

impl MaskRegion {
    pub fn new(width: u32, height: u32) -> Self {
        MaskRegion {
            raster: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.raster.get_pixel(x, y).0[0] != 0
    }

    pub fn set(&mut self, x: u32, y: u32) {
        self.raster.put_pixel(x, y, image::Luma([255u8]));
    }

    /// Fill a rectangle already clamped to the raster bounds.
    pub fn fill_rect(&mut self, rect: &Rect) {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.set(x, y);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raster.pixels().all(|p| p.0[0] == 0)
    }

    /// Minimal bounding box of the set pixels, or `None` when empty.
    pub fn bounding_box(&self) -> Option<Rect> {
        let (w, h) = (self.width(), self.height());
        let mut min_x = w;
        let mut min_y = h;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut any = false;
        for y in 0..h {
            for x in 0..w {
                if self.is_set(x, y) {
                    any = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if any {
            Some(Rect::new(
                min_x,
                min_y,
                max_x - min_x + 1,
                max_y - min_y + 1,
            ))
        } else {
            None
        }
    }

    /// Extract the sub-mask covered by `rect` (must lie within bounds).
    pub fn crop(&self, rect: &Rect) -> MaskRegion {
        let view =
            image::imageops::crop_imm(&self.raster, rect.x, rect.y, rect.width, rect.height);
        MaskRegion {
            raster: view.to_image(),
        }
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.raster
    }

    pub fn into_gray(self) -> GrayImage {
        self.raster
    }
}
