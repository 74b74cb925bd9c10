// OCR境界: 検出結果（矩形 + テキスト）のみを受け取る

use image::RgbaImage;

use crate::geometry::Rect;

/// One detected text instance on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedText {
    pub rect: Rect,
    pub text: String,
}

/// Boundary to an external OCR engine.
///
/// The detector is a black box producing a finite set of boxes+text per
/// invocation; no ordering is guaranteed beyond covering the detected
/// instances. Restartable: calling it again re-runs detection.
pub trait TextDetector {
    fn detect(&self, image: &RgbaImage) -> crate::error::Result<Vec<DetectedText>>;
}
