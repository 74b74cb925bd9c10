//! Edit-history and background-regeneration core of an image-to-slides
//! editor: per-page state, mask building from OCR boxes and manual
//! strokes, inpaint-service orchestration with feathered compositing, and
//! a document-wide bounded undo/redo timeline.

pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod history;
pub mod inpaint;
pub mod mask;
pub mod ocr;
pub mod page;
pub mod pipeline;
pub mod project;
pub mod version;
