// ページ単位の編集状態（テキストボックス・手描きストローク・背景バージョン）

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::page::TextBox;
use crate::version::VersionId;

/// Manual mask geometry drawn by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stroke {
    /// Dragged rectangle selection.
    Rect(Rect),
    /// Freehand polyline with a brush radius.
    Polyline { points: Vec<(f32, f32)>, radius: f32 },
}

/// Mutable per-page document state.
///
/// `PageState` is a plain data holder: the `apply_*` methods replace state
/// wholesale and do no history bookkeeping. Recording the change is the
/// caller's responsibility, which keeps "what changed" separate from "that
/// a change happened".
#[derive(Debug, Clone)]
pub struct PageState {
    /// Source the page was imported from (image file or rasterized PDF page).
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Current background in the version chain. Older versions stay
    /// reachable through history entries only.
    pub current_version: VersionId,
    pub text_boxes: Vec<TextBox>,
    /// Uncommitted mask strokes; consumed by the next regeneration.
    pub strokes: Vec<Stroke>,
}

impl PageState {
    pub fn new(source: PathBuf, width: u32, height: u32, root_version: VersionId) -> Self {
        PageState {
            source,
            width,
            height,
            current_version: root_version,
            text_boxes: Vec::new(),
            strokes: Vec::new(),
        }
    }

    pub fn apply_text_boxes(&mut self, snapshot: Vec<TextBox>) {
        self.text_boxes = snapshot;
    }

    pub fn apply_strokes(&mut self, snapshot: Vec<Stroke>) {
        self.strokes = snapshot;
    }

    /// Swap the current background version pointer. Single assignment, so
    /// readers never observe a half-updated version.
    pub fn apply_background(&mut self, version: VersionId) {
        self.current_version = version;
    }

    /// Pixel rects of all text boxes, clamped to page bounds. Empty rects
    /// (boxes dragged fully off-page) are dropped.
    pub fn text_box_rects(&self) -> Vec<Rect> {
        self.text_boxes
            .iter()
            .map(|b| b.pixel_rect(self.width, self.height))
            .filter(|r| !r.is_empty())
            .collect()
    }
}
