pub mod timeline;

pub use timeline::{HistoryEntry, Timeline};

use std::collections::HashMap;

use crate::page::{PageId, PageState};

/// State machine over the [`Timeline`], replaying entries against page
/// state.
///
/// `record`/`undo`/`redo` are single-writer by construction: the manager is
/// owned by the document controller and only reachable through `&mut`.
#[derive(Debug)]
pub struct HistoryManager {
    timeline: Timeline,
    dirty: bool,
}

impl HistoryManager {
    pub fn new(limit: usize) -> Self {
        HistoryManager {
            timeline: Timeline::new(limit),
            dirty: false,
        }
    }

    pub fn from_timeline(timeline: Timeline) -> Self {
        HistoryManager {
            timeline,
            dirty: false,
        }
    }

    /// Record a completed operation and mark the document dirty.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.timeline.push(entry);
        self.dirty = true;
    }

    /// Walk the cursor back one entry and apply its inverse.
    ///
    /// Returns `false` at the start of the timeline — a boundary, not an
    /// error. An entry whose page no longer exists is skipped with a log
    /// line; the cursor still moves, keeping the document-wide timeline
    /// consistent across page deletions.
    pub fn undo(&mut self, pages: &mut HashMap<PageId, PageState>) -> bool {
        let Some(entry) = self.timeline.step_back() else {
            return false;
        };

        match pages.get_mut(&entry.page_id()) {
            None => {
                tracing::warn!(page = %entry.page_id(), "undo target page no longer exists, skipping");
            }
            Some(page) => match entry {
                HistoryEntry::TextBoxEdit { before, .. } => {
                    page.apply_text_boxes(before.clone());
                }
                HistoryEntry::StrokeEdit { before, .. } => {
                    page.apply_strokes(before.clone());
                }
                HistoryEntry::BackgroundRegen {
                    before_version,
                    strokes_consumed,
                    ..
                } => {
                    // Pointer swap; the old version is retained, never
                    // recomputed.
                    page.apply_background(*before_version);
                    page.apply_strokes(strokes_consumed.clone());
                }
            },
        }

        self.dirty = true;
        true
    }

    /// Walk the cursor forward one entry and re-apply its `after` state.
    pub fn redo(&mut self, pages: &mut HashMap<PageId, PageState>) -> bool {
        let Some(entry) = self.timeline.step_forward() else {
            return false;
        };

        match pages.get_mut(&entry.page_id()) {
            None => {
                tracing::warn!(page = %entry.page_id(), "redo target page no longer exists, skipping");
            }
            Some(page) => match entry {
                HistoryEntry::TextBoxEdit { after, .. } => {
                    page.apply_text_boxes(after.clone());
                }
                HistoryEntry::StrokeEdit { after, .. } => {
                    page.apply_strokes(after.clone());
                }
                HistoryEntry::BackgroundRegen { after_version, .. } => {
                    page.apply_background(*after_version);
                    page.apply_strokes(Vec::new());
                }
            },
        }

        self.dirty = true;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.timeline.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.timeline.can_redo()
    }

    /// Drop all entries (used when loading a new document).
    pub fn clear(&mut self) {
        self.timeline.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }
}
