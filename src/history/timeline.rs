// グローバル編集履歴タイムライン（カーソル + 上限付き）

use serde::{Deserialize, Serialize};

use crate::page::{PageId, Stroke, TextBox};
use crate::version::VersionId;

/// One undoable operation. Closed variant set with exhaustive handling in
/// undo/redo, so there is no "unknown entry type" failure mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HistoryEntry {
    TextBoxEdit {
        page_id: PageId,
        before: Vec<TextBox>,
        after: Vec<TextBox>,
    },
    StrokeEdit {
        page_id: PageId,
        before: Vec<Stroke>,
        after: Vec<Stroke>,
    },
    BackgroundRegen {
        page_id: PageId,
        before_version: VersionId,
        after_version: VersionId,
        /// Strokes cleared by the regeneration; restored on undo.
        strokes_consumed: Vec<Stroke>,
    },
}

impl HistoryEntry {
    pub fn page_id(&self) -> PageId {
        match self {
            HistoryEntry::TextBoxEdit { page_id, .. }
            | HistoryEntry::StrokeEdit { page_id, .. }
            | HistoryEntry::BackgroundRegen { page_id, .. } => *page_id,
        }
    }
}

/// Ordered sequence of entries with a cursor marking the boundary between
/// "applied" and "available to redo".
///
/// The timeline is document-wide, shared across all pages: switching pages
/// does not reset or partition it.
#[derive(Debug, Clone)]
pub struct Timeline {
    entries: Vec<HistoryEntry>,
    /// Entries `[0, cursor)` are applied; `[cursor, len)` are redoable.
    cursor: usize,
    limit: usize,
}

impl Timeline {
    pub fn new(limit: usize) -> Self {
        Timeline {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Rebuild a timeline from persisted parts.
    pub fn from_parts(entries: Vec<HistoryEntry>, cursor: usize, limit: usize) -> Self {
        let cursor = cursor.min(entries.len());
        Timeline {
            entries,
            cursor,
            limit: limit.max(1),
        }
    }

    /// Append an entry at the cursor.
    ///
    /// Any entries past the cursor are discarded first (undo-branch
    /// truncation), then the oldest entry is evicted when the cap is
    /// exceeded. Eviction happens with the cursor at the tail, so it can
    /// never remove an entry between the cursor and the tail.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor);
        self.entries.push(entry);
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len();
    }

    /// Move the cursor back one entry, returning the entry stepped over.
    pub fn step_back(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Move the cursor forward one entry, returning the entry stepped over.
    pub fn step_forward(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == self.entries.len() {
            return None;
        }
        let entry = &self.entries[self.cursor];
        self.cursor += 1;
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}
