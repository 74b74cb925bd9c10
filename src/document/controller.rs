// ドキュメント制御: ページ集合 + 履歴 + 再生成の仲介
//
// Every mutating intent goes through here so that applying a change and
// recording it in history happen in one logical step; one without the
// other would corrupt the undo invariant.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::config::settings::Settings;
use crate::error::RetouchError;
use crate::history::{HistoryEntry, HistoryManager, Timeline};
use crate::inpaint::client::{InpaintBackend, InpaintOptions};
use crate::inpaint::orchestrator::{self, BlendedCrop, RegenJob};
use crate::mask;
use crate::ocr::DetectedText;
use crate::page::{PageId, PageState, Stroke, TextBox};
use crate::version::{VersionId, VersionStore};

pub struct DocumentController {
    settings: Settings,
    pages: HashMap<PageId, PageState>,
    /// Page display order; history identity stays with [`PageId`].
    order: Vec<PageId>,
    active_index: usize,
    versions: VersionStore,
    history: HistoryManager,
    /// Pages with a regeneration in flight; at most one per page.
    in_flight: HashSet<PageId>,
    next_page_id: u64,
}

impl DocumentController {
    pub fn new(settings: Settings) -> Self {
        let history = HistoryManager::new(settings.history_limit);
        DocumentController {
            settings,
            pages: HashMap::new(),
            order: Vec::new(),
            active_index: 0,
            versions: VersionStore::new(),
            history,
            in_flight: HashSet::new(),
            next_page_id: 0,
        }
    }

    /// Rebuild a controller from persisted parts (project load).
    pub(crate) fn from_parts(
        settings: Settings,
        pages: HashMap<PageId, PageState>,
        order: Vec<PageId>,
        active_index: usize,
        versions: VersionStore,
        timeline: Timeline,
    ) -> Self {
        let next_page_id = order.iter().map(|p| p.0 + 1).max().unwrap_or(0);
        let active_index = if order.is_empty() {
            0
        } else {
            active_index.min(order.len() - 1)
        };
        DocumentController {
            settings,
            pages,
            order,
            active_index,
            versions,
            history: HistoryManager::from_timeline(timeline),
            in_flight: HashSet::new(),
            next_page_id,
        }
    }

    // --- Page lifecycle -------------------------------------------------

    /// Import an image as a new page at the end of the document. The image
    /// becomes the root of the page's background-version chain.
    pub fn add_page(&mut self, source: PathBuf, image: RgbaImage) -> PageId {
        let id = PageId(self.next_page_id);
        self.next_page_id += 1;
        let (width, height) = image.dimensions();
        let root = self.versions.push(image, None);
        self.pages
            .insert(id, PageState::new(source, width, height, root));
        self.order.push(id);
        tracing::info!(page = %id, width, height, "page added");
        id
    }

    pub fn add_page_from_file(&mut self, path: &Path) -> crate::error::Result<PageId> {
        let image = image::open(path)?.to_rgba8();
        Ok(self.add_page(path.to_path_buf(), image))
    }

    /// Remove a page. History entries referencing it stay in the timeline
    /// and degrade to no-ops; an in-flight regeneration loses its guard so
    /// its eventual result is discarded at commit.
    pub fn remove_page(&mut self, page_id: PageId) -> crate::error::Result<()> {
        if self.pages.remove(&page_id).is_none() {
            return Err(RetouchError::UnknownPage(page_id));
        }
        self.order.retain(|id| *id != page_id);
        self.in_flight.remove(&page_id);
        if self.active_index >= self.order.len() && self.active_index > 0 {
            self.active_index = self.order.len() - 1;
        }
        tracing::info!(page = %page_id, "page removed");
        Ok(())
    }

    /// Duplicate a page: copies text boxes and strokes, and clones the
    /// current background into a fresh root version (the copy starts its
    /// own chain).
    pub fn duplicate_page(&mut self, page_id: PageId) -> crate::error::Result<PageId> {
        let src = self.page(page_id)?;
        let image = self.versions.image_of(src.current_version)?.clone();
        let source = src.source.clone();
        let text_boxes = src.text_boxes.clone();
        let strokes = src.strokes.clone();

        let new_id = self.add_page(source, image);
        let insert_at = self
            .order
            .iter()
            .position(|id| *id == page_id)
            .map(|i| i + 1)
            .unwrap_or(self.order.len());
        self.order.retain(|id| *id != new_id);
        self.order.insert(insert_at.min(self.order.len()), new_id);

        let page = self.pages.get_mut(&new_id).expect("page just inserted");
        page.text_boxes = text_boxes;
        page.strokes = strokes;
        Ok(new_id)
    }

    /// Move a page to a new position in the display order.
    pub fn move_page(&mut self, page_id: PageId, new_index: usize) -> crate::error::Result<()> {
        let from = self
            .order
            .iter()
            .position(|id| *id == page_id)
            .ok_or(RetouchError::UnknownPage(page_id))?;
        let to = new_index.min(self.order.len() - 1);
        let id = self.order.remove(from);
        self.order.insert(to, id);
        Ok(())
    }

    pub fn page(&self, page_id: PageId) -> crate::error::Result<&PageState> {
        self.pages
            .get(&page_id)
            .ok_or(RetouchError::UnknownPage(page_id))
    }

    pub fn page_ids(&self) -> &[PageId] {
        &self.order
    }

    pub fn page_count(&self) -> usize {
        self.order.len()
    }

    pub fn active_page_id(&self) -> Option<PageId> {
        self.order.get(self.active_index).copied()
    }

    pub fn set_active_index(&mut self, index: usize) -> crate::error::Result<()> {
        if index >= self.order.len() {
            return Err(RetouchError::document(format!(
                "active index {index} out of range ({} pages)",
                self.order.len()
            )));
        }
        self.active_index = index;
        Ok(())
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    // --- Text box edits -------------------------------------------------

    /// Replace the box at `index` with `new_box`.
    pub fn edit_text_box(
        &mut self,
        page_id: PageId,
        index: usize,
        new_box: TextBox,
    ) -> crate::error::Result<()> {
        self.with_text_boxes(page_id, |boxes| {
            let slot = boxes.get_mut(index).ok_or_else(|| {
                RetouchError::document(format!("text box index {index} out of range"))
            })?;
            *slot = new_box;
            Ok(())
        })
    }

    /// Append a text box, returning its index (identity within the page).
    pub fn insert_text_box(
        &mut self,
        page_id: PageId,
        text_box: TextBox,
    ) -> crate::error::Result<usize> {
        self.with_text_boxes(page_id, |boxes| {
            boxes.push(text_box);
            Ok(boxes.len() - 1)
        })
    }

    pub fn remove_text_box(&mut self, page_id: PageId, index: usize) -> crate::error::Result<()> {
        self.with_text_boxes(page_id, |boxes| {
            if index >= boxes.len() {
                return Err(RetouchError::document(format!(
                    "text box index {index} out of range"
                )));
            }
            boxes.remove(index);
            Ok(())
        })
    }

    /// Turn OCR detections into editable text boxes, appended in detection
    /// order. One undoable entry for the whole import.
    pub fn import_ocr_results(
        &mut self,
        page_id: PageId,
        detections: Vec<DetectedText>,
    ) -> crate::error::Result<()> {
        if detections.is_empty() {
            return Ok(());
        }
        self.with_text_boxes(page_id, |boxes| {
            for det in detections {
                boxes.push(TextBox::new(
                    det.rect.x as f32,
                    det.rect.y as f32,
                    det.rect.width as f32,
                    det.rect.height as f32,
                    det.text,
                ));
            }
            Ok(())
        })
    }

    /// Snapshot-mutate-record skeleton shared by all text-box edits. The
    /// mutation either succeeds (recorded) or fails (state untouched).
    fn with_text_boxes<T>(
        &mut self,
        page_id: PageId,
        mutate: impl FnOnce(&mut Vec<TextBox>) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let page = self
            .pages
            .get_mut(&page_id)
            .ok_or(RetouchError::UnknownPage(page_id))?;
        let before = page.text_boxes.clone();
        let mut working = before.clone();
        let out = mutate(&mut working)?;
        self.history.record(HistoryEntry::TextBoxEdit {
            page_id,
            before,
            after: working.clone(),
        });
        // record() precedes apply; the two always happen together here.
        self.pages
            .get_mut(&page_id)
            .expect("page checked above")
            .apply_text_boxes(working);
        Ok(out)
    }

    // --- Strokes --------------------------------------------------------

    /// Replace the page's uncommitted stroke set.
    pub fn apply_strokes(
        &mut self,
        page_id: PageId,
        strokes: Vec<Stroke>,
    ) -> crate::error::Result<()> {
        let page = self
            .pages
            .get_mut(&page_id)
            .ok_or(RetouchError::UnknownPage(page_id))?;
        let before = page.strokes.clone();
        self.history.record(HistoryEntry::StrokeEdit {
            page_id,
            before,
            after: strokes.clone(),
        });
        self.pages
            .get_mut(&page_id)
            .expect("page checked above")
            .apply_strokes(strokes);
        Ok(())
    }

    // --- Background regeneration ---------------------------------------

    /// Prepare a regeneration for a page and take its in-flight slot.
    ///
    /// Mask sources are the page's text-box rects (inflated by the box
    /// padding) plus its manual strokes. The returned job is `Send` and can
    /// run on a worker thread; nothing is committed until
    /// [`Self::commit_regeneration`].
    pub fn begin_regeneration(&mut self, page_id: PageId) -> crate::error::Result<RegenJob> {
        let page = self
            .pages
            .get(&page_id)
            .ok_or(RetouchError::UnknownPage(page_id))?;
        if self.in_flight.contains(&page_id) {
            return Err(RetouchError::RegenInFlight(page_id));
        }

        let boxes: Vec<_> = page
            .text_box_rects()
            .iter()
            .map(|r| r.inflate(self.settings.box_padding_px))
            .collect();
        let (region, crop) = mask::build_mask(
            page.width,
            page.height,
            &boxes,
            &page.strokes,
            self.settings.crop_padding_px,
        )?;

        let job = orchestrator::prepare(
            page_id,
            page,
            &self.versions,
            &region,
            crop,
            InpaintOptions::from_settings(&self.settings),
            self.settings.feather_sigma,
        )?;

        self.in_flight.insert(page_id);
        tracing::info!(page = %page_id, crop = ?crop, "regeneration started");
        Ok(job)
    }

    /// Release a page's in-flight slot after a failed run. State is
    /// untouched; the user may retry the same intent.
    pub fn abort_regeneration(&mut self, page_id: PageId) {
        self.in_flight.remove(&page_id);
    }

    /// Commit a finished regeneration: paste the blended crop into a copy
    /// of the base version, chain the new version, record, apply.
    ///
    /// Re-validates before touching anything: a result for a deleted page,
    /// or one whose base version is no longer current (an undo raced the
    /// worker), is discarded with a log line.
    pub fn commit_regeneration(&mut self, blended: BlendedCrop) -> crate::error::Result<()> {
        let page_id = blended.page_id;
        self.in_flight.remove(&page_id);

        let Some(page) = self.pages.get(&page_id) else {
            tracing::warn!(page = %page_id, "regeneration result for deleted page discarded");
            return Ok(());
        };
        if page.current_version != blended.base_version {
            tracing::warn!(
                page = %page_id,
                base = %blended.base_version,
                current = %page.current_version,
                "regeneration base version is stale, result discarded"
            );
            return Ok(());
        }

        let base = self.versions.image_of(blended.base_version)?;
        let new_image = orchestrator::paste_crop(base, &blended);
        let after_version = self.versions.push(new_image, Some(blended.base_version));

        let strokes_consumed = page.strokes.clone();
        self.history.record(HistoryEntry::BackgroundRegen {
            page_id,
            before_version: blended.base_version,
            after_version,
            strokes_consumed,
        });
        let page = self.pages.get_mut(&page_id).expect("page checked above");
        page.apply_background(after_version);
        page.apply_strokes(Vec::new());

        tracing::info!(page = %page_id, version = %after_version, "regeneration committed");
        Ok(())
    }

    /// Synchronous convenience: begin, run on the calling thread, commit.
    ///
    /// Any failure releases the in-flight slot and leaves page state and
    /// the timeline unmodified.
    pub fn request_regeneration(
        &mut self,
        page_id: PageId,
        backend: &dyn InpaintBackend,
    ) -> crate::error::Result<()> {
        let job = self.begin_regeneration(page_id)?;
        match job.run(backend) {
            Ok(blended) => self.commit_regeneration(blended),
            Err(e) => {
                self.abort_regeneration(page_id);
                Err(e)
            }
        }
    }

    pub fn regeneration_in_flight(&self, page_id: PageId) -> bool {
        self.in_flight.contains(&page_id)
    }

    /// Point the page back at the root of its version chain, recorded as a
    /// regeneration so it is undoable.
    pub fn restore_original(&mut self, page_id: PageId) -> crate::error::Result<()> {
        let page = self
            .pages
            .get(&page_id)
            .ok_or(RetouchError::UnknownPage(page_id))?;
        let current = page.current_version;
        let root = self.versions.root_of(current);
        if root == current {
            return Ok(());
        }
        let strokes_consumed = page.strokes.clone();
        self.history.record(HistoryEntry::BackgroundRegen {
            page_id,
            before_version: current,
            after_version: root,
            strokes_consumed,
        });
        let page = self.pages.get_mut(&page_id).expect("page checked above");
        page.apply_background(root);
        page.apply_strokes(Vec::new());
        Ok(())
    }

    // --- History --------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.pages)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.pages)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    // --- Accessors for persistence and inspection -----------------------

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn versions(&self) -> &VersionStore {
        &self.versions
    }

    pub fn timeline(&self) -> &Timeline {
        self.history.timeline()
    }

    pub fn current_version_of(&self, page_id: PageId) -> crate::error::Result<VersionId> {
        Ok(self.page(page_id)?.current_version)
    }
}
