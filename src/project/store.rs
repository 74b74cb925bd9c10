// プロジェクト永続化: project.json + SHA-256キーの背景画像
//
// Serializes (pages, timeline, version chains) so that a reload
// reconstructs identical undo/redo behavior. Version images live under
// `<root>/versions/<sha256>.png`; the manifest references them by key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::settings::Settings;
use crate::document::DocumentController;
use crate::error::RetouchError;
use crate::history::{HistoryEntry, Timeline};
use crate::page::{PageId, PageState, Stroke, TextBox};
use crate::version::{VersionId, VersionStore, storage};

const MANIFEST_FILE: &str = "project.json";
const VERSIONS_DIR: &str = "versions";

#[derive(Debug, Serialize, Deserialize)]
struct ProjectManifest {
    pages: Vec<PageManifest>,
    active_index: usize,
    /// Versions in arena order; the vector index is the `VersionId`.
    versions: Vec<VersionManifest>,
    timeline_entries: Vec<HistoryEntry>,
    timeline_cursor: usize,
    timeline_limit: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct PageManifest {
    id: PageId,
    source: PathBuf,
    width: u32,
    height: u32,
    current_version: VersionId,
    text_boxes: Vec<TextBox>,
    strokes: Vec<Stroke>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionManifest {
    parent: Option<VersionId>,
    image_key: String,
}

/// Directory-backed project storage.
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        ProjectStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn versions_dir(&self) -> PathBuf {
        self.root.join(VERSIONS_DIR)
    }

    /// Persist the document. Version images are content-addressed, so
    /// repeated saves only write new versions; the manifest itself is
    /// written atomically (temp file, then rename).
    pub fn save(&self, document: &DocumentController) -> crate::error::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let versions_dir = self.versions_dir();

        let mut versions = Vec::with_capacity(document.versions().len());
        for (_, version) in document.versions().iter() {
            let image_key = storage::persist_image(&versions_dir, &version.image)?;
            versions.push(VersionManifest {
                parent: version.parent,
                image_key,
            });
        }

        let mut pages = Vec::with_capacity(document.page_count());
        for &id in document.page_ids() {
            let page = document.page(id)?;
            pages.push(PageManifest {
                id,
                source: page.source.clone(),
                width: page.width,
                height: page.height,
                current_version: page.current_version,
                text_boxes: page.text_boxes.clone(),
                strokes: page.strokes.clone(),
            });
        }

        let timeline = document.timeline();
        let manifest = ProjectManifest {
            pages,
            active_index: document.active_index(),
            versions,
            timeline_entries: timeline.entries().to_vec(),
            timeline_cursor: timeline.cursor(),
            timeline_limit: timeline.limit(),
        };

        let json = serde_json::to_vec_pretty(&manifest)?;
        let final_path = self.root.join(MANIFEST_FILE);
        let tmp_path = self.root.join(format!(".{MANIFEST_FILE}.tmp"));
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &final_path)?;

        tracing::info!(root = %self.root.display(), pages = manifest.pages.len(), "project saved");
        Ok(())
    }

    /// Load a document back. The returned controller starts with a clean
    /// dirty flag and no in-flight regenerations.
    pub fn load(&self, settings: Settings) -> crate::error::Result<DocumentController> {
        let manifest_path = self.root.join(MANIFEST_FILE);
        let json = std::fs::read(&manifest_path)?;
        let manifest: ProjectManifest = serde_json::from_slice(&json)?;

        let versions_dir = self.versions_dir();
        let mut store = VersionStore::new();
        for vm in &manifest.versions {
            if let Some(parent) = vm.parent
                && parent.0 as usize >= store.len()
            {
                return Err(RetouchError::project(format!(
                    "version parent {parent} does not precede its child in the arena"
                )));
            }
            let image = storage::load_image(&versions_dir, &vm.image_key)?;
            store.push(image, vm.parent);
        }

        let mut pages = HashMap::new();
        let mut order = Vec::with_capacity(manifest.pages.len());
        for pm in manifest.pages {
            if store.get(pm.current_version).is_none() {
                return Err(RetouchError::project(format!(
                    "page {} references missing version {}",
                    pm.id, pm.current_version
                )));
            }
            let mut page = PageState::new(pm.source, pm.width, pm.height, pm.current_version);
            page.text_boxes = pm.text_boxes;
            page.strokes = pm.strokes;
            order.push(pm.id);
            pages.insert(pm.id, page);
        }

        let timeline = Timeline::from_parts(
            manifest.timeline_entries,
            manifest.timeline_cursor,
            manifest.timeline_limit,
        );

        Ok(DocumentController::from_parts(
            settings,
            pages,
            order,
            manifest.active_index,
            store,
            timeline,
        ))
    }
}
