pub mod storage;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Handle into the document's [`VersionStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub u32);

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// One immutable snapshot of a page's background, chained to the version it
/// was derived from. The chain roots at the imported image (`parent: None`).
#[derive(Debug, Clone)]
pub struct BackgroundVersion {
    pub image: RgbaImage,
    pub parent: Option<VersionId>,
}

/// Append-only arena of background versions.
///
/// Pages and history entries refer to versions by handle; undoing a
/// regeneration is a pointer swap back to `parent`, never a recomputation.
/// Versions are never removed while the document lives — entries evicted
/// from the history may leave orphans, bounded in practice by the history
/// cap.
#[derive(Debug, Default)]
pub struct VersionStore {
    versions: Vec<BackgroundVersion>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, image: RgbaImage, parent: Option<VersionId>) -> VersionId {
        let id = VersionId(self.versions.len() as u32);
        self.versions.push(BackgroundVersion { image, parent });
        id
    }

    pub fn get(&self, id: VersionId) -> Option<&BackgroundVersion> {
        self.versions.get(id.0 as usize)
    }

    pub fn image_of(&self, id: VersionId) -> crate::error::Result<&RgbaImage> {
        self.get(id)
            .map(|v| &v.image)
            .ok_or_else(|| crate::error::RetouchError::version(format!("dangling version {id}")))
    }

    /// Walk the parent chain from `id` to the root version.
    pub fn root_of(&self, id: VersionId) -> VersionId {
        let mut cur = id;
        while let Some(v) = self.get(cur) {
            match v.parent {
                Some(p) => cur = p,
                None => break,
            }
        }
        cur
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VersionId, &BackgroundVersion)> {
        self.versions
            .iter()
            .enumerate()
            .map(|(i, v)| (VersionId(i as u32), v))
    }
}
