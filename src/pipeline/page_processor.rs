// ページ単位処理: マスク生成 -> 再生成 -> 合成画像

use std::path::PathBuf;

use image::RgbaImage;

use crate::config::settings::Settings;
use crate::geometry::Rect;
use crate::inpaint::client::{InpaintBackend, InpaintOptions};
use crate::inpaint::orchestrator;
use crate::mask::build_mask;
use crate::page::{PageId, PageState};
use crate::version::VersionStore;

/// Regenerate the given regions of a single page image.
///
/// The batch path goes through the same mask/prepare/run/paste sequence as
/// the interactive document flow, over a throwaway one-page state. Returns
/// the repaired full-page image.
pub fn process_page(
    image: RgbaImage,
    regions: &[Rect],
    settings: &Settings,
    backend: &dyn InpaintBackend,
) -> crate::error::Result<RgbaImage> {
    let (width, height) = image.dimensions();
    let mut versions = VersionStore::new();
    let root = versions.push(image, None);
    let page = PageState::new(PathBuf::new(), width, height, root);

    let boxes: Vec<_> = regions
        .iter()
        .map(|r| r.inflate(settings.box_padding_px))
        .collect();
    let (region, crop) = build_mask(width, height, &boxes, &[], settings.crop_padding_px)?;

    let job = orchestrator::prepare(
        PageId(0),
        &page,
        &versions,
        &region,
        crop,
        InpaintOptions::from_settings(settings),
        settings.feather_sigma,
    )?;
    let blended = job.run(backend)?;

    Ok(orchestrator::paste_crop(versions.image_of(root)?, &blended))
}
