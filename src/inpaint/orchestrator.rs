// 背景再生成: クロップ抽出 -> サービス呼び出し -> フェザー合成

use std::io::Cursor;

use image::{GrayImage, ImageFormat, RgbaImage, imageops};

use crate::error::{InpaintFailure, RetouchError};
use crate::geometry::Rect;
use crate::inpaint::client::{InpaintBackend, InpaintOptions};
use crate::mask::MaskRegion;
use crate::page::{PageId, PageState};
use crate::version::{VersionId, VersionStore};

/// A regeneration prepared against a page's current background version.
///
/// Owns clones of the crop sub-image and sub-mask, so it is `Send` and can
/// run on a worker thread while the document stays interactive. Nothing is
/// mutated until the caller commits the resulting [`BlendedCrop`].
#[derive(Debug, Clone)]
pub struct RegenJob {
    pub page_id: PageId,
    /// Version the crop was extracted from; the commit chains to it.
    pub base_version: VersionId,
    pub crop: Rect,
    crop_image: RgbaImage,
    crop_mask: GrayImage,
    opts: InpaintOptions,
    feather_sigma: f32,
}

/// The repaired and blended crop, ready to paste at `crop`'s offset.
#[derive(Debug, Clone)]
pub struct BlendedCrop {
    pub page_id: PageId,
    pub base_version: VersionId,
    pub crop: Rect,
    pub image: RgbaImage,
}

/// Extract the crop sub-image from the page's *current* background version
/// (not the original — each regeneration builds on the prior one) together
/// with the matching sub-mask.
pub fn prepare(
    page_id: PageId,
    page: &PageState,
    versions: &VersionStore,
    region: &MaskRegion,
    crop: Rect,
    opts: InpaintOptions,
    feather_sigma: f32,
) -> crate::error::Result<RegenJob> {
    if crop.is_empty() {
        return Err(RetouchError::EmptyRegion);
    }
    let base_version = page.current_version;
    let full = versions.image_of(base_version)?;
    if crop.right() > full.width() || crop.bottom() > full.height() {
        return Err(RetouchError::image(format!(
            "crop {crop:?} exceeds background {}x{}",
            full.width(),
            full.height()
        )));
    }

    let crop_image = imageops::crop_imm(full, crop.x, crop.y, crop.width, crop.height).to_image();
    let crop_mask = region.crop(&crop).into_gray();

    Ok(RegenJob {
        page_id,
        base_version,
        crop,
        crop_image,
        crop_mask,
        opts,
        feather_sigma,
    })
}

impl RegenJob {
    /// Submit the crop to the service and feather-blend the reply.
    ///
    /// Pure with respect to document state: any failure surfaces as an
    /// error with nothing committed anywhere.
    pub fn run(&self, backend: &dyn InpaintBackend) -> crate::error::Result<BlendedCrop> {
        let image_png = encode_png_rgba(&self.crop_image)?;
        let mask_png = encode_png_gray(&self.crop_mask)?;

        let reply = backend.inpaint(&image_png, &mask_png, &self.opts)?;

        let repaired = image::load_from_memory(&reply)
            .map_err(|_| RetouchError::Inpaint(InpaintFailure::MalformedResponse))?
            .to_rgba8();
        if repaired.dimensions() != self.crop_image.dimensions() {
            tracing::warn!(
                expected = ?self.crop_image.dimensions(),
                got = ?repaired.dimensions(),
                "inpaint reply dimensions do not match the crop"
            );
            return Err(RetouchError::Inpaint(InpaintFailure::MalformedResponse));
        }

        let blended = feather_blend(
            &self.crop_image,
            &repaired,
            &self.crop_mask,
            self.feather_sigma,
        );

        tracing::debug!(page = %self.page_id, crop = ?self.crop, "inpaint crop blended");

        Ok(BlendedCrop {
            page_id: self.page_id,
            base_version: self.base_version,
            crop: self.crop,
            image: blended,
        })
    }
}

/// Composite `repaired` over `original` through a feathered mask.
///
/// The binary mask gets a gaussian falloff at its edges so there is no
/// visible seam between model output and untouched pixels:
/// `out = m * repaired + (1 - m) * original` per channel.
pub fn feather_blend(
    original: &RgbaImage,
    repaired: &RgbaImage,
    mask: &GrayImage,
    sigma: f32,
) -> RgbaImage {
    let feather = if sigma > 0.0 {
        imageops::blur(mask, sigma)
    } else {
        mask.clone()
    };

    let (w, h) = original.dimensions();
    let mut out = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let m = feather.get_pixel(x, y).0[0] as f32 / 255.0;
            let o = original.get_pixel(x, y).0;
            let r = repaired.get_pixel(x, y).0;
            let mut px = [0u8; 4];
            for c in 0..4 {
                px[c] = (m * r[c] as f32 + (1.0 - m) * o[c] as f32).round() as u8;
            }
            out.put_pixel(x, y, image::Rgba(px));
        }
    }
    out
}

/// Paste the blended crop back into a copy of the base image at the crop
/// offset. Pixels outside the crop are untouched.
pub fn paste_crop(base: &RgbaImage, blended: &BlendedCrop) -> RgbaImage {
    let mut out = base.clone();
    imageops::replace(
        &mut out,
        &blended.image,
        blended.crop.x as i64,
        blended.crop.y as i64,
    );
    out
}

fn encode_png_rgba(img: &RgbaImage) -> crate::error::Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

fn encode_png_gray(img: &GrayImage) -> crate::error::Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
