// マスク生成: OCR矩形 + 手描きストローク -> 二値マスク + クロップ矩形

use crate::error::RetouchError;
use crate::geometry::Rect;
use crate::mask::MaskRegion;
use crate::page::Stroke;

/// Build the repair mask and its padded crop rectangle for one page.
///
/// The mask is the rasterized union of `boxes` and `strokes`, clamped to
/// the page bounds. The crop is the minimal bounding box of the set pixels
/// expanded by `padding_px` on every side, again clamped to the page —
/// sending the whole page to the inpaint service would be wasteful, while
/// the margin gives the model enough surrounding context to blend.
///
/// Deterministic: identical inputs yield a bit-identical raster and crop.
/// Fails with [`RetouchError::EmptyRegion`] when nothing rasterizes.
pub fn build_mask(
    page_w: u32,
    page_h: u32,
    boxes: &[Rect],
    strokes: &[Stroke],
    padding_px: u32,
) -> crate::error::Result<(MaskRegion, Rect)> {
    let mut region = MaskRegion::new(page_w, page_h);

    for rect in boxes {
        let clamped = rect.clamp_to(page_w, page_h);
        if !clamped.is_empty() {
            region.fill_rect(&clamped);
        }
    }

    for stroke in strokes {
        rasterize_stroke(&mut region, stroke, page_w, page_h);
    }

    let Some(bbox) = region.bounding_box() else {
        return Err(RetouchError::EmptyRegion);
    };

    let crop = bbox.inflate(padding_px).clamp_to(page_w, page_h);
    Ok((region, crop))
}

fn rasterize_stroke(region: &mut MaskRegion, stroke: &Stroke, page_w: u32, page_h: u32) {
    match stroke {
        Stroke::Rect(rect) => {
            let clamped = rect.clamp_to(page_w, page_h);
            if !clamped.is_empty() {
                region.fill_rect(&clamped);
            }
        }
        Stroke::Polyline { points, radius } => {
            let radius = radius.max(0.5);
            match points.as_slice() {
                [] => {}
                [p] => stamp_disc(region, p.0, p.1, radius, page_w, page_h),
                _ => {
                    for pair in points.windows(2) {
                        stamp_segment(region, pair[0], pair[1], radius, page_w, page_h);
                    }
                }
            }
        }
    }
}

/// Stamp discs along the segment at half-radius steps. The stepping is a
/// fixed function of the endpoints, so rasterization stays reproducible.
fn stamp_segment(
    region: &mut MaskRegion,
    from: (f32, f32),
    to: (f32, f32),
    radius: f32,
    page_w: u32,
    page_h: u32,
) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let len = (dx * dx + dy * dy).sqrt();
    let step = (radius * 0.5).max(0.25);
    let steps = (len / step).ceil() as u32;
    for i in 0..=steps {
        let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
        stamp_disc(
            region,
            from.0 + dx * t,
            from.1 + dy * t,
            radius,
            page_w,
            page_h,
        );
    }
}

fn stamp_disc(region: &mut MaskRegion, cx: f32, cy: f32, radius: f32, page_w: u32, page_h: u32) {
    if page_w == 0 || page_h == 0 {
        return;
    }
    let min_x = (cx - radius).floor().max(0.0) as u32;
    let min_y = (cy - radius).floor().max(0.0) as u32;
    let max_x = ((cx + radius).ceil() as i64).clamp(0, page_w as i64 - 1) as u32;
    let max_y = ((cy + radius).ceil() as i64).clamp(0, page_h as i64 - 1) as u32;
    let r_sq = radius * radius;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let ddx = x as f32 + 0.5 - cx;
            let ddy = y as f32 + 0.5 - cy;
            if ddx * ddx + ddy * ddy <= r_sq {
                region.set(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sources_fail() {
        let err = build_mask(100, 100, &[], &[], 10).unwrap_err();
        assert!(matches!(err, RetouchError::EmptyRegion));
    }

    #[test]
    fn off_page_box_fails() {
        let boxes = [Rect::new(500, 500, 10, 10)];
        let err = build_mask(100, 100, &boxes, &[], 10).unwrap_err();
        assert!(matches!(err, RetouchError::EmptyRegion));
    }

    #[test]
    fn single_point_polyline_stamps_disc() {
        let strokes = [Stroke::Polyline {
            points: vec![(50.0, 50.0)],
            radius: 4.0,
        }];
        let (region, crop) = build_mask(100, 100, &[], &strokes, 0).unwrap();
        assert!(region.is_set(50, 50));
        assert!(crop.contains_point(50, 50));
    }
}
