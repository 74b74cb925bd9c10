use std::io::Cursor;
use std::path::PathBuf;

use image::{ImageFormat, Rgba, RgbaImage};
use page_retouch::config::settings::Settings;
use page_retouch::document::DocumentController;
use page_retouch::error::{InpaintFailure, RetouchError};
use page_retouch::geometry::Rect;
use page_retouch::inpaint::client::{InpaintBackend, InpaintOptions};
use page_retouch::page::{PageId, Stroke};

/// Fills the masked pixels with a solid color; dimensions in = out.
struct FillBackend {
    color: [u8; 4],
}

impl InpaintBackend for FillBackend {
    fn inpaint(
        &self,
        image_png: &[u8],
        mask_png: &[u8],
        _opts: &InpaintOptions,
    ) -> page_retouch::error::Result<Vec<u8>> {
        let img = image::load_from_memory(image_png).unwrap().to_rgba8();
        let mask = image::load_from_memory(mask_png).unwrap().to_luma8();
        assert_eq!(img.dimensions(), mask.dimensions(), "mask must be pixel-aligned");

        let mut out = img;
        for (x, y, px) in out.enumerate_pixels_mut() {
            if mask.get_pixel(x, y).0[0] > 0 {
                *px = Rgba(self.color);
            }
        }
        let mut buf = Vec::new();
        out.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        Ok(buf)
    }
}

/// Always fails, simulating an unreachable service.
struct FailBackend;

impl InpaintBackend for FailBackend {
    fn inpaint(
        &self,
        _image_png: &[u8],
        _mask_png: &[u8],
        _opts: &InpaintOptions,
    ) -> page_retouch::error::Result<Vec<u8>> {
        Err(RetouchError::Inpaint(InpaintFailure::ServiceUnavailable))
    }
}

/// Replies with an image of the wrong dimensions.
struct ShrunkenBackend;

impl InpaintBackend for ShrunkenBackend {
    fn inpaint(
        &self,
        _image_png: &[u8],
        _mask_png: &[u8],
        _opts: &InpaintOptions,
    ) -> page_retouch::error::Result<Vec<u8>> {
        let img = RgbaImage::new(3, 3);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        Ok(buf)
    }
}

fn settings_hard_edge() -> Settings {
    Settings {
        feather_sigma: 0.0,
        box_padding_px: 0,
        crop_padding_px: 8,
        ..Settings::default()
    }
}

fn doc_with_page(settings: Settings) -> (DocumentController, PageId) {
    let mut doc = DocumentController::new(settings);
    let image = RgbaImage::from_pixel(120, 90, Rgba([40, 40, 40, 255]));
    let id = doc.add_page(PathBuf::from("page.png"), image);
    (doc, id)
}

#[test]
fn test_regeneration_repairs_stroke_region() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(30, 30, 20, 10))])
        .unwrap();

    let backend = FillBackend {
        color: [255, 0, 0, 255],
    };
    doc.request_regeneration(page, &backend).unwrap();

    let state = doc.page(page).unwrap();
    assert!(state.strokes.is_empty(), "consumed strokes are cleared");

    let bg = doc
        .versions()
        .image_of(state.current_version)
        .unwrap();
    assert_eq!(bg.get_pixel(35, 35).0, [255, 0, 0, 255], "masked pixel repaired");
    assert_eq!(bg.get_pixel(5, 5).0, [40, 40, 40, 255], "outside the crop untouched");
}

#[test]
fn test_regeneration_undo_redo_swaps_versions() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    let strokes = vec![Stroke::Rect(Rect::new(10, 10, 10, 10))];
    doc.apply_strokes(page, strokes.clone()).unwrap();

    let root = doc.page(page).unwrap().current_version;
    let backend = FillBackend {
        color: [0, 255, 0, 255],
    };
    doc.request_regeneration(page, &backend).unwrap();
    let repaired = doc.page(page).unwrap().current_version;
    assert_ne!(root, repaired);

    assert!(doc.undo());
    let state = doc.page(page).unwrap();
    assert_eq!(state.current_version, root, "undo is a pointer swap");
    assert_eq!(state.strokes, strokes, "consumed strokes restored");

    assert!(doc.redo());
    let state = doc.page(page).unwrap();
    assert_eq!(state.current_version, repaired);
    assert!(state.strokes.is_empty());
}

#[test]
fn test_failed_regeneration_is_atomic() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(10, 10, 10, 10))])
        .unwrap();

    let version_before = doc.page(page).unwrap().current_version;
    let timeline_before = doc.timeline().len();
    let cursor_before = doc.timeline().cursor();

    let err = doc.request_regeneration(page, &FailBackend).unwrap_err();
    assert!(matches!(
        err,
        RetouchError::Inpaint(InpaintFailure::ServiceUnavailable)
    ));

    assert_eq!(doc.page(page).unwrap().current_version, version_before);
    assert_eq!(doc.timeline().len(), timeline_before);
    assert_eq!(doc.timeline().cursor(), cursor_before);
    assert!(!doc.regeneration_in_flight(page), "failure releases the slot");

    // The same intent is retryable.
    let backend = FillBackend {
        color: [1, 2, 3, 255],
    };
    doc.request_regeneration(page, &backend).unwrap();
}

#[test]
fn test_malformed_reply_is_atomic() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(10, 10, 10, 10))])
        .unwrap();

    let version_before = doc.page(page).unwrap().current_version;
    let err = doc.request_regeneration(page, &ShrunkenBackend).unwrap_err();
    assert!(matches!(
        err,
        RetouchError::Inpaint(InpaintFailure::MalformedResponse)
    ));
    assert_eq!(doc.page(page).unwrap().current_version, version_before);
}

#[test]
fn test_second_concurrent_regeneration_rejected() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(10, 10, 10, 10))])
        .unwrap();

    let _job = doc.begin_regeneration(page).unwrap();
    let err = doc.begin_regeneration(page).unwrap_err();
    assert!(matches!(err, RetouchError::RegenInFlight(p) if p == page));

    doc.abort_regeneration(page);
    assert!(doc.begin_regeneration(page).is_ok());
}

#[test]
fn test_commit_for_deleted_page_is_discarded() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(10, 10, 10, 10))])
        .unwrap();

    let job = doc.begin_regeneration(page).unwrap();
    let blended = job
        .run(&FillBackend {
            color: [9, 9, 9, 255],
        })
        .unwrap();

    doc.remove_page(page).unwrap();
    let timeline_before = doc.timeline().len();

    // Commit after deletion: tolerated, nothing recorded.
    doc.commit_regeneration(blended).unwrap();
    assert_eq!(doc.timeline().len(), timeline_before);
    assert!(doc.page(page).is_err());
}

#[test]
fn test_commit_with_stale_base_is_discarded() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(10, 10, 10, 10))])
        .unwrap();
    let backend = FillBackend {
        color: [200, 0, 0, 255],
    };
    doc.request_regeneration(page, &backend).unwrap();

    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(40, 40, 10, 10))])
        .unwrap();
    let job = doc.begin_regeneration(page).unwrap();
    let blended = job.run(&backend).unwrap();

    // An undo races the worker: the base version is no longer current.
    assert!(doc.undo()); // stroke edit
    assert!(doc.undo()); // regeneration
    let undone_version = doc.page(page).unwrap().current_version;

    doc.commit_regeneration(blended).unwrap();
    assert_eq!(
        doc.page(page).unwrap().current_version,
        undone_version,
        "stale result must be discarded"
    );
}

#[test]
fn test_empty_region_rejected_before_flight() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    let err = doc.begin_regeneration(page).unwrap_err();
    assert!(matches!(err, RetouchError::EmptyRegion));
    assert!(!doc.regeneration_in_flight(page));
}

#[test]
fn test_iterative_regeneration_builds_on_prior_version() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());

    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(10, 10, 10, 10))])
        .unwrap();
    doc.request_regeneration(
        page,
        &FillBackend {
            color: [255, 0, 0, 255],
        },
    )
    .unwrap();

    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(60, 60, 10, 10))])
        .unwrap();
    doc.request_regeneration(
        page,
        &FillBackend {
            color: [0, 0, 255, 255],
        },
    )
    .unwrap();

    // Second repair preserved the first one: regeneration reads the
    // current version, not the original.
    let bg = doc
        .versions()
        .image_of(doc.page(page).unwrap().current_version)
        .unwrap();
    assert_eq!(bg.get_pixel(15, 15).0, [255, 0, 0, 255]);
    assert_eq!(bg.get_pixel(65, 65).0, [0, 0, 255, 255]);

    // And the chain links back to the root.
    let current = doc.page(page).unwrap().current_version;
    let root = doc.versions().root_of(current);
    assert_ne!(current, root);
    assert!(doc.versions().get(current).unwrap().parent.is_some());
}

#[test]
fn test_restore_original_is_undoable() {
    let (mut doc, page) = doc_with_page(settings_hard_edge());
    doc.apply_strokes(page, vec![Stroke::Rect(Rect::new(10, 10, 10, 10))])
        .unwrap();
    let root = doc.page(page).unwrap().current_version;
    doc.request_regeneration(
        page,
        &FillBackend {
            color: [255, 255, 0, 255],
        },
    )
    .unwrap();
    let repaired = doc.page(page).unwrap().current_version;

    doc.restore_original(page).unwrap();
    assert_eq!(doc.page(page).unwrap().current_version, root);

    assert!(doc.undo());
    assert_eq!(doc.page(page).unwrap().current_version, repaired);
}
