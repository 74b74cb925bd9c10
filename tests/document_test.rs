use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use page_retouch::config::settings::Settings;
use page_retouch::document::DocumentController;
use page_retouch::error::RetouchError;
use page_retouch::geometry::Rect;
use page_retouch::ocr::{DetectedText, TextDetector};
use page_retouch::page::{PageId, Stroke, TextBox};

fn new_doc() -> DocumentController {
    DocumentController::new(Settings::default())
}

fn add_page(doc: &mut DocumentController, name: &str) -> PageId {
    doc.add_page(
        PathBuf::from(name),
        RgbaImage::from_pixel(80, 60, Rgba([128, 128, 128, 255])),
    )
}

#[test]
fn test_page_lifecycle_and_order() {
    let mut doc = new_doc();
    let a = add_page(&mut doc, "a.png");
    let b = add_page(&mut doc, "b.png");
    let c = add_page(&mut doc, "c.png");
    assert_eq!(doc.page_ids(), &[a, b, c]);

    doc.move_page(c, 0).unwrap();
    assert_eq!(doc.page_ids(), &[c, a, b]);

    doc.remove_page(a).unwrap();
    assert_eq!(doc.page_ids(), &[c, b]);
    assert!(matches!(
        doc.remove_page(a),
        Err(RetouchError::UnknownPage(_))
    ));
}

#[test]
fn test_duplicate_page_copies_state() {
    let mut doc = new_doc();
    let a = add_page(&mut doc, "a.png");
    let b = add_page(&mut doc, "b.png");
    doc.insert_text_box(a, TextBox::new(1.0, 2.0, 10.0, 5.0, "dup me"))
        .unwrap();
    doc.apply_strokes(a, vec![Stroke::Rect(Rect::new(3, 3, 4, 4))])
        .unwrap();

    let copy = doc.duplicate_page(a).unwrap();
    // The copy sits right after its source.
    assert_eq!(doc.page_ids(), &[a, copy, b]);

    let src = doc.page(a).unwrap();
    let dup = doc.page(copy).unwrap();
    assert_eq!(dup.text_boxes, src.text_boxes);
    assert_eq!(dup.strokes, src.strokes);
    // Fresh root version: editing the copy's background cannot touch the
    // source's chain.
    assert_ne!(dup.current_version, src.current_version);
    assert!(doc.versions().get(dup.current_version).unwrap().parent.is_none());
}

#[test]
fn test_active_index_tracks_removals() {
    let mut doc = new_doc();
    let _a = add_page(&mut doc, "a.png");
    let b = add_page(&mut doc, "b.png");
    doc.set_active_index(1).unwrap();
    doc.remove_page(b).unwrap();
    assert_eq!(doc.active_index(), 0);
    assert!(doc.set_active_index(5).is_err());
}

struct CannedDetector(Vec<DetectedText>);

impl TextDetector for CannedDetector {
    fn detect(&self, _image: &RgbaImage) -> page_retouch::error::Result<Vec<DetectedText>> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_ocr_import_creates_undoable_boxes() {
    let mut doc = new_doc();
    let page = add_page(&mut doc, "a.png");

    let detector = CannedDetector(vec![
        DetectedText {
            rect: Rect::new(10, 10, 30, 12),
            text: "hello".to_string(),
        },
        DetectedText {
            rect: Rect::new(10, 30, 40, 12),
            text: "world".to_string(),
        },
    ]);
    let image = doc
        .versions()
        .image_of(doc.page(page).unwrap().current_version)
        .unwrap()
        .clone();
    let detections = detector.detect(&image).unwrap();
    doc.import_ocr_results(page, detections).unwrap();

    let boxes = &doc.page(page).unwrap().text_boxes;
    assert_eq!(boxes.len(), 2);
    assert_eq!(boxes[0].text, "hello");
    assert_eq!(boxes[1].text, "world");

    // One entry for the whole import.
    assert!(doc.undo());
    assert!(doc.page(page).unwrap().text_boxes.is_empty());
}

#[test]
fn test_text_box_errors_leave_state_untouched() {
    let mut doc = new_doc();
    let page = add_page(&mut doc, "a.png");
    let missing = PageId(999);

    assert!(matches!(
        doc.insert_text_box(missing, TextBox::new(0.0, 0.0, 1.0, 1.0, "x")),
        Err(RetouchError::UnknownPage(_))
    ));
    assert!(matches!(
        doc.edit_text_box(page, 0, TextBox::new(0.0, 0.0, 1.0, 1.0, "x")),
        Err(RetouchError::DocumentError(_))
    ));
    assert!(matches!(
        doc.remove_text_box(page, 0),
        Err(RetouchError::DocumentError(_))
    ));
    // Nothing recorded by the failed intents.
    assert!(!doc.can_undo());
}

#[test]
fn test_dirty_flag_follows_history() {
    let mut doc = new_doc();
    let page = add_page(&mut doc, "a.png");
    assert!(!doc.is_dirty());

    doc.insert_text_box(page, TextBox::new(0.0, 0.0, 5.0, 5.0, "x"))
        .unwrap();
    assert!(doc.is_dirty());

    doc.mark_saved();
    assert!(!doc.is_dirty());

    doc.undo();
    assert!(doc.is_dirty(), "undo changes the document relative to the save");
}

#[test]
fn test_stroke_edit_round_trip() {
    let mut doc = new_doc();
    let page = add_page(&mut doc, "a.png");
    let first = vec![Stroke::Rect(Rect::new(1, 1, 5, 5))];
    let second = vec![
        Stroke::Rect(Rect::new(1, 1, 5, 5)),
        Stroke::Polyline {
            points: vec![(10.0, 10.0), (20.0, 20.0)],
            radius: 2.0,
        },
    ];

    doc.apply_strokes(page, first.clone()).unwrap();
    doc.apply_strokes(page, second.clone()).unwrap();
    assert_eq!(doc.page(page).unwrap().strokes, second);

    doc.undo();
    assert_eq!(doc.page(page).unwrap().strokes, first);
    doc.redo();
    assert_eq!(doc.page(page).unwrap().strokes, second);
}

#[test]
fn test_clear_history_drops_both_directions() {
    let mut doc = new_doc();
    let page = add_page(&mut doc, "a.png");
    doc.insert_text_box(page, TextBox::new(0.0, 0.0, 5.0, 5.0, "x"))
        .unwrap();
    doc.undo();

    doc.clear_history();
    assert!(!doc.can_undo());
    assert!(!doc.can_redo());
}
