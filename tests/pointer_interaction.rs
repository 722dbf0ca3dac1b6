use egui::{CursorIcon, Pos2};
use overlay_forge::geometry::ResizeHandle;
use overlay_forge::tools::{DragKind, PointerOutcome, SelectionState};
use overlay_forge::{Document, FontBook, FrameLayer, LayerId, PositionMode, SelectionTool, TextLayer};

fn frame(x: f32, y: f32, width: f32, height: f32) -> FrameLayer {
    FrameLayer {
        position_mode: PositionMode::Absolute,
        x,
        y,
        width,
        height,
        border_width: 2.0,
        ..Default::default()
    }
}

fn geometry(doc: &Document, id: LayerId) -> (f32, f32, f32, f32) {
    let f = doc.frame(id).unwrap();
    (f.x, f.y, f.width, f.height)
}

#[test]
fn test_handle_wins_over_body() {
    let mut doc = Document::new();
    let id = doc.add_frame(frame(100.0, 100.0, 200.0, 100.0));
    let fonts = FontBook::new();
    let mut tool = SelectionTool::new();

    // Inside the body and inside the north-west grab zone.
    let hit = tool.on_pointer_down(Pos2::new(105.0, 105.0), &doc, &fonts).unwrap();
    assert_eq!(hit.layer_id, id);
    assert_eq!(hit.handle, Some(ResizeHandle::Nw));
    assert_eq!(tool.cursor(), CursorIcon::ResizeNorthWest);
    match tool.state() {
        SelectionState::Dragging(session) => assert!(matches!(
            session.kind,
            DragKind::Resize {
                handle: ResizeHandle::Nw,
                ..
            }
        )),
        SelectionState::Idle => panic!("expected a drag session"),
    }
}

#[test]
fn test_resize_from_snapshot_and_minimum_size() {
    let mut doc = Document::new();
    let id = doc.add_frame(frame(100.0, 100.0, 200.0, 100.0));
    let fonts = FontBook::new();
    let mut tool = SelectionTool::new();

    tool.on_pointer_down(Pos2::new(300.0, 200.0), &doc, &fonts).unwrap();
    assert_eq!(tool.on_pointer_move(Pos2::new(350.0, 260.0), &mut doc), PointerOutcome::Resized);
    assert_eq!(geometry(&doc, id), (100.0, 100.0, 250.0, 160.0));

    // Width would drop to 5: rejected, geometry kept, session alive.
    assert_eq!(tool.on_pointer_move(Pos2::new(105.0, 260.0), &mut doc), PointerOutcome::Rejected);
    assert_eq!(geometry(&doc, id), (100.0, 100.0, 250.0, 160.0));
    assert!(tool.is_dragging());

    // Exactly the minimum is still rejected.
    assert_eq!(tool.on_pointer_move(Pos2::new(110.0, 260.0), &mut doc), PointerOutcome::Rejected);

    // Deltas are measured from the press point, not the previous move.
    assert_eq!(tool.on_pointer_move(Pos2::new(320.0, 220.0), &mut doc), PointerOutcome::Resized);
    assert_eq!(geometry(&doc, id), (100.0, 100.0, 220.0, 120.0));

    tool.on_pointer_up();
    assert_eq!(tool.state(), &SelectionState::Idle);
    assert_eq!(tool.cursor(), CursorIcon::Grab);
}

#[test]
fn test_edge_handles_move_one_side() {
    let mut doc = Document::new();
    let id = doc.add_frame(frame(100.0, 100.0, 200.0, 100.0));
    let fonts = FontBook::new();
    let mut tool = SelectionTool::new();

    let hit = tool.on_pointer_down(Pos2::new(200.0, 100.0), &doc, &fonts).unwrap();
    assert_eq!(hit.handle, Some(ResizeHandle::N));
    tool.on_pointer_move(Pos2::new(230.0, 80.0), &mut doc);
    assert_eq!(geometry(&doc, id), (100.0, 80.0, 200.0, 120.0));
    tool.on_pointer_up();

    let hit = tool.on_pointer_down(Pos2::new(100.0, 150.0), &doc, &fonts).unwrap();
    assert_eq!(hit.handle, Some(ResizeHandle::W));
    tool.on_pointer_move(Pos2::new(150.0, 150.0), &mut doc);
    assert_eq!(geometry(&doc, id), (150.0, 80.0, 150.0, 120.0));
}

#[test]
fn test_thick_border_widens_grab_zone() {
    let mut doc = Document::new();
    doc.add_frame(FrameLayer {
        border_width: 24.0,
        ..frame(100.0, 100.0, 200.0, 200.0)
    });
    let fonts = FontBook::new();
    let tool = SelectionTool::new();

    let hit = tool.hit_test(Pos2::new(200.0, 120.0), &doc, &fonts).unwrap();
    assert_eq!(hit.handle, Some(ResizeHandle::N));
}

#[test]
fn test_overlapping_frames_topmost_wins() {
    let mut doc = Document::new();
    let _bottom = doc.add_frame(frame(100.0, 100.0, 200.0, 100.0));
    let top = doc.add_frame(frame(100.0, 100.0, 200.0, 100.0));
    let fonts = FontBook::new();
    let mut tool = SelectionTool::new();

    let hit = tool.on_pointer_down(Pos2::new(300.0, 200.0), &doc, &fonts).unwrap();
    assert_eq!(hit.layer_id, top);
    assert_eq!(hit.handle, Some(ResizeHandle::Se));

    let body = tool.hit_test(Pos2::new(200.0, 150.0), &doc, &fonts).unwrap();
    assert_eq!(body.layer_id, top);
}

#[test]
fn test_upper_body_beats_lower_handle_zone() {
    let mut doc = Document::new();
    let lower = doc.add_frame(frame(100.0, 100.0, 200.0, 100.0));
    let fonts = FontBook::new();
    let mut tool = SelectionTool::new();

    // (300, 200) is the lower frame's south-east corner.
    let corner = Pos2::new(300.0, 200.0);
    let hit = tool.hit_test(corner, &doc, &fonts).unwrap();
    assert_eq!((hit.layer_id, hit.handle), (lower, Some(ResizeHandle::Se)));

    // An upper frame whose body covers that corner, 50 px away from its own edges.
    let upper = doc.add_frame(frame(250.0, 150.0, 200.0, 100.0));
    let hit = tool.on_pointer_down(corner, &doc, &fonts).unwrap();
    assert_eq!((hit.layer_id, hit.handle), (upper, None));
    match tool.state() {
        SelectionState::Dragging(session) => assert!(matches!(session.kind, DragKind::Move { .. })),
        SelectionState::Idle => panic!("expected a move session"),
    }

    tool.on_pointer_move(Pos2::new(310.0, 210.0), &mut doc);
    assert_eq!(geometry(&doc, upper), (260.0, 160.0, 200.0, 100.0));
    assert_eq!(geometry(&doc, lower), (100.0, 100.0, 200.0, 100.0));
}

#[test]
fn test_frames_take_precedence_over_text() {
    let mut doc = Document::new();
    let text = doc.add_text(TextLayer {
        position_mode: PositionMode::Absolute,
        text: "Overlay".to_owned(),
        x: 120.0,
        y: 160.0,
        font_size: 40.0,
        ..Default::default()
    });
    let fonts = FontBook::new();
    let tool = SelectionTool::new();
    assert_eq!(tool.hit_test(Pos2::new(140.0, 140.0), &doc, &fonts).map(|h| h.layer_id), Some(text));

    let frame_id = doc.add_frame(frame(100.0, 100.0, 200.0, 100.0));
    assert_eq!(tool.hit_test(Pos2::new(140.0, 140.0), &doc, &fonts).map(|h| h.layer_id), Some(frame_id));
}

#[test]
fn test_move_text_by_anchor() {
    let mut doc = Document::new();
    let id = doc.add_text(TextLayer {
        position_mode: PositionMode::Absolute,
        text: "Move me".to_owned(),
        x: 50.0,
        y: 100.0,
        font_size: 30.0,
        ..Default::default()
    });
    let fonts = FontBook::new();
    let mut tool = SelectionTool::new();

    let hit = tool.on_pointer_down(Pos2::new(60.0, 90.0), &doc, &fonts).unwrap();
    assert_eq!(hit.layer_id, id);
    assert_eq!(hit.handle, None);
    assert_eq!(tool.on_pointer_move(Pos2::new(160.0, 40.0), &mut doc), PointerOutcome::Moved);
    let text = doc.text(id).unwrap();
    assert_eq!((text.x, text.y), (150.0, 50.0));
    assert_eq!(text.font_size, 30.0);
}

#[test]
fn test_leave_ends_session() {
    let mut doc = Document::new();
    let id = doc.add_frame(frame(100.0, 100.0, 200.0, 100.0));
    let fonts = FontBook::new();
    let mut tool = SelectionTool::new();

    tool.on_pointer_down(Pos2::new(200.0, 150.0), &doc, &fonts).unwrap();
    tool.on_pointer_leave();
    assert!(!tool.is_dragging());

    // Later moves only update the hover cursor.
    assert_eq!(tool.on_pointer_move(Pos2::new(250.0, 180.0), &mut doc), PointerOutcome::Hover);
    assert_eq!(geometry(&doc, id), (100.0, 100.0, 200.0, 100.0));
    assert_eq!(tool.selected(), Some(id));
}
