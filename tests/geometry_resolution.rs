use egui::{Color32, Pos2, Vec2};
use overlay_forge::geometry::{materialize_relative, resolve_absolute, sync_relative_from_absolute};
use overlay_forge::{Document, FrameLayer, LogoAsset, LogoLayer, PositionMode, TextLayer};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn frame_50_50_300_200() -> FrameLayer {
    FrameLayer {
        position_mode: PositionMode::Relative,
        x: 50.0,
        y: 50.0,
        width: 300.0,
        height: 200.0,
        border_width: 5.0,
        ..Default::default()
    }
}

#[test]
fn test_frame_follows_image_size() {
    let mut doc = Document::new();
    let id = doc.add_frame(frame_50_50_300_200());

    assert!(sync_relative_from_absolute(&mut doc, Vec2::new(1000.0, 1000.0)));
    let frame = doc.frame(id).unwrap();
    assert!(approx(frame.rel_x, 5.0));
    assert!(approx(frame.rel_y, 5.0));
    assert!(approx(frame.rel_width, 30.0));
    assert!(approx(frame.rel_height, 20.0));

    let resolved = resolve_absolute(&doc, Vec2::new(2000.0, 500.0));
    let rect = resolved.frames[0].rect;
    assert!(approx(rect.min.x, 100.0));
    assert!(approx(rect.min.y, 25.0));
    assert!(approx(rect.width(), 600.0));
    assert!(approx(rect.height(), 100.0));
    assert!(approx(resolved.frames[0].border_width, 10.0));
}

#[test]
fn test_absolute_layers_ignore_image_size() {
    let mut doc = Document::new();
    doc.add_frame(FrameLayer {
        position_mode: PositionMode::Absolute,
        ..frame_50_50_300_200()
    });
    doc.add_text(TextLayer {
        position_mode: PositionMode::Absolute,
        ..Default::default()
    });

    let small = resolve_absolute(&doc, Vec2::new(400.0, 300.0));
    let large = resolve_absolute(&doc, Vec2::new(4000.0, 3000.0));
    assert_eq!(small, large);
    assert_eq!(small.texts[0].anchor, Pos2::new(100.0, 100.0));
    assert_eq!(small.texts[0].font_size, 48.0);
}

#[test]
fn test_resolution_is_deterministic() {
    let mut doc = Document::new();
    doc.add_frame(frame_50_50_300_200());
    doc.add_text(TextLayer::default());
    let reference = Vec2::new(1234.0, 567.0);

    assert_eq!(resolve_absolute(&doc, reference), resolve_absolute(&doc, reference));
}

#[test]
fn test_sync_round_trip() {
    let mut doc = Document::new();
    let id = doc.add_frame(frame_50_50_300_200());
    let text_id = doc.add_text(TextLayer {
        x: 321.0,
        y: 123.0,
        font_size: 30.0,
        ..Default::default()
    });
    let reference = Vec2::new(1600.0, 900.0);

    sync_relative_from_absolute(&mut doc, reference);
    let resolved = resolve_absolute(&doc, reference);
    let rect = resolved.frames[0].rect;
    let frame = doc.frame(id).unwrap();
    assert!(approx(rect.min.x, frame.x) && approx(rect.min.y, frame.y));
    assert!(approx(rect.width(), frame.width) && approx(rect.height(), frame.height));

    let text = &resolved.texts[0];
    assert_eq!(text.id, text_id);
    assert!(approx(text.anchor.x, 321.0) && approx(text.anchor.y, 123.0));
    assert!(approx(text.font_size, 30.0));
}

#[test]
fn test_logo_keeps_aspect_ratio() {
    let asset = LogoAsset::new(image::RgbaImage::new(200, 100), vec![0u8; 4]);
    let mut doc = Document::new();
    doc.add_logo(LogoLayer::new(asset));

    let resolved = resolve_absolute(&doc, Vec2::new(1000.0, 800.0));
    let rect = resolved.logos[0].rect;
    // 15% of 1000 wide, half as tall.
    assert!(approx(rect.width(), 150.0));
    assert!(approx(rect.height(), 75.0));
    assert!(approx(rect.min.x, 50.0));
    assert!(approx(rect.min.y, 40.0));
}

#[test]
fn test_empty_reference_is_skipped() {
    let mut doc = Document::new();
    let id = doc.add_frame(frame_50_50_300_200());
    let before = doc.clone();

    assert!(!sync_relative_from_absolute(&mut doc, Vec2::ZERO));
    assert!(!materialize_relative(&mut doc, Vec2::new(0.0, 100.0)));
    assert_eq!(doc, before);
    assert_eq!(doc.frame(id).unwrap().border_color, Color32::BLACK);
}
