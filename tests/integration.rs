use std::path::Path;

use image::{ColorType, DynamicImage, Rgba, RgbaImage};

use photo_watermark::{
    anchor_point, save_image, Anchor, Color, Engine, Error, FontResolver, OutputNaming, Position,
    TemplateRecord, TemplateStore, WatermarkConfig,
};

/// Rendering tests need at least one real font on the host. Skip them on
/// fontless CI machines instead of failing.
fn fonts_available() -> bool {
    FontResolver::new().has_fonts()
}

fn blue_source(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([0, 0, 200, 255]),
    ))
}

/// Bounding box of pixels that differ from the uniform background.
fn changed_bounds(image: &RgbaImage, background: Rgba<u8>) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if *pixel != background {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds
}

#[test]
fn layout_center_formula_holds() {
    for (img, text) in [
        ((500u32, 300u32), (120u32, 40u32)),
        ((101, 51), (20, 20)),
        ((1920, 1080), (333, 77)),
        ((10, 10), (50, 50)),
    ] {
        let (x, y) = anchor_point(Anchor::Center, img, text, 10);
        assert_eq!(x, (i64::from(img.0) - i64::from(text.0)).div_euclid(2));
        assert_eq!(y, (i64::from(img.1) - i64::from(text.1)).div_euclid(2));
    }
}

#[test]
fn codec_round_trip_for_valid_configs() {
    let configs = [
        WatermarkConfig::default().with_text("a"),
        WatermarkConfig::default()
            .with_text("测试水印")
            .with_font("Microsoft YaHei", 72, true, true)
            .with_color(Color::new(1, 2, 3))
            .with_opacity(0)
            .with_position(Position::Anchor(Anchor::BottomLeft))
            .with_rotation(359),
        WatermarkConfig::default()
            .with_position(Position::Offset { x: -20, y: 999 })
            .with_opacity(100),
    ];
    for config in configs {
        let record = TemplateRecord::from_config("t", &config);
        let json = serde_json::to_string(&record).unwrap();
        let decoded: TemplateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.to_config(), config);
    }
}

#[test]
fn opacity_clamping_bounds_alpha() {
    let high = WatermarkConfig::default().with_opacity(150);
    assert_eq!(high.opacity, 100);
    assert_eq!(high.alpha(), 255);

    let low = WatermarkConfig::default().with_opacity(-10);
    assert_eq!(low.opacity, 0);
    assert_eq!(low.alpha(), 0);
}

// Scenario A: centered, unrotated text on a 500x300 canvas.
#[test]
fn scenario_centered_text_keeps_canvas_and_alpha() {
    if !fonts_available() {
        return;
    }
    let engine = Engine::new();
    let config = WatermarkConfig::default()
        .with_text("测试水印")
        .with_font("SimHei", 36, false, false)
        .with_color(Color::white())
        .with_opacity(50);

    let out = engine.render(&blue_source(500, 300), &config).unwrap();
    assert_eq!(out.dimensions(), (500, 300));
}

#[test]
fn centered_ascii_text_lands_near_canvas_center() {
    if !fonts_available() {
        return;
    }
    let engine = Engine::new();
    let config = WatermarkConfig::default()
        .with_text("WATERMARK")
        .with_font("SimHei", 36, false, false)
        .with_opacity(100);

    let background = Rgba([0, 0, 200, 255]);
    let out = engine.render(&blue_source(500, 300), &config).unwrap();
    let (x0, y0, x1, y1) = changed_bounds(&out, background).expect("text left no visible pixels");

    let cx = f64::from(x0 + x1) / 2.0;
    let cy = f64::from(y0 + y1) / 2.0;
    assert!((cx - 250.0).abs() < 50.0, "ink centered at x={cx}");
    assert!((cy - 150.0).abs() < 50.0, "ink centered at y={cy}");
}

// Scenario B: rotation must never change the output dimensions.
#[test]
fn scenario_rotation_keeps_canvas_size() {
    if !fonts_available() {
        return;
    }
    let engine = Engine::new();
    let background = Rgba([0, 0, 200, 255]);

    for rotation in [90, 37, 180, -45, 720] {
        let config = WatermarkConfig::default()
            .with_text("WATERMARK")
            .with_font("SimHei", 36, false, false)
            .with_opacity(100)
            .with_rotation(rotation);

        let out = engine.render(&blue_source(500, 300), &config).unwrap();
        assert_eq!(out.dimensions(), (500, 300), "rotation {rotation} resized the canvas");
        if rotation % 360 != 0 {
            assert!(
                changed_bounds(&out, background).is_some(),
                "rotation {rotation} left no visible pixels"
            );
        }
    }
}

// Scenario C: empty text is a configuration error and writes nothing.
#[test]
fn scenario_empty_text_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("src.png");
    blue_source(50, 50).save(&source_path).unwrap();
    let dest = dir.path().join("out.png");

    let engine = Engine::new();
    let config = WatermarkConfig::default(); // text is empty
    let result = engine.render_path(&source_path, &config, Some(&dest));

    assert!(matches!(result, Err(Error::EmptyText)));
    assert!(!dest.exists(), "failed render must not write a file");
}

// Scenario D: JPEG output is flattened; PNG output keeps alpha.
#[test]
fn scenario_jpeg_flattens_and_png_keeps_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let mut img = RgbaImage::from_pixel(64, 48, Rgba([200, 100, 50, 255]));
    img.put_pixel(0, 0, Rgba([1, 2, 3, 77]));

    let jpg_path = dir.path().join("out.jpg");
    save_image(&img, &jpg_path).unwrap();
    let reloaded = image::open(&jpg_path).unwrap();
    assert_eq!(reloaded.color(), ColorType::Rgb8);
    assert_eq!(reloaded.width(), 64);
    assert_eq!(reloaded.height(), 48);

    let png_path = dir.path().join("out.png");
    save_image(&img, &png_path).unwrap();
    let reloaded = image::open(&png_path).unwrap();
    assert_eq!(reloaded.color(), ColorType::Rgba8);
    assert_eq!(reloaded.into_rgba8().get_pixel(0, 0)[3], 77);

    // Unknown extension defaults to PNG with alpha.
    let odd_path = dir.path().join("out.dat");
    save_image(&img, &odd_path).unwrap();
    let format = image::guess_format(&std::fs::read(&odd_path).unwrap()).unwrap();
    assert_eq!(format, image::ImageFormat::Png);
}

// Scenario E: explicit coordinates survive template persistence exactly.
#[test]
fn scenario_template_preserves_explicit_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();

    let config = WatermarkConfig::default()
        .with_text("tag")
        .with_position(Position::Offset { x: 37, y: 42 });
    store
        .save(&TemplateRecord::from_config("offset", &config))
        .unwrap();

    let loaded = store.load("offset").unwrap().to_config();
    assert_eq!(loaded.position, Position::Offset { x: 37, y: 42 });
    assert_eq!(loaded, config);
}

#[test]
fn batch_continues_past_failing_items() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("in");
    std::fs::create_dir(&input_dir).unwrap();

    blue_source(40, 40).save(input_dir.join("a.png")).unwrap();
    blue_source(60, 30).save(input_dir.join("b.png")).unwrap();
    // Not a real image; decoding fails but the batch must go on.
    std::fs::write(input_dir.join("broken.png"), b"not a png").unwrap();

    let engine = Engine::new();
    let config = WatermarkConfig::default().with_text("x");
    let inputs = photo_watermark::collect_images(&input_dir).unwrap();
    assert_eq!(inputs.len(), 3);

    let out_dir = dir.path().join("out");
    let results = engine.process_batch(
        &inputs,
        &out_dir,
        &OutputNaming::Suffix("_wm".to_string()),
        &config,
    );

    assert_eq!(results.len(), 3);
    let ok: Vec<_> = results.iter().filter(|r| r.success).collect();
    let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
    assert_eq!(ok.len(), 2);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with(Path::new("broken.png")));

    assert!(out_dir.join("a_wm.png").exists());
    assert!(out_dir.join("b_wm.png").exists());
    assert!(!out_dir.join("broken_wm.png").exists());
}

#[test]
fn render_path_returns_image_when_no_destination() {
    if !fonts_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("src.png");
    blue_source(80, 40).save(&source_path).unwrap();

    let engine = Engine::new();
    let config = WatermarkConfig::default().with_text("x");
    let rendered = engine.render_path(&source_path, &config, None).unwrap();
    let img = rendered.expect("no destination means an in-memory image");
    assert_eq!(img.dimensions(), (80, 40));
}

#[test]
fn missing_source_is_reported_per_item() {
    let engine = Engine::new();
    let config = WatermarkConfig::default().with_text("x");
    let result = engine.process_file(
        Path::new("no/such/file.png"),
        Path::new("unused.png"),
        &config,
    );
    assert!(!result.success);
    assert!(!result.message.is_empty());
}
