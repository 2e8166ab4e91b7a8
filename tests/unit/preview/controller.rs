use super::*;
use crate::composition::model::WatermarkParams;

fn images() -> ImageSet {
    ImageSet::new(vec![
        RasterImage::solid(20, 10, [0, 0, 255, 255]).unwrap(),
        RasterImage::solid(5, 5, [0, 255, 0, 255]).unwrap(),
    ])
}

fn watermark(scale: f32) -> WatermarkSpec {
    WatermarkSpec::new(
        RasterImage::solid(4, 4, [255, 0, 0, 255]).unwrap(),
        WatermarkParams {
            scale,
            ..Default::default()
        },
    )
}

#[test]
fn skipped_without_images_or_watermark() {
    let ctl = PreviewController::new(PreviewSlot::new());
    let wm = watermark(1.0);
    assert!(matches!(
        ctl.refresh_preview(&ImageSet::default(), Some(&wm)).unwrap(),
        PreviewOutcome::Skipped
    ));
    assert!(matches!(
        ctl.refresh_preview(&images(), None).unwrap(),
        PreviewOutcome::Skipped
    ));
    assert_eq!(ctl.with_display(|d| d.presents()).unwrap(), 0);
}

#[test]
fn publishes_composite_of_first_image() {
    let ctl = PreviewController::new(PreviewSlot::new());
    let out = ctl.refresh_preview(&images(), Some(&watermark(1.0))).unwrap();
    let frame = out.published().unwrap().clone();
    assert_eq!(frame.dimensions(), (20, 10));
    // 4x4 watermark centered on 20x10 covers x 8..12, y 3..7.
    assert_eq!(frame.pixel(10, 5), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 255, 255]));
    let shown = ctl.with_display(|d| d.current().cloned()).unwrap().unwrap();
    assert!(Arc::ptr_eq(&shown, &frame));
}

#[test]
fn stale_ticket_never_replaces_newer_frame() {
    let ctl = PreviewController::new(PreviewSlot::new());
    let imgs = images();
    let slow = ctl.begin();
    let fast = ctl.begin();
    assert!(!ctl.is_current(slow));

    let newer = ctl.render(fast, &imgs, Some(&watermark(2.0))).unwrap();
    assert!(newer.published().is_some());

    let stale = composite(imgs.first().unwrap(), &watermark(0.5)).unwrap();
    let outcome = ctl.publish(slow, Arc::new(stale)).unwrap();
    assert!(matches!(outcome, PreviewOutcome::Superseded));

    let shown = ctl.with_display(|d| d.current().cloned()).unwrap().unwrap();
    assert!(Arc::ptr_eq(&shown, newer.published().unwrap()));
    assert_eq!(ctl.shown().unwrap(), Some(fast));
    assert_eq!(ctl.with_display(|d| d.presents()).unwrap(), 1);
}

#[test]
fn superseded_before_rendering_does_no_work() {
    let ctl = PreviewController::new(PreviewSlot::new());
    let old = ctl.begin();
    let _new = ctl.begin();
    let outcome = ctl.render(old, &images(), Some(&watermark(1.0))).unwrap();
    assert!(matches!(outcome, PreviewOutcome::Superseded));
    assert_eq!(ctl.with_display(|d| d.presents()).unwrap(), 0);
}

#[test]
fn invalid_params_fail_like_export_and_keep_the_frame() {
    let ctl = PreviewController::new(PreviewSlot::new());
    let shown = ctl
        .refresh_preview(&images(), Some(&watermark(1.0)))
        .unwrap()
        .published()
        .unwrap()
        .clone();

    for position_x in [2.0, 1e30, f32::NAN] {
        let mut bad = watermark(1.0);
        bad.params.position_x = position_x;
        let err = ctl.refresh_preview(&images(), Some(&bad)).unwrap_err();
        assert!(matches!(err, MarkbatchError::Validation(_)), "{err}");
    }

    let current = ctl.with_display(|d| d.current().cloned()).unwrap().unwrap();
    assert!(Arc::ptr_eq(&current, &shown));
    assert_eq!(ctl.with_display(|d| d.presents()).unwrap(), 1);
}

#[test]
fn identical_inputs_give_identical_previews() {
    let ctl = PreviewController::new(PreviewSlot::new());
    let wm = watermark(1.5);
    let a = ctl.refresh_preview(&images(), Some(&wm)).unwrap();
    let b = ctl.refresh_preview(&images(), Some(&wm)).unwrap();
    assert_eq!(
        a.published().unwrap().pixels(),
        b.published().unwrap().pixels()
    );
}

#[test]
fn clear_supersedes_in_flight_work() {
    let ctl = PreviewController::new(PreviewSlot::new());
    ctl.refresh_preview(&images(), Some(&watermark(1.0))).unwrap();
    let in_flight = ctl.begin();
    ctl.clear().unwrap();
    assert!(ctl.with_display(|d| d.current().is_none()).unwrap());
    let frame = Arc::new(RasterImage::solid(2, 2, [0, 0, 0, 255]).unwrap());
    assert!(matches!(
        ctl.publish(in_flight, frame).unwrap(),
        PreviewOutcome::Superseded
    ));
}

#[test]
fn png_file_display_writes_fitted_preview() {
    let dir = std::env::temp_dir().join(format!(
        "markbatch_preview_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let path = dir.join("preview.png");
    let mut display = PngFileDisplay::new(&path).fit_within(10, 10);
    let frame = Arc::new(RasterImage::solid(40, 20, [0, 0, 0, 255]).unwrap());
    display.present(frame).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (10, 5));

    display.clear().unwrap();
    assert!(!path.exists());
    display.clear().unwrap();
    let _ = std::fs::remove_dir_all(&dir);
}
