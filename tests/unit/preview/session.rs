use super::*;
use crate::{
    encode::archive::ZipArchiveWriter, export::sink::MemorySink,
    preview::controller::PreviewSlot,
};

fn base() -> RasterImage {
    RasterImage::solid(10, 10, [0, 0, 0, 255]).unwrap()
}

fn mark() -> RasterImage {
    RasterImage::solid(2, 2, [255, 255, 255, 255]).unwrap()
}

#[test]
fn preview_waits_for_both_inputs() {
    let mut s = WatermarkSession::new(PreviewSlot::new());
    assert!(matches!(
        s.set_images(ImageSet::new(vec![base()])).unwrap(),
        PreviewOutcome::Skipped
    ));
    let out = s.set_watermark(mark()).unwrap();
    let frame = out.published().unwrap();
    assert_eq!(frame.pixel(5, 5), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn parameter_changes_move_the_preview() {
    let mut s = WatermarkSession::new(PreviewSlot::new());
    s.set_images(ImageSet::new(vec![base()])).unwrap();
    s.set_watermark(mark()).unwrap();

    let out = s.set_position_x(0.1).unwrap();
    // Center at x=1: rect x 0..2.
    let frame = out.published().unwrap();
    assert_eq!(frame.pixel(0, 5), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(5, 5), Some([0, 0, 0, 255]));

    let out = s.set_scale(0.0).unwrap();
    assert_eq!(out.published().unwrap().pixels(), base().pixels());
    assert_eq!(s.preview().with_display(|d| d.presents()).unwrap(), 3);
}

#[test]
fn invalid_parameters_are_rejected_without_change() {
    let mut s = WatermarkSession::new(PreviewSlot::new());
    let before = s.params();
    let err = s.set_position_y(1.5).unwrap_err();
    assert!(matches!(err, MarkbatchError::Validation(_)), "{err}");
    let err = s.set_scale(-1.0).unwrap_err();
    assert!(matches!(err, MarkbatchError::Validation(_)), "{err}");
    assert_eq!(s.params(), before);
}

#[test]
fn export_uses_current_state() {
    let mut s = WatermarkSession::new(PreviewSlot::new());
    s.set_images(ImageSet::new(vec![base(), base()])).unwrap();
    let mut sink = MemorySink::new();
    let err = s
        .export(
            &BatchExporter::default(),
            ZipArchiveWriter::new(),
            &mut sink,
            &mut |_p: u8| {},
        )
        .unwrap_err();
    assert!(err.is_export(), "{err}");

    s.set_watermark(mark()).unwrap();
    let report = s
        .export(
            &BatchExporter::default(),
            ZipArchiveWriter::new(),
            &mut sink,
            &mut |_p: u8| {},
        )
        .unwrap();
    assert_eq!(report.entries.len(), 2);
    assert_eq!(sink.deliveries().len(), 1);
}
