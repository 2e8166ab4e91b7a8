use super::*;

#[test]
fn centered_watermark_at_natural_size() {
    let r = place(100, 100, 20, 20, 0.5, 0.5, 1.0);
    assert_eq!(
        r,
        DrawRect {
            x: 40,
            y: 40,
            width: 20,
            height: 20
        }
    );
}

#[test]
fn placement_is_deterministic() {
    let inputs = [
        (640, 480, 33, 17, 0.13, 0.87, 1.37),
        (1, 1, 1, 1, 0.0, 1.0, 0.01),
        (4000, 3000, 512, 128, 0.99, 0.01, 2.0),
    ];
    for (cw, ch, ww, wh, x, y, s) in inputs {
        assert_eq!(place(cw, ch, ww, wh, x, y, s), place(cw, ch, ww, wh, x, y, s));
    }
}

#[test]
fn zero_scale_is_empty_without_error() {
    let r = place(100, 80, 20, 30, 0.3, 0.7, 0.0);
    assert_eq!((r.width, r.height), (0, 0));
    assert!(r.is_empty());
    assert_eq!((r.x, r.y), (30, 56));
}

#[test]
fn position_is_relative_to_canvas_not_watermark() {
    // 50x200 canvas, 20x20 watermark: center lands at (25, 100).
    let r = place(50, 200, 20, 20, 0.5, 0.5, 1.0);
    assert_eq!((r.x, r.y, r.width, r.height), (15, 90, 20, 20));
}

#[test]
fn scale_multiplies_natural_size() {
    let r = place(300, 300, 20, 10, 0.5, 0.5, 2.0);
    assert_eq!((r.x, r.y, r.width, r.height), (130, 140, 40, 20));

    let r = place(300, 300, 20, 10, 0.5, 0.5, 0.5);
    assert_eq!((r.x, r.y, r.width, r.height), (145, 148, 10, 5));
}

#[test]
fn corners_extend_off_canvas_without_clamping() {
    let r = place(100, 100, 60, 40, 0.0, 0.0, 1.0);
    assert_eq!((r.x, r.y), (-30, -20));

    let r = place(100, 100, 60, 40, 1.0, 1.0, 1.0);
    assert_eq!((r.x, r.y), (70, 80));
}

#[test]
fn negative_or_nan_scale_behaves_like_zero() {
    assert!(place(10, 10, 4, 4, 0.5, 0.5, -1.0).is_empty());
    assert!(place(10, 10, 4, 4, 0.5, 0.5, f32::NAN).is_empty());
}

#[test]
fn exact_rect_matches_formula() {
    let r = placement_rect(100, 50, 10, 4, 0.25, 0.5, 1.5);
    assert!((r.x0 - (25.0 - 7.5)).abs() < 1e-9);
    assert!((r.y0 - (25.0 - 3.0)).abs() < 1e-9);
    assert!((r.width() - 15.0).abs() < 1e-9);
    assert!((r.height() - 6.0).abs() < 1e-9);
}

#[test]
fn snapped_rect_keeps_far_edge_past_the_canvas_for_huge_scales() {
    let r = snapped_rect(10, 10, 1000, 1000, 0.5, 0.5, 1e7);
    assert!(r.x0 < 0.0 && r.x1 > 10.0);
    assert!(r.y0 < 0.0 && r.y1 > 10.0);
    // The integer form saturates its size.
    assert_eq!(place(10, 10, 1000, 1000, 0.5, 0.5, 1e7).width, u32::MAX);
}

#[test]
fn snapped_rect_matches_place_for_ordinary_inputs() {
    let r = snapped_rect(300, 300, 20, 10, 0.3, 0.6, 1.5);
    let d = place(300, 300, 20, 10, 0.3, 0.6, 1.5);
    assert_eq!((r.x0 as i64, r.y0 as i64), (d.x, d.y));
    assert_eq!((r.width() as u32, r.height() as u32), (d.width, d.height));
}
