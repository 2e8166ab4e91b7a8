use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let buf = png_bytes(1, 1, vec![100u8, 50u8, 200u8, 128u8]);

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width(), 1);
    assert_eq!(decoded.height(), 1);
    assert_eq!(
        decoded.pixels(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn fully_transparent_pixels_zero_their_color() {
    let buf = png_bytes(1, 1, vec![90, 80, 70, 0]);
    assert_eq!(decode_image(&buf).unwrap().pixels(), &[0, 0, 0, 0]);
}

#[test]
fn garbage_and_truncated_bytes_are_decode_errors() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, MarkbatchError::Decode(_)), "{err}");

    let err = decode_image(&[]).unwrap_err();
    assert!(matches!(err, MarkbatchError::Decode(_)), "{err}");

    let buf = png_bytes(8, 8, vec![255; 8 * 8 * 4]);
    let err = decode_image(&buf[..buf.len() / 2]).unwrap_err();
    assert!(matches!(err, MarkbatchError::Decode(_)), "{err}");
}

#[test]
fn decode_set_preserves_order() {
    let sources = vec![
        png_bytes(3, 1, vec![255; 3 * 4]),
        png_bytes(1, 5, vec![255; 5 * 4]),
        png_bytes(2, 2, vec![255; 2 * 2 * 4]),
    ];
    let set = decode_image_set(&sources).unwrap();
    let dims: Vec<_> = set.iter().map(|img| img.dimensions()).collect();
    assert_eq!(dims, vec![(3, 1), (1, 5), (2, 2)]);
}

#[test]
fn decode_set_reports_lowest_failing_index() {
    let sources = vec![
        png_bytes(1, 1, vec![0, 0, 0, 255]),
        b"bad".to_vec(),
        b"also bad".to_vec(),
    ];
    let err = decode_image_set(&sources).unwrap_err();
    assert!(err.to_string().contains("image 1"), "{err}");
}
