use rayon::prelude::*;

use crate::{
    composition::model::ImageSet,
    foundation::core::RasterImage,
    foundation::error::{MarkbatchError, MarkbatchResult},
};

/// Decode an encoded image (PNG, JPEG, ...) into a premultiplied RGBA8 [`RasterImage`].
pub fn decode_image(bytes: &[u8]) -> MarkbatchResult<RasterImage> {
    if bytes.is_empty() {
        return Err(MarkbatchError::decode("empty image buffer"));
    }
    let format = image::guess_format(bytes)
        .map_err(|e| MarkbatchError::decode(format!("unrecognized image format: {e}")))?;
    let dyn_img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| MarkbatchError::decode(format!("decode {format:?} image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    RasterImage::from_premul_rgba8(width, height, rgba8_premul)
        .map_err(|e| MarkbatchError::decode(e.to_string()))
}

/// Decode every buffer into an [`ImageSet`], preserving the supplied order.
///
/// Buffers are decoded in parallel; when several fail, the lowest index is reported.
#[tracing::instrument(skip(sources), fields(count = sources.len()))]
pub fn decode_image_set<B>(sources: &[B]) -> MarkbatchResult<ImageSet>
where
    B: AsRef<[u8]> + Sync,
{
    let decoded = sources
        .par_iter()
        .enumerate()
        .map(|(i, bytes)| {
            decode_image(bytes.as_ref()).map_err(|e| match e {
                MarkbatchError::Decode(msg) => MarkbatchError::decode(format!("image {i}: {msg}")),
                other => other,
            })
        })
        .collect::<Vec<_>>();

    let images = decoded.into_iter().collect::<MarkbatchResult<Vec<_>>>()?;
    Ok(ImageSet::new(images))
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
