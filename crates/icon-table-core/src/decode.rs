//! Consumer-side reversal of stored records.

use crate::channel::expand_alpha;
use crate::error::{IconTableError, Result};
use crate::model::{EncodingKind, ImageRecord, PixelBuffer};
use crate::rle;
use crate::table::ImageTable;
use image::RgbaImage;

/// Decodes a record to its RGBA8 pixels.
///
/// Raw-container payloads go through the image decoder and are normalized to
/// RGBA8; run-length payloads are decoded to exactly `original_size` bytes and,
/// when `alpha_only`, expanded with a white tint.
pub fn decode_record(record: &ImageRecord) -> Result<PixelBuffer> {
    let expected = record.rgba_len();
    let rgba = match record.kind() {
        EncodingKind::RawContainer => {
            let img = image::load_from_memory(&record.data[..record.size.min(record.data.len())])?;
            let img = img.to_rgba8();
            if img.dimensions() != (record.width, record.height) {
                return Err(IconTableError::Encode(format!(
                    "{}: container is {}x{}, record says {}x{}",
                    record.name,
                    img.width(),
                    img.height(),
                    record.width,
                    record.height
                )));
            }
            img.into_raw()
        }
        EncodingKind::AlphaRle => expand_alpha(&rle::decode(&record.data, record.original_size)?),
        EncodingKind::FullRle => rle::decode(&record.data, record.original_size)?,
    };
    if rgba.len() != expected {
        return Err(IconTableError::RunLengthMismatch {
            expected,
            actual: rgba.len(),
        });
    }
    Ok(PixelBuffer::from_rgba(record.width, record.height, rgba))
}

/// Decodes a record into an `RgbaImage`.
pub fn decode_to_image(record: &ImageRecord) -> Result<RgbaImage> {
    let px = decode_record(record)?;
    RgbaImage::from_raw(px.width, px.height, px.data).ok_or_else(|| {
        IconTableError::Encode(format!("{}: buffer does not match dimensions", record.name))
    })
}

/// Looks up `name` and decodes it.
pub fn decode_named(table: &ImageTable, name: &str) -> Result<PixelBuffer> {
    decode_record(table.lookup(name)?)
}
