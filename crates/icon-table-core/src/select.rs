use crate::channel::reduce_to_alpha;
use crate::config::EncodeOptions;
use crate::error::Result;
use crate::model::{EncodedImage, Encoding, PixelBuffer};
use crate::rle;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use tracing::trace;

/// Lossless general-purpose container used for the raw candidate.
pub trait ContainerCodec: Send + Sync {
    /// Encodes a validated RGBA buffer.
    fn encode(&self, pixels: &PixelBuffer) -> Result<Vec<u8>>;
}

/// PNG with best compression and adaptive filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngContainer;

impl ContainerCodec for PngContainer {
    fn encode(&self, pixels: &PixelBuffer) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
        encoder.write_image(
            &pixels.data,
            pixels.width,
            pixels.height,
            ExtendedColorType::Rgba8,
        )?;
        Ok(out)
    }
}

/// Picks the smallest encoding for `pixels` using the PNG container.
pub fn select_encoding(pixels: &PixelBuffer, options: &EncodeOptions) -> Result<EncodedImage> {
    select_encoding_with(pixels, options, &PngContainer, None)
}

/// Picks the smallest encoding for `pixels`.
///
/// Candidates are considered in the order raw container, alpha-only RLE, full
/// RLE; a later candidate only wins when strictly smaller. With
/// `force_raw_container` the container candidate is returned without computing
/// the others. `source` is the untouched source file, offered as an
/// alternative container payload when it is a PNG smaller than the re-encode.
pub fn select_encoding_with(
    pixels: &PixelBuffer,
    options: &EncodeOptions,
    codec: &dyn ContainerCodec,
    source: Option<&[u8]>,
) -> Result<EncodedImage> {
    options.validate()?;
    pixels.validate_rgba()?;

    if options.force_raw_container {
        return raw_candidate(pixels, codec, source);
    }

    let mut best: Option<EncodedImage> = None;
    for cand in candidates(pixels, options, codec, source)? {
        let smaller = match &best {
            Some(b) => cand.encoding.len() < b.encoding.len(),
            None => true,
        };
        if smaller {
            best = Some(cand);
        }
    }
    // full RLE is always computed, so there is at least one candidate
    best.ok_or_else(|| crate::error::IconTableError::Encode("no encoding candidates".into()))
}

/// Every candidate `options` permits, in preference order.
pub fn candidates(
    pixels: &PixelBuffer,
    options: &EncodeOptions,
    codec: &dyn ContainerCodec,
    source: Option<&[u8]>,
) -> Result<Vec<EncodedImage>> {
    pixels.validate_rgba()?;
    let mut out = Vec::with_capacity(3);

    if options.allow_raw_container {
        out.push(raw_candidate(pixels, codec, source)?);
    }

    if options.allow_alpha_only {
        let alpha = reduce_to_alpha(&pixels.data)?;
        let payload = rle::encode_to_bytes(&alpha);
        trace!(size = payload.len(), "alpha-only candidate");
        out.push(EncodedImage {
            width: pixels.width,
            height: pixels.height,
            encoding: Encoding::AlphaRle(payload),
            original_size: alpha.len(),
        });
    }

    let payload = rle::encode_to_bytes(&pixels.data);
    trace!(size = payload.len(), "full rgba candidate");
    out.push(EncodedImage {
        width: pixels.width,
        height: pixels.height,
        encoding: Encoding::FullRle(payload),
        original_size: pixels.data.len(),
    });

    Ok(out)
}

fn raw_candidate(
    pixels: &PixelBuffer,
    codec: &dyn ContainerCodec,
    source: Option<&[u8]>,
) -> Result<EncodedImage> {
    let mut payload = codec.encode(pixels)?;
    if let Some(src) = source.filter(|s| is_png(s)) {
        if src.len() < payload.len() {
            payload = src.to_vec();
        }
    }
    trace!(size = payload.len(), "raw container candidate");
    Ok(EncodedImage {
        width: pixels.width,
        height: pixels.height,
        encoding: Encoding::RawContainer(payload),
        original_size: pixels.rgba_len(),
    })
}

/// Consumers only decode PNG payloads, so other formats never stand in for
/// the re-encode.
fn is_png(bytes: &[u8]) -> bool {
    matches!(image::guess_format(bytes), Ok(ImageFormat::Png))
}
