use crate::error::{IconTableError, Result};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of interleaved channels the codec works on (R,G,B,A).
pub const RGBA_CHANNELS: u8 = 4;

/// Decoded pixels of one image, interleaved per pixel.
///
/// The codec only accepts 4-channel RGBA buffers; other channel counts are
/// representable so that callers can hand over whatever their loader produced
/// and get a typed error back instead of a silent misread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// RGBA buffer (`data.len()` should be `width * height * 4`).
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::new(width, height, RGBA_CHANNELS, data)
    }

    /// Converts any decoded image to RGBA8.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        Self::from(rgba)
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Length in bytes of the same image as RGBA8.
    pub fn rgba_len(&self) -> usize {
        self.pixel_count() * RGBA_CHANNELS as usize
    }

    /// Checks the buffer is a non-empty, well-formed RGBA image.
    pub fn validate_rgba(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(IconTableError::EmptyImage {
                width: self.width,
                height: self.height,
            });
        }
        if self.channels != RGBA_CHANNELS {
            return Err(IconTableError::UnsupportedChannelCount {
                channels: self.channels,
            });
        }
        if self.data.len() != self.rgba_len() {
            return Err(IconTableError::InvalidBufferLength {
                len: self.data.len(),
            });
        }
        Ok(())
    }

    /// Borrows the buffer as an `RgbaImage`; `None` when the buffer is not valid RGBA.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        if self.channels != RGBA_CHANNELS {
            return None;
        }
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }
}

/// Which of the three stored representations a record uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EncodingKind {
    /// Re-encoded general-purpose container (PNG).
    RawContainer,
    /// Run-length coded alpha channel, tinted white at decode time.
    AlphaRle,
    /// Run-length coded RGBA bytes.
    FullRle,
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EncodingKind::RawContainer => "raw_container",
            EncodingKind::AlphaRle => "alpha_rle",
            EncodingKind::FullRle => "full_rle",
        };
        f.write_str(s)
    }
}

/// Stored payload of an image, tagged by representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    RawContainer(Vec<u8>),
    AlphaRle(Vec<u8>),
    FullRle(Vec<u8>),
}

impl Encoding {
    pub fn kind(&self) -> EncodingKind {
        match self {
            Encoding::RawContainer(_) => EncodingKind::RawContainer,
            Encoding::AlphaRle(_) => EncodingKind::AlphaRle,
            Encoding::FullRle(_) => EncodingKind::FullRle,
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            Encoding::RawContainer(b) | Encoding::AlphaRle(b) | Encoding::FullRle(b) => b,
        }
    }

    pub fn into_payload(self) -> Vec<u8> {
        match self {
            Encoding::RawContainer(b) | Encoding::AlphaRle(b) | Encoding::FullRle(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.payload().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }
}

/// Output of the encoding selector for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub encoding: Encoding,
    /// Byte length the payload's decode path must reproduce.
    pub original_size: usize,
}

/// The persisted per-image unit of the generated table.
///
/// `is_raw_png` / `alpha_only` are a flat projection of [`Encoding`], kept in
/// this shape because it is what the generated header exposes to consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub is_raw_png: bool,
    pub alpha_only: bool,
    /// Length of `data`.
    pub size: usize,
    /// Length of the stream `data` decodes to.
    pub original_size: usize,
    pub data: Vec<u8>,
}

impl ImageRecord {
    pub fn from_encoded(name: impl Into<String>, encoded: EncodedImage) -> Self {
        let is_raw_png = matches!(encoded.encoding, Encoding::RawContainer(_));
        let alpha_only = matches!(encoded.encoding, Encoding::AlphaRle(_));
        let data = encoded.encoding.into_payload();
        Self {
            name: name.into(),
            width: encoded.width,
            height: encoded.height,
            is_raw_png,
            alpha_only,
            size: data.len(),
            original_size: encoded.original_size,
            data,
        }
    }

    /// Representation this record was stored with. `alpha_only` is ignored when `is_raw_png`.
    pub fn kind(&self) -> EncodingKind {
        if self.is_raw_png {
            EncodingKind::RawContainer
        } else if self.alpha_only {
            EncodingKind::AlphaRle
        } else {
            EncodingKind::FullRle
        }
    }

    /// Rebuilds the tagged representation from the stored flags.
    pub fn encoding(&self) -> Encoding {
        match self.kind() {
            EncodingKind::RawContainer => Encoding::RawContainer(self.data.clone()),
            EncodingKind::AlphaRle => Encoding::AlphaRle(self.data.clone()),
            EncodingKind::FullRle => Encoding::FullRle(self.data.clone()),
        }
    }

    /// Size of the image as decoded RGBA8.
    pub fn rgba_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * RGBA_CHANNELS as usize
    }
}

/// Aggregate numbers over a built table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BuildStats {
    /// Number of records in the table.
    pub num_images: usize,
    pub num_raw_container: usize,
    pub num_alpha_rle: usize,
    pub num_full_rle: usize,
    /// Sum of decoded RGBA8 sizes (`width * height * 4`).
    pub decoded_bytes: u64,
    /// Sum of stored payload sizes.
    pub stored_bytes: u64,
    /// Largest single payload.
    pub max_record_size: usize,
}

impl BuildStats {
    /// Bytes saved relative to storing every image as raw RGBA8.
    pub fn saved_bytes(&self) -> i64 {
        self.decoded_bytes as i64 - self.stored_bytes as i64
    }

    /// Saved bytes as a percentage of the decoded size (0.0 when empty).
    pub fn saved_percentage(&self) -> f64 {
        if self.decoded_bytes > 0 {
            self.saved_bytes() as f64 / self.decoded_bytes as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Images: {} (raw: {}, alpha: {}, rgba: {}), Decoded: {} B, Stored: {} B, Saved: {} B ({:.3}%)",
            self.num_images,
            self.num_raw_container,
            self.num_alpha_rle,
            self.num_full_rle,
            self.decoded_bytes,
            self.stored_bytes,
            self.saved_bytes(),
            self.saved_percentage(),
        )
    }
}
