use crate::config::BuildConfig;
use crate::error::{IconTableError, Result};
use crate::model::{BuildStats, EncodedImage, PixelBuffer};
use crate::select::{PngContainer, select_encoding_with};
use crate::table::ImageTable;
use image::DynamicImage;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// In-memory image to encode (table name + decoded image + optional source file bytes).
pub struct InputImage {
    pub name: String,
    pub image: DynamicImage,
    /// Bytes of the file the image was decoded from, if any.
    pub source: Option<Vec<u8>>,
}

impl InputImage {
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            name: name.into(),
            image,
            source: None,
        }
    }

    pub fn with_source(mut self, bytes: Vec<u8>) -> Self {
        self.source = Some(bytes);
        self
    }
}

/// An image that could not be encoded; the rest of the build carried on.
#[derive(Debug)]
pub struct ImageFailure {
    pub name: String,
    pub error: IconTableError,
}

/// Output of a build: the finished table and any per-image failures.
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub table: ImageTable,
    pub failures: Vec<ImageFailure>,
}

impl BuildOutput {
    /// Delegates to `table.stats()`.
    pub fn stats(&self) -> BuildStats {
        self.table.stats()
    }
}

#[instrument(skip_all)]
/// Encodes every input and collects the records into a table.
///
/// Notes:
/// - Names are checked for duplicates before any encoding; a duplicate fails the whole build.
/// - An image that fails to encode is logged and reported in `failures`; others still build.
/// - With feature "parallel" and `cfg.parallel`, images are encoded on a rayon pool; the
///   table itself is only written from this thread, in input order.
pub fn build_table(inputs: &[InputImage], cfg: &BuildConfig) -> Result<BuildOutput> {
    cfg.validate()?;
    check_unique_names(inputs)?;

    let results = encode_all(inputs, cfg)?;

    let mut out = BuildOutput::default();
    for (input, res) in inputs.iter().zip(results) {
        match res {
            Ok(encoded) => {
                debug!(
                    name = %input.name,
                    kind = %encoded.encoding.kind(),
                    size = encoded.encoding.len(),
                    original_size = encoded.original_size,
                    "encoded image"
                );
                out.table.insert(input.name.clone(), encoded)?;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(name = %input.name, error = %e, "skip image");
                out.failures.push(ImageFailure {
                    name: input.name.clone(),
                    error: e,
                });
            }
        }
    }
    info!(
        images = out.table.len(),
        failed = out.failures.len(),
        "image table built"
    );
    Ok(out)
}

/// Runs the selector for one input (resizing first when configured).
pub fn encode_input(input: &InputImage, cfg: &BuildConfig) -> Result<EncodedImage> {
    let (pixels, resized) = prepare_pixels(&input.image, cfg);
    let source = if cfg.use_source_bytes && !resized {
        input.source.as_deref()
    } else {
        None
    };
    select_encoding_with(&pixels, &cfg.options_for(&input.name), &PngContainer, source)
}

/// RGBA pixels the selector will see for `image`, and whether a resize happened.
pub fn prepare_pixels(image: &DynamicImage, cfg: &BuildConfig) -> (PixelBuffer, bool) {
    match cfg.resize {
        Some((w, h)) if (w, h) != (image.width(), image.height()) => {
            let resized = image.resize_exact(w, h, cfg.resize_filter.filter_type());
            (PixelBuffer::from_image(&resized), true)
        }
        _ => (PixelBuffer::from_image(image), false),
    }
}

fn check_unique_names(inputs: &[InputImage]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(inputs.len());
    for inp in inputs {
        if !seen.insert(inp.name.as_str()) {
            return Err(IconTableError::DuplicateName(inp.name.clone()));
        }
    }
    Ok(())
}

fn encode_all(inputs: &[InputImage], cfg: &BuildConfig) -> Result<Vec<Result<EncodedImage>>> {
    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            return encode_parallel(inputs, cfg);
        }
    }
    Ok(inputs.iter().map(|inp| encode_input(inp, cfg)).collect())
}

#[cfg(feature = "parallel")]
fn encode_parallel(inputs: &[InputImage], cfg: &BuildConfig) -> Result<Vec<Result<EncodedImage>>> {
    let run = || {
        inputs
            .par_iter()
            .map(|inp| encode_input(inp, cfg))
            .collect::<Vec<_>>()
    };
    match cfg.threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| IconTableError::InvalidConfig(e.to_string()))?;
            Ok(pool.install(run))
        }
        None => Ok(run()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn prepare_skips_resize_at_target_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 4])));
        let cfg = BuildConfig::builder().resize(4, 4).build();
        let (px, resized) = prepare_pixels(&img, &cfg);
        assert!(!resized);
        assert_eq!(px.data.len(), 64);

        let cfg = BuildConfig::builder().resize(2, 2).build();
        let (px, resized) = prepare_pixels(&img, &cfg);
        assert!(resized);
        assert_eq!((px.width, px.height), (2, 2));
    }

    #[test]
    fn source_bytes_ignored_after_resize() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([9, 9, 9, 9])));
        let signature = b"\x89PNG\r\n\x1a\n".to_vec();
        let input = InputImage::new("a.png", img).with_source(signature.clone());
        let cfg = BuildConfig::builder()
            .resize(4, 4)
            .force_raw_container(true)
            .build();
        let enc = encode_input(&input, &cfg).unwrap();
        assert_ne!(enc.encoding.payload(), &signature[..]);

        let cfg = BuildConfig::builder().force_raw_container(true).build();
        let enc = encode_input(&input, &cfg).unwrap();
        assert_eq!(enc.encoding.payload(), &signature[..]);
    }
}
