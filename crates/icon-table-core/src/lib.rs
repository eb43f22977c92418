//! Core library for turning icon images into statically embeddable byte tables.
//!
//! - Codec: alpha extraction (`channel`) and a `(count, value)` run-length scheme (`rle`)
//! - Selection: `select_encoding` picks the smallest of raw PNG, alpha-only RLE and RGBA RLE
//! - Table: `ImageTable` of `ImageRecord`s keyed by name, emitted as a C++ header or JSON
//! - Consumer side: `decode_record` reverses any record to RGBA8
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use icon_table_core::{AlphaOnlyPolicy, BuildConfig, InputImage, build_table, to_cpp_header};
//! # fn main() -> anyhow::Result<()> {
//! let bug = ImageReader::open("bug.png")?.decode()?;
//! let inputs = vec![InputImage::new("bug.png", bug)];
//! let cfg = BuildConfig::builder()
//!     .resize(64, 64)
//!     .alpha_only(AlphaOnlyPolicy::All)
//!     .build();
//! let out = build_table(&inputs, &cfg)?;
//! std::fs::write("image_data.h", to_cpp_header(&out.table))?;
//! # Ok(()) }
//! ```

pub mod channel;
pub mod config;
pub mod decode;
pub mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod pipeline;
pub mod rle;
pub mod select;
pub mod table;
pub mod verify;

pub use channel::*;
pub use config::*;
pub use decode::*;
pub use error::*;
pub use export::*;
pub use import::*;
pub use model::*;
pub use pipeline::*;
pub use select::*;
pub use table::*;
pub use verify::*;

/// Convenience prelude for common types and functions.
/// Importing `icon_table_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        AlphaOnlyPolicy, BuildConfig, BuildConfigBuilder, EncodeOptions, ResizeFilter,
    };
    pub use crate::model::{
        BuildStats, EncodedImage, Encoding, EncodingKind, ImageRecord, PixelBuffer,
    };
    pub use crate::rle::{Run, RunLengthStream};
    pub use crate::table::ImageTable;
    pub use crate::{
        BuildOutput, InputImage, build_table, decode_named, decode_record, select_encoding,
        to_cpp_header, to_json,
    };
}
