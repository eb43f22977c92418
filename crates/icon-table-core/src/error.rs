use thiserror::Error;

#[derive(Debug, Error)]
pub enum IconTableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Buffer length {len} is not a whole number of RGBA pixels")]
    InvalidBufferLength { len: usize },
    #[error("Image has zero area: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
    #[error("Unsupported channel count {channels} (expected 4-channel RGBA)")]
    UnsupportedChannelCount { channels: u8 },
    #[error("Duplicate image name: {0}")]
    DuplicateName(String),
    #[error("Run-length data decodes to {actual} bytes, expected {expected}")]
    RunLengthMismatch { expected: usize, actual: usize },
    #[error("Unknown image: {0}")]
    UnknownImage(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl IconTableError {
    /// True for errors that invalidate the whole build rather than a single image.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IconTableError::DuplicateName(_) | IconTableError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IconTableError>;
