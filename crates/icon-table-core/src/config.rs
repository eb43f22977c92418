use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Per-image switches for the encoding selector.
///   - `allow_alpha_only` opts the image into the alpha-only candidate (RGB is discarded)
///   - `allow_raw_container` lets the re-encoded PNG compete
///   - `force_raw_container` picks the PNG regardless of size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodeOptions {
    pub allow_alpha_only: bool,
    pub allow_raw_container: bool,
    pub force_raw_container: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            allow_alpha_only: false,
            allow_raw_container: true,
            force_raw_container: false,
        }
    }
}

impl EncodeOptions {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.force_raw_container && !self.allow_raw_container {
            return Err(crate::error::IconTableError::InvalidConfig(
                "force_raw_container requires allow_raw_container".into(),
            ));
        }
        Ok(())
    }
}

/// Which images may be stored as alpha-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlphaOnlyPolicy {
    /// Never drop colour.
    #[default]
    None,
    /// Every image is a tintable icon.
    All,
    /// Only the listed image names.
    Only(Vec<String>),
}

impl AlphaOnlyPolicy {
    pub fn allows(&self, name: &str) -> bool {
        match self {
            AlphaOnlyPolicy::None => false,
            AlphaOnlyPolicy::All => true,
            AlphaOnlyPolicy::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

impl FromStr for AlphaOnlyPolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "all" | "on" => Ok(Self::All),
            _ => Err(()),
        }
    }
}

/// Resampling filter used when resizing before encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "bilinear" => Ok(Self::Triangle),
            "catmullrom" | "cubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            _ => Err(()),
        }
    }
}

/// Parses `WxH` (e.g. `64x64`).
pub fn parse_size(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.trim().split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    /// Resize every image to exactly this size before encoding. None keeps source dimensions.
    #[serde(default)]
    pub resize: Option<(u32, u32)>,
    #[serde(default = "default_resize_filter")]
    pub resize_filter: ResizeFilter,

    /// Images allowed to drop RGB and store alpha only.
    #[serde(default)]
    pub alpha_only: AlphaOnlyPolicy,
    /// Let the re-encoded PNG compete with the run-length candidates.
    #[serde(default = "default_true")]
    pub allow_raw_container: bool,
    /// Store every image as PNG.
    #[serde(default)]
    pub force_raw_container: bool,
    /// When an image was not resized, let its original file bytes stand in for the PNG candidate if smaller.
    #[serde(default = "default_true")]
    pub use_source_bytes: bool,

    /// Encode images in parallel when feature "parallel" is on.
    #[serde(default)]
    pub parallel: bool,
    /// Worker count for parallel encoding. None uses rayon's global pool.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            resize: None,
            resize_filter: default_resize_filter(),
            alpha_only: AlphaOnlyPolicy::None,
            allow_raw_container: true,
            force_raw_container: false,
            use_source_bytes: true,
            parallel: false,
            threads: None,
        }
    }
}

impl BuildConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::IconTableError;

        if let Some((w, h)) = self.resize {
            if w == 0 || h == 0 {
                return Err(IconTableError::InvalidConfig(format!(
                    "resize target must be non-zero, got {}x{}",
                    w, h
                )));
            }
        }
        if self.threads == Some(0) {
            return Err(IconTableError::InvalidConfig(
                "threads must be at least 1".into(),
            ));
        }
        self.options_for("").validate()
    }

    /// Selector options for the image called `name`.
    pub fn options_for(&self, name: &str) -> EncodeOptions {
        EncodeOptions {
            allow_alpha_only: self.alpha_only.allows(name),
            allow_raw_container: self.allow_raw_container,
            force_raw_container: self.force_raw_container,
        }
    }
}

fn default_resize_filter() -> ResizeFilter {
    ResizeFilter::Lanczos3
}
fn default_true() -> bool {
    true
}

/// Builder for `BuildConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct BuildConfigBuilder {
    cfg: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: BuildConfig::default(),
        }
    }
    pub fn resize(mut self, w: u32, h: u32) -> Self {
        self.cfg.resize = Some((w, h));
        self
    }
    pub fn no_resize(mut self) -> Self {
        self.cfg.resize = None;
        self
    }
    pub fn resize_filter(mut self, v: ResizeFilter) -> Self {
        self.cfg.resize_filter = v;
        self
    }
    pub fn alpha_only(mut self, v: AlphaOnlyPolicy) -> Self {
        self.cfg.alpha_only = v;
        self
    }
    pub fn allow_raw_container(mut self, v: bool) -> Self {
        self.cfg.allow_raw_container = v;
        self
    }
    pub fn force_raw_container(mut self, v: bool) -> Self {
        self.cfg.force_raw_container = v;
        self
    }
    pub fn use_source_bytes(mut self, v: bool) -> Self {
        self.cfg.use_source_bytes = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn threads(mut self, v: Option<usize>) -> Self {
        self.cfg.threads = v;
        self
    }
    pub fn build(self) -> BuildConfig {
        self.cfg
    }
}

impl BuildConfig {
    /// Create a fluent builder for `BuildConfig`.
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_policy_allowlist() {
        let p = AlphaOnlyPolicy::Only(vec!["bug.png".into()]);
        assert!(p.allows("bug.png"));
        assert!(!p.allows("logo.png"));
        assert!(AlphaOnlyPolicy::All.allows("anything"));
        assert!(!AlphaOnlyPolicy::None.allows("anything"));
    }

    #[test]
    fn parse_size_accepts_both_cases() {
        assert_eq!(parse_size("64x32"), Some((64, 32)));
        assert_eq!(parse_size(" 16X16 "), Some((16, 16)));
        assert_eq!(parse_size("64"), None);
        assert_eq!(parse_size("ax4"), None);
    }

    #[test]
    fn validate_rejects_conflicts() {
        let cfg = BuildConfig::builder()
            .allow_raw_container(false)
            .force_raw_container(true)
            .build();
        assert!(cfg.validate().is_err());
        assert!(BuildConfig::builder().resize(0, 8).build().validate().is_err());
        assert!(BuildConfig::builder().threads(Some(0)).build().validate().is_err());
        assert!(BuildConfig::default().validate().is_ok());
    }

    #[test]
    fn yaml_style_deserialize_fills_defaults() {
        let cfg: BuildConfig =
            serde_json::from_str(r#"{"resize":[64,64],"alpha_only":{"only":["a.png"]}}"#).unwrap();
        assert_eq!(cfg.resize, Some((64, 64)));
        assert!(cfg.allow_raw_container);
        assert!(cfg.options_for("a.png").allow_alpha_only);
        assert!(!cfg.options_for("b.png").allow_alpha_only);
    }
}
