//! Logo settings and the size bound that ties them to the symbol size.
//!
//! A logo's edge length may never exceed `min(120, size / 2)` where `size`
//! is the current symbol size. The bound moves with the style, so it is
//! enforced twice: [`LogoSpec::clamp_to`] lowers the stored size whenever the
//! symbol shrinks, and [`LogoSpec::effective_size`] re-applies it whenever the
//! size is read.

mod compositor;
mod decode;

pub use compositor::LogoCompositor;
pub use decode::decode_logo;

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content::{FileUpload, InlineBlob};
use crate::style::StyleConfig;

/// Smallest logo edge in pixels.
pub const LOGO_MIN_SIZE: u32 = 20;
/// Absolute cap on the logo edge, independent of symbol size.
pub const LOGO_MAX_SIZE: u32 = 120;
/// Logo edge used when a logo is first added.
pub const LOGO_DEFAULT_SIZE: u32 = 60;
/// Background-colored margin painted around the logo.
pub const LOGO_PADDING: u32 = 4;

/// Largest logo edge allowed for a symbol of `symbol_size` pixels.
pub fn max_logo_size(symbol_size: u32) -> u32 {
    LOGO_MAX_SIZE.min(symbol_size / 2)
}

// ============================================================================
// LogoShape
// ============================================================================

/// Aperture the logo is masked into. Also selects the shape of the padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum LogoShape {
    /// Rounded rectangle.
    Square,
    #[default]
    Circle,
}

impl FromStr for LogoShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square" => Ok(Self::Square),
            "circle" => Ok(Self::Circle),
            other => Err(format!("unknown logo shape {other:?}")),
        }
    }
}

// ============================================================================
// LogoSource
// ============================================================================

/// Where the logo image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogoSource {
    /// An inline `data:` blob, usually from an upload.
    Inline(String),
    /// A remote URL. Kept for the settings but never fetched.
    Url(String),
}

impl LogoSource {
    /// Embeds an uploaded image as an inline blob.
    pub fn from_upload(upload: &FileUpload) -> Self {
        Self::Inline(InlineBlob::encode(&upload.mime(), &upload.bytes))
    }

    /// Interprets a typed string; `data:` blobs stay inline, anything else is a URL.
    pub fn parse(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.starts_with("data:") {
            Self::Inline(value)
        } else {
            Self::Url(value)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(data) | Self::Url(data) => data,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// Short description of the origin, for listings.
    pub fn origin_label(&self) -> &'static str {
        match self {
            Self::Inline(_) => "From your device",
            Self::Url(_) => "From URL",
        }
    }
}

// ============================================================================
// LogoSpec
// ============================================================================

/// A logo placed at the center of the symbol.
///
/// The image source is shared, so render requests built from this spec refer
/// to the same data instead of copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoSpec {
    source: Arc<LogoSource>,
    shape: LogoShape,
    size_px: u32,
}

impl LogoSpec {
    /// Creates a spec with the default shape and size, clamped for `style`.
    pub fn new(source: LogoSource, style: &StyleConfig) -> Self {
        let mut spec = Self {
            source: Arc::new(source),
            shape: LogoShape::default(),
            size_px: LOGO_DEFAULT_SIZE,
        };
        spec.clamp_to(style);
        spec
    }

    pub fn source(&self) -> &Arc<LogoSource> {
        &self.source
    }

    pub fn shape(&self) -> LogoShape {
        self.shape
    }

    /// The stored size. Use [`effective_size`](Self::effective_size) for rendering.
    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    pub fn set_source(&mut self, source: LogoSource) {
        self.source = Arc::new(source);
    }

    pub fn set_shape(&mut self, shape: LogoShape) {
        self.shape = shape;
    }

    pub fn with_shape(mut self, shape: LogoShape) -> Self {
        self.shape = shape;
        self
    }

    /// Sets the size, clamped to `[LOGO_MIN_SIZE, max_logo_size(style.size())]`.
    pub fn set_size_px(&mut self, size: i64, style: &StyleConfig) {
        let max = max_logo_size(style.size()).max(LOGO_MIN_SIZE);
        self.size_px = size.clamp(LOGO_MIN_SIZE as i64, max as i64) as u32;
    }

    /// Lowers the stored size if it exceeds the bound for `style`.
    ///
    /// Never raises it. Returns true if the size changed.
    pub fn clamp_to(&mut self, style: &StyleConfig) -> bool {
        let max = max_logo_size(style.size());
        if self.size_px > max {
            self.size_px = max;
            true
        } else {
            false
        }
    }

    /// The size to render at, with the bound for `style` applied.
    pub fn effective_size(&self, style: &StyleConfig) -> u32 {
        self.size_px.min(max_logo_size(style.size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(size: i64) -> StyleConfig {
        StyleConfig::new().with_size(size)
    }

    #[test]
    fn bound_is_half_size_capped_at_120() {
        assert_eq!(max_logo_size(120), 60);
        assert_eq!(max_logo_size(240), 120);
        assert_eq!(max_logo_size(250), 120);
        assert_eq!(max_logo_size(400), 120);
        assert_eq!(max_logo_size(155), 77);
    }

    #[test]
    fn new_spec_uses_defaults() {
        let spec = LogoSpec::new(LogoSource::parse("https://x/logo.png"), &style(240));
        assert_eq!(spec.size_px(), LOGO_DEFAULT_SIZE);
        assert_eq!(spec.shape(), LogoShape::Circle);
        assert!(!spec.source().is_inline());
    }

    #[test]
    fn setter_clamps_into_dynamic_range() {
        let style = style(200);
        let mut spec = LogoSpec::new(LogoSource::parse("u"), &style);
        spec.set_size_px(500, &style);
        assert_eq!(spec.size_px(), 100);
        spec.set_size_px(3, &style);
        assert_eq!(spec.size_px(), LOGO_MIN_SIZE);
    }

    #[test]
    fn shrinking_symbol_clamps_down_and_never_back_up() {
        let mut spec = LogoSpec::new(LogoSource::parse("u"), &style(400));
        spec.set_size_px(120, &style(400));

        assert!(spec.clamp_to(&style(160)));
        assert_eq!(spec.size_px(), 80);

        assert!(spec.clamp_to(&style(120)));
        assert_eq!(spec.size_px(), 60);

        // Growing again leaves the stored size alone
        assert!(!spec.clamp_to(&style(400)));
        assert_eq!(spec.size_px(), 60);
    }

    #[test]
    fn every_size_keeps_logo_within_bound() {
        let mut spec = LogoSpec::new(LogoSource::parse("u"), &style(400));
        spec.set_size_px(120, &style(400));
        let mut previous = spec.size_px();

        for size in (120..=400).rev().chain(120..=400) {
            let style = style(size);
            spec.clamp_to(&style);
            assert!(spec.size_px() <= max_logo_size(style.size()));
            assert!(spec.size_px() <= previous, "size must never grow back");
            previous = spec.size_px();
        }
    }

    #[test]
    fn effective_size_applies_bound_at_read_time() {
        let spec = LogoSpec {
            source: Arc::new(LogoSource::parse("u")),
            shape: LogoShape::Square,
            size_px: 120,
        };
        assert_eq!(spec.effective_size(&style(140)), 70);
        assert_eq!(spec.effective_size(&style(400)), 120);
    }

    #[test]
    fn upload_becomes_inline_blob() {
        let upload = FileUpload::new("logo.png", vec![1, 2, 3]);
        let source = LogoSource::from_upload(&upload);
        assert!(source.is_inline());
        assert!(source.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(source.origin_label(), "From your device");
        assert_eq!(LogoSource::parse(source.as_str().to_string()), source);
    }
}
