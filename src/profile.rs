//! Serializable studio settings.
//!
//! A [`StudioProfile`] captures the payload, style and logo settings of a
//! [`Studio`](crate::Studio) in a JSON form that can be saved, passed to the
//! command line tool, or exchanged with a front end.
//!
//! # Example
//!
//! ```
//! use qr_studio::{DotStyle, StudioProfile, StyleSettings};
//!
//! let profile = StudioProfile::new()
//!     .with_url("https://example.com")
//!     .with_style(StyleSettings {
//!         size: 300,
//!         dot_style: DotStyle::Classy,
//!         ..StyleSettings::default()
//!     });
//!
//! let json = profile.to_json().unwrap();
//! let restored = StudioProfile::from_json(&json).unwrap();
//! assert_eq!(restored.style.size, 300);
//! ```

use serde::{Deserialize, Serialize};

use crate::logo::{LOGO_DEFAULT_SIZE, LogoShape, LogoSource, LogoSpec};
use crate::style::{DotStyle, HexColor, StyleConfig};

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured from a [`StudioProfile`].
pub trait Configurable {
    /// Applies a profile's settings. Numeric values are clamped on the way in.
    fn apply_profile(&mut self, profile: &StudioProfile);

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> StudioProfile;
}

// ============================================================================
// Settings
// ============================================================================

/// Serializable form of [`StyleConfig`].
///
/// Values are stored as given; bounds are applied when the settings are
/// turned back into a [`StyleConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct StyleSettings {
    /// Edge length in pixels (120-400).
    pub size: i64,
    pub background_color: HexColor,
    pub foreground_color: HexColor,
    pub dot_style: DotStyle,
    /// Finder pattern corner radius in pixels (0-20).
    pub eye_radius: i64,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self::from(&StyleConfig::default())
    }
}

impl From<&StyleConfig> for StyleSettings {
    fn from(style: &StyleConfig) -> Self {
        Self {
            size: style.size() as i64,
            background_color: style.background().clone(),
            foreground_color: style.foreground().clone(),
            dot_style: style.dot_style(),
            eye_radius: style.eye_radius() as i64,
        }
    }
}

impl StyleSettings {
    /// Builds a clamped [`StyleConfig`].
    pub fn to_config(&self) -> StyleConfig {
        StyleConfig::new()
            .with_size(self.size)
            .with_eye_radius(self.eye_radius)
            .with_colors(self.background_color.clone(), self.foreground_color.clone())
            .with_dot_style(self.dot_style)
    }
}

/// Serializable form of [`LogoSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct LogoSettings {
    /// A `data:` blob or a URL.
    pub source: String,

    #[serde(default)]
    pub shape: LogoShape,

    #[serde(default = "default_logo_size")]
    pub size_px: i64,
}

fn default_logo_size() -> i64 {
    LOGO_DEFAULT_SIZE as i64
}

impl From<&LogoSpec> for LogoSettings {
    fn from(spec: &LogoSpec) -> Self {
        Self {
            source: spec.source().as_str().to_string(),
            shape: spec.shape(),
            size_px: spec.size_px() as i64,
        }
    }
}

impl LogoSettings {
    /// Builds a [`LogoSpec`] with its size bounded for `style`.
    pub fn to_spec(&self, style: &StyleConfig) -> LogoSpec {
        let mut spec = LogoSpec::new(LogoSource::parse(self.source.clone()), style).with_shape(self.shape);
        spec.set_size_px(self.size_px, style);
        spec
    }
}

// ============================================================================
// StudioProfile
// ============================================================================

/// All user-facing settings of a studio session.
///
/// # JSON Format
///
/// ```json
/// {
///   "url": "https://example.com",
///   "style": {
///     "size": 240,
///     "backgroundColor": "#FFFFFF",
///     "foregroundColor": "#000000",
///     "dotStyle": "rounded",
///     "eyeRadius": 8
///   },
///   "logo": { "source": "data:image/png;base64,...", "shape": "circle", "sizePx": 60 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct StudioProfile {
    /// The typed payload. `None` leaves the current payload alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub style: StyleSettings,

    /// `None` means no logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<LogoSettings>,
}

impl StudioProfile {
    /// Creates a profile with default style and no logo.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_style(mut self, style: StyleSettings) -> Self {
        self.style = style;
        self
    }

    pub fn with_logo(mut self, logo: LogoSettings) -> Self {
        self.logo = Some(logo);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// JSON schema of the profile format.
    #[cfg(feature = "jsonschema")]
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StudioProfile)
    }
}

// ============================================================================
// Tests
// ============================================================================
