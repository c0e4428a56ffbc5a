//! Visual parameters of the rendered symbol.
//!
//! [`StyleConfig`] never rejects input. Numeric setters clamp into their
//! declared bounds and colors are stored exactly as given; checking the hex
//! format is left to whatever widget produced the value.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Smallest symbol edge in pixels.
pub const MIN_SIZE: u32 = 120;
/// Largest symbol edge in pixels.
pub const MAX_SIZE: u32 = 400;
/// Largest finder-eye corner radius.
pub const MAX_EYE_RADIUS: u32 = 20;

// ============================================================================
// HexColor
// ============================================================================

/// A color as typed by the user, e.g. `#FFFFFF`.
///
/// The string is kept verbatim. It is only interpreted when a raster is
/// produced, see [`HexColor::to_rgba`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct HexColor(String);

impl HexColor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the stored string as an opaque sRGB color.
    pub fn to_rgba(&self) -> Result<Rgba<u8>, RenderError> {
        let rgb: Srgb<u8> = self
            .0
            .trim()
            .parse()
            .map_err(|_| RenderError::InvalidColor(self.0.clone()))?;
        Ok(Rgba([rgb.red, rgb.green, rgb.blue, 255]))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HexColor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for HexColor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// DotStyle
// ============================================================================

/// How individual data modules are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum DotStyle {
    /// Circular dots.
    Dots,
    /// Squares with all corners rounded.
    #[default]
    Rounded,
    /// Squares rounded on the top-left and bottom-right corners only.
    Classy,
    /// Plain squares.
    Square,
}

impl DotStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dots => "dots",
            Self::Rounded => "rounded",
            Self::Classy => "classy",
            Self::Square => "square",
        }
    }
}

impl FromStr for DotStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dots" => Ok(Self::Dots),
            "rounded" => Ok(Self::Rounded),
            "classy" => Ok(Self::Classy),
            "square" => Ok(Self::Square),
            other => Err(format!("unknown dot style {other:?}")),
        }
    }
}

// ============================================================================
// StyleConfig
// ============================================================================

/// Bounded visual parameters of the symbol.
///
/// `size` always lies in `[MIN_SIZE, MAX_SIZE]` and `eye_radius` in
/// `[0, MAX_EYE_RADIUS]`. Fields are private so the setters are the only way
/// in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleConfig {
    size: u32,
    background: HexColor,
    foreground: HexColor,
    dot_style: DotStyle,
    eye_radius: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            size: 240,
            background: HexColor::new("#FFFFFF"),
            foreground: HexColor::new("#000000"),
            dot_style: DotStyle::Rounded,
            eye_radius: 8,
        }
    }
}

impl StyleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn background(&self) -> &HexColor {
        &self.background
    }

    pub fn foreground(&self) -> &HexColor {
        &self.foreground
    }

    pub fn dot_style(&self) -> DotStyle {
        self.dot_style
    }

    pub fn eye_radius(&self) -> u32 {
        self.eye_radius
    }

    /// Sets the symbol edge length, clamped to `[MIN_SIZE, MAX_SIZE]`.
    pub fn set_size(&mut self, size: i64) {
        self.size = size.clamp(MIN_SIZE as i64, MAX_SIZE as i64) as u32;
    }

    /// Sets the finder-eye corner radius, clamped to `[0, MAX_EYE_RADIUS]`.
    pub fn set_eye_radius(&mut self, radius: i64) {
        self.eye_radius = radius.clamp(0, MAX_EYE_RADIUS as i64) as u32;
    }

    pub fn set_background(&mut self, color: impl Into<HexColor>) {
        self.background = color.into();
    }

    pub fn set_foreground(&mut self, color: impl Into<HexColor>) {
        self.foreground = color.into();
    }

    pub fn set_dot_style(&mut self, style: DotStyle) {
        self.dot_style = style;
    }

    /// Builder form of [`set_size`](Self::set_size).
    pub fn with_size(mut self, size: i64) -> Self {
        self.set_size(size);
        self
    }

    /// Builder form of [`set_eye_radius`](Self::set_eye_radius).
    pub fn with_eye_radius(mut self, radius: i64) -> Self {
        self.set_eye_radius(radius);
        self
    }

    pub fn with_colors(mut self, background: impl Into<HexColor>, foreground: impl Into<HexColor>) -> Self {
        self.background = background.into();
        self.foreground = foreground.into();
        self
    }

    pub fn with_dot_style(mut self, style: DotStyle) -> Self {
        self.dot_style = style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_studio_start_state() {
        let style = StyleConfig::default();
        assert_eq!(style.size(), 240);
        assert_eq!(style.background().as_str(), "#FFFFFF");
        assert_eq!(style.foreground().as_str(), "#000000");
        assert_eq!(style.dot_style(), DotStyle::Rounded);
        assert_eq!(style.eye_radius(), 8);
    }

    #[test]
    fn size_is_clamped_not_rejected() {
        let mut style = StyleConfig::new();
        style.set_size(10);
        assert_eq!(style.size(), MIN_SIZE);
        style.set_size(9_000);
        assert_eq!(style.size(), MAX_SIZE);
        style.set_size(-5);
        assert_eq!(style.size(), MIN_SIZE);
        style.set_size(310);
        assert_eq!(style.size(), 310);
    }

    #[test]
    fn eye_radius_is_clamped() {
        let mut style = StyleConfig::new();
        style.set_eye_radius(-1);
        assert_eq!(style.eye_radius(), 0);
        style.set_eye_radius(21);
        assert_eq!(style.eye_radius(), MAX_EYE_RADIUS);
    }

    #[test]
    fn colors_are_stored_verbatim() {
        let style = StyleConfig::new().with_colors("not-a-color", "#abc123");
        assert_eq!(style.background().as_str(), "not-a-color");
        assert!(style.background().to_rgba().is_err());
        assert_eq!(style.foreground().to_rgba().unwrap(), Rgba([0xab, 0xc1, 0x23, 255]));
    }

    #[test]
    fn dot_style_round_trips_through_str() {
        for style in [DotStyle::Dots, DotStyle::Rounded, DotStyle::Classy, DotStyle::Square] {
            assert_eq!(style.as_str().parse::<DotStyle>().unwrap(), style);
        }
        assert!("fluid".parse::<DotStyle>().is_err());
    }

    #[test]
    fn dot_style_serializes_lowercase() {
        let json = serde_json::to_string(&DotStyle::Classy).unwrap();
        assert_eq!(json, "\"classy\"");
    }
}
