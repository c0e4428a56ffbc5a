//! Render requests.
//!
//! A [`RenderRequest`] is a snapshot of everything needed to draw one symbol.
//! It is derived from the payload, style and logo every time one of them
//! changes and is never edited afterwards.

use std::sync::Arc;

use crate::content::Payload;
use crate::error::StudioError;
use crate::logo::{LOGO_PADDING, LogoShape, LogoSource, LogoSpec};
use crate::style::{DotStyle, HexColor, StyleConfig};

/// Logos are always drawn fully opaque.
pub const LOGO_OPACITY: f32 = 1.0;

/// Edge length of the phone preview.
pub const PHONE_PREVIEW_SIZE: u32 = 160;
/// Logo scale applied in the phone preview.
pub const PHONE_PREVIEW_LOGO_SCALE: f32 = 0.7;

// ============================================================================
// LogoOverlay
// ============================================================================

/// The logo part of a request, with the size bound already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoOverlay {
    /// Shared with the [`LogoSpec`] it came from.
    pub source: Arc<LogoSource>,
    pub size_px: u32,
    pub shape: LogoShape,
    pub padding: u32,
    pub opacity: f32,
    /// Clear the modules beneath the logo and its padding.
    pub occlude_modules: bool,
}

impl LogoOverlay {
    pub fn from_spec(spec: &LogoSpec, style: &StyleConfig) -> Self {
        Self {
            source: Arc::clone(spec.source()),
            size_px: spec.effective_size(style),
            shape: spec.shape(),
            padding: LOGO_PADDING,
            opacity: LOGO_OPACITY,
            occlude_modules: true,
        }
    }

    /// Shape of the padding between the logo and the modules it covers.
    pub fn padding_style(&self) -> LogoShape {
        self.shape
    }
}

// ============================================================================
// RenderRequest
// ============================================================================

/// Everything the symbol renderer and compositor need for one raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub payload: Payload,
    pub size: u32,
    pub background: HexColor,
    pub foreground: HexColor,
    pub dot_style: DotStyle,
    pub eye_radius: u32,
    pub logo: Option<LogoOverlay>,
}

impl RenderRequest {
    /// The same request without its logo.
    pub fn without_logo(&self) -> Self {
        Self {
            logo: None,
            ..self.clone()
        }
    }

    /// The request scaled down for the phone preview.
    pub fn phone_preview(&self) -> Self {
        let logo = self.logo.as_ref().map(|logo| LogoOverlay {
            size_px: (logo.size_px as f32 * PHONE_PREVIEW_LOGO_SCALE).round() as u32,
            ..logo.clone()
        });
        Self {
            size: PHONE_PREVIEW_SIZE,
            logo,
            ..self.clone()
        }
    }
}

/// Derives a request from the current inputs.
///
/// Fails only when the payload is empty.
pub fn build_render_request(
    payload: &Payload,
    style: &StyleConfig,
    logo: Option<&LogoSpec>,
) -> Result<RenderRequest, StudioError> {
    if payload.is_empty() {
        return Err(StudioError::EmptyPayload);
    }

    Ok(RenderRequest {
        payload: payload.clone(),
        size: style.size(),
        background: style.background().clone(),
        foreground: style.foreground().clone(),
        dot_style: style.dot_style(),
        eye_radius: style.eye_radius(),
        logo: logo.map(|spec| LogoOverlay::from_spec(spec, style)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo_spec(style: &StyleConfig) -> LogoSpec {
        LogoSpec::new(LogoSource::parse("https://example.com/logo.png"), style)
    }

    #[test]
    fn scenario_without_logo() {
        let style = StyleConfig::new()
            .with_size(240)
            .with_colors("#FFFFFF", "#000000")
            .with_dot_style(DotStyle::Rounded)
            .with_eye_radius(8);
        let request = build_render_request(&"https://example.com".into(), &style, None).unwrap();

        assert_eq!(request.payload.as_str(), "https://example.com");
        assert_eq!(request.size, 240);
        assert_eq!(request.background.as_str(), "#FFFFFF");
        assert_eq!(request.foreground.as_str(), "#000000");
        assert_eq!(request.dot_style, DotStyle::Rounded);
        assert_eq!(request.eye_radius, 8);
        assert!(request.logo.is_none());
    }

    #[test]
    fn empty_payload_is_rejected() {
        let err = build_render_request(&Payload::default(), &StyleConfig::new(), None).unwrap_err();
        assert!(matches!(err, StudioError::EmptyPayload));
    }

    #[test]
    fn derivation_is_pure() {
        let style = StyleConfig::new();
        let spec = logo_spec(&style);
        let payload = Payload::from("abc");

        let a = build_render_request(&payload, &style, Some(&spec)).unwrap();
        let b = build_render_request(&payload, &style, Some(&spec)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn logo_overlay_shares_source_and_fixes_contract() {
        let style = StyleConfig::new();
        let spec = logo_spec(&style);
        let request = build_render_request(&"abc".into(), &style, Some(&spec)).unwrap();

        let overlay = request.logo.unwrap();
        assert!(Arc::ptr_eq(&overlay.source, spec.source()));
        assert_eq!(overlay.padding, 4);
        assert_eq!(overlay.opacity, 1.0);
        assert!(overlay.occlude_modules);
        assert_eq!(overlay.padding_style(), spec.shape());
    }

    #[test]
    fn overlay_size_respects_bound_at_read_time() {
        let big = StyleConfig::new().with_size(400);
        let mut spec = logo_spec(&big);
        spec.set_size_px(120, &big);

        let small = StyleConfig::new().with_size(150);
        let request = build_render_request(&"abc".into(), &small, Some(&spec)).unwrap();
        assert_eq!(request.logo.unwrap().size_px, 75);
    }

    #[test]
    fn phone_preview_scales_size_and_logo() {
        let style = StyleConfig::new();
        let spec = logo_spec(&style);
        let request = build_render_request(&"abc".into(), &style, Some(&spec)).unwrap();

        let phone = request.phone_preview();
        assert_eq!(phone.size, 160);
        assert_eq!(phone.logo.as_ref().unwrap().size_px, 42);
        assert_eq!(phone.payload, request.payload);
        assert!(phone.without_logo().logo.is_none());
    }
}
