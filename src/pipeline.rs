//! Staged, cached rendering of requests into surfaces.
//!
//! The live preview re-renders on every input change, usually with only one
//! field different. The pipeline splits work into two stages, each of which
//! tracks its configuration, a version and a cached raster:
//!
//! ```text
//! RenderRequest
//!     │
//!     ▼
//! ┌──────────┐
//! │  Symbol  │ ◄── No dependencies (payload, size, colors, styles)
//! └────┬─────┘
//!      │  emits ModuleGrid
//!      ▼
//! ┌──────────┐
//! │   Logo   │ ◄── Depends on: Symbol
//! └────┬─────┘
//!      ▼
//! RenderSurface
//! ```
//!
//! Changing only the logo reuses the cached symbol; changing the symbol
//! invalidates the logo stage through its dependency version.

use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::{LogoError, RenderError, StudioError};
use crate::logo::{LogoCompositor, LogoSource, decode_logo};
use crate::request::{LogoOverlay, RenderRequest};
use crate::symbol::{ModuleGrid, Symbol, SymbolRenderer};

// ============================================================================
// Stage configuration and versions
// ============================================================================

/// Trait for stage configuration types.
pub trait LayerConfig: Clone {
    /// Returns true if this config would render differently from `other`.
    fn differs_from(&self, other: &Self) -> bool;
}

impl LayerConfig for RenderRequest {
    fn differs_from(&self, other: &Self) -> bool {
        self != other
    }
}

impl LayerConfig for LogoOverlay {
    fn differs_from(&self, other: &Self) -> bool {
        self != other
    }
}

/// Combined version of the upstream stages a cached raster was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DependencyVersion(u64);

impl DependencyVersion {
    /// No dependencies (root stage).
    pub const NONE: Self = Self(0);

    pub fn from_version(version: u64) -> Self {
        Self(version)
    }
}

// ============================================================================
// Layer
// ============================================================================

/// A pipeline stage with configuration, version tracking and a cached raster.
pub struct Layer<C: LayerConfig> {
    config: Option<C>,
    version: u64,
    cache: Option<(RgbaImage, DependencyVersion)>,
}

impl<C: LayerConfig> Default for Layer<C> {
    fn default() -> Self {
        Self {
            config: None,
            version: 0,
            cache: None,
        }
    }
}

impl<C: LayerConfig> Layer<C> {
    pub fn config(&self) -> Option<&C> {
        self.config.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.config.is_some()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the configuration. Returns true if it changed.
    ///
    /// Clears the cache and bumps the version if the config differs.
    pub fn set_config(&mut self, config: Option<C>) -> bool {
        let differs = match (&self.config, &config) {
            (None, None) => false,
            (Some(_), None) | (None, Some(_)) => true,
            (Some(old), Some(new)) => old.differs_from(new),
        };

        if differs {
            self.config = config;
            self.invalidate();
        }
        differs
    }

    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.cache = None;
    }

    /// Gets the cached raster if it was built from `deps`.
    pub fn get_cached(&self, deps: DependencyVersion) -> Option<&RgbaImage> {
        self.cache
            .as_ref()
            .and_then(|(img, stored)| (*stored == deps).then_some(img))
    }

    pub fn store(&mut self, image: RgbaImage, deps: DependencyVersion) {
        self.cache = Some((image, deps));
    }
}

// ============================================================================
// RenderSurface
// ============================================================================

/// What the preview currently shows.
///
/// A surface has no raster until a render succeeds; a failed render leaves
/// it empty rather than keeping a stale image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSurface {
    raster: Option<RgbaImage>,
}

impl RenderSurface {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_raster(raster: RgbaImage) -> Self {
        Self { raster: Some(raster) }
    }

    pub fn raster(&self) -> Option<&RgbaImage> {
        self.raster.as_ref()
    }

    pub fn is_drawable(&self) -> bool {
        self.raster
            .as_ref()
            .is_some_and(|r| r.width() > 0 && r.height() > 0)
    }
}

// ============================================================================
// RenderPipeline
// ============================================================================

/// Decoded logo pixels, keyed by source and edge length.
struct DecodedLogo {
    source: Arc<LogoSource>,
    size: u32,
    pixels: RgbaImage,
}

/// Turns [`RenderRequest`]s into [`RenderSurface`]s, caching per stage.
pub struct RenderPipeline {
    renderer: Arc<dyn SymbolRenderer>,
    compositor: LogoCompositor,

    /// Symbol stage (root).
    pub symbol: Layer<RenderRequest>,
    /// Logo stage (depends on symbol).
    pub logo: Layer<LogoOverlay>,

    /// Module layout of the cached symbol raster.
    grid: Option<ModuleGrid>,
    decoded: Option<DecodedLogo>,
}

impl RenderPipeline {
    pub fn new(renderer: Arc<dyn SymbolRenderer>) -> Self {
        Self {
            renderer,
            compositor: LogoCompositor::new(),
            symbol: Layer::default(),
            logo: Layer::default(),
            grid: None,
            decoded: None,
        }
    }

    pub fn invalidate_all(&mut self) {
        self.symbol.invalidate();
        self.logo.invalidate();
        self.grid = None;
        self.decoded = None;
    }

    /// Renders `request`, reusing cached stages where nothing changed.
    ///
    /// Never fails: a symbol that cannot be rendered yields an empty surface,
    /// and a logo that cannot be decoded is left out.
    pub fn render(&mut self, request: &RenderRequest) -> RenderSurface {
        match self.try_render(request) {
            Ok(surface) => surface,
            Err(err) => {
                warn!(error = %err, "render failed");
                RenderSurface::empty()
            }
        }
    }

    /// Like [`render`](Self::render) but reports symbol failures.
    pub fn try_render(&mut self, request: &RenderRequest) -> Result<RenderSurface, StudioError> {
        let symbol = self.render_symbol(request)?;
        let raster = self.apply_logo(symbol, request)?;
        Ok(RenderSurface::from_raster(raster))
    }

    fn render_symbol(&mut self, request: &RenderRequest) -> Result<Symbol, RenderError> {
        self.symbol.set_config(Some(request.without_logo()));

        if let Some(cached) = self.symbol.get_cached(DependencyVersion::NONE) {
            debug!("symbol cache hit");
            return Ok(Symbol {
                raster: cached.clone(),
                grid: self.grid,
            });
        }

        let symbol = self.renderer.render(request)?;
        self.symbol.store(symbol.raster.clone(), DependencyVersion::NONE);
        self.grid = symbol.grid;
        Ok(symbol)
    }

    /// Draws the logo onto `symbol`, or hands its raster back when there is
    /// no logo to draw.
    fn apply_logo(&mut self, symbol: Symbol, request: &RenderRequest) -> Result<RgbaImage, RenderError> {
        self.logo.set_config(request.logo.clone());
        let Some(overlay) = self.logo.config().cloned() else {
            return Ok(symbol.raster);
        };

        let deps = DependencyVersion::from_version(self.symbol.version());
        if let Some(cached) = self.logo.get_cached(deps) {
            debug!("logo cache hit");
            return Ok(cached.clone());
        }

        if let Err(err) = self.ensure_decoded(&overlay) {
            warn!(error = %err, "logo skipped");
            return Ok(symbol.raster);
        }
        let Some(decoded) = &self.decoded else {
            return Ok(symbol.raster);
        };

        let background = request.background.to_rgba()?;
        let composited = self.compositor.compose_overlay(
            &symbol.raster,
            &decoded.pixels,
            &overlay,
            background,
            symbol.grid.as_ref(),
        )?;
        self.logo.store(composited.clone(), deps);
        Ok(composited)
    }

    /// Decodes the overlay's logo unless the same source and size is cached.
    fn ensure_decoded(&mut self, overlay: &LogoOverlay) -> Result<(), LogoError> {
        let fresh = self
            .decoded
            .as_ref()
            .is_some_and(|d| d.size == overlay.size_px && d.source == overlay.source);

        if !fresh {
            let pixels = decode_logo(&overlay.source, overlay.size_px)?;
            self.decoded = Some(DecodedLogo {
                source: Arc::clone(&overlay.source),
                size: overlay.size_px,
                pixels,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{FileUpload, Payload};
    use crate::logo::LogoSpec;
    use crate::request::build_render_request;
    use crate::style::StyleConfig;
    use crate::symbol::QrSymbolRenderer;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and returns a flat symbol.
    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    impl SymbolRenderer for CountingRenderer {
        fn render(&self, request: &RenderRequest) -> Result<Symbol, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Symbol {
                raster: RgbaImage::from_pixel(request.size, request.size, Rgba([0, 0, 0, 255])),
                grid: None,
            })
        }
    }

    fn red_logo() -> LogoSource {
        let img = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        LogoSource::from_upload(&FileUpload::new("logo.png", bytes))
    }

    fn request(style: &StyleConfig, logo: Option<&LogoSpec>) -> RenderRequest {
        build_render_request(&Payload::from("https://example.com"), style, logo).unwrap()
    }

    #[test]
    fn layer_version_tracks_config_changes() {
        let style = StyleConfig::new();
        let mut layer: Layer<RenderRequest> = Layer::default();
        assert!(!layer.is_active());

        assert!(layer.set_config(Some(request(&style, None))));
        assert_eq!(layer.version(), 1);

        // Same config does not bump
        assert!(!layer.set_config(Some(request(&style, None))));
        assert_eq!(layer.version(), 1);

        assert!(layer.set_config(Some(request(&style.clone().with_size(300), None))));
        assert_eq!(layer.version(), 2);
    }

    #[test]
    fn unchanged_request_reuses_symbol() {
        let renderer = Arc::new(CountingRenderer::default());
        let mut pipeline = RenderPipeline::new(renderer.clone());
        let req = request(&StyleConfig::new(), None);

        let first = pipeline.render(&req);
        let second = pipeline.render(&req);
        assert_eq!(first, second);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn logo_change_does_not_rerender_symbol() {
        let renderer = Arc::new(CountingRenderer::default());
        let mut pipeline = RenderPipeline::new(renderer.clone());
        let style = StyleConfig::new();
        let mut spec = LogoSpec::new(red_logo(), &style);

        let plain = pipeline.render(&request(&style, None));
        let with_logo = pipeline.render(&request(&style, Some(&spec)));
        spec.set_size_px(40, &style);
        let smaller = pipeline.render(&request(&style, Some(&spec)));

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert_ne!(plain, with_logo);
        assert_ne!(with_logo, smaller);
        assert_eq!(with_logo.raster().unwrap().get_pixel(120, 120).0, [255, 0, 0, 255]);
    }

    #[test]
    fn symbol_change_invalidates_logo_stage() {
        let renderer = Arc::new(CountingRenderer::default());
        let mut pipeline = RenderPipeline::new(renderer.clone());
        let style = StyleConfig::new();
        let spec = LogoSpec::new(red_logo(), &style);

        pipeline.render(&request(&style, Some(&spec)));
        let resized = style.clone().with_size(300);
        let surface = pipeline.render(&request(&resized, Some(&spec)));

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(surface.raster().unwrap().dimensions(), (300, 300));
        assert_eq!(surface.raster().unwrap().get_pixel(150, 150).0, [255, 0, 0, 255]);
    }

    #[test]
    fn cached_symbol_keeps_its_grid() {
        let mut pipeline = RenderPipeline::new(Arc::new(QrSymbolRenderer));
        let style = StyleConfig::new();
        let req = request(&style, None);

        let fresh = pipeline.render_symbol(&req).unwrap();
        let cached = pipeline.render_symbol(&req).unwrap();
        assert!(fresh.grid.is_some());
        assert_eq!(cached, fresh);
    }

    #[test]
    fn undecodable_logo_is_skipped() {
        let mut pipeline = RenderPipeline::new(Arc::new(CountingRenderer::default()));
        let style = StyleConfig::new();
        let spec = LogoSpec::new(LogoSource::parse("https://example.com/logo.png"), &style);

        let surface = pipeline.render(&request(&style, Some(&spec)));
        assert!(surface.is_drawable());
        assert_eq!(surface.raster().unwrap().get_pixel(120, 120).0, [0, 0, 0, 255]);
    }

    #[test]
    fn failed_symbol_leaves_surface_empty() {
        let mut pipeline = RenderPipeline::new(Arc::new(QrSymbolRenderer));
        let style = StyleConfig::new().with_colors("bogus", "#000000");

        let surface = pipeline.render(&request(&style, None));
        assert!(!surface.is_drawable());
        assert!(surface.raster().is_none());
    }

    #[test]
    fn qr_render_with_logo_is_pixel_stable() {
        let style = StyleConfig::new();
        let spec = LogoSpec::new(red_logo(), &style);
        let req = request(&style, Some(&spec));

        let a = RenderPipeline::new(Arc::new(QrSymbolRenderer)).render(&req);
        let b = RenderPipeline::new(Arc::new(QrSymbolRenderer)).render(&req);
        assert!(a.is_drawable());
        assert_eq!(a, b);
    }
}
