//! Placing a logo over the rendered symbol.
//!
//! The logo is centered, masked into its aperture (circle or rounded
//! rectangle) and drawn fully opaque. Before it is drawn, every module cell
//! touching the logo footprint plus [`LOGO_PADDING`](super::LOGO_PADDING)
//! is painted with the background color, and a padding shape matching the
//! logo shape is laid down. The symbol's error correction absorbs the
//! occluded modules.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{FillRule, Mask, Path, PixmapPaint, Transform};
use tracing::debug;

use super::{LogoShape, LogoSpec};
use crate::error::RenderError;
use crate::geometry::RectPx;
use crate::raster::{circle, fill, pixmap_to_rgba_image, rgba_image_to_pixmap, uniform_rounded_rect};
use crate::request::LogoOverlay;
use crate::style::StyleConfig;
use crate::symbol::ModuleGrid;

/// Corner radius of the square aperture, relative to the logo edge.
const SQUARE_CORNER_RATIO: f32 = 0.125;

/// Composites logos onto rendered symbols.
#[derive(Debug, Clone, Copy)]
pub struct LogoCompositor {
    corner_ratio: f32,
}

impl Default for LogoCompositor {
    fn default() -> Self {
        Self {
            corner_ratio: SQUARE_CORNER_RATIO,
        }
    }
}

impl LogoCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composites `logo` onto `surface` using the settings of `spec` bounded
    /// by `style`.
    pub fn compose(
        &self,
        surface: &RgbaImage,
        logo: &RgbaImage,
        spec: &LogoSpec,
        style: &StyleConfig,
        grid: Option<&ModuleGrid>,
    ) -> Result<RgbaImage, RenderError> {
        let overlay = LogoOverlay::from_spec(spec, style);
        let background = style.background().to_rgba()?;
        self.compose_overlay(surface, logo, &overlay, background, grid)
    }

    /// Composites `logo` onto `surface` as described by a request's overlay.
    pub fn compose_overlay(
        &self,
        surface: &RgbaImage,
        logo: &RgbaImage,
        overlay: &LogoOverlay,
        background: Rgba<u8>,
        grid: Option<&ModuleGrid>,
    ) -> Result<RgbaImage, RenderError> {
        let side = overlay.size_px;
        if side == 0 {
            return Ok(surface.clone());
        }

        let footprint = RectPx::centered(surface.width(), side);
        debug!(?footprint, shape = ?overlay.shape, "compositing logo");

        let mut out = surface.clone();
        if overlay.occlude_modules {
            if let Some(grid) = grid {
                self.clear_modules(&mut out, grid, &footprint, overlay, background);
            }
        }

        let surface_err = || RenderError::Surface(surface.width());
        let mut pixmap = rgba_image_to_pixmap(&out).ok_or_else(surface_err)?;

        if let Some(path) = self.padding_path(&footprint, overlay) {
            fill(&mut pixmap, &path, background, FillRule::Winding);
        }

        let logo = if logo.dimensions() == (side, side) {
            logo.clone()
        } else {
            imageops::resize(logo, side, side, FilterType::Lanczos3)
        };
        let logo = rgba_image_to_pixmap(&logo).ok_or_else(surface_err)?;

        let mut mask = Mask::new(pixmap.width(), pixmap.height()).ok_or_else(surface_err)?;
        if let Some(aperture) = self.aperture_path(&footprint, overlay.shape) {
            mask.fill_path(&aperture, FillRule::Winding, true, Transform::identity());
        }

        let paint = PixmapPaint {
            opacity: overlay.opacity,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(
            footprint.x as i32,
            footprint.y as i32,
            logo.as_ref(),
            &paint,
            Transform::identity(),
            Some(&mask),
        );

        Ok(pixmap_to_rgba_image(&pixmap))
    }

    /// Paints every module cell that touches the padded footprint.
    fn clear_modules(
        &self,
        surface: &mut RgbaImage,
        grid: &ModuleGrid,
        footprint: &RectPx,
        overlay: &LogoOverlay,
        background: Rgba<u8>,
    ) {
        let padded = footprint.inflate(overlay.padding);
        let (cx, cy) = footprint.center();
        let radius = footprint.width as f32 / 2.0 + overlay.padding as f32;

        for cell in grid.cells() {
            let touched = match overlay.padding_style() {
                LogoShape::Circle => cell.intersects_circle(cx, cy, radius),
                LogoShape::Square => cell.intersects(&padded),
            };
            if touched {
                fill_rect(surface, &cell, background);
            }
        }
    }

    fn aperture_path(&self, footprint: &RectPx, shape: LogoShape) -> Option<Path> {
        let side = footprint.width as f32;
        match shape {
            LogoShape::Circle => {
                let (cx, cy) = footprint.center();
                circle(cx, cy, side / 2.0)
            }
            LogoShape::Square => uniform_rounded_rect(
                footprint.x as f32,
                footprint.y as f32,
                side,
                side,
                side * self.corner_ratio,
            ),
        }
    }

    fn padding_path(&self, footprint: &RectPx, overlay: &LogoOverlay) -> Option<Path> {
        let side = footprint.width as f32;
        let pad = overlay.padding as f32;
        match overlay.padding_style() {
            LogoShape::Circle => {
                let (cx, cy) = footprint.center();
                circle(cx, cy, side / 2.0 + pad)
            }
            LogoShape::Square => uniform_rounded_rect(
                footprint.x as f32 - pad,
                footprint.y as f32 - pad,
                side + 2.0 * pad,
                side + 2.0 * pad,
                side * self.corner_ratio + pad,
            ),
        }
    }
}

fn fill_rect(surface: &mut RgbaImage, rect: &RectPx, color: Rgba<u8>) {
    let right = rect.right().min(surface.width());
    let bottom = rect.bottom().min(surface.height());
    for y in rect.y..bottom {
        for x in rect.x..right {
            surface.put_pixel(x, y, color);
        }
    }
}
