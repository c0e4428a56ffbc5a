//! The symbol renderer seam.
//!
//! Encoding a payload into a module matrix (error correction, version and
//! mask selection) is not this crate's business. [`SymbolRenderer`] is the
//! boundary: it takes a [`RenderRequest`] and hands back a raster.
//! [`QrSymbolRenderer`] is the bundled implementation, built on the
//! `qrcode` crate.

use image::{Rgba, RgbaImage};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};
use resvg::tiny_skia::{FillRule, PathBuilder, Pixmap};
use tracing::debug;

use crate::error::RenderError;
use crate::geometry::RectPx;
use crate::raster::{circle, fill, pixmap_to_rgba_image, rounded_rect, solid_pixmap, uniform_rounded_rect};
use crate::request::RenderRequest;
use crate::style::DotStyle;

/// Modules of light margin around the symbol.
pub const QUIET_ZONE: u32 = 4;

/// Side length, in modules, of a finder pattern.
const FINDER: u32 = 7;

/// Error correction levels tried in turn, strongest first.
const EC_LEVELS: [EcLevel; 4] = [EcLevel::H, EcLevel::Q, EcLevel::M, EcLevel::L];

// ============================================================================
// ModuleGrid
// ============================================================================

/// Where the modules of a rendered symbol sit on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleGrid {
    /// Modules per side, excluding the quiet zone.
    pub modules: u32,
    /// Edge length of one module in pixels.
    pub module_px: f32,
    /// Pixel offset of the first module from the top-left corner.
    pub origin: f32,
}

impl ModuleGrid {
    /// Pixel cell covered by the module at `(col, row)`, rounded outwards.
    pub fn cell(&self, col: u32, row: u32) -> RectPx {
        let x0 = (self.origin + col as f32 * self.module_px).floor();
        let y0 = (self.origin + row as f32 * self.module_px).floor();
        let x1 = (self.origin + (col + 1) as f32 * self.module_px).ceil();
        let y1 = (self.origin + (row + 1) as f32 * self.module_px).ceil();
        RectPx::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
    }

    /// Every module cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = RectPx> + '_ {
        (0..self.modules).flat_map(move |row| (0..self.modules).map(move |col| self.cell(col, row)))
    }
}

// ============================================================================
// Symbol
// ============================================================================

/// Output of a [`SymbolRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub raster: RgbaImage,
    /// Module layout, when the renderer can report it. The logo stage uses it
    /// to clear whole modules.
    pub grid: Option<ModuleGrid>,
}

/// Produces a drawable raster for a request.
///
/// Implementations draw the symbol only. Logo fields of the request are
/// handled by the compositor afterwards.
pub trait SymbolRenderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<Symbol, RenderError>;
}

// ============================================================================
// QrSymbolRenderer
// ============================================================================

/// Renders QR codes with the `qrcode` crate.
///
/// Uses error correction level H so a centered logo of bounded size stays
/// readable. Payloads too long for H step down through Q, M and L; only a
/// payload that fits none of them fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrSymbolRenderer;

impl QrSymbolRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolRenderer for QrSymbolRenderer {
    fn render(&self, request: &RenderRequest) -> Result<Symbol, RenderError> {
        let background = request.background.to_rgba()?;
        let foreground = request.foreground.to_rgba()?;

        let code = encode(request.payload.as_str().as_bytes())?;
        let modules = code.width() as u32;
        let colors = code.to_colors();

        let size = request.size;
        let module_px = size as f32 / (modules + 2 * QUIET_ZONE) as f32;
        let grid = ModuleGrid {
            modules,
            module_px,
            origin: QUIET_ZONE as f32 * module_px,
        };

        let mut pixmap = solid_pixmap(size, size, background).ok_or(RenderError::Surface(size))?;

        let mut dots = PathBuilder::new();
        for (i, color) in colors.iter().enumerate() {
            let col = i as u32 % modules;
            let row = i as u32 / modules;
            if *color != Color::Dark || in_finder(col, row, modules) {
                continue;
            }
            push_module(&mut dots, &grid, col, row, request.dot_style);
        }
        if let Some(path) = dots.finish() {
            fill(&mut pixmap, &path, foreground, FillRule::Winding);
        }

        for (col, row) in [(0, 0), (modules - FINDER, 0), (0, modules - FINDER)] {
            draw_eye(&mut pixmap, &grid, col, row, request.eye_radius as f32, foreground);
        }

        Ok(Symbol {
            raster: pixmap_to_rgba_image(&pixmap),
            grid: Some(grid),
        })
    }
}

/// Encodes `data` at the strongest error correction level it fits.
fn encode(data: &[u8]) -> Result<QrCode, RenderError> {
    for level in EC_LEVELS {
        match QrCode::with_error_correction_level(data, level) {
            Ok(code) => return Ok(code),
            Err(QrError::DataTooLong) => debug!(?level, bytes = data.len(), "payload too long for level"),
            Err(e) => return Err(RenderError::Encode(e.to_string())),
        }
    }
    Err(RenderError::TooLong(data.len()))
}

fn in_finder(col: u32, row: u32, modules: u32) -> bool {
    let near = |v: u32| v < FINDER;
    let far = |v: u32| v >= modules - FINDER;
    (near(col) && near(row)) || (far(col) && near(row)) || (near(col) && far(row))
}

fn push_module(pb: &mut PathBuilder, grid: &ModuleGrid, col: u32, row: u32, style: DotStyle) {
    let s = grid.module_px;
    let x = grid.origin + col as f32 * s;
    let y = grid.origin + row as f32 * s;

    let path = match style {
        DotStyle::Square => rounded_rect(x, y, s, s, [0.0; 4]),
        DotStyle::Dots => circle(x + s / 2.0, y + s / 2.0, s / 2.0),
        DotStyle::Rounded => uniform_rounded_rect(x, y, s, s, s * 0.35),
        DotStyle::Classy => rounded_rect(x, y, s, s, [s * 0.5, 0.0, s * 0.5, 0.0]),
    };
    if let Some(path) = path {
        pb.push_path(&path);
    }
}

/// Draws a finder pattern: a 7x7 ring around a 3x3 center, both rounded by
/// `radius` pixels.
fn draw_eye(pixmap: &mut Pixmap, grid: &ModuleGrid, col: u32, row: u32, radius: f32, color: Rgba<u8>) {
    let s = grid.module_px;
    let x = grid.origin + col as f32 * s;
    let y = grid.origin + row as f32 * s;

    let mut ring = PathBuilder::new();
    if let Some(outer) = uniform_rounded_rect(x, y, 7.0 * s, 7.0 * s, radius) {
        ring.push_path(&outer);
    }
    if let Some(inner) = uniform_rounded_rect(x + s, y + s, 5.0 * s, 5.0 * s, (radius - s).max(0.0)) {
        ring.push_path(&inner);
    }
    if let Some(path) = ring.finish() {
        fill(pixmap, &path, color, FillRule::EvenOdd);
    }

    if let Some(center) = uniform_rounded_rect(x + 2.0 * s, y + 2.0 * s, 3.0 * s, 3.0 * s, radius * 0.5) {
        fill(pixmap, &center, color, FillRule::Winding);
    }
}
