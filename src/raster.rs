//! Raster helpers shared by the symbol renderer and the logo compositor.
//!
//! Surfaces are kept as straight-alpha [`RgbaImage`]s. Vector drawing goes
//! through `tiny_skia`, which works on premultiplied pixmaps, so this module
//! converts in both directions.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{
    self, FillRule, Paint, Path, PathBuilder, Pixmap, PremultipliedColorU8, Transform,
};

/// Bezier control-point factor for approximating a quarter circle.
const KAPPA: f32 = 0.552_284_8;

// ============================================================================
// Conversion
// ============================================================================

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let height = pixmap.height();
    let mut img = RgbaImage::new(width, height);

    for (i, pixel) in pixmap.pixels().iter().enumerate() {
        let x = i as u32 % width;
        let y = i as u32 / width;
        let (r, g, b, a) = unpremultiply(pixel.red(), pixel.green(), pixel.blue(), pixel.alpha());
        img.put_pixel(x, y, Rgba([r, g, b, a]));
    }

    img
}

/// Converts an image::RgbaImage to a premultiplied tiny_skia Pixmap.
///
/// Returns `None` for zero-sized images.
pub fn rgba_image_to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

/// Returns a pixmap filled with a single opaque color.
pub fn solid_pixmap(width: u32, height: u32, color: Rgba<u8>) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    let [r, g, b, a] = color.0;
    let fill: PremultipliedColorU8 = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    pixmap.pixels_mut().fill(fill);
    Some(pixmap)
}

// ============================================================================
// Shapes
// ============================================================================

/// Builds a rectangle path whose corners are rounded by the given radii,
/// in the order top-left, top-right, bottom-right, bottom-left.
///
/// Each radius is clamped to half of the shorter side.
pub fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radii: [f32; 4]) -> Option<Path> {
    let max = w.min(h) / 2.0;
    let [tl, tr, br, bl] = radii.map(|r| r.clamp(0.0, max));
    let (right, bottom) = (x + w, y + h);

    let mut pb = PathBuilder::new();
    pb.move_to(x + tl, y);
    pb.line_to(right - tr, y);
    if tr > 0.0 {
        pb.cubic_to(right - tr * (1.0 - KAPPA), y, right, y + tr * (1.0 - KAPPA), right, y + tr);
    }
    pb.line_to(right, bottom - br);
    if br > 0.0 {
        pb.cubic_to(
            right,
            bottom - br * (1.0 - KAPPA),
            right - br * (1.0 - KAPPA),
            bottom,
            right - br,
            bottom,
        );
    }
    pb.line_to(x + bl, bottom);
    if bl > 0.0 {
        pb.cubic_to(x + bl * (1.0 - KAPPA), bottom, x, bottom - bl * (1.0 - KAPPA), x, bottom - bl);
    }
    pb.line_to(x, y + tl);
    if tl > 0.0 {
        pb.cubic_to(x, y + tl * (1.0 - KAPPA), x + tl * (1.0 - KAPPA), y, x + tl, y);
    }
    pb.close();
    pb.finish()
}

/// Builds a rectangle path with the same radius on every corner.
pub fn uniform_rounded_rect(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<Path> {
    rounded_rect(x, y, w, h, [radius; 4])
}

/// Builds a circle path.
pub fn circle(cx: f32, cy: f32, r: f32) -> Option<Path> {
    PathBuilder::from_circle(cx, cy, r)
}

/// Returns an anti-aliased solid paint.
pub fn solid_paint(color: Rgba<u8>) -> Paint<'static> {
    let [r, g, b, a] = color.0;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Fills `path` with `color`.
pub fn fill(pixmap: &mut Pixmap, path: &Path, color: Rgba<u8>, rule: FillRule) {
    pixmap.fill_path(path, &solid_paint(color), rule, Transform::identity(), None);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixmap_round_trip_preserves_opaque_pixels() {
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        img.put_pixel(2, 1, Rgba([200, 100, 50, 255]));

        let pixmap = rgba_image_to_pixmap(&img).unwrap();
        let back = pixmap_to_rgba_image(&pixmap);
        assert_eq!(back, img);
    }

    #[test]
    fn zero_sized_image_has_no_pixmap() {
        assert!(rgba_image_to_pixmap(&RgbaImage::new(0, 0)).is_none());
    }

    #[test]
    fn solid_pixmap_is_uniform() {
        let pixmap = solid_pixmap(5, 5, Rgba([0, 128, 255, 255])).unwrap();
        let img = pixmap_to_rgba_image(&pixmap);
        assert!(img.pixels().all(|p| p.0 == [0, 128, 255, 255]));
    }

    #[test]
    fn rounded_rect_leaves_corners_open() {
        let mut pixmap = solid_pixmap(40, 40, Rgba([255, 255, 255, 255])).unwrap();
        let path = uniform_rounded_rect(0.0, 0.0, 40.0, 40.0, 15.0).unwrap();
        fill(&mut pixmap, &path, Rgba([0, 0, 0, 255]), FillRule::Winding);

        let img = pixmap_to_rgba_image(&pixmap);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255], "corner stays background");
        assert_eq!(img.get_pixel(20, 20).0, [0, 0, 0, 255], "center is filled");
    }

    #[test]
    fn zero_radius_is_a_plain_rect() {
        let mut pixmap = solid_pixmap(10, 10, Rgba([255, 255, 255, 255])).unwrap();
        let path = rounded_rect(0.0, 0.0, 10.0, 10.0, [0.0; 4]).unwrap();
        fill(&mut pixmap, &path, Rgba([0, 0, 0, 255]), FillRule::Winding);

        let img = pixmap_to_rgba_image(&pixmap);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(9, 9).0, [0, 0, 0, 255]);
    }
}
