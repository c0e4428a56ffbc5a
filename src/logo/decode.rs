//! Turning a [`LogoSource`] into pixels.
//!
//! Raster images are decoded with `image`; SVG blobs are rasterized with
//! resvg. Remote URLs are never fetched.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use tracing::debug;

use super::LogoSource;
use crate::content::InlineBlob;
use crate::error::LogoError;
use crate::raster::pixmap_to_rgba_image;

const SVG_MIME: &str = "image/svg+xml";

/// Decodes `source` and scales it to exactly `size` x `size` pixels.
pub fn decode_logo(source: &LogoSource, size: u32) -> Result<RgbaImage, LogoError> {
    let data = match source {
        LogoSource::Inline(data) => data,
        LogoSource::Url(url) => return Err(LogoError::RemoteUnsupported(url.clone())),
    };

    let blob = InlineBlob::parse(data).ok_or(LogoError::MalformedData)?;
    debug!(mime = %blob.mime, bytes = blob.bytes.len(), size, "decoding logo");

    if blob.mime == SVG_MIME {
        let svg = std::str::from_utf8(&blob.bytes).map_err(|_| LogoError::Svg)?;
        return render_svg(svg, size).ok_or(LogoError::Svg);
    }

    let img = image::load_from_memory(&blob.bytes)?.to_rgba8();
    if img.dimensions() == (size, size) {
        return Ok(img);
    }
    Ok(imageops::resize(&img, size, size, FilterType::Lanczos3))
}

/// Renders an SVG string stretched to `size` x `size` pixels.
///
/// Returns `None` if the SVG cannot be parsed or rendered.
pub fn render_svg(svg_data: &str, size: u32) -> Option<RgbaImage> {
    let opts = Options::default();
    let tree = Tree::from_str(svg_data, &opts).ok()?;

    let svg_size = tree.size();
    let sx = size as f32 / svg_size.width();
    let sy = size as f32 / svg_size.height();

    let mut pixmap = Pixmap::new(size, size)?;
    resvg::render(&tree, Transform::from_scale(sx, sy), &mut pixmap.as_mut());

    Some(pixmap_to_rgba_image(&pixmap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FileUpload;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    const SIMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><rect width="100" height="50" fill="#ff0000"/></svg>"##;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn remote_url_is_not_fetched() {
        let err = decode_logo(&LogoSource::parse("https://example.com/logo.png"), 40).unwrap_err();
        assert!(matches!(err, LogoError::RemoteUnsupported(_)));
    }

    #[test]
    fn png_upload_is_scaled_to_square() {
        let img = RgbaImage::from_pixel(10, 20, Rgba([0, 0, 255, 255]));
        let upload = FileUpload::new("logo.png", png_bytes(&img));

        let decoded = decode_logo(&LogoSource::from_upload(&upload), 40).unwrap();
        assert_eq!(decoded.dimensions(), (40, 40));
        assert_eq!(decoded.get_pixel(20, 20).0, [0, 0, 255, 255]);
    }

    #[test]
    fn svg_upload_is_rasterized() {
        let upload = FileUpload::new("logo.svg", SIMPLE_SVG.as_bytes().to_vec());
        let decoded = decode_logo(&LogoSource::from_upload(&upload), 32).unwrap();
        assert_eq!(decoded.dimensions(), (32, 32));

        let center = decoded.get_pixel(16, 16);
        assert_eq!(center.0, [255, 0, 0, 255]);
    }

    #[test]
    fn garbage_blob_fails_to_decode() {
        let upload = FileUpload::new("logo.png", b"not an image".to_vec());
        let err = decode_logo(&LogoSource::from_upload(&upload), 32).unwrap_err();
        assert!(matches!(err, LogoError::Decode(_)));

        let err = decode_logo(&LogoSource::Inline("data:oops".into()), 32).unwrap_err();
        assert!(matches!(err, LogoError::MalformedData));
    }
}
