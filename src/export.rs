//! PNG export of the rendered surface.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use tracing::info;

use crate::error::ExportError;
use crate::pipeline::RenderSurface;

/// File name every export is saved under.
pub const EXPORT_FILE_NAME: &str = "qr-code-studio.png";

/// An encoded PNG ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ExportArtifact {
    /// Writes the PNG into `dir` under its fixed file name.
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), bytes = self.bytes.len(), "saved export");
        Ok(path)
    }

    /// The PNG as a `data:image/png;base64,...` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.bytes))
    }
}

/// Encodes the current surface losslessly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exporter;

impl Exporter {
    pub fn new() -> Self {
        Self
    }

    /// Encodes `surface` as PNG at its native size.
    ///
    /// Fails with [`ExportError::NoSurface`] if nothing has been rendered.
    pub fn export(&self, surface: &RenderSurface) -> Result<ExportArtifact, ExportError> {
        let raster = match surface.raster() {
            Some(raster) if surface.is_drawable() => raster,
            _ => return Err(ExportError::NoSurface),
        };

        let mut bytes = Vec::new();
        raster.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

        Ok(ExportArtifact {
            file_name: EXPORT_FILE_NAME.to_string(),
            bytes,
            width: raster.width(),
            height: raster.height(),
        })
    }
}
