//! Error types.
//!
//! Most failures in the studio are fail-soft: they are logged and the session
//! keeps going. These enums exist for the boundaries where a caller can still
//! decide what to show.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reading or interpreting user content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("upload has no file name")]
    MissingName,
}

/// Failure turning a logo source into pixels.
#[derive(Debug, Error)]
pub enum LogoError {
    #[error("remote logo URLs are not fetched: {0}")]
    RemoteUnsupported(String),

    #[error("malformed data blob")]
    MalformedData,

    #[error("failed to decode logo image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to rasterize SVG logo")]
    Svg,
}

/// Failure producing a raster from a render request.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid color {0:?}")]
    InvalidColor(String),

    #[error("failed to encode payload: {0}")]
    Encode(String),

    #[error("payload of {0} bytes does not fit in a symbol at any error correction level")]
    TooLong(usize),

    #[error("could not allocate a {0}x{0} surface")]
    Surface(u32),
}

/// Failure exporting the rendered surface.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no rendered surface to export")]
    NoSurface,

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reading or writing the persisted history slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage quota exceeded")]
    QuotaExceeded,
}

/// Errors surfaced by [`Studio`](crate::Studio) actions.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("a generation is already in progress")]
    Busy,

    #[error("nothing to encode: the payload is empty")]
    EmptyPayload,

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Logo(#[from] LogoError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
