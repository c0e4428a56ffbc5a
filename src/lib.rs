//! qr-studio: QR code design studio
//!
//! This crate turns user content (a typed URL or an uploaded file) into a
//! styled QR code with an optional centered logo, keeps a short history of
//! generated payloads, and exports the result as PNG.
//!
//! # Example
//!
//! ```
//! use qr_studio::{DotStyle, MemoryRepository, NoticeLog, Studio};
//!
//! let mut studio = Studio::new(MemoryRepository::new(), NoticeLog::new());
//!
//! // Every input change re-renders the preview
//! studio.set_url("https://example.com");
//! studio.set_size(300);
//! studio.set_dot_style(DotStyle::Classy);
//! assert!(studio.surface().is_drawable());
//!
//! let artifact = studio.download().unwrap();
//! assert_eq!(artifact.file_name, "qr-code-studio.png");
//! ```
//!
//! # Building blocks
//!
//! The session is a thin layer over pieces that can be used on their own:
//!
//! ```
//! use qr_studio::{
//!     build_render_request, ContentInput, ContentResolver, QrSymbolRenderer, RenderPipeline,
//!     StyleConfig,
//! };
//! use std::sync::Arc;
//!
//! let resolution = ContentResolver::new().resolve(&ContentInput::Url("hello".into()));
//! let style = StyleConfig::new().with_size(200).with_eye_radius(4);
//! let request = build_render_request(&resolution.payload, &style, None).unwrap();
//!
//! let mut pipeline = RenderPipeline::new(Arc::new(QrSymbolRenderer::new()));
//! let surface = pipeline.render(&request);
//! assert_eq!(surface.raster().unwrap().dimensions(), (200, 200));
//! ```
//!
//! # Serializable Profiles
//!
//! Settings travel as [`StudioProfile`] JSON through the [`Configurable`]
//! trait:
//!
//! ```
//! use qr_studio::{Configurable, MemoryRepository, NoticeLog, Studio, StudioProfile};
//!
//! let mut studio = Studio::new(MemoryRepository::new(), NoticeLog::new());
//! let profile = StudioProfile::from_json(r#"{"style":{"size":320,"dotStyle":"dots"}}"#).unwrap();
//! studio.apply_profile(&profile);
//!
//! let json = studio.export_profile().to_json().unwrap();
//! assert!(json.contains("\"size\":320"));
//! ```

mod content;
mod error;
mod export;
mod geometry;
mod history;
mod logo;
mod notify;
mod pipeline;
mod profile;
mod raster;
mod request;
mod session;
mod style;
mod symbol;

pub use content::{
    ContentInput, ContentOutcome, ContentResolver, FileUpload, INLINE_LIMIT_BYTES, InlineBlob, Payload,
    Resolution, mime_for_name, read_upload,
};
pub use error::{ContentError, ExportError, LogoError, RenderError, StorageError, StudioError};
pub use export::{EXPORT_FILE_NAME, ExportArtifact, Exporter};
pub use geometry::RectPx;
pub use history::{
    FileRepository, HISTORY_CAPACITY, HISTORY_SLOT, HistoryEntry, HistoryRepository, HistoryStore,
    MemoryRepository,
};
pub use logo::{
    LOGO_DEFAULT_SIZE, LOGO_MAX_SIZE, LOGO_MIN_SIZE, LOGO_PADDING, LogoCompositor, LogoShape, LogoSource,
    LogoSpec, decode_logo, max_logo_size,
};
pub use notify::{Notice, NoticeLog, Notifier, Severity, TracingNotifier};
pub use pipeline::{DependencyVersion, Layer, LayerConfig, RenderPipeline, RenderSurface};
pub use profile::{Configurable, LogoSettings, StudioProfile, StyleSettings};
pub use request::{
    LOGO_OPACITY, LogoOverlay, PHONE_PREVIEW_LOGO_SCALE, PHONE_PREVIEW_SIZE, RenderRequest,
    build_render_request,
};
pub use session::{DEFAULT_PAYLOAD, GENERATE_DELAY, GenerationGate, GenerationPermit, Studio};
pub use style::{DotStyle, HexColor, MAX_EYE_RADIUS, MAX_SIZE, MIN_SIZE, StyleConfig};
pub use symbol::{ModuleGrid, QUIET_ZONE, QrSymbolRenderer, Symbol, SymbolRenderer};
