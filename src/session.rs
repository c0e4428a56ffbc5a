//! The interactive studio session.
//!
//! [`Studio`] owns the current payload, style and logo, and keeps the live
//! preview in sync with them. Every input change rebuilds the render request
//! and re-renders through the cached pipeline; the explicit actions
//! (generate, download, restore) report back through a [`Notifier`].
//!
//! # Example
//!
//! ```no_run
//! use qr_studio::{MemoryRepository, NoticeLog, Studio};
//!
//! # async fn run() -> Result<(), qr_studio::StudioError> {
//! let mut studio = Studio::new(MemoryRepository::new(), NoticeLog::new());
//! studio.set_url("https://example.com");
//! studio.set_size(300);
//!
//! studio.generate().await?;
//! let artifact = studio.download()?;
//! assert_eq!(artifact.file_name, "qr-code-studio.png");
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::content::{ContentInput, ContentOutcome, ContentResolver, FileUpload, Payload, read_upload};
use crate::error::{RenderError, StudioError};
use crate::export::{ExportArtifact, Exporter};
use crate::history::{HistoryEntry, HistoryRepository, HistoryStore, MemoryRepository};
use crate::logo::{LogoShape, LogoSource, LogoSpec};
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::pipeline::{RenderPipeline, RenderSurface};
use crate::profile::{Configurable, LogoSettings, StudioProfile, StyleSettings};
use crate::request::{RenderRequest, build_render_request};
use crate::style::{DotStyle, HexColor, StyleConfig};
use crate::symbol::{QrSymbolRenderer, SymbolRenderer};

/// Payload a new session starts with, and what the preview shows while the
/// payload is empty.
pub const DEFAULT_PAYLOAD: &str = "https://example.com";

/// Artificial delay of the generate action.
pub const GENERATE_DELAY: Duration = Duration::from_millis(800);

// ============================================================================
// GenerationGate
// ============================================================================

/// Allows at most one generation in flight.
#[derive(Debug, Clone, Default)]
pub struct GenerationGate {
    busy: Arc<AtomicBool>,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the gate, or returns `None` if a generation already holds it.
    pub fn try_acquire(&self) -> Option<GenerationPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one generation. Releases the gate when dropped,
/// including when the generating future is dropped before it completes.
#[derive(Debug)]
pub struct GenerationPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for GenerationPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

// ============================================================================
// Studio
// ============================================================================

/// An editing session: inputs, live preview, history and export.
pub struct Studio<R: HistoryRepository = MemoryRepository, N: Notifier = TracingNotifier> {
    payload: Payload,
    style: StyleConfig,
    logo: Option<LogoSpec>,

    resolver: ContentResolver,
    history: HistoryStore<R>,
    exporter: Exporter,
    notifier: N,

    pipeline: RenderPipeline,
    phone_pipeline: RenderPipeline,
    surface: RenderSurface,
    phone_surface: RenderSurface,

    gate: GenerationGate,
    generate_delay: Duration,
}

impl<R: HistoryRepository, N: Notifier> Studio<R, N> {
    /// Opens a session with default settings, rendering with [`QrSymbolRenderer`].
    pub fn new(repository: R, notifier: N) -> Self {
        Self::with_renderer(repository, notifier, Arc::new(QrSymbolRenderer::new()))
    }

    /// Opens a session that renders symbols with `renderer`.
    pub fn with_renderer(repository: R, notifier: N, renderer: Arc<dyn SymbolRenderer>) -> Self {
        let mut studio = Self {
            payload: Payload::from(DEFAULT_PAYLOAD),
            style: StyleConfig::default(),
            logo: None,
            resolver: ContentResolver::new(),
            history: HistoryStore::open(repository),
            exporter: Exporter::new(),
            notifier,
            pipeline: RenderPipeline::new(Arc::clone(&renderer)),
            phone_pipeline: RenderPipeline::new(renderer),
            surface: RenderSurface::empty(),
            phone_surface: RenderSurface::empty(),
            gate: GenerationGate::new(),
            generate_delay: GENERATE_DELAY,
        };
        studio.refresh();
        studio
    }

    /// Overrides the artificial generate delay.
    pub fn with_generate_delay(mut self, delay: Duration) -> Self {
        self.generate_delay = delay;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn logo(&self) -> Option<&LogoSpec> {
        self.logo.as_ref()
    }

    pub fn history(&self) -> &HistoryStore<R> {
        &self.history
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// The main preview, as it would be exported.
    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// The scaled-down phone mockup preview.
    pub fn phone_surface(&self) -> &RenderSurface {
        &self.phone_surface
    }

    /// A handle to the generation gate, for front ends that disable the
    /// generate control while it is held.
    pub fn gate(&self) -> GenerationGate {
        self.gate.clone()
    }

    pub fn can_generate(&self) -> bool {
        !self.payload.is_empty() && !self.gate.is_busy()
    }

    pub fn can_download(&self) -> bool {
        !self.payload.is_empty() && self.surface.is_drawable()
    }

    // ------------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------------

    /// Resolves `input` into the active payload and reports the outcome.
    ///
    /// A payload too long for any symbol gets a destructive notice in place
    /// of the outcome's own.
    pub fn set_content(&mut self, input: &ContentInput) -> ContentOutcome {
        let resolution = self.resolver.resolve(input);
        self.payload = resolution.payload;

        match self.render_previews() {
            Some(StudioError::Render(RenderError::TooLong(bytes))) => {
                self.notifier.notify(Notice::destructive(
                    "Content Too Large",
                    format!("{bytes} bytes is more than a QR code can hold."),
                ));
            }
            _ => {
                if let Some(notice) = resolution.outcome.notice() {
                    self.notifier.notify(notice);
                }
            }
        }
        resolution.outcome
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.set_content(&ContentInput::Url(url.into()));
    }

    pub fn set_file(&mut self, upload: FileUpload) -> ContentOutcome {
        self.set_content(&ContentInput::File(upload))
    }

    /// Reads a content file from disk and makes it the payload. Files too
    /// large to embed are not read.
    pub async fn load_file(&mut self, path: impl AsRef<Path>) -> Result<ContentOutcome, StudioError> {
        let upload = self.resolver.read_file(path).await?;
        Ok(self.set_file(upload))
    }

    // ------------------------------------------------------------------------
    // Style
    // ------------------------------------------------------------------------

    /// Sets the symbol size, lowering the logo size if the new bound requires it.
    pub fn set_size(&mut self, size: i64) {
        self.style.set_size(size);
        if let Some(logo) = &mut self.logo {
            if logo.clamp_to(&self.style) {
                debug!(size = logo.size_px(), "logo size clamped to new bound");
            }
        }
        self.refresh();
    }

    pub fn set_eye_radius(&mut self, radius: i64) {
        self.style.set_eye_radius(radius);
        self.refresh();
    }

    pub fn set_background(&mut self, color: impl Into<HexColor>) {
        self.style.set_background(color);
        self.refresh();
    }

    pub fn set_foreground(&mut self, color: impl Into<HexColor>) {
        self.style.set_foreground(color);
        self.refresh();
    }

    pub fn set_dot_style(&mut self, style: DotStyle) {
        self.style.set_dot_style(style);
        self.refresh();
    }

    // ------------------------------------------------------------------------
    // Logo
    // ------------------------------------------------------------------------

    /// Sets the logo image. Shape and size carry over from the previous logo.
    pub fn set_logo(&mut self, source: LogoSource) {
        match &mut self.logo {
            Some(spec) => spec.set_source(source),
            None => self.logo = Some(LogoSpec::new(source, &self.style)),
        }
        self.refresh();
    }

    /// Embeds an uploaded image as the logo.
    pub fn upload_logo(&mut self, upload: &FileUpload) {
        self.set_logo(LogoSource::from_upload(upload));
        self.notifier.notify(Notice::new(
            "Logo Uploaded",
            "Your logo has been added to the QR code.",
        ));
    }

    /// Reads an image from disk and uses it as the logo.
    pub async fn load_logo(&mut self, path: impl AsRef<Path>) -> Result<(), StudioError> {
        let upload = read_upload(path).await?;
        self.upload_logo(&upload);
        Ok(())
    }

    /// Changes the logo shape. Does nothing without a logo.
    pub fn set_logo_shape(&mut self, shape: LogoShape) {
        if let Some(logo) = &mut self.logo {
            logo.set_shape(shape);
            self.refresh();
        }
    }

    /// Changes the logo size within its current bounds. Does nothing without
    /// a logo.
    pub fn set_logo_size(&mut self, size: i64) {
        if let Some(logo) = &mut self.logo {
            logo.set_size_px(size, &self.style);
            self.refresh();
        }
    }

    pub fn clear_logo(&mut self) {
        if self.logo.take().is_some() {
            self.refresh();
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// The request for the current inputs. Fails while the payload is empty.
    pub fn render_request(&self) -> Result<RenderRequest, StudioError> {
        build_render_request(&self.payload, &self.style, self.logo.as_ref())
    }

    /// The request the preview shows, with the default payload standing in
    /// for an empty one.
    pub fn preview_request(&self) -> Result<RenderRequest, StudioError> {
        if self.payload.is_empty() {
            build_render_request(&Payload::from(DEFAULT_PAYLOAD), &self.style, self.logo.as_ref())
        } else {
            self.render_request()
        }
    }

    /// Drops every cached stage. The next refresh renders from scratch.
    pub fn clear_cache(&mut self) {
        self.pipeline.invalidate_all();
        self.phone_pipeline.invalidate_all();
    }

    /// Re-renders both previews from the current inputs.
    pub fn refresh(&mut self) {
        self.render_previews();
    }

    /// Re-renders both previews and returns why the main one is empty, if it is.
    fn render_previews(&mut self) -> Option<StudioError> {
        let request = match self.preview_request() {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "preview not rendered");
                self.surface = RenderSurface::empty();
                self.phone_surface = RenderSurface::empty();
                return Some(err);
            }
        };

        self.phone_surface = self.phone_pipeline.render(&request.phone_preview());
        match self.pipeline.try_render(&request) {
            Ok(surface) => {
                self.surface = surface;
                None
            }
            Err(err) => {
                warn!(error = %err, "render failed");
                self.surface = RenderSurface::empty();
                Some(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Generates the symbol for the current payload and records it in history.
    ///
    /// Waits for the generate delay first. Fails with
    /// [`StudioError::Busy`] while another generation holds the gate.
    pub async fn generate(&mut self) -> Result<HistoryEntry, StudioError> {
        if self.payload.is_empty() {
            return Err(StudioError::EmptyPayload);
        }
        let _permit = self.gate.try_acquire().ok_or(StudioError::Busy)?;
        let payload = self.payload.clone();

        tokio::time::sleep(self.generate_delay).await;

        let entry = self.history.append(payload);
        self.refresh();
        info!(id = entry.id(), "generated");
        self.notifier.notify(Notice::new(
            "QR Code Generated",
            "Your QR code has been created successfully.",
        ));
        Ok(entry)
    }

    /// Encodes the current preview as PNG.
    ///
    /// The exported pixels are the ones on display; nothing is re-rendered.
    pub fn download(&mut self) -> Result<ExportArtifact, StudioError> {
        if self.payload.is_empty() {
            return Err(StudioError::EmptyPayload);
        }
        let artifact = self.exporter.export(&self.surface).inspect_err(|err| {
            warn!(error = %err, "export aborted");
        })?;
        self.notifier.notify(Notice::new(
            "Download Complete",
            "Your QR code has been downloaded.",
        ));
        Ok(artifact)
    }

    /// Downloads into `dir` and returns the written path.
    pub fn save_download(&mut self, dir: impl AsRef<Path>) -> Result<PathBuf, StudioError> {
        let artifact = self.download()?;
        Ok(artifact.save_to(dir)?)
    }

    /// Makes a history entry's payload active again. Style is left unchanged.
    ///
    /// Returns `None` if no entry has that id.
    pub fn restore(&mut self, id: &str) -> Option<Payload> {
        let payload = self.history.restore(self.history.get(id)?);
        self.payload = payload.clone();
        self.refresh();
        self.notifier.notify(Notice::new(
            "Loaded from History",
            "Previous QR code settings restored.",
        ));
        Some(payload)
    }
}

impl<R: HistoryRepository, N: Notifier> Configurable for Studio<R, N> {
    fn apply_profile(&mut self, profile: &StudioProfile) {
        self.style = profile.style.to_config();
        if let Some(url) = &profile.url {
            self.payload = Payload::new(url.clone());
        }
        self.logo = profile.logo.as_ref().map(|logo| logo.to_spec(&self.style));
        self.refresh();
    }

    fn export_profile(&self) -> StudioProfile {
        StudioProfile {
            url: Some(self.payload.as_str().to_string()),
            style: StyleSettings::from(&self.style),
            logo: self.logo.as_ref().map(LogoSettings::from),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
