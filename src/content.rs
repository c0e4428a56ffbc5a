//! Turning user content into the payload string that gets encoded.
//!
//! Typed text is used as-is. Uploaded files are embedded as a
//! `data:<mime>;base64,...` blob when they are small enough to scan
//! reliably; larger files are replaced by a human-readable placeholder that
//! does **not** carry the file bytes.

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ContentError;
use crate::notify::Notice;

/// Files up to this many bytes are embedded inline.
pub const INLINE_LIMIT_BYTES: u64 = 500 * 1024;

// ============================================================================
// Payload
// ============================================================================

/// The content string encoded into the symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes an inline data blob back into its MIME type and bytes.
    ///
    /// Returns `None` for URLs, placeholders and anything else that is not a
    /// base64 data blob.
    pub fn decode_inline(&self) -> Option<InlineBlob> {
        InlineBlob::parse(&self.0)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Inline data blobs
// ============================================================================

/// A decoded `data:<mime>;base64,<bytes>` blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineBlob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InlineBlob {
    /// Encodes bytes as a self-describing data blob.
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(bytes))
    }

    /// Parses a base64 data blob. Returns `None` if `value` is not one.
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        let bytes = STANDARD.decode(data).ok()?;
        Some(Self {
            mime: mime.to_string(),
            bytes,
        })
    }
}

/// Guesses a MIME type from a file name, falling back to
/// `application/octet-stream`.
pub fn mime_for_name(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

// ============================================================================
// Input
// ============================================================================

/// A file chosen by the user.
///
/// The size is tracked apart from the bytes: a file too large to embed is
/// known by name and size only, and its contents are never loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name without directories, as shown to the user.
    pub name: String,
    /// MIME type reported by the picker, if any.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
    size: u64,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// An upload whose contents were not read.
    pub(crate) fn unread(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes: Vec::new(),
            size,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Size of the file on disk, whether or not its bytes were loaded.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// True when [`bytes`](Self::bytes) holds the whole file.
    pub fn is_loaded(&self) -> bool {
        self.bytes.len() as u64 == self.size
    }

    /// The reported MIME type, or one guessed from the file name.
    pub fn mime(&self) -> String {
        match &self.mime {
            Some(mime) if !mime.is_empty() => mime.clone(),
            _ => mime_for_name(&self.name),
        }
    }
}

/// Reads a whole file from disk into a [`FileUpload`].
///
/// Reads are independent; when several overlap, whichever result the caller
/// applies last wins.
pub async fn read_upload(path: impl AsRef<Path>) -> Result<FileUpload, ContentError> {
    let path = path.as_ref();
    let name = upload_name(path)?;
    let bytes = tokio::fs::read(path).await.map_err(|source| read_error(path, source))?;
    debug!(name, size = bytes.len(), "read upload");
    Ok(FileUpload::new(name, bytes))
}

fn upload_name(path: &Path) -> Result<String, ContentError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or(ContentError::MissingName)
}

fn read_error(path: &Path, source: std::io::Error) -> ContentError {
    ContentError::Read {
        path: path.to_path_buf(),
        source,
    }
}

/// Raw content as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentInput {
    /// Typed text, usually a URL. Never validated.
    Url(String),
    /// An uploaded file.
    File(FileUpload),
}

// ============================================================================
// Resolution
// ============================================================================

/// Which strategy produced a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOutcome {
    /// Typed text taken verbatim.
    Typed,
    /// File bytes embedded as a data blob.
    Embedded { name: String },
    /// File too large; only a placeholder was encoded.
    Placeholder { name: String, size: u64 },
}

impl ContentOutcome {
    /// The notice to show for this outcome. Typed text needs none.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Typed => None,
            Self::Embedded { name } => Some(Notice::new(
                "File Added",
                format!("{name} has been encoded in your QR code."),
            )),
            Self::Placeholder { .. } => Some(Notice::destructive(
                "Large File Detected",
                "Large files need to be hosted online to be accessible via QR code.",
            )),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// Result of [`ContentResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub payload: Payload,
    pub outcome: ContentOutcome,
}

/// Applies the size-based strategy that turns [`ContentInput`] into a [`Payload`].
#[derive(Debug, Clone, Copy)]
pub struct ContentResolver {
    inline_limit: u64,
}

impl Default for ContentResolver {
    fn default() -> Self {
        Self {
            inline_limit: INLINE_LIMIT_BYTES,
        }
    }
}

impl ContentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inline_limit(&self) -> u64 {
        self.inline_limit
    }

    /// Reads a content file, loading its bytes only if they can be embedded.
    ///
    /// Files over the inline limit are returned unread, carrying just their
    /// name and size for the placeholder.
    pub async fn read_file(&self, path: impl AsRef<Path>) -> Result<FileUpload, ContentError> {
        let path = path.as_ref();
        let name = upload_name(path)?;
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|source| read_error(path, source))?
            .len();

        if size > self.inline_limit {
            debug!(name, size, "skipping read of oversized file");
            return Ok(FileUpload::unread(name, size));
        }
        read_upload(path).await
    }

    pub fn resolve(&self, input: &ContentInput) -> Resolution {
        match input {
            ContentInput::Url(text) => Resolution {
                payload: Payload::new(text.clone()),
                outcome: ContentOutcome::Typed,
            },
            ContentInput::File(upload) => self.resolve_file(upload),
        }
    }

    fn resolve_file(&self, upload: &FileUpload) -> Resolution {
        let size = upload.size();
        if size <= self.inline_limit && upload.is_loaded() {
            debug!(name = %upload.name, size, "embedding file inline");
            Resolution {
                payload: Payload::new(InlineBlob::encode(&upload.mime(), &upload.bytes)),
                outcome: ContentOutcome::Embedded {
                    name: upload.name.clone(),
                },
            }
        } else {
            debug!(name = %upload.name, size, "file too large, encoding placeholder");
            Resolution {
                payload: Payload::new(placeholder(&upload.name, size)),
                outcome: ContentOutcome::Placeholder {
                    name: upload.name.clone(),
                    size,
                },
            }
        }
    }
}

/// `File: <name> (<size> KB)` with the size in KiB to two decimals.
fn placeholder(name: &str, size: u64) -> String {
    format!("File: {name} ({:.2} KB)", size as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;

    #[test]
    fn url_is_taken_verbatim() {
        let resolver = ContentResolver::new();
        let input = ContentInput::Url("not really a url ::".into());
        let first = resolver.resolve(&input);
        let second = resolver.resolve(&input);

        assert_eq!(first.payload.as_str(), "not really a url ::");
        assert_eq!(first, second);
        assert_eq!(first.outcome, ContentOutcome::Typed);
        assert!(first.outcome.notice().is_none());
    }

    #[test]
    fn small_file_is_embedded_and_decodes_exactly() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let upload = FileUpload::new("notes.txt", bytes.clone());
        let resolution = ContentResolver::new().resolve(&ContentInput::File(upload));

        assert!(resolution.payload.as_str().starts_with("data:text/plain;base64,"));
        let blob = resolution.payload.decode_inline().unwrap();
        assert_eq!(blob.mime, "text/plain");
        assert_eq!(blob.bytes, bytes);

        let notice = resolution.outcome.notice().unwrap();
        assert_eq!(notice.title, "File Added");
        assert_eq!(notice.severity, Severity::Default);
    }

    #[test]
    fn file_at_exact_limit_is_embedded() {
        let upload = FileUpload::new("edge.bin", vec![7; INLINE_LIMIT_BYTES as usize]);
        let resolution = ContentResolver::new().resolve(&ContentInput::File(upload));
        assert!(matches!(resolution.outcome, ContentOutcome::Embedded { .. }));
        assert_eq!(resolution.payload.decode_inline().unwrap().bytes.len(), 500 * 1024);
    }

    #[test]
    fn large_file_becomes_placeholder() {
        let upload = FileUpload::new("report.pdf", vec![0; 600 * 1024]);
        let resolution = ContentResolver::new().resolve(&ContentInput::File(upload));

        assert_eq!(resolution.payload.as_str(), "File: report.pdf (600.00 KB)");
        assert!(resolution.payload.decode_inline().is_none());
        assert!(resolution.outcome.is_degraded());

        let notice = resolution.outcome.notice().unwrap();
        assert_eq!(notice.title, "Large File Detected");
        assert!(notice.is_destructive());
    }

    #[test]
    fn placeholder_rounds_to_two_decimals() {
        let upload = FileUpload::new("a.zip", vec![0; INLINE_LIMIT_BYTES as usize + 1]);
        let resolution = ContentResolver::new().resolve(&ContentInput::File(upload));
        assert_eq!(resolution.payload.as_str(), "File: a.zip (500.00 KB)");
    }

    #[test]
    fn reported_mime_wins_over_guess() {
        let upload = FileUpload::new("blob", vec![1, 2, 3]).with_mime("image/png");
        assert_eq!(upload.mime(), "image/png");
        assert_eq!(FileUpload::new("blob", vec![]).mime(), "application/octet-stream");
    }

    #[test]
    fn non_blob_payloads_do_not_decode() {
        assert!(Payload::from("https://example.com").decode_inline().is_none());
        assert!(Payload::from("data:text/plain,hello").decode_inline().is_none());
    }

    #[tokio::test]
    async fn read_upload_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, b"hello").unwrap();

        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.name, "hello.txt");
        assert_eq!(upload.bytes, b"hello");
    }

    #[tokio::test]
    async fn oversized_file_is_never_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(50 * 1024 * 1024).unwrap();

        let resolver = ContentResolver::new();
        let upload = resolver.read_file(&path).await.unwrap();
        assert_eq!(upload.size(), 50 * 1024 * 1024);
        assert!(upload.bytes.is_empty());
        assert!(!upload.is_loaded());

        let resolution = resolver.resolve(&ContentInput::File(upload));
        assert_eq!(resolution.payload.as_str(), "File: big.bin (51200.00 KB)");
    }

    #[tokio::test]
    async fn small_file_is_read_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.vcf");
        std::fs::write(&path, b"BEGIN:VCARD").unwrap();

        let upload = ContentResolver::new().read_file(&path).await.unwrap();
        assert!(upload.is_loaded());
        assert_eq!(upload.bytes, b"BEGIN:VCARD");
    }

    #[tokio::test]
    async fn read_upload_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_upload(dir.path().join("missing.txt")).await.unwrap_err();
        assert!(matches!(err, ContentError::Read { .. }));
    }
}
