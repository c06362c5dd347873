//! Error types for the pdf2turnus library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TurnusError`] — **Fatal**: the run cannot proceed at all (missing or
//!   unreadable PDF, unknown template version, rasterisation failure).
//!   Returned as `Err(TurnusError)` from the top-level entry points; no
//!   partial output is produced.
//!
//! * [`DutyImageError`] — **Non-fatal**: generating the cropped image for a
//!   single duty failed, but the batch continues. Collected into
//!   [`crate::images::ImageBatchReport`] so callers can report errored
//!   counts without discarding completed work.
//!
//! Token-level problems (a token landing outside every cell rectangle, an
//! unparseable clock time) are not errors at all — they are silently skipped
//! per the placement rules, so a single stray token never aborts a page.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2turnus library.
///
/// Per-duty image failures use [`DutyImageError`] and are stored in
/// [`crate::images::ImageBatchReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum TurnusError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// A page index past the end of the document was requested.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render failed to rasterise a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// pdfium-render failed to extract positioned text from a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// No built-in template constants exist for the requested version id.
    #[error("Unknown template version '{version}'\nKnown versions: {known}")]
    UnknownTemplate { version: String, known: String },

    /// Template validation failed (overlapping or unordered geometry bands).
    #[error("Invalid template configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure while generating the cropped image for one duty.
///
/// Stored in [`crate::images::ImageBatchReport::errors`]; the batch
/// continues with the remaining duties.
#[derive(Debug, Clone, Error, serde::Serialize)]
pub enum DutyImageError {
    /// Cropping produced an empty or degenerate region.
    #[error("duty {duty}: degenerate crop region ({detail})")]
    BadCropRegion { duty: String, detail: String },

    /// The PNG could not be written.
    #[error("duty {duty}: failed to write '{path}': {detail}")]
    WriteFailed {
        duty: String,
        path: PathBuf,
        detail: String,
    },
}
