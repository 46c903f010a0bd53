//! Error types for the curriculum-extract library.
//!
//! Only one error type exists because only one failure mode does: the pass
//! cannot consume its table-row source (bad path, unreadable PDF, malformed
//! JSON, pdfium missing). Everything the row engine itself meets is tolerated:
//!
//! * a label that never appears leaves its field absent from the record;
//! * a heuristic that finds too few tokens sets only what it could derive.
//!
//! [`ExtractError`] therefore surfaces only at the outermost boundary, where
//! [`crate::output::Envelope::from_result`] turns it into the failure envelope.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the curriculum-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file is neither a PDF nor a tabular JSON document.
    #[error("Unsupported document '{path}': first bytes {magic:?} are neither %PDF nor JSON")]
    UnsupportedFormat { path: PathBuf, magic: [u8; 4] },

    // ── Source errors ─────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// A JSON table document did not have the pages → tables → rows shape.
    #[error("Malformed table document '{path}': {detail}")]
    MalformedSource { path: PathBuf, detail: String },

    /// pdfium failed while reading a specific page.
    #[error("Reading page {page} failed: {detail}")]
    PageReadFailed { page: usize, detail: String },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Request errors ────────────────────────────────────────────────────
    /// Unknown extraction kind requested.
    #[error("Unknown extraction kind '{0}'. Expected one of: programa, competencias, raps, proyecto, fases, actividades, todo")]
    UnknownKind(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF sources need a pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Install pdfium system-wide so it is found on the library path.\n\
  • Convert the document's tables to JSON and pass the .json file instead.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
