//! Eager extraction entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: run every requested pass, then
//! return one [`ExtractionData`]. Use [`crate::stream::extract_stream`]
//! instead when you want each family as soon as its pass finishes.
//!
//! Passes never share a source. In "all" mode each pass opens its own
//! [`TableSource`] on the blocking pool, at most `config.concurrency` at a
//! time, and the results are reassembled in the fixed family order.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extractors::run_kind;
use crate::kind::{ExtractionKind, KindRequest};
use crate::output::{Envelope, ExtractionData, Records};
use crate::pipeline::{input, open_source, Document, DocumentShape, TableSource};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract the requested record families from a file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`: Local path or HTTP/HTTPS URL to a `.json` or PDF document
/// * `kind`: One family, or [`KindRequest::All`]
/// * `config`: Extraction configuration
///
/// # Errors
/// The first pass that fails aborts the whole extraction: no partial
/// `data` is returned.
pub async fn extract(
    input_str: impl AsRef<str>,
    kind: impl Into<KindRequest>,
    config: &ExtractionConfig,
) -> Result<ExtractionData, ExtractError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    let kinds = kind.into().kinds();
    info!("Starting extraction of {} families: {}", kinds.len(), input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(&kinds);
    }

    // ── Step 2: Run passes, at most `concurrency` at once ────────────────
    let results: Vec<(ExtractionKind, Result<Records, ExtractError>)> =
        stream::iter(kinds.iter().map(|&kind| {
            let path = path.clone();
            async move { (kind, run_pass(path, kind, config).await) }
        }))
        .buffered(config.concurrency)
        .collect()
        .await;

    let succeeded = results.iter().filter(|(_, r)| r.is_ok()).count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(results.len(), succeeded);
    }

    // ── Step 3: Assemble in family order ─────────────────────────────────
    let mut data = ExtractionData::default();
    for (kind, result) in results {
        match result {
            Ok(records) => data.insert(records),
            Err(e) => {
                warn!("Pass {} failed: {}", kind, e);
                return Err(e);
            }
        }
    }

    info!(
        "Extraction complete: {} families in {}ms",
        succeeded,
        start.elapsed().as_millis()
    );
    Ok(data)
}

/// Extract and write the success envelope directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files. Nothing
/// is written when extraction fails.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    kind: impl Into<KindRequest>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionData, ExtractError> {
    let envelope = Envelope::ok(extract(input_str, kind, config).await?);
    write_atomic(output_path.as_ref(), envelope.to_json(true)?.as_bytes()).await?;
    Ok(envelope.data.unwrap_or_default())
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    kind: impl Into<KindRequest>,
    config: &ExtractionConfig,
) -> Result<ExtractionData, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, kind, config))
}

/// Extract from document bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed on
/// return. With [`crate::SourceFormat::Auto`] the format is sniffed from the
/// leading bytes.
///
/// # Example
/// ```rust,no_run
/// use curriculum_extract::{extract_from_bytes, ExtractionConfig, KindRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("programa.pdf")?;
/// let data = extract_from_bytes(&bytes, KindRequest::All, &ExtractionConfig::default()).await?;
/// println!("{:?}", data.kinds());
/// # Ok(())
/// # }
/// ```
pub async fn extract_from_bytes(
    bytes: &[u8],
    kind: impl Into<KindRequest>,
    config: &ExtractionConfig,
) -> Result<ExtractionData, ExtractError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(&path, kind, config).await
}

/// Run passes over an in-memory document. Pure: no I/O, no runtime.
pub fn extract_document(
    document: &Document,
    kind: impl Into<KindRequest>,
) -> Result<ExtractionData, ExtractError> {
    kind.into()
        .kinds()
        .into_iter()
        .map(|kind| run_kind(kind, &mut document.clone()))
        .collect()
}

/// Count pages, tables and rows of a source without running any pass.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<DocumentShape, ExtractError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let mut source = open_source(&path, &config)?;
        shape_of(source.as_mut())
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Inspect task panicked: {e}")))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// One pass on the blocking pool, with progress events.
pub(crate) async fn run_pass(
    path: PathBuf,
    kind: ExtractionKind,
    config: &ExtractionConfig,
) -> Result<Records, ExtractError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_pass_start(kind);
    }

    let task_config = config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut source = open_source(&path, &task_config)?;
        run_kind(kind, source.as_mut())
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Pass {kind} panicked: {e}")))
    .and_then(|r| r);

    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(records) => cb.on_pass_complete(kind, records.len()),
            Err(e) => cb.on_pass_error(kind, &e.to_string()),
        }
    }
    result
}

fn shape_of<S: TableSource + ?Sized>(source: &mut S) -> Result<DocumentShape, ExtractError> {
    let mut shape = DocumentShape::default();
    for page in source.pages() {
        let page = page?;
        shape.pages += 1;
        shape.tables += page.tables.len();
        shape.rows += page.tables.iter().map(|t| t.rows.len()).sum::<usize>();
    }
    debug!("Shape: {:?}", shape);
    Ok(shape)
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ExtractError> {
    let write_failed = |source| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)
}
