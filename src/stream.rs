//! Streaming extraction API: emit each record family as its pass completes.
//!
//! ## Why stream?
//!
//! PDF passes reread the whole document, so "all" mode on a long program
//! takes a while. A stream lets callers show the quick families right away
//! and report each failure against the family that caused it.
//!
//! Unlike the eager [`crate::extract::extract`], which aborts on the first
//! failed pass, [`extract_stream`] yields every pass's result. Items arrive
//! in completion order; collect [`Records`] into an
//! [`crate::output::ExtractionData`] to get the fixed family order back.
//! Progress callbacks fire per pass; `on_extraction_complete` does not, the
//! end of the stream is the completion signal.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extract::run_pass;
use crate::kind::{ExtractionKind, KindRequest};
use crate::output::Records;
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// One finished pass.
pub type PassResult = (ExtractionKind, Result<Records, ExtractError>);

/// A boxed stream of pass results.
pub type PassStream = Pin<Box<dyn Stream<Item = PassResult> + Send>>;

/// Extract the requested families, streaming each pass as it finishes.
///
/// # Returns
/// - `Ok(PassStream)`: one item per requested family
/// - `Err(ExtractError)`: the input could not be resolved
///
/// # Example
/// ```rust,no_run
/// use curriculum_extract::{extract_stream, ExtractionConfig, KindRequest};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut passes = extract_stream("programa.pdf", KindRequest::All, &ExtractionConfig::default()).await?;
/// while let Some((kind, result)) = passes.next().await {
///     match result {
///         Ok(records) => println!("{kind}: {} records", records.len()),
///         Err(e) => eprintln!("{kind}: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_stream(
    input_str: impl AsRef<str>,
    kind: impl Into<KindRequest>,
    config: &ExtractionConfig,
) -> Result<PassStream, ExtractError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming extraction: {}", input_str);

    let kinds = kind.into().kinds();
    // Downloads live in a TempDir owned by the resolved input; every pass
    // holds a handle so the file outlives the last one.
    let resolved = Arc::new(input::resolve_input(input_str, config.download_timeout_secs).await?);

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(&kinds);
    }

    let concurrency = config.concurrency;
    let config = config.clone();
    let s = stream::iter(kinds.into_iter().map(move |kind| {
        let resolved = Arc::clone(&resolved);
        let cfg = config.clone();
        async move {
            let path = resolved.path().to_path_buf();
            let result = run_pass(path, kind, &cfg).await;
            (kind, result)
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
