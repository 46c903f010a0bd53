//! # curriculum-extract
//!
//! Extract structured curriculum records from semi-structured tabular
//! documents: program metadata, competency units, learning-outcome (RAP)
//! bundles, formative-project information, project phases and activities.
//!
//! ## Why rows?
//!
//! Curriculum documents are long tables whose labels and values move between
//! columns, wrap across rows and repeat across pages. Cell geometry is
//! unreliable, but the order of rows is not. Every extractor therefore reads
//! the document as one stream of rows and drives a small state machine:
//! a label opens a record or fills a field, a section marker opens or closes
//! a capture region, and the stream end flushes the last record.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Source   .json tables, or pdfium text grouped into rows (spawn_blocking)
//!  ├─ 3. Passes   one state machine per record family, one source each
//!  ├─ 4. Data     records assembled under fixed keys
//!  └─ 5. Output   {"success": true, "data": …} envelope
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use curriculum_extract::{extract, Envelope, ExtractionConfig, KindRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let result = extract("programa.pdf", KindRequest::All, &config).await;
//!     println!("{}", Envelope::from_result(result).to_json(true)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `curext` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! curriculum-extract = { version = "0.3", default-features = false }
//! ```
//!
//! ## Record Families
//!
//! | Kind | `data` key | One record per |
//! |------|------------|----------------|
//! | `programa`     | `programa`     | program edition |
//! | `competencias` | `competencias` | competency unit |
//! | `raps`         | `unidadRaps`   | competency unit's learning outcomes |
//! | `proyecto`     | `proyecto`     | formative project |
//! | `fases`        | `fases`        | canonical phase present |
//! | `actividades`  | `actividades`  | activity row with outcome codes |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod extractors;
pub mod fields;
pub mod kind;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod structure;
pub mod text;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageSelection, SourceFormat};
pub use error::ExtractError;
pub use extract::{extract, extract_document, extract_from_bytes, extract_sync, extract_to_file, inspect};
pub use kind::{ExtractionKind, KindRequest};
pub use output::{
    ActivityRecord, CompetencyRecord, Envelope, ExtractionData, PhaseRecord, ProgramRecord, ProjectRecord,
    RapUnitRecord, Records,
};
pub use pipeline::{Document, DocumentShape, Page, Table, TableSource};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{extract_stream, PassResult, PassStream};
pub use structure::{RapSummary, StructuredRap, StructuredUnit};
