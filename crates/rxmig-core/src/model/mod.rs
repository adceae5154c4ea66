//! Records passed between the pipeline stages
//!
//! - [`method`]: candidate methods and their parameters
//! - [`context`]: per-file context
//! - [`imports`]: import tables
//! - [`results`]: classification, conversion, validation and file results
//! - [`report`]: run-level report

pub mod context;
pub mod imports;
pub mod method;
pub mod report;
pub mod results;

pub use context::{FileContext, DEFAULT_STATE_CONTAINER};
pub use imports::{ImportEntry, ImportSpecifier, ImportTable};
pub use method::{
    BodyMarkers, MethodHost, MethodRecord, MethodRecordBuilder, Parameter, PatternLabel,
    ResultType,
};
pub use report::{ManualReviewItem, MigrationReport, MigrationStats, MigrationSummary};
pub use results::{
    Alternative, ClassificationResult, ConversionRecord, GenerationResult, ImportChangeSummary,
    ImportConflict, ValidationIssue, ValidationReport,
};
