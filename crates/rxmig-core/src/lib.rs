//! rxmig core
//!
//! Shared vocabulary for the rxmig workspace: the records produced by the
//! scanner, the results produced by the classifier and assembler, the error
//! taxonomy, and the run configuration.
//!
//! # Architecture
//!
//! ```text
//! source file → Scanner → MethodRecord + FileContext
//!                             ↓
//!                        Classifier → ClassificationResult
//!                             ↓
//!                        Assembler → ConversionRecord → GenerationResult
//!                             ↓
//!                       Orchestrator → MigrationReport
//! ```
//!
//! Nothing in this crate performs I/O except [`MigrationConfig::from_file`].

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod model;

pub use config::{MigrationConfig, ReportFormat, Thresholds, TypeCheckConfig};
pub use error::{ConfigError, ErrorCategory, FileIssue};
pub use model::{
    Alternative, BodyMarkers, ClassificationResult, ConversionRecord, FileContext,
    GenerationResult, ImportChangeSummary, ImportConflict, ImportEntry, ImportSpecifier,
    ImportTable, ManualReviewItem, MethodHost, MethodRecord, MethodRecordBuilder,
    MigrationReport, MigrationStats, MigrationSummary, Parameter, PatternLabel, ResultType,
    ValidationIssue, ValidationReport,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Marker embedded in generated code that needs a human pass
pub const MANUAL_REVIEW_MARKER: &str = "@rx-migrate:review";

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with rxmig records
    pub use crate::config::{MigrationConfig, ReportFormat, Thresholds};
    pub use crate::error::{ErrorCategory, FileIssue};
    pub use crate::model::{
        ClassificationResult, ConversionRecord, FileContext, GenerationResult, ImportEntry,
        ImportTable, MethodRecord, PatternLabel,
    };
}
