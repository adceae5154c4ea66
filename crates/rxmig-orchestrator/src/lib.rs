//! rxmig Orchestrator
//!
//! Drives a migration run over a project: finds store files, checks them,
//! backs them up, converts them, checks the output, rolls back what failed
//! and reports.
//!
//! # Architecture
//!
//! ```text
//! MigrationTarget
//!       ↓
//! Discovery ──── FileSystem (TokioFs | MemoryFs)
//!       ↓
//! PreValidator ── ManifestReader
//!       ↓
//! BackupMap (sibling <file>.rxmig.bak, blake3-checked)
//!       ↓
//! scan → classify → assemble   (per file, batches joined concurrently)
//!       ↓
//! PostValidator + ProgramChecker
//!       ↓
//! restore failed files → MigrationReport (text | JSON | HTML)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rxmig_orchestrator::prelude::*;
//!
//! init_logging(false);
//! let migrator = Migrator::new(MigrationConfig::new().with_preview(true))?;
//! let report = migrator.run(MigrationTarget::directory("src/app")).await?;
//! println!("{}", ReportFormat::StructuredText.render(&report)?);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backup;
pub mod context;
pub mod discover;
pub mod error;
pub mod fs;
pub mod migrator;
pub mod report;
pub mod telemetry;

pub use backup::{backup_path, BackupEntry, BackupMap};
pub use context::RunContext;
pub use discover::{glob_to_regex, Discovered, Discovery, MigrationTarget};
pub use error::MigrationError;
pub use fs::{FileSystem, MemoryFs, TokioFs};
pub use migrator::Migrator;
pub use report::{render_html, render_markdown, render_text, RenderReport};
pub use telemetry::init_logging;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running migrations
    pub use crate::discover::MigrationTarget;
    pub use crate::error::MigrationError;
    pub use crate::migrator::Migrator;
    pub use crate::report::RenderReport;
    pub use crate::telemetry::init_logging;
    pub use rxmig_core::{MigrationConfig, MigrationReport, ReportFormat};
}
