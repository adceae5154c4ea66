//! rxmig Validator
//!
//! Three checkpoints, each producing a [`ValidationReport`]:
//!
//! # Architecture
//!
//! ```text
//!  file on disk / FileProbe
//!        ↓
//!   PreValidator   → exists, extension, size, syntax, candidates, package.json
//!        ↓
//!   (conversion)
//!        ↓
//!   PostValidator  → reparse, imports, rxMethod / error handling / wrappers
//!        ↓
//!   ProgramChecker → TypeChecker (tsc) under a timeout
//! ```
//!
//! Errors block a file; warnings and info never do.
//!
//! [`ValidationReport`]: rxmig_core::ValidationReport

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod manifest;
pub mod post;
pub mod pre;
pub mod program;

pub use error::ValidatorError;
pub use manifest::{
    missing_dependencies, ManifestReader, PackageJsonReader, StaticManifest, REQUIRED_DEPENDENCIES,
};
pub use post::PostValidator;
pub use pre::{FileProbe, PreValidator, MAX_FILE_BYTES};
pub use program::{
    parse_diagnostics, Diagnostic, ProgramChecker, ProgramOutcome, Severity, TscChecker, TypeChecker,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for validation
    pub use crate::error::ValidatorError;
    pub use crate::post::PostValidator;
    pub use crate::pre::{FileProbe, PreValidator};
    pub use crate::program::{ProgramChecker, TypeChecker};
}
