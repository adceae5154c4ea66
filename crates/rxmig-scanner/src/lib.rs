//! rxmig Source Scanner
//!
//! Parses one TypeScript store file and reports its suspending procedures
//! together with the file-level context later stages need.
//!
//! # Architecture
//!
//! ```text
//! source text → SourceLanguage::parse_strict → Tree
//!                                               ├─ context::collect_context → FileContext
//!                                               └─ methods::collect_methods → Vec<MethodRecord>
//!                                                        ↑
//!                                                   detectors (regex over bodies)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rxmig_scanner::scan_file;
//!
//! let output = scan_file("src/app/projects.store.ts")?;
//! for method in &output.methods {
//!     println!("{} ({}-{})", method.name(), method.start_line(), method.end_line());
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod context;
pub mod detectors;
pub mod error;
pub mod language;
pub mod lexical;
pub mod methods;

pub use error::ScanError;
pub use language::{check_syntax, SourceLanguage};
pub use lexical::{check_balance, Imbalance};

use rxmig_core::{FileContext, MethodRecord};
use std::path::Path;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything the scanner learns about one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutput {
    /// Candidates in source order, line ranges pairwise disjoint
    pub methods: Vec<MethodRecord>,
    /// File-level context
    pub context: FileContext,
}

impl ScanOutput {
    /// Whether the file has nothing to convert
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Scan source text
///
/// Methods already present in the converted set are left out.
///
/// # Errors
/// - `ScanError::UnsupportedExtension` for paths without a grammar
/// - `ScanError::Syntax` when the tree contains error nodes
pub fn scan_source(path: &Path, source: &str) -> Result<ScanOutput, ScanError> {
    let language = SourceLanguage::from_path(path)?;
    let tree = language.parse_strict(source)?;
    let context = context::collect_context(&tree, source);
    let mut methods = methods::collect_methods(&tree, source);

    let found = methods.len();
    methods.retain(|m| !context.is_converted(m.name()));
    if methods.len() < found {
        tracing::debug!(
            path = %path.display(),
            skipped = found - methods.len(),
            "skipping already converted methods"
        );
    }
    tracing::debug!(
        path = %path.display(),
        language = %language,
        candidates = methods.len(),
        state_fields = context.state_fields.len(),
        "scanned file"
    );

    Ok(ScanOutput { methods, context })
}

/// Read and scan a file from disk
///
/// # Errors
/// `ScanError::Io` if the file cannot be read, otherwise as [`scan_source`]
pub fn scan_file(path: impl AsRef<Path>) -> Result<ScanOutput, ScanError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| ScanError::io_error(path, e))?;
    scan_source(path, &source)
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for scanning
    pub use crate::error::ScanError;
    pub use crate::language::SourceLanguage;
    pub use crate::{scan_file, scan_source, ScanOutput};
}
