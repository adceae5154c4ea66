//! rxmig Code Generation
//!
//! Produces reactive-pipeline replacements for classified methods and splices
//! them into the source file.
//!
//! # Architecture
//!
//! ```text
//! MethodRecord + PatternLabel
//!        ↓
//!   templates::generate → GeneratedMethod (input, stages, imports, notes)
//!        ↓
//!   render::render      → replacement lines (+ <name>Async wrapper)
//!        ↓
//!   splice::splice      → text with method ranges replaced
//!        ↓
//!   imports::reconcile  → merged import block
//!        ↓
//!   check_balance       → AssemblyOutcome
//! ```
//!
//! Everything here is synchronous and pure over its inputs.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod assembler;
pub mod error;
pub mod imports;
pub mod render;
pub mod splice;
pub mod templates;

pub use assembler::{assemble, AssemblerOptions, AssemblyOutcome, PlannedConversion};
pub use error::CodegenError;
pub use imports::{reconcile, render_imports, sanitize, ReconcileOutcome, RenderOptions};
pub use render::{render, LayoutOptions, RenderedMethod, WRAPPER_SUFFIX};
pub use splice::{splice, LineEdit, Spliced};
pub use templates::{generate, GeneratedMethod, MethodInput, TemplateOptions};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for assembling files
    pub use crate::assembler::{assemble, AssemblerOptions, AssemblyOutcome, PlannedConversion};
    pub use crate::error::CodegenError;
    pub use crate::imports::{reconcile, ReconcileOutcome};
}
