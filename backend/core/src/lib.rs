//! `uarwatch-core`: data model shared by the audit logging pipeline.
//!
//! Defines the immutable `LogEntry`, the level/category/status taxonomy and
//! the error type used at the pipeline's fallible seams.

pub mod entry;
pub mod error;
pub mod types;

pub use entry::{ClientContext, Details, LogEntry};
pub use error::{AuditError, AuditResult};
pub use types::{AuthAction, DataOperation, LogCategory, LogLevel, LogStatus, ParseTaxonomyError};
