//! # veld-diag
//!
//! Diagnostic reporting for the Veld front end: structured messages with
//! source code context, buffered collection across passes, colored terminal
//! rendering, and JSON output for IDE integration.

pub mod diagnostic;
pub mod sink;

pub use codespan_reporting::diagnostic::Severity;
pub use codespan_reporting::files::SimpleFiles;
pub use diagnostic::{create_files, Diagnostic, ErrorCode, JsonDiagnostic, JsonLabel};
pub use sink::DiagnosticSink;
