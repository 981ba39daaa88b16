//! Buffered diagnostic collection
//!
//! The semantic passes report into a [`DiagnosticSink`] instead of printing
//! directly. Buffering lets a pass that visits the tree out of source order
//! (forward declarations, deferred generic specializations) still present
//! its diagnostics sorted by source position, and gives callers one place
//! to ask "did anything fail".

use crate::diagnostic::Diagnostic;
use codespan_reporting::diagnostic::Severity;
use codespan_reporting::files::SimpleFiles;

struct Buffered {
    /// Report order, used to break ties between equal spans.
    seq: usize,
    diag: Diagnostic,
}

/// Collects diagnostics across passes.
#[derive(Default)]
pub struct DiagnosticSink {
    buffered: Vec<Buffered>,
    error_count: usize,
    warning_count: usize,
    /// When set, errors at or beyond this count are dropped.
    error_limit: Option<usize>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        DiagnosticSink::default()
    }

    /// Create a sink that stops recording errors after `limit` of them.
    /// The error count keeps incrementing so `has_errors` stays accurate.
    pub fn with_error_limit(limit: usize) -> Self {
        DiagnosticSink { error_limit: Some(limit), ..DiagnosticSink::default() }
    }

    /// Report a diagnostic.
    pub fn report(&mut self, diag: Diagnostic) {
        match diag.severity() {
            Severity::Error | Severity::Bug => {
                self.error_count += 1;
                if let Some(limit) = self.error_limit {
                    if self.error_count > limit {
                        return;
                    }
                }
            }
            Severity::Warning => self.warning_count += 1,
            _ => {}
        }
        self.buffered.push(Buffered { seq: self.buffered.len(), diag });
    }

    /// Number of errors reported so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Number of warnings reported so far.
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// True if at least one error has been reported.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Drain the buffer in source order: by primary span start, then by
    /// report order. Diagnostics without a span sort first.
    pub fn take_sorted(&mut self) -> Vec<Diagnostic> {
        let mut buffered = std::mem::take(&mut self.buffered);
        buffered.sort_by_key(|b| {
            (b.diag.primary_span().map(|s| s.start).unwrap_or(0), b.seq)
        });
        buffered.into_iter().map(|b| b.diag).collect()
    }

    /// Emit every buffered diagnostic to stderr in source order.
    pub fn emit_all(
        &mut self,
        files: &SimpleFiles<String, String>,
    ) -> Result<(), codespan_reporting::files::Error> {
        for diag in self.take_sorted() {
            diag.emit(files)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::ErrorCode;
    use veld_ast::Span;

    #[test]
    fn test_counts_by_severity() {
        let mut sink = DiagnosticSink::new();
        sink.report(Diagnostic::error("e1"));
        sink.report(Diagnostic::warning("w1"));
        sink.report(Diagnostic::error("e2"));
        assert_eq!(sink.error_count(), 2);
        assert_eq!(sink.warning_count(), 1);
        assert!(sink.has_errors());
    }

    #[test]
    fn test_sorted_by_source_position() {
        let mut sink = DiagnosticSink::new();
        sink.report(
            Diagnostic::error("late").with_primary_label(0, Span::new(40, 42, 3, 1), ""),
        );
        sink.report(
            Diagnostic::error("early").with_primary_label(0, Span::new(5, 8, 1, 6), ""),
        );
        sink.report(
            Diagnostic::error("early-tie").with_primary_label(0, Span::new(5, 8, 1, 6), ""),
        );
        let sorted = sink.take_sorted();
        let messages: Vec<_> = sorted.iter().map(|d| d.message().to_string()).collect();
        assert_eq!(messages, vec!["early", "early-tie", "late"]);
    }

    #[test]
    fn test_error_limit_drops_but_counts() {
        let mut sink = DiagnosticSink::with_error_limit(1);
        sink.report(Diagnostic::error("kept").with_code(ErrorCode("E1001")));
        sink.report(Diagnostic::error("dropped"));
        assert_eq!(sink.error_count(), 2);
        assert_eq!(sink.take_sorted().len(), 1);
    }
}
