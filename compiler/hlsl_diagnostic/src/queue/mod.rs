//! Diagnostic queue: collects diagnostics against a running error count.
//!
//! - Warnings are stored but never counted.
//! - Past the configured error limit, errors are still counted (so the
//!   unit still fails) but no longer stored.
//! - Exact duplicates at the same location are dropped.

use hlsl_ir::Span;

use crate::{Diagnostic, ErrorCode, ErrorGuaranteed};

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DiagnosticConfig {
    /// Maximum number of stored errors (0 = unlimited).
    pub error_limit: usize,
    /// Drop a diagnostic identical to one already stored.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    pub fn with_error_limit(error_limit: usize) -> Self {
        DiagnosticConfig {
            error_limit,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    /// Set once the limit note has been stored.
    limit_noted: bool,
    config: DiagnosticConfig,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            config,
            ..Self::default()
        }
    }

    /// Report an error and get proof it was reported.
    pub fn emit_error(&mut self, diag: Diagnostic) -> ErrorGuaranteed {
        debug_assert!(diag.is_error(), "emit_error called with {:?}", diag.severity);
        self.error_count += 1;
        if self.limit_reached_before_this() {
            if !self.limit_noted {
                self.limit_noted = true;
                let span = diag.primary_span().unwrap_or(Span::DUMMY);
                self.diagnostics
                    .push(too_many_errors(self.config.error_limit, span));
            }
        } else {
            self.store(diag);
        }
        ErrorGuaranteed::new()
    }

    /// Report a warning. Warnings do not affect the error count.
    pub fn warn(&mut self, diag: Diagnostic) {
        debug_assert!(!diag.is_error());
        self.warning_count += 1;
        self.store(diag);
    }

    fn store(&mut self, diag: Diagnostic) {
        if self.config.deduplicate && self.diagnostics.contains(&diag) {
            return;
        }
        self.diagnostics.push(diag);
    }

    fn limit_reached_before_this(&self) -> bool {
        self.config.error_limit > 0 && self.error_count > self.config.error_limit
    }

    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Proof of errors, if any were reported.
    pub fn has_errors(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.error_count)
    }

    /// Diagnostics sorted by source position. Clears the queue; the error
    /// count is kept so a caller can still ask whether the unit failed.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        let mut out = std::mem::take(&mut self.diagnostics);
        out.sort_by_key(|d| d.primary_span().map_or(u32::MAX, |s| s.start));
        out
    }

    /// Stored diagnostics in emission order.
    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

/// The "too many errors" note stored once the limit is exceeded.
#[cold]
pub fn too_many_errors(limit: usize, span: Span) -> Diagnostic {
    Diagnostic::error(ErrorCode::E9002)
        .with_message(format!("too many errors: stopped recording after {limit}"))
        .with_label(span, "error limit reached here")
}

#[cfg(test)]
mod tests;
