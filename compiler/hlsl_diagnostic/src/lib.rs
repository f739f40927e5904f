//! Diagnostics for the HLSL front-end.
//!
//! Every analyzer error is a [`Diagnostic`] carrying a structured
//! [`ErrorCode`], reported through a [`DiagnosticQueue`] that keeps the
//! running error count. A non-zero count is the only fatal condition for a
//! compilation unit.
//!
//! ```text
//! let guarantee = queue.emit_error(diagnostic);
//! fn finish(self) -> Result<LoweredUnit, ErrorGuaranteed> { ... }
//! ```

mod diagnostic;
mod error_code;
mod guarantee;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
