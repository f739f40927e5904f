//! HLSL semantic analysis and AST lowering.
//!
//! The parser drives a [`SemaContext`] with one handler call per grammar
//! construct. Handlers type-check, convert, resolve overloads and lower
//! HLSL-only constructs (resource methods, structured buffers, interstage
//! IO structs, entry-point signatures) into a typed node tree that a
//! SPIR-V-style code generator consumes directly.
//!
//! # Main Entry Points
//!
//! - [`SemaContext::new`]: one context per compilation unit
//! - `handle_*` methods: one per grammar construct
//! - [`SemaContext::finish`]: entry wrapper, linkage and locations
//!
//! ```text
//! parser ──handle_*──▶ SemaContext ──finish──▶ SemaResult
//!                         │                       ├── LoweredUnit
//!                         ├── builtins            │   nodes, symbols,
//!                         ├── convert/overload    │   linkage, exec modes
//!                         ├── flatten/split       └── diagnostics
//!                         └── intrinsics
//! ```

mod builtins;
mod context;
mod convert;
mod entry;
mod error;
mod finish;
mod flatten;
mod handlers;
mod intrinsics;
mod layout;
mod lvalue;
mod options;
mod overload;
mod split;

use std::sync::Once;

pub use context::SemaContext;
pub use convert::{better, can_implicitly_promote, convertible, ConversionMode};
pub use entry::{DepthMode, EntryAttribute, OutputTopology, Partitioning};
pub use error::SemaError;
pub use finish::{CallEdge, ExecutionModes, LinkageVar, LoweredUnit, SemaResult};
pub use handlers::{BufferKind, ParamDecl};
pub use layout::{
    base_alignment, io_location_size, MAX_BINDING, MAX_COMPONENT, MAX_LOCATION, MAX_SET,
};
pub use options::SemaOptions;
pub use overload::{select_function, select_with_fallback, Candidate, Selection};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once. Enable with `RUST_LOG=hlsl_sema=debug`
/// (handler and finish spans) or `RUST_LOG=hlsl_sema=trace` (conversions
/// and intrinsic rewrites).
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

#[cfg(test)]
mod test_support;
