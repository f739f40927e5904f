//! Grammar-facing handlers.
//!
//! The parser drives analysis with one call per construct, passing operand
//! nodes it already built. Every handler returns a typed node (or symbol);
//! on error it reports through the context's diagnostics queue and returns
//! a placeholder so the parser can keep going.
//!
//! ```text
//! handlers
//! ├── variables      identifier references, the $Global block
//! ├── declarations   structs, variables, cbuffers, structured buffers
//! ├── functions      declarators, definitions, calls
//! ├── operators      unary/binary math and assignment
//! ├── dereference    `[]` and `.` (members, swizzles, resource elements)
//! ├── constructors   type constructors and casts
//! ├── statements     selection, switch, loops, branches, blocks
//! └── semantics      `: SEMANTIC` and geometry input modifiers
//! ```

mod constructors;
mod declarations;
mod dereference;
mod functions;
mod operators;
mod semantics;
mod statements;
mod variables;

pub use declarations::BufferKind;
pub use functions::ParamDecl;

#[cfg(test)]
mod tests;
