//! Intermediate representation for the HLSL semantic stage.
//!
//! Everything here is plain data: spans, interned names, type descriptors
//! and qualifiers, the content-addressed struct registry, the node arena and
//! the scoped symbol table. Analysis lives in `hlsl_sema`.

/// Compile-time size assertion for hot IR types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod ast;
mod interner;
mod qualifier;
mod span;
mod structs;
mod symbol;
mod types;

pub use ast::{
    BranchKind, ConstRange, ConstValue, LoopControl, NodeArena, NodeId, NodeKind, NodeRange, Op,
};
pub use interner::{Name, StringInterner};
pub use qualifier::{
    AuxFlags, BuiltIn, Interpolation, Layout, MatrixLayout, MemoryFlags, Packing, Qualifier,
    RegisterClass, Stage, Storage,
};
pub use span::Span;
pub use structs::{Member, StructDef, StructId, StructRegistry};
pub use symbol::{
    FunctionSig, Param, Symbol, SymbolId, SymbolKind, SymbolTable, BUILTIN_LEVEL, GLOBAL_LEVEL,
};
pub use types::{
    ArrayDim, ArraySizes, BasicType, Dim, ResourceKind, Sampler, Shape, Topology, Type,
    TypeDisplay,
};

static_assert_size!(NodeId, 4);
static_assert_size!(SymbolId, 4);
