//! Typed AST produced by semantic analysis.
//!
//! Nodes live in a [`NodeArena`] using struct-of-arrays layout (parallel
//! `kinds`, `spans`, `types` vectors indexed by [`NodeId`]). Children are
//! referenced by id, never boxed, so a later pass can replace one node's
//! content in place without invalidating any other holder of its id.

use crate::{SymbolId, Span, Type};

/// Index of a node in the [`NodeArena`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Contiguous range of child ids in the arena's list storage.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct NodeRange {
    start: u32,
    len: u32,
}

impl NodeRange {
    pub const EMPTY: NodeRange = NodeRange { start: 0, len: 0 };

    pub fn len(self) -> usize {
        self.len as usize
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Contiguous range of constant components.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ConstRange {
    start: u32,
    len: u32,
}

impl ConstRange {
    pub fn len(self) -> usize {
        self.len as usize
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// One constant component. Floats are stored as bits so the value is
/// `Eq + Hash`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(u64),
}

impl ConstValue {
    pub fn float(v: f64) -> Self {
        ConstValue::Float(v.to_bits())
    }

    #[expect(clippy::cast_precision_loss, reason = "constant folding follows C rules")]
    pub fn as_f64(self) -> f64 {
        match self {
            ConstValue::Bool(b) => f64::from(u8::from(b)),
            ConstValue::Int(i) => i as f64,
            ConstValue::Uint(u) => u as f64,
            ConstValue::Float(bits) => f64::from_bits(bits),
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "constant folding follows C rules"
    )]
    pub fn as_i64(self) -> i64 {
        match self {
            ConstValue::Bool(b) => i64::from(b),
            ConstValue::Int(i) => i,
            ConstValue::Uint(u) => u as i64,
            ConstValue::Float(bits) => f64::from_bits(bits) as i64,
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            ConstValue::Bool(b) => b,
            ConstValue::Int(i) => i != 0,
            ConstValue::Uint(u) => u != 0,
            ConstValue::Float(bits) => f64::from_bits(bits) != 0.0,
        }
    }
}

/// Operators: primitive operations handed to the backend plus the
/// source-level intrinsics and methods that are decomposed before output.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Op {
    // === Structure ===
    Null,
    Sequence,
    Comma,
    Function,
    Parameters,
    FunctionCall,
    LinkerObjects,
    Construct,

    // === Unary ===
    Negative,
    LogicalNot,
    BitwiseNot,
    PostIncrement,
    PostDecrement,
    PreIncrement,
    PreDecrement,
    Convert(crate::BasicType),

    // === Binary ===
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    LeftShift,
    RightShift,
    And,
    InclusiveOr,
    ExclusiveOr,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    VectorTimesScalar,
    VectorTimesMatrix,
    MatrixTimesVector,
    MatrixTimesScalar,
    MatrixTimesMatrix,
    IndexDirect,
    IndexIndirect,
    IndexDirectStruct,
    VectorSwizzle,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    InclusiveOrAssign,
    ExclusiveOrAssign,
    LeftShiftAssign,
    RightShiftAssign,

    // === Primitive intrinsics ===
    Sin,
    Cos,
    Tan,
    Pow,
    Exp,
    Log,
    Exp2,
    Log2,
    Sqrt,
    InverseSqrt,
    Abs,
    Sign,
    Floor,
    Ceil,
    Fract,
    Min,
    Max,
    Clamp,
    Mix,
    Step,
    SmoothStep,
    Length,
    Distance,
    Dot,
    Cross,
    Normalize,
    Reflect,
    Transpose,
    Determinant,
    Any,
    All,
    Ddx,
    Ddy,
    Barrier,
    MemoryBarrier,
    GroupMemoryBarrier,
    EmitVertex,
    EndPrimitive,
    AtomicAdd,
    AtomicMin,
    AtomicMax,
    AtomicAnd,
    AtomicOr,
    AtomicXor,
    AtomicExchange,
    AtomicCompSwap,
    ImageLoad,
    ImageStore,
    ImageQuerySize,
    ImageAtomicAdd,
    ImageAtomicMin,
    ImageAtomicMax,
    ImageAtomicAnd,
    ImageAtomicOr,
    ImageAtomicXor,
    ImageAtomicExchange,
    ImageAtomicCompSwap,
    ConstructTextureSampler,
    Texture,
    TextureBias,
    TextureLod,
    TextureGrad,
    TextureOffset,
    TextureLodOffset,
    TextureGradOffset,
    TextureFetch,
    TextureFetchOffset,
    TextureGather,
    TextureGatherOffset,
    TextureQuerySize,
    TextureQueryLevels,
    TextureQueryLod,
    TextureQuerySamples,
    ArrayLength,

    // === Source-level intrinsics (decomposed) ===
    GenMul,
    Rcp,
    Saturate,
    SinCos,
    Clip,
    InterlockedAdd,
    InterlockedMin,
    InterlockedMax,
    InterlockedAnd,
    InterlockedOr,
    InterlockedXor,
    InterlockedExchange,
    InterlockedCompareExchange,
    InterlockedCompareStore,

    // === Methods (decomposed) ===
    MethodSample,
    MethodSampleBias,
    MethodSampleCmp,
    MethodSampleCmpLevelZero,
    MethodSampleGrad,
    MethodSampleLevel,
    MethodLoad,
    MethodLoad2,
    MethodLoad3,
    MethodLoad4,
    MethodStore,
    MethodStore2,
    MethodStore3,
    MethodStore4,
    MethodGather,
    MethodGatherRed,
    MethodGatherGreen,
    MethodGatherBlue,
    MethodGatherAlpha,
    MethodGatherCmpRed,
    MethodGatherCmpGreen,
    MethodGatherCmpBlue,
    MethodGatherCmpAlpha,
    MethodGetDimensions,
    MethodCalculateLevelOfDetail,
    MethodIncrementCounter,
    MethodDecrementCounter,
    MethodAppend,
    MethodConsume,
    MethodRestartStrip,
}

impl Op {
    pub fn is_assignment(self) -> bool {
        self == Op::Assign || self.compound_base().is_some()
    }

    /// Arithmetic operator applied by a compound assignment.
    pub fn compound_base(self) -> Option<Op> {
        match self {
            Op::AddAssign => Some(Op::Add),
            Op::SubAssign => Some(Op::Sub),
            Op::MulAssign => Some(Op::Mul),
            Op::DivAssign => Some(Op::Div),
            Op::ModAssign => Some(Op::Mod),
            Op::AndAssign => Some(Op::And),
            Op::InclusiveOrAssign => Some(Op::InclusiveOr),
            Op::ExclusiveOrAssign => Some(Op::ExclusiveOr),
            Op::LeftShiftAssign => Some(Op::LeftShift),
            Op::RightShiftAssign => Some(Op::RightShift),
            _ => None,
        }
    }

    pub fn is_increment(self) -> bool {
        matches!(
            self,
            Op::PreIncrement | Op::PreDecrement | Op::PostIncrement | Op::PostDecrement
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Op::Equal
                | Op::NotEqual
                | Op::LessThan
                | Op::GreaterThan
                | Op::LessThanEqual
                | Op::GreaterThanEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Op::LogicalAnd | Op::LogicalOr | Op::LogicalXor)
    }

    pub fn is_index(self) -> bool {
        matches!(self, Op::IndexDirect | Op::IndexIndirect)
    }

    /// Source-level `Interlocked*` intrinsics.
    pub fn is_interlocked(self) -> bool {
        matches!(
            self,
            Op::InterlockedAdd
                | Op::InterlockedMin
                | Op::InterlockedMax
                | Op::InterlockedAnd
                | Op::InterlockedOr
                | Op::InterlockedXor
                | Op::InterlockedExchange
                | Op::InterlockedCompareExchange
                | Op::InterlockedCompareStore
        )
    }

    /// Texture object methods whose first argument is the texture handle.
    pub fn is_texture_method(self) -> bool {
        matches!(
            self,
            Op::MethodSample
                | Op::MethodSampleBias
                | Op::MethodSampleCmp
                | Op::MethodSampleCmpLevelZero
                | Op::MethodSampleGrad
                | Op::MethodSampleLevel
                | Op::MethodGather
                | Op::MethodGatherRed
                | Op::MethodGatherGreen
                | Op::MethodGatherBlue
                | Op::MethodGatherAlpha
                | Op::MethodGatherCmpRed
                | Op::MethodGatherCmpGreen
                | Op::MethodGatherCmpBlue
                | Op::MethodGatherCmpAlpha
                | Op::MethodCalculateLevelOfDetail
        )
    }

    /// Structured/byte-address buffer methods.
    pub fn is_buffer_method(self) -> bool {
        matches!(
            self,
            Op::MethodLoad2
                | Op::MethodLoad3
                | Op::MethodLoad4
                | Op::MethodStore
                | Op::MethodStore2
                | Op::MethodStore3
                | Op::MethodStore4
                | Op::MethodIncrementCounter
                | Op::MethodDecrementCounter
                | Op::MethodAppend
                | Op::MethodConsume
        )
    }

    /// Operations whose argument 0 is a resource handle that must never be
    /// converted during overload resolution.
    pub fn pins_first_argument(self) -> bool {
        self.is_interlocked()
            || self.is_texture_method()
            || self.is_buffer_method()
            || matches!(self, Op::MethodLoad | Op::MethodGetDimensions)
    }

    /// Component-wise operations whose arguments promote to one common type.
    pub fn is_componentwise(self) -> bool {
        matches!(
            self,
            Op::Min
                | Op::Max
                | Op::Clamp
                | Op::Mix
                | Op::Step
                | Op::SmoothStep
                | Op::Pow
                | Op::Dot
                | Op::Cross
                | Op::Distance
                | Op::Reflect
                | Op::Saturate
                | Op::Rcp
        )
    }
}

/// Kind of a branch node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BranchKind {
    Discard,
    Return,
    Break,
    Continue,
    Case,
    Default,
}

/// Loop unrolling hint from a loop attribute.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum LoopControl {
    #[default]
    None,
    Unroll,
    DontUnroll,
}

/// Node payload.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    /// Reference to a variable. `flatten_subset` marks a partially
    /// dereferenced flattened aggregate: the position reached so far in
    /// that aggregate's offset table.
    Symbol {
        symbol: SymbolId,
        flatten_subset: Option<u32>,
    },
    Constant {
        values: ConstRange,
    },
    Unary {
        op: Op,
        operand: NodeId,
    },
    Binary {
        op: Op,
        left: NodeId,
        right: NodeId,
    },
    /// N-ary operation. `callee` names the function for calls and
    /// definitions.
    Aggregate {
        op: Op,
        args: NodeRange,
        callee: Option<SymbolId>,
    },
    Selection {
        cond: NodeId,
        then_branch: Option<NodeId>,
        else_branch: Option<NodeId>,
    },
    Branch {
        kind: BranchKind,
        value: Option<NodeId>,
    },
    Switch {
        cond: NodeId,
        body: NodeId,
    },
    Loop {
        cond: Option<NodeId>,
        body: Option<NodeId>,
        step: Option<NodeId>,
        test_first: bool,
        control: LoopControl,
    },
    /// Placeholder left behind by a reported error.
    Error,
}

/// Arena for typed nodes.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    kinds: Vec<NodeKind>,
    spans: Vec<Span>,
    types: Vec<Type>,
    lists: Vec<NodeId>,
    consts: Vec<ConstValue>,
}

fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("node arena exceeded u32::MAX {what}"))
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its id.
    pub fn push(&mut self, kind: NodeKind, span: Span, ty: Type) -> NodeId {
        let id = NodeId(to_u32(self.kinds.len(), "nodes"));
        self.kinds.push(kind);
        self.spans.push(span);
        self.types.push(ty);
        id
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.kinds[id.index()]
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.spans[id.index()]
    }

    #[inline]
    pub fn ty(&self, id: NodeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn set_type(&mut self, id: NodeId, ty: Type) {
        self.types[id.index()] = ty;
    }

    /// Replace a node's payload and type in place. Every holder of `id`
    /// observes the new subtree.
    pub fn replace(&mut self, id: NodeId, kind: NodeKind, ty: Type) {
        self.kinds[id.index()] = kind;
        self.types[id.index()] = ty;
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn push_list(&mut self, ids: &[NodeId]) -> NodeRange {
        if ids.is_empty() {
            return NodeRange::EMPTY;
        }
        let start = to_u32(self.lists.len(), "list entries");
        self.lists.extend_from_slice(ids);
        NodeRange {
            start,
            len: to_u32(ids.len(), "list entries"),
        }
    }

    pub fn list(&self, range: NodeRange) -> &[NodeId] {
        let start = range.start as usize;
        &self.lists[start..start + range.len()]
    }

    pub fn push_consts(&mut self, values: &[ConstValue]) -> ConstRange {
        let start = to_u32(self.consts.len(), "constants");
        self.consts.extend_from_slice(values);
        ConstRange {
            start,
            len: to_u32(values.len(), "constants"),
        }
    }

    pub fn consts(&self, range: ConstRange) -> &[ConstValue] {
        let start = range.start as usize;
        &self.consts[start..start + range.len()]
    }

    // === Convenience accessors ===

    /// Symbol referenced by a symbol node.
    pub fn symbol(&self, id: NodeId) -> Option<SymbolId> {
        match self.kind(id) {
            NodeKind::Symbol { symbol, .. } => Some(symbol),
            _ => None,
        }
    }

    /// Children of an aggregate node (empty for other kinds).
    pub fn args(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::Aggregate { args, .. } => self.list(args),
            _ => &[],
        }
    }

    /// Operator of a unary, binary or aggregate node.
    pub fn op(&self, id: NodeId) -> Option<Op> {
        match self.kind(id) {
            NodeKind::Unary { op, .. }
            | NodeKind::Binary { op, .. }
            | NodeKind::Aggregate { op, .. } => Some(op),
            _ => None,
        }
    }

    pub fn is_constant(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Constant { .. })
    }

    /// Components of a constant node.
    pub fn constant_values(&self, id: NodeId) -> Option<&[ConstValue]> {
        match self.kind(id) {
            NodeKind::Constant { values } => Some(self.consts(values)),
            _ => None,
        }
    }

    /// Value of a single-component constant node.
    pub fn scalar_constant(&self, id: NodeId) -> Option<ConstValue> {
        match self.kind(id) {
            NodeKind::Constant { values } if values.len() == 1 => {
                Some(self.consts(values)[0])
            }
            _ => None,
        }
    }

    /// Depth-first walk over `root` and its descendants.
    pub fn walk(&self, root: NodeId, visit: &mut dyn FnMut(NodeId)) {
        visit(root);
        match self.kind(root) {
            NodeKind::Unary { operand, .. } => self.walk(operand, visit),
            NodeKind::Binary { left, right, .. } => {
                self.walk(left, visit);
                self.walk(right, visit);
            }
            NodeKind::Aggregate { args, .. } => {
                for &child in self.list(args) {
                    self.walk(child, visit);
                }
            }
            NodeKind::Selection {
                cond,
                then_branch,
                else_branch,
            } => {
                self.walk(cond, visit);
                for child in [then_branch, else_branch].into_iter().flatten() {
                    self.walk(child, visit);
                }
            }
            NodeKind::Branch { value, .. } => {
                if let Some(value) = value {
                    self.walk(value, visit);
                }
            }
            NodeKind::Switch { cond, body } => {
                self.walk(cond, visit);
                self.walk(body, visit);
            }
            NodeKind::Loop {
                cond, body, step, ..
            } => {
                for child in [cond, body, step].into_iter().flatten() {
                    self.walk(child, visit);
                }
            }
            NodeKind::Symbol { .. } | NodeKind::Constant { .. } | NodeKind::Error => {}
        }
    }
}
