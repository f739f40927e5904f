//! Builtin intrinsic table.
//!
//! Intrinsics are declared from a compact prototype manifest: each entry
//! names the source-level function, the operation it lowers to, the
//! argument and return slots, and the basic-type and shape families the
//! generic slot `T` ranges over. [`install`] expands every entry into one
//! overload per (basic type, shape) pair at the builtin scope, where
//! overload resolution finds them like any other function.

use hlsl_ir::{BasicType, FunctionSig, Op, Param, Shape, Span, Storage, Symbol, Type};

use crate::SemaContext;

use Shapes::{Matrix, Scalar as S, ScalarVector as SV, SquareMatrix, Vec3, Vector};
use Slot::{Bool, InOutT, IntT, OutT, Transposed, Void, T};

/// Basic types the generic slot ranges over.
#[derive(Copy, Clone, Debug)]
enum Types {
    Float,
    /// Float and signed int.
    Signed,
    /// Float, int and uint.
    Numeric,
    /// Int and uint.
    Integer,
    /// Bool plus every numeric type.
    All,
}

impl Types {
    fn basics(self) -> &'static [BasicType] {
        match self {
            Types::Float => &[BasicType::Float],
            Types::Signed => &[BasicType::Float, BasicType::Int],
            Types::Numeric => &[BasicType::Float, BasicType::Int, BasicType::Uint],
            Types::Integer => &[BasicType::Int, BasicType::Uint],
            Types::All => &[
                BasicType::Bool,
                BasicType::Float,
                BasicType::Int,
                BasicType::Uint,
            ],
        }
    }
}

/// Shapes the generic slot ranges over.
#[derive(Copy, Clone, Debug)]
enum Shapes {
    Scalar,
    /// Scalar and vectors of 2 to 4 components.
    ScalarVector,
    Vector,
    Vec3,
    Matrix,
    SquareMatrix,
}

impl Shapes {
    fn expand(self) -> Vec<Shape> {
        let vectors = || (2..=4).map(Shape::Vector);
        let matrices = || (2..=4).flat_map(|cols| (2..=4).map(move |rows| Shape::Matrix { cols, rows }));
        match self {
            Shapes::Scalar => vec![Shape::Scalar],
            Shapes::ScalarVector => std::iter::once(Shape::Scalar).chain(vectors()).collect(),
            Shapes::Vector => vectors().collect(),
            Shapes::Vec3 => vec![Shape::Vector(3)],
            Shapes::Matrix => matrices().collect(),
            Shapes::SquareMatrix => (2..=4).map(|n| Shape::Matrix { cols: n, rows: n }).collect(),
        }
    }
}

/// One argument or return slot of a prototype.
#[derive(Copy, Clone, Debug)]
enum Slot {
    /// The generic type.
    T,
    /// `out T`.
    OutT,
    /// `inout T`.
    InOutT,
    /// Scalar of T's basic type.
    Scalar,
    /// Bool scalar.
    Bool,
    /// T's shape with int components.
    IntT,
    /// T with rows and columns exchanged.
    Transposed,
    Void,
}

struct Prototype {
    name: &'static str,
    op: Op,
    ret: Slot,
    args: &'static [Slot],
    types: Types,
    shapes: Shapes,
}

const fn proto(
    name: &'static str,
    op: Op,
    ret: Slot,
    args: &'static [Slot],
    types: Types,
    shapes: Shapes,
) -> Prototype {
    Prototype {
        name,
        op,
        ret,
        args,
        types,
        shapes,
    }
}

const T1: &[Slot] = &[T];
const T2: &[Slot] = &[T, T];
const T3: &[Slot] = &[T, T, T];

/// The intrinsic manifest. `mul` and the barriers are installed separately.
const PROTOTYPES: &[Prototype] = &[
    // Component-wise math.
    proto("sin", Op::Sin, T, T1, Types::Float, SV),
    proto("cos", Op::Cos, T, T1, Types::Float, SV),
    proto("tan", Op::Tan, T, T1, Types::Float, SV),
    proto("exp", Op::Exp, T, T1, Types::Float, SV),
    proto("log", Op::Log, T, T1, Types::Float, SV),
    proto("exp2", Op::Exp2, T, T1, Types::Float, SV),
    proto("log2", Op::Log2, T, T1, Types::Float, SV),
    proto("sqrt", Op::Sqrt, T, T1, Types::Float, SV),
    proto("rsqrt", Op::InverseSqrt, T, T1, Types::Float, SV),
    proto("floor", Op::Floor, T, T1, Types::Float, SV),
    proto("ceil", Op::Ceil, T, T1, Types::Float, SV),
    proto("frac", Op::Fract, T, T1, Types::Float, SV),
    proto("ddx", Op::Ddx, T, T1, Types::Float, SV),
    proto("ddy", Op::Ddy, T, T1, Types::Float, SV),
    proto("abs", Op::Abs, T, T1, Types::Signed, SV),
    proto("sign", Op::Sign, IntT, T1, Types::Signed, SV),
    proto("min", Op::Min, T, T2, Types::Numeric, SV),
    proto("max", Op::Max, T, T2, Types::Numeric, SV),
    proto("clamp", Op::Clamp, T, T3, Types::Numeric, SV),
    proto("lerp", Op::Mix, T, T3, Types::Float, SV),
    proto("step", Op::Step, T, T2, Types::Float, SV),
    proto("smoothstep", Op::SmoothStep, T, T3, Types::Float, SV),
    proto("pow", Op::Pow, T, T2, Types::Float, SV),
    // Geometric.
    proto("length", Op::Length, Slot::Scalar, T1, Types::Float, Vector),
    proto("distance", Op::Distance, Slot::Scalar, T2, Types::Float, Vector),
    proto("dot", Op::Dot, Slot::Scalar, T2, Types::Numeric, Vector),
    proto("cross", Op::Cross, T, T2, Types::Float, Vec3),
    proto("normalize", Op::Normalize, T, T1, Types::Float, Vector),
    proto("reflect", Op::Reflect, T, T2, Types::Float, Vector),
    proto("any", Op::Any, Bool, T1, Types::All, SV),
    proto("all", Op::All, Bool, T1, Types::All, SV),
    // Matrix.
    proto("transpose", Op::Transpose, Transposed, T1, Types::Numeric, Matrix),
    proto("determinant", Op::Determinant, Slot::Scalar, T1, Types::Float, SquareMatrix),
    // Decomposed before output.
    proto("rcp", Op::Rcp, T, T1, Types::Float, SV),
    proto("saturate", Op::Saturate, T, T1, Types::Float, SV),
    proto("sincos", Op::SinCos, Void, &[T, OutT, OutT], Types::Float, SV),
    proto("clip", Op::Clip, Void, T1, Types::Float, SV),
    proto("InterlockedAdd", Op::InterlockedAdd, Void, &[InOutT, T], Types::Integer, S),
    proto("InterlockedAdd", Op::InterlockedAdd, Void, &[InOutT, T, OutT], Types::Integer, S),
    proto("InterlockedMin", Op::InterlockedMin, Void, &[InOutT, T], Types::Integer, S),
    proto("InterlockedMin", Op::InterlockedMin, Void, &[InOutT, T, OutT], Types::Integer, S),
    proto("InterlockedMax", Op::InterlockedMax, Void, &[InOutT, T], Types::Integer, S),
    proto("InterlockedMax", Op::InterlockedMax, Void, &[InOutT, T, OutT], Types::Integer, S),
    proto("InterlockedAnd", Op::InterlockedAnd, Void, &[InOutT, T], Types::Integer, S),
    proto("InterlockedAnd", Op::InterlockedAnd, Void, &[InOutT, T, OutT], Types::Integer, S),
    proto("InterlockedOr", Op::InterlockedOr, Void, &[InOutT, T], Types::Integer, S),
    proto("InterlockedOr", Op::InterlockedOr, Void, &[InOutT, T, OutT], Types::Integer, S),
    proto("InterlockedXor", Op::InterlockedXor, Void, &[InOutT, T], Types::Integer, S),
    proto("InterlockedXor", Op::InterlockedXor, Void, &[InOutT, T, OutT], Types::Integer, S),
    proto("InterlockedExchange", Op::InterlockedExchange, Void, &[InOutT, T, OutT], Types::Integer, S),
    proto(
        "InterlockedCompareExchange",
        Op::InterlockedCompareExchange,
        Void,
        &[InOutT, T, T, OutT],
        Types::Integer,
        S,
    ),
    proto(
        "InterlockedCompareStore",
        Op::InterlockedCompareStore,
        Void,
        &[InOutT, T, T],
        Types::Integer,
        S,
    ),
];

/// Zero-argument barrier intrinsics.
const BARRIERS: &[(&str, Op)] = &[
    ("AllMemoryBarrier", Op::MemoryBarrier),
    ("AllMemoryBarrierWithGroupSync", Op::Barrier),
    ("DeviceMemoryBarrier", Op::MemoryBarrier),
    ("DeviceMemoryBarrierWithGroupSync", Op::Barrier),
    ("GroupMemoryBarrier", Op::GroupMemoryBarrier),
    ("GroupMemoryBarrierWithGroupSync", Op::Barrier),
];

fn slot_type(slot: Slot, generic: &Type) -> Type {
    match slot {
        Slot::T => generic.clone().with_storage(Storage::In),
        Slot::OutT => generic.clone().with_storage(Storage::Out),
        Slot::InOutT => generic.clone().with_storage(Storage::InOut),
        Slot::Scalar => Type::scalar(generic.basic),
        Slot::Bool => Type::scalar(BasicType::Bool),
        Slot::IntT => Type {
            basic: BasicType::Int,
            ..generic.clone()
        },
        Slot::Transposed => match generic.shape {
            Shape::Matrix { cols, rows } => Type::matrix(generic.basic, rows, cols),
            _ => generic.clone(),
        },
        Slot::Void => Type::void(),
    }
}

fn generic_type(basic: BasicType, shape: Shape) -> Type {
    match shape {
        Shape::Scalar => Type::scalar(basic),
        Shape::Vector(n) => Type::vector(basic, n),
        Shape::Matrix { cols, rows } => Type::matrix(basic, cols, rows),
    }
}

fn declare(ctx: &mut SemaContext, name: &str, op: Op, ret: Type, params: Vec<Type>) {
    let name = ctx.intern(name);
    let sig = FunctionSig {
        params: params.into_iter().map(|ty| Param::new(None, ty)).collect(),
        builtin_op: Some(op),
        defined: true,
    };
    ctx.symbols
        .insert_function(Symbol::function(name, ret, sig, Span::DUMMY));
}

/// `mul` over every scalar, vector and matrix combination with matching
/// inner dimensions. HLSL matrices are rows x columns; a row vector on the
/// left multiplies by rows, a column vector on the right by columns.
fn install_mul(ctx: &mut SemaContext) {
    let input = |ty: Type| ty.with_storage(Storage::In);
    for &basic in Types::Numeric.basics() {
        let scalar = Type::scalar(basic);
        declare(ctx, "mul", Op::GenMul, scalar.clone(), vec![input(scalar.clone()), input(scalar.clone())]);
        for n in 2..=4u8 {
            let v = Type::vector(basic, n);
            declare(ctx, "mul", Op::GenMul, v.clone(), vec![input(scalar.clone()), input(v.clone())]);
            declare(ctx, "mul", Op::GenMul, v.clone(), vec![input(v.clone()), input(scalar.clone())]);
            declare(ctx, "mul", Op::GenMul, scalar.clone(), vec![input(v.clone()), input(v.clone())]);
        }
        for rows in 2..=4u8 {
            for cols in 2..=4u8 {
                let m = Type::matrix(basic, cols, rows);
                declare(ctx, "mul", Op::GenMul, m.clone(), vec![input(scalar.clone()), input(m.clone())]);
                declare(ctx, "mul", Op::GenMul, m.clone(), vec![input(m.clone()), input(scalar.clone())]);
                // Row vector times matrix: length rows in, cols out.
                declare(
                    ctx,
                    "mul",
                    Op::GenMul,
                    Type::vector(basic, cols),
                    vec![input(Type::vector(basic, rows)), input(m.clone())],
                );
                // Matrix times column vector: length cols in, rows out.
                declare(
                    ctx,
                    "mul",
                    Op::GenMul,
                    Type::vector(basic, rows),
                    vec![input(m.clone()), input(Type::vector(basic, cols))],
                );
                for inner in 2..=4u8 {
                    // rows x inner times inner x cols gives rows x cols.
                    declare(
                        ctx,
                        "mul",
                        Op::GenMul,
                        m.clone(),
                        vec![
                            input(Type::matrix(basic, inner, rows)),
                            input(Type::matrix(basic, cols, inner)),
                        ],
                    );
                }
            }
        }
    }
}

/// Declare every builtin intrinsic at the builtin scope.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn install(ctx: &mut SemaContext) {
    let before = ctx.symbols.len();
    for proto in PROTOTYPES {
        for &basic in proto.types.basics() {
            for shape in proto.shapes.expand() {
                let generic = generic_type(basic, shape);
                let params = proto.args.iter().map(|&s| slot_type(s, &generic)).collect();
                let ret = slot_type(proto.ret, &generic).with_storage(Storage::Temporary);
                declare(ctx, proto.name, proto.op, ret, params);
            }
        }
    }
    install_mul(ctx);
    for &(name, op) in BARRIERS {
        declare(ctx, name, op, Type::void(), Vec::new());
    }
    tracing::debug!(overloads = ctx.symbols.len() - before, "builtins installed");
}

#[cfg(test)]
mod tests;
