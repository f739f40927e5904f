//! Intrinsic decomposition.
//!
//! Builtin calls resolve to an aggregate tagged with the intrinsic's
//! operation. Source-level intrinsics with no primitive counterpart are
//! rewritten here, keyed by operation and operand shapes:
//!
//! ```text
//! mul(v, v)          dot(v, v)
//! mul(v, M)          M * v      (operands swapped: rows vs. columns)
//! mul(M, v)          v * M
//! mul(A, B)          B * A
//! rcp(a)             1 / a
//! saturate(a)        clamp(a, 0, 1)
//! sincos(a, s, c)    s = sin(a), c = cos(a)
//! clip(a)            if (any(a < 0)) discard
//! Interlocked*(d..)  atomic op on d, or image atomic on d's image element
//! ```
//!
//! Object methods (`tex.Sample`, `buf.Load`, `stream.Append`) live in
//! [`methods`].

mod methods;

use hlsl_ir::{BasicType, NodeId, NodeKind, Op, Shape, Span, SymbolId, Type};

use crate::context::rvalue;
use crate::lvalue::image_load_operands;
use crate::{SemaContext, SemaError};

/// A value that may be read more than once.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Reusable {
    /// Side-effect-free reference, duplicated on each read.
    Node(NodeId),
    Temp(SymbolId),
}

/// Primitive atomic and image atomic of an `Interlocked*` intrinsic.
fn atomic_ops(op: Op) -> Option<(Op, Op)> {
    let ops = match op {
        Op::InterlockedAdd => (Op::AtomicAdd, Op::ImageAtomicAdd),
        Op::InterlockedMin => (Op::AtomicMin, Op::ImageAtomicMin),
        Op::InterlockedMax => (Op::AtomicMax, Op::ImageAtomicMax),
        Op::InterlockedAnd => (Op::AtomicAnd, Op::ImageAtomicAnd),
        Op::InterlockedOr => (Op::AtomicOr, Op::ImageAtomicOr),
        Op::InterlockedXor => (Op::AtomicXor, Op::ImageAtomicXor),
        Op::InterlockedExchange => (Op::AtomicExchange, Op::ImageAtomicExchange),
        Op::InterlockedCompareExchange | Op::InterlockedCompareStore => {
            (Op::AtomicCompSwap, Op::ImageAtomicCompSwap)
        }
        _ => return None,
    };
    Some(ops)
}

impl SemaContext {
    /// Rewrite a builtin call node into primitive operations. Nodes of
    /// primitive intrinsics come back unchanged.
    #[tracing::instrument(level = "trace", skip_all)]
    pub(crate) fn decompose_intrinsic(&mut self, node: NodeId) -> NodeId {
        let NodeKind::Aggregate { op, args, .. } = self.nodes.kind(node) else {
            return node;
        };
        let args = self.nodes.list(args).to_vec();
        let span = self.nodes.span(node);
        let ty = self.ty(node).clone();
        match (op, args.as_slice()) {
            (Op::GenMul, &[a, b]) => self.decompose_mul(span, a, b, ty),
            (Op::Rcp, &[a]) => {
                let one = self.one(&ty, span);
                self.binary(Op::Div, one, a, ty, span)
            }
            (Op::Saturate, &[a]) => {
                let zero = self.zero(&ty, span);
                let one = self.one(&ty, span);
                self.aggregate(Op::Clamp, &[a, zero, one], ty, span)
            }
            (Op::SinCos, &[a, s, c]) => self.decompose_sincos(span, a, s, c),
            (Op::Clip, &[a]) => self.decompose_clip(span, a),
            (op, _) if op.is_interlocked() => self.decompose_interlocked(span, op, &args),
            _ => node,
        }
    }

    fn decompose_mul(&mut self, span: Span, a: NodeId, b: NodeId, ty: Type) -> NodeId {
        let at = self.ty(a).clone();
        let bt = self.ty(b).clone();
        let scale = |wide: &Type| {
            if wide.is_matrix() {
                Op::MatrixTimesScalar
            } else {
                Op::VectorTimesScalar
            }
        };
        match (at.shape, bt.shape) {
            (Shape::Scalar, Shape::Scalar) => self.binary(Op::Mul, a, b, ty, span),
            (Shape::Scalar, _) => self.binary(scale(&bt), b, a, ty, span),
            (_, Shape::Scalar) => self.binary(scale(&at), a, b, ty, span),
            (Shape::Vector(_), Shape::Vector(_)) => self.aggregate(Op::Dot, &[a, b], ty, span),
            (Shape::Vector(_), Shape::Matrix { .. }) => {
                self.binary(Op::MatrixTimesVector, b, a, ty, span)
            }
            (Shape::Matrix { .. }, Shape::Vector(_)) => {
                self.binary(Op::VectorTimesMatrix, b, a, ty, span)
            }
            (Shape::Matrix { .. }, Shape::Matrix { .. }) => {
                self.binary(Op::MatrixTimesMatrix, b, a, ty, span)
            }
        }
    }

    fn decompose_sincos(&mut self, span: Span, a: NodeId, s: NodeId, c: NodeId) -> NodeId {
        let mut seq = Vec::new();
        let value = self.reusable(a, span, &mut seq);
        let ty = rvalue(self.ty(a));
        for (op, target) in [(Op::Sin, s), (Op::Cos, c)] {
            let operand = self.read(value, span);
            let result = self.aggregate(op, &[operand], ty.clone(), span);
            seq.extend(self.copy_value(target, result, span));
        }
        self.sequence(&seq, span)
    }

    fn decompose_clip(&mut self, span: Span, a: NodeId) -> NodeId {
        let ty = rvalue(self.ty(a));
        let zero = self.zero(&ty, span);
        let below = self.handle_binary_math(span, Op::LessThan, a, zero);
        let cond = if ty.is_scalar() {
            below
        } else {
            self.aggregate(Op::Any, &[below], Type::scalar(BasicType::Bool), span)
        };
        let discard = self.handle_discard(span);
        self.handle_selection(span, cond, Some(discard), None)
    }

    /// `Interlocked*(dest, values.., [original])`.
    fn decompose_interlocked(&mut self, span: Span, op: Op, args: &[NodeId]) -> NodeId {
        let split = match (op, args) {
            (Op::InterlockedCompareStore, &[dest, cmp, value]) => Some((dest, vec![cmp, value], None)),
            (Op::InterlockedCompareExchange, &[dest, cmp, value, original]) => {
                Some((dest, vec![cmp, value], Some(original)))
            }
            (Op::InterlockedCompareStore | Op::InterlockedCompareExchange, _) => None,
            (_, &[dest, value]) => Some((dest, vec![value], None)),
            (_, &[dest, value, original]) => Some((dest, vec![value], Some(original))),
            _ => None,
        };
        let (Some((dest, values, original)), Some((atomic, image_atomic))) = (split, atomic_ops(op)) else {
            let err = SemaError::Internal(format!("malformed {op:?} call"));
            return self.error_node(span, err);
        };
        let value_ty = rvalue(self.ty(dest));
        let (primitive, mut operands) = match image_load_operands(self, dest) {
            Some((image, coord)) => (image_atomic, vec![image, coord]),
            None => (atomic, vec![dest]),
        };
        for value in values {
            operands.push(self.convert_or_error(value, &value_ty, span));
        }
        let result = self.aggregate(primitive, &operands, value_ty, span);
        match original {
            Some(original) => {
                let copies = self.copy_value(original, result, span);
                self.sequence(&copies, span)
            }
            None => result,
        }
    }

    // === Reuse ===

    /// Make `value` readable more than once: references are duplicated,
    /// anything else is stored to a temporary first (the store is pushed to
    /// `setup`).
    pub(crate) fn reusable(&mut self, value: NodeId, span: Span, setup: &mut Vec<NodeId>) -> Reusable {
        if matches!(
            self.nodes.kind(value),
            NodeKind::Symbol { .. } | NodeKind::Constant { .. }
        ) {
            return Reusable::Node(value);
        }
        let ty = self.ty(value).clone();
        let tmp = self.new_temp(&ty, span);
        let tmp_ref = self.symbol_ref(tmp, span);
        setup.push(self.assign(tmp_ref, value, span));
        Reusable::Temp(tmp)
    }

    pub(crate) fn read(&mut self, value: Reusable, span: Span) -> NodeId {
        match value {
            Reusable::Node(node) => self.duplicate_ref(node),
            Reusable::Temp(tmp) => self.symbol_ref(tmp, span),
        }
    }
}
