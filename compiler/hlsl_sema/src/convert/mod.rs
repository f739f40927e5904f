//! Conversion rules and implicit-conversion node construction.
//!
//! `convertible` and `better` are the two predicates overload resolution is
//! built on; `add_conversion` materializes a conversion in the tree
//! (component conversion, scalar broadcast, vector truncation), folding it
//! when the operand is a constant.

use hlsl_ir::{BasicType, ConstValue, NodeId, NodeKind, Op, Shape, Span, Type};

use crate::context::rvalue;
use crate::{SemaContext, SemaError};

/// Which basic-type conversions overload resolution may use.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ConversionMode {
    /// Only along the promotion chain toward more resolution.
    WideningOnly,
    /// Any numeric conversion, including narrowing and to/from bool.
    AllowNarrowing,
}

/// Whether `from` may be implicitly promoted to `to`.
pub fn can_implicitly_promote(from: BasicType, to: BasicType) -> bool {
    match (from.promotion_rank(), to.promotion_rank()) {
        (Some(f), Some(t)) => f <= t,
        _ => from == to,
    }
}

fn can_convert_basic(from: BasicType, to: BasicType, mode: ConversionMode) -> bool {
    match mode {
        ConversionMode::WideningOnly => can_implicitly_promote(from, to),
        ConversionMode::AllowNarrowing => {
            from == to || (from.promotion_rank().is_some() && to.promotion_rank().is_some())
        }
    }
}

/// Whether an argument of type `from` can be passed to a parameter of type
/// `to` of a function with operation `op` at position `arg`.
pub fn convertible(
    from: &Type,
    to: &Type,
    op: Option<Op>,
    arg: usize,
    mode: ConversionMode,
) -> bool {
    if from.same_kind(to) {
        return true;
    }
    if from.is_array() || to.is_array() || from.is_struct() || to.is_struct() {
        return false;
    }
    // The resource handle of an atomic, texture or buffer operation is never
    // converted.
    if arg == 0 && op.is_some_and(Op::pins_first_argument) {
        return false;
    }
    if from.is_opaque() || to.is_opaque() || from.stream.is_some() || to.stream.is_some() {
        return false;
    }
    if !can_convert_basic(from.basic, to.basic, mode) {
        return false;
    }
    match (from.shape, to.shape) {
        (Shape::Scalar, _) => true,
        (Shape::Vector(f), Shape::Vector(t)) => f >= t,
        (Shape::Matrix { .. }, Shape::Matrix { .. }) => from.shape == to.shape,
        _ => false,
    }
}

/// Linearized distance key: float vs integer dominates, then width, then
/// bool vs non-bool, then signedness.
fn linearize(basic: BasicType) -> i32 {
    basic.linear_key()
}

/// Whether converting `from` to `to2` is better than converting it to `to1`.
pub fn better(from: &Type, to1: &Type, to2: &Type) -> bool {
    // Exact match beats any conversion.
    if from.same_kind(to2) {
        return !from.same_kind(to1);
    }
    if from.same_kind(to1) {
        return false;
    }

    // Shape changes are always worse.
    if matches!(from.shape, Shape::Scalar | Shape::Vector(_)) && !from.is_struct() {
        let size = from.vector_size();
        if size == to2.vector_size() && size != to1.vector_size() {
            return true;
        }
        if size == to1.vector_size() && size != to2.vector_size() {
            return false;
        }
    }

    // An exact resource match beats a near match.
    if let (Some(f), Some(s1), Some(s2)) = (from.sampler, to1.sampler, to2.sampler) {
        if f == s2 {
            return f != s1;
        }
        if f == s1 {
            return false;
        }
    }

    let key = linearize(from.basic);
    (linearize(to2.basic) - key).abs() < (linearize(to1.basic) - key).abs()
}

/// Operations whose arguments promote to one common basic type before
/// re-selecting an overload.
fn promotes_arguments(op: Op) -> bool {
    matches!(
        op,
        Op::Clamp
            | Op::Cross
            | Op::Distance
            | Op::Dot
            | Op::Mix
            | Op::Max
            | Op::Min
            | Op::Pow
            | Op::Reflect
            | Op::SmoothStep
            | Op::Step
    )
}

#[expect(clippy::cast_sign_loss, reason = "C conversion semantics")]
fn convert_value(value: ConstValue, to: BasicType) -> ConstValue {
    match to {
        BasicType::Bool => ConstValue::Bool(value.as_bool()),
        BasicType::Int | BasicType::Int64 => ConstValue::Int(value.as_i64()),
        BasicType::Uint | BasicType::Uint64 => ConstValue::Uint(value.as_i64() as u64),
        BasicType::Float | BasicType::Double => ConstValue::float(value.as_f64()),
        _ => value,
    }
}

impl SemaContext {
    /// Convert `node` to `to`, allowing any numeric conversion, scalar
    /// broadcast and truncation. Returns `None` when no conversion exists.
    pub(crate) fn add_conversion(&mut self, node: NodeId, to: &Type, span: Span) -> Option<NodeId> {
        let from = self.ty(node).clone();
        if from.is_error() || to.is_error() || from.same_kind(to) {
            return Some(node);
        }
        if !from.is_arithmetic() || !to.is_arithmetic() {
            return None;
        }

        let truncates = match (from.shape, to.shape) {
            (Shape::Scalar, _) => false,
            (Shape::Vector(f), Shape::Vector(t)) if f >= t => f > t,
            (Shape::Vector(_), Shape::Scalar) => true,
            (Shape::Matrix { cols: fc, rows: fr }, Shape::Matrix { cols: tc, rows: tr })
                if fc >= tc && fr >= tr =>
            {
                fc > tc || fr > tr
            }
            _ => return None,
        };
        if truncates {
            let err = SemaError::ImplicitTruncation {
                from: self.type_name(&from),
                to: self.type_name(to),
            };
            self.warn(span, err);
        }

        if let NodeKind::Constant { values } = self.nodes.kind(node) {
            let values = self.nodes.consts(values).to_vec();
            return Some(self.fold_conversion(&values, &from, to, span));
        }

        let mut converted = node;
        if from.basic != to.basic {
            let ty = Type {
                basic: to.basic,
                ..rvalue(&from)
            };
            converted = self.unary(Op::Convert(to.basic), node, ty, span);
        }
        if from.shape != to.shape {
            converted = self.aggregate(Op::Construct, &[converted], rvalue(to), span);
        }
        Some(converted)
    }

    fn fold_conversion(
        &mut self,
        values: &[ConstValue],
        from: &Type,
        to: &Type,
        span: Span,
    ) -> NodeId {
        let count = to.component_count() as usize;
        let out: Vec<ConstValue> = if from.is_scalar() {
            vec![convert_value(values[0], to.basic); count]
        } else if let (Shape::Matrix { cols: fc, .. }, Shape::Matrix { cols, rows }) =
            (from.shape, to.shape)
        {
            // Row-by-row storage: keep the top-left corner.
            let mut out = Vec::with_capacity(count);
            for r in 0..usize::from(rows) {
                for c in 0..usize::from(cols) {
                    out.push(convert_value(values[r * usize::from(fc) + c], to.basic));
                }
            }
            out
        } else {
            values
                .iter()
                .take(count)
                .map(|v| convert_value(*v, to.basic))
                .collect()
        };
        self.constant(&out, rvalue(to), span)
    }

    /// Convert with an error on failure; the placeholder keeps analysis going.
    pub(crate) fn convert_or_error(&mut self, node: NodeId, to: &Type, span: Span) -> NodeId {
        match self.add_conversion(node, to, span) {
            Some(converted) => converted,
            None => {
                let from = self.ty(node).clone();
                let _ = self.cannot_convert(span, &from, to);
                self.placeholder(span)
            }
        }
    }

    /// Convert only the basic type of `node`, keeping its shape.
    pub(crate) fn convert_basic(&mut self, node: NodeId, to: BasicType, span: Span) -> Option<NodeId> {
        let ty = Type {
            basic: to,
            ..rvalue(self.ty(node))
        };
        self.add_conversion(node, &ty, span)
    }

    /// Promote the arguments of a builtin call to one common basic type, as
    /// the builtin's operation would. Returns `None` when no common type
    /// exists; operations that do not promote return the arguments as-is.
    pub(crate) fn promote_builtin_args(
        &mut self,
        op: Op,
        args: &[NodeId],
        span: Span,
    ) -> Option<Vec<NodeId>> {
        if !promotes_arguments(op) {
            return Some(args.to_vec());
        }
        for &target in args {
            let basic = self.ty(target).basic;
            if basic.promotion_rank().is_none() {
                continue;
            }
            let converted: Option<Vec<NodeId>> = args
                .iter()
                .map(|&arg| {
                    if self.ty(arg).basic.promotion_rank().is_some() {
                        self.convert_basic(arg, basic, span)
                    } else {
                        None
                    }
                })
                .collect();
            if converted.is_some() {
                return converted;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests;
