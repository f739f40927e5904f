//! Operator expressions and assignment.
//!
//! Binary operands promote to the higher-ranked basic type and a common
//! shape (scalars broadcast, vectors and matrices truncate with a warning).
//! A `*` with exactly one scalar side keeps the scalar unbroadcast and
//! selects a vector-times-scalar or matrix-times-scalar product. Constant
//! operands fold.

use hlsl_ir::{BasicType, ConstValue, NodeId, NodeKind, Op, Shape, Span, Type};

use crate::context::rvalue;
use crate::{SemaContext, SemaError};

/// Source spelling of an operator, for diagnostics.
pub(crate) fn op_symbol(op: Op) -> &'static str {
    match op {
        Op::Add | Op::AddAssign => "+",
        Op::Sub | Op::SubAssign | Op::Negative => "-",
        Op::Mul | Op::MulAssign => "*",
        Op::Div | Op::DivAssign => "/",
        Op::Mod | Op::ModAssign => "%",
        Op::LeftShift | Op::LeftShiftAssign => "<<",
        Op::RightShift | Op::RightShiftAssign => ">>",
        Op::And | Op::AndAssign => "&",
        Op::InclusiveOr | Op::InclusiveOrAssign => "|",
        Op::ExclusiveOr | Op::ExclusiveOrAssign => "^",
        Op::Equal => "==",
        Op::NotEqual => "!=",
        Op::LessThan => "<",
        Op::GreaterThan => ">",
        Op::LessThanEqual => "<=",
        Op::GreaterThanEqual => ">=",
        Op::LogicalAnd => "&&",
        Op::LogicalOr => "||",
        Op::LogicalXor => "^^",
        Op::LogicalNot => "!",
        Op::BitwiseNot => "~",
        Op::PreIncrement | Op::PostIncrement => "++",
        Op::PreDecrement | Op::PostDecrement => "--",
        Op::Assign => "=",
        _ => "operator",
    }
}

fn is_bitwise(op: Op) -> bool {
    matches!(
        op,
        Op::LeftShift | Op::RightShift | Op::And | Op::InclusiveOr | Op::ExclusiveOr
    )
}

fn shaped(basic: BasicType, shape: Shape) -> Type {
    Type {
        shape,
        ..Type::scalar(basic)
    }
}

/// Basic type both operands of `op` convert to.
fn operand_basic(op: Op, left: &Type, right: &Type) -> Option<BasicType> {
    if !left.is_arithmetic() || !right.is_arithmetic() {
        return None;
    }
    if op.is_logical() {
        return Some(BasicType::Bool);
    }
    let wider = if left.basic.promotion_rank() >= right.basic.promotion_rank() {
        left.basic
    } else {
        right.basic
    };
    if is_bitwise(op) && (left.basic.is_float() || right.basic.is_float()) {
        return None;
    }
    if wider == BasicType::Bool && !op.is_comparison() {
        return Some(BasicType::Int);
    }
    Some(wider)
}

/// Common shape of two operands.
fn common_shape(left: Shape, right: Shape) -> Option<Shape> {
    match (left, right) {
        (l, r) if l == r => Some(l),
        (Shape::Scalar, s) | (s, Shape::Scalar) => Some(s),
        (Shape::Vector(l), Shape::Vector(r)) => Some(Shape::Vector(l.min(r))),
        (Shape::Matrix { cols: lc, rows: lr }, Shape::Matrix { cols: rc, rows: rr }) => {
            Some(Shape::Matrix {
                cols: lc.min(rc),
                rows: lr.min(rr),
            })
        }
        _ => None,
    }
}

fn fold_int(op: Op, x: i64, y: i64) -> Option<i64> {
    match op {
        Op::Add => Some(x.wrapping_add(y)),
        Op::Sub => Some(x.wrapping_sub(y)),
        Op::Mul => Some(x.wrapping_mul(y)),
        Op::Div => x.checked_div(y),
        Op::Mod => x.checked_rem(y),
        Op::LeftShift => u32::try_from(y).ok().and_then(|s| x.checked_shl(s)),
        Op::RightShift => u32::try_from(y).ok().and_then(|s| x.checked_shr(s)),
        Op::And => Some(x & y),
        Op::InclusiveOr => Some(x | y),
        Op::ExclusiveOr => Some(x ^ y),
        _ => None,
    }
}

fn fold_uint(op: Op, x: u64, y: u64) -> Option<u64> {
    match op {
        Op::Add => Some(x.wrapping_add(y)),
        Op::Sub => Some(x.wrapping_sub(y)),
        Op::Mul => Some(x.wrapping_mul(y)),
        Op::Div => x.checked_div(y),
        Op::Mod => x.checked_rem(y),
        Op::LeftShift => u32::try_from(y).ok().and_then(|s| x.checked_shl(s)),
        Op::RightShift => u32::try_from(y).ok().and_then(|s| x.checked_shr(s)),
        Op::And => Some(x & y),
        Op::InclusiveOr => Some(x | y),
        Op::ExclusiveOr => Some(x ^ y),
        _ => None,
    }
}

fn fold_float(op: Op, x: f64, y: f64) -> Option<f64> {
    match op {
        Op::Add => Some(x + y),
        Op::Sub => Some(x - y),
        Op::Mul => Some(x * y),
        Op::Div => Some(x / y),
        Op::Mod => Some(x % y),
        _ => None,
    }
}

/// Fold one component pair of matching basic type.
pub(crate) fn fold_scalar(op: Op, a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    use ConstValue as C;
    if op.is_comparison() {
        let order = match (a, b) {
            (C::Int(x), C::Int(y)) => Some(x.cmp(&y)),
            (C::Uint(x), C::Uint(y)) => Some(x.cmp(&y)),
            (C::Bool(x), C::Bool(y)) => Some(x.cmp(&y)),
            (C::Float(_), C::Float(_)) => a.as_f64().partial_cmp(&b.as_f64()),
            _ => None,
        }?;
        let holds = match op {
            Op::Equal => order.is_eq(),
            Op::NotEqual => order.is_ne(),
            Op::LessThan => order.is_lt(),
            Op::GreaterThan => order.is_gt(),
            Op::LessThanEqual => order.is_le(),
            _ => order.is_ge(),
        };
        return Some(C::Bool(holds));
    }
    match (a, b) {
        (C::Int(x), C::Int(y)) => fold_int(op, x, y).map(C::Int),
        (C::Uint(x), C::Uint(y)) => fold_uint(op, x, y).map(C::Uint),
        (C::Float(_), C::Float(_)) => fold_float(op, a.as_f64(), b.as_f64()).map(C::float),
        (C::Bool(x), C::Bool(y)) => match op {
            Op::LogicalAnd => Some(C::Bool(x && y)),
            Op::LogicalOr => Some(C::Bool(x || y)),
            Op::LogicalXor => Some(C::Bool(x != y)),
            _ => None,
        },
        _ => None,
    }
}

fn fold_unary(op: Op, value: ConstValue) -> Option<ConstValue> {
    use ConstValue as C;
    match (op, value) {
        (Op::Negative, C::Int(x)) => Some(C::Int(x.wrapping_neg())),
        (Op::Negative, C::Uint(x)) => Some(C::Uint(x.wrapping_neg())),
        (Op::Negative, C::Float(_)) => Some(C::float(-value.as_f64())),
        (Op::LogicalNot, C::Bool(b)) => Some(C::Bool(!b)),
        (Op::BitwiseNot, C::Int(x)) => Some(C::Int(!x)),
        (Op::BitwiseNot, C::Uint(x)) => Some(C::Uint(!x)),
        _ => None,
    }
}

impl SemaContext {
    fn invalid_operands(&mut self, span: Span, op: Op, left: &Type, right: &Type) -> NodeId {
        let err = SemaError::InvalidOperands {
            op: op_symbol(op),
            left: self.type_name(left),
            right: self.type_name(right),
        };
        self.error_node(span, err)
    }

    fn invalid_operand(&mut self, span: Span, op: Op, operand: &Type) -> NodeId {
        let err = SemaError::InvalidOperand {
            op: op_symbol(op),
            operand: self.type_name(operand),
        };
        self.error_node(span, err)
    }

    /// Binary arithmetic, bitwise, comparison or logical operator.
    #[tracing::instrument(level = "trace", skip_all, fields(op = ?op))]
    pub fn handle_binary_math(&mut self, span: Span, op: Op, left: NodeId, right: NodeId) -> NodeId {
        if self.is_error(left) || self.is_error(right) {
            return self.placeholder(span);
        }
        let lt = self.ty(left).clone();
        let rt = self.ty(right).clone();
        let (Some(basic), Some(shape)) = (operand_basic(op, &lt, &rt), common_shape(lt.shape, rt.shape))
        else {
            return self.invalid_operands(span, op, &lt, &rt);
        };

        if op == Op::Mul && lt.is_scalar() != rt.is_scalar() {
            let (wide, scalar) = if lt.is_scalar() { (right, left) } else { (left, right) };
            let (Some(wide), Some(scalar)) = (
                self.convert_basic(wide, basic, span),
                self.convert_basic(scalar, basic, span),
            ) else {
                return self.invalid_operands(span, op, &lt, &rt);
            };
            let ty = rvalue(self.ty(wide));
            let product = if ty.is_matrix() {
                Op::MatrixTimesScalar
            } else {
                Op::VectorTimesScalar
            };
            return self.binary(product, wide, scalar, ty, span);
        }

        let operand_ty = shaped(basic, shape);
        let (Some(l), Some(r)) = (
            self.add_conversion(left, &operand_ty, span),
            self.add_conversion(right, &operand_ty, span),
        ) else {
            return self.invalid_operands(span, op, &lt, &rt);
        };
        let result_ty = if op.is_comparison() {
            shaped(BasicType::Bool, shape)
        } else {
            operand_ty
        };
        if let Some(folded) = self.fold_binary(op, l, r, &result_ty, span) {
            return folded;
        }
        self.binary(op, l, r, result_ty, span)
    }

    fn fold_binary(&mut self, op: Op, l: NodeId, r: NodeId, ty: &Type, span: Span) -> Option<NodeId> {
        let lv = self.nodes.constant_values(l)?;
        let rv = self.nodes.constant_values(r)?;
        if lv.len() != rv.len() {
            return None;
        }
        let values = lv
            .iter()
            .zip(rv)
            .map(|(&a, &b)| fold_scalar(op, a, b))
            .collect::<Option<Vec<_>>>()?;
        Some(self.constant(&values, ty.clone(), span))
    }

    /// Prefix or postfix unary operator.
    #[tracing::instrument(level = "trace", skip_all, fields(op = ?op))]
    pub fn handle_unary_math(&mut self, span: Span, op: Op, operand: NodeId) -> NodeId {
        if self.is_error(operand) {
            return self.placeholder(span);
        }
        let ty = self.ty(operand).clone();
        if !ty.is_arithmetic() {
            return self.invalid_operand(span, op, &ty);
        }
        if op.is_increment() {
            if ty.basic == BasicType::Bool {
                return self.invalid_operand(span, op, &ty);
            }
            if let Some(lowered) = self.lower_resource_lvalue(op, operand, None, span) {
                return lowered;
            }
            if !self.check_lvalue(operand, span) {
                return self.placeholder(span);
            }
            return self.unary(op, operand, rvalue(&ty), span);
        }

        let converted = match op {
            Op::LogicalNot => self.convert_basic(operand, BasicType::Bool, span),
            Op::BitwiseNot if ty.basic.is_integer() => Some(operand),
            Op::BitwiseNot | Op::Negative if ty.basic == BasicType::Bool => {
                self.convert_basic(operand, BasicType::Int, span)
            }
            Op::Negative => Some(operand),
            _ => None,
        };
        let Some(operand) = converted else {
            return self.invalid_operand(span, op, &ty);
        };
        let result_ty = rvalue(self.ty(operand));
        if let Some(values) = self.nodes.constant_values(operand) {
            let folded: Option<Vec<ConstValue>> = values.iter().map(|&v| fold_unary(op, v)).collect();
            if let Some(folded) = folded {
                return self.constant(&folded, result_ty, span);
            }
        }
        self.unary(op, operand, result_ty, span)
    }

    /// Simple or compound assignment.
    #[tracing::instrument(level = "trace", skip_all, fields(op = ?op))]
    pub fn handle_assign(&mut self, span: Span, op: Op, left: NodeId, right: NodeId) -> NodeId {
        if self.is_error(left) || self.is_error(right) {
            return self.placeholder(span);
        }
        let lt = self.ty(left).clone();
        if op == Op::Assign && (lt.is_struct() || lt.is_array()) {
            return self.assign_aggregate(span, left, right);
        }
        let Some(rhs) = self.assignment_operand(span, op, &lt, right) else {
            return self.placeholder(span);
        };
        if let Some(lowered) = self.lower_resource_lvalue(op, left, Some(rhs), span) {
            return lowered;
        }
        if !self.check_lvalue(left, span) {
            return self.placeholder(span);
        }
        self.binary(op, left, rhs, rvalue(&lt), span)
    }

    /// Right-hand side converted for an assignment to `target`.
    fn assignment_operand(&mut self, span: Span, op: Op, target: &Type, right: NodeId) -> Option<NodeId> {
        let rt = self.ty(right).clone();
        if let Some(base) = op.compound_base() {
            let bad_bitwise = is_bitwise(base) && (target.basic.is_float() || rt.basic.is_float());
            if !target.is_arithmetic() || !rt.is_arithmetic() || bad_bitwise {
                let _ = self.invalid_operands(span, op, target, &rt);
                return None;
            }
            if base == Op::Mul && rt.is_scalar() && !target.is_scalar() {
                return self.convert_basic(right, target.basic, span);
            }
        }
        let to = rvalue(target);
        let converted = self.add_conversion(right, &to, span);
        if converted.is_none() {
            let _ = self.cannot_convert(span, &rt, &to);
        }
        converted
    }

    fn assign_aggregate(&mut self, span: Span, left: NodeId, right: NodeId) -> NodeId {
        let lt = self.ty(left).clone();
        let rt = self.ty(right).clone();
        if !lt.same_kind(&rt) {
            let _ = self.cannot_convert(span, &rt, &lt);
            return self.placeholder(span);
        }
        if self.needs_member_copy(left) || self.needs_member_copy(right) {
            let copies = self.copy_aggregate(left, right, span);
            return self.sequence(&copies, span);
        }
        if !self.check_lvalue(left, span) {
            return self.placeholder(span);
        }
        self.assign(left, right, span)
    }

    /// Whether `node` is an aggregate that only exists member by member.
    pub(crate) fn needs_member_copy(&self, node: NodeId) -> bool {
        let ty = self.ty(node);
        (ty.is_struct() || ty.is_array())
            && (self.is_flattened(node) || self.split_root_of(node).is_some())
    }

    /// Member-wise copy of `src` into `dst`, one assignment per leaf that
    /// needs it. Plain sub-aggregates are copied whole.
    pub(crate) fn copy_aggregate(&mut self, dst: NodeId, src: NodeId, span: Span) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.copy_into(dst, src, span, &mut out);
        out
    }

    fn copy_into(&mut self, dst: NodeId, src: NodeId, span: Span, out: &mut Vec<NodeId>) {
        if self.is_error(dst) || self.is_error(src) {
            return;
        }
        if !self.needs_member_copy(dst) && !self.needs_member_copy(src) {
            out.push(self.assign(dst, src, span));
            return;
        }
        let ty = self.ty(dst).clone();
        if ty.is_array() {
            let Some(count) = ty.arrays.outer().and_then(hlsl_ir::ArrayDim::size) else {
                let name = self.describe(dst);
                let _ = self.error(span, SemaError::FlattenUnsized(name));
                return;
            };
            for i in 0..count {
                let d = self.duplicate_ref(dst);
                let d = self.element_ref(d, i, span);
                let s = self.duplicate_ref(src);
                let s = self.element_ref(s, i, span);
                self.copy_into(d, s, span, out);
            }
        } else if let Some(id) = ty.fields {
            for member in 0..self.structs.members(id).len() {
                let d = self.duplicate_ref(dst);
                let d = self.member_ref(d, member, span);
                let s = self.duplicate_ref(src);
                let s = self.member_ref(s, member, span);
                self.copy_into(d, s, span, out);
            }
        }
    }

    fn element_ref(&mut self, base: NodeId, index: u32, span: Span) -> NodeId {
        if self.is_flattened(base) {
            self.flatten_access(base, index, span)
        } else {
            self.index_direct(base, index, span)
        }
    }

    fn member_ref(&mut self, base: NodeId, member: usize, span: Span) -> NodeId {
        if self.is_flattened(base) {
            self.flatten_access(base, u32::try_from(member).unwrap_or(u32::MAX), span)
        } else if self.split_root_of(base).is_some() {
            self.split_member_access(base, member, span)
        } else {
            self.index_struct(base, member, span)
        }
    }

    /// Fresh copy of a side-effect-free reference chain; anything else is
    /// shared.
    pub(crate) fn duplicate_ref(&mut self, node: NodeId) -> NodeId {
        let kind = self.nodes.kind(node);
        let span = self.nodes.span(node);
        let ty = self.ty(node).clone();
        match kind {
            NodeKind::Symbol { .. } | NodeKind::Constant { .. } => self.nodes.push(kind, span, ty),
            NodeKind::Binary {
                op: op @ (Op::IndexDirect | Op::IndexIndirect | Op::IndexDirectStruct | Op::VectorSwizzle),
                left,
                right,
            } => {
                let left = self.duplicate_ref(left);
                self.nodes.push(NodeKind::Binary { op, left, right }, span, ty)
            }
            _ => node,
        }
    }
}
