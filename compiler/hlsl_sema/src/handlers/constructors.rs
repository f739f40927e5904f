//! Type constructors, casts and zero values.

use hlsl_ir::{ArrayDim, ConstValue, NodeId, Op, Shape, Span, Type};

use crate::context::rvalue;
use crate::{SemaContext, SemaError};

impl SemaContext {
    /// `T(args...)`. Arithmetic targets take either one scalar (broadcast)
    /// or arguments whose components add up to the target's; struct and
    /// array targets take one argument per member or element.
    #[tracing::instrument(level = "trace", skip_all, fields(args = args.len()))]
    pub fn handle_constructor(&mut self, span: Span, ty: &Type, args: &[NodeId]) -> NodeId {
        if args.iter().any(|&a| self.is_error(a)) {
            return self.placeholder(span);
        }
        let node = if ty.is_array() {
            self.construct_array(span, ty, args)
        } else if ty.is_struct() {
            self.construct_struct(span, ty, args)
        } else if ty.is_arithmetic() {
            self.construct_arithmetic(span, ty, args)
        } else {
            None
        };
        match node {
            Some(node) => node,
            None => {
                let name = self.type_name(ty);
                self.error_node(span, SemaError::ConstructorMismatch(name))
            }
        }
    }

    fn construct_arithmetic(&mut self, span: Span, ty: &Type, args: &[NodeId]) -> Option<NodeId> {
        let target = rvalue(ty);
        if let [single] = *args {
            if self.ty(single).is_scalar() {
                return self.add_conversion(single, &target, span);
            }
        }
        let mut total = 0;
        let mut converted = Vec::with_capacity(args.len());
        for &arg in args {
            let arg_ty = self.ty(arg).clone();
            if !arg_ty.is_arithmetic() {
                return None;
            }
            total += arg_ty.component_count();
            converted.push(self.convert_basic(arg, target.basic, span)?);
        }
        if total != target.component_count() {
            return None;
        }
        let values: Option<Vec<ConstValue>> = converted
            .iter()
            .map(|&a| self.nodes.constant_values(a).map(<[_]>::to_vec))
            .try_fold(Vec::new(), |mut acc, v| {
                acc.extend(v?);
                Some(acc)
            });
        if let Some(values) = values {
            return Some(self.constant(&values, target, span));
        }
        Some(self.aggregate(Op::Construct, &converted, target, span))
    }

    fn construct_struct(&mut self, span: Span, ty: &Type, args: &[NodeId]) -> Option<NodeId> {
        let members = self.structs.members(ty.fields?).to_vec();
        if members.len() != args.len() {
            return None;
        }
        let mut converted = Vec::with_capacity(args.len());
        for (member, &arg) in members.iter().zip(args) {
            converted.push(self.convert_aggregate_part(arg, &member.ty, span)?);
        }
        Some(self.aggregate(Op::Construct, &converted, rvalue(ty), span))
    }

    fn construct_array(&mut self, span: Span, ty: &Type, args: &[NodeId]) -> Option<NodeId> {
        let mut target = rvalue(ty);
        match ty.arrays.outer() {
            Some(ArrayDim::Sized(n)) if n as usize != args.len() => return None,
            Some(ArrayDim::Unsized) => {
                let n = u32::try_from(args.len()).ok()?;
                target.arrays.set_outer(ArrayDim::Sized(n));
            }
            _ => {}
        }
        let element = ty.element();
        let mut converted = Vec::with_capacity(args.len());
        for &arg in args {
            converted.push(self.convert_aggregate_part(arg, &element, span)?);
        }
        Some(self.aggregate(Op::Construct, &converted, target, span))
    }

    fn convert_aggregate_part(&mut self, arg: NodeId, to: &Type, span: Span) -> Option<NodeId> {
        if to.is_struct() || to.is_array() || to.is_opaque() {
            return self.ty(arg).same_kind(to).then_some(arg);
        }
        self.add_conversion(arg, &rvalue(to), span)
    }

    /// `(T)operand`. Explicit casts may truncate without a warning, and a
    /// scalar cast to a struct zero-fills it.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn handle_cast(&mut self, span: Span, ty: &Type, operand: NodeId) -> NodeId {
        if self.is_error(operand) {
            return self.placeholder(span);
        }
        let from = self.ty(operand).clone();
        if from.same_kind(ty) {
            return operand;
        }
        if (ty.is_struct() || ty.is_array()) && from.is_scalar() {
            return self.zero_value(ty, span);
        }
        if ty.is_arithmetic() && from.is_arithmetic() {
            if let Some(node) = self.explicit_truncation(operand, &from, ty, span) {
                return node;
            }
            if let Some(node) = self.add_conversion(operand, &rvalue(ty), span) {
                return node;
            }
        }
        let _ = self.cannot_convert(span, &from, ty);
        self.placeholder(span)
    }

    fn explicit_truncation(&mut self, operand: NodeId, from: &Type, to: &Type, span: Span) -> Option<NodeId> {
        let shrinks = match (from.shape, to.shape) {
            (Shape::Vector(f), Shape::Vector(t)) => f > t,
            (Shape::Vector(_), Shape::Scalar) => true,
            _ => false,
        };
        if !shrinks {
            return None;
        }
        let converted = self.convert_basic(operand, to.basic, span)?;
        let target = rvalue(to);
        if let Some(values) = self.nodes.constant_values(converted) {
            let kept = values[..to.component_count() as usize].to_vec();
            return Some(self.constant(&kept, target, span));
        }
        if to.is_scalar() {
            return Some(self.index_direct(converted, 0, span));
        }
        Some(self.aggregate(Op::Construct, &[converted], target, span))
    }

    /// Zero of any sized type: constants for arithmetic types, nested
    /// constructors for structs and arrays.
    pub(crate) fn zero_value(&mut self, ty: &Type, span: Span) -> NodeId {
        if ty.is_array() {
            let count = ty.arrays.outer().and_then(ArrayDim::size).unwrap_or(0);
            let element = ty.element();
            let parts: Vec<NodeId> = (0..count).map(|_| self.zero_value(&element, span)).collect();
            return self.aggregate(Op::Construct, &parts, rvalue(ty), span);
        }
        if let Some(id) = ty.fields {
            let members = self.structs.members(id).to_vec();
            let parts: Vec<NodeId> = members.iter().map(|m| self.zero_value(&m.ty, span)).collect();
            return self.aggregate(Op::Construct, &parts, rvalue(ty), span);
        }
        self.zero(ty, span)
    }
}
