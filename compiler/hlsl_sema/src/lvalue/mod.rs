//! L-value checking and resource-element write lowering.
//!
//! `rwtex[coord]` is lowered to an explicit image load as soon as it is
//! dereferenced. When such a load turns out to be the target of an
//! assignment, compound assignment or increment it is rewritten into a
//! read-modify-write sequence, since the target model has no reference
//! into a resource element:
//!
//! ```text
//! rwtex[c] += v   =>   (@tmpC = c, @tmpV = load(rwtex, @tmpC),
//!                       @tmpV += v, store(rwtex, @tmpC, @tmpV), @tmpV)
//! ```

use hlsl_ir::{BasicType, MemoryFlags, NodeId, NodeKind, Op, Span, Storage, Type};

use crate::context::rvalue;
use crate::{SemaContext, SemaError};

/// Image handle and coordinate of an explicit image load.
pub(crate) fn image_load_operands(ctx: &SemaContext, node: NodeId) -> Option<(NodeId, NodeId)> {
    match ctx.nodes.kind(node) {
        NodeKind::Aggregate {
            op: Op::ImageLoad,
            args,
            ..
        } => match ctx.nodes.list(args) {
            &[image, coord] => Some((image, coord)),
            _ => None,
        },
        _ => None,
    }
}

impl SemaContext {
    /// Whether `node` reads an element of a resource (an image load or a
    /// texture fetch), possibly through a swizzle or component index.
    fn resource_read_below(&self, node: NodeId) -> Option<Op> {
        match self.nodes.kind(node) {
            NodeKind::Aggregate {
                op: op @ (Op::ImageLoad | Op::TextureFetch),
                ..
            } => Some(op),
            NodeKind::Binary {
                op: Op::VectorSwizzle | Op::IndexDirect | Op::IndexIndirect,
                left,
                ..
            } => self.resource_read_below(left),
            _ => None,
        }
    }

    /// Rewrite a write through a resource element. `rhs` is the assigned
    /// value for assignments, `None` for increments. Returns `None` when
    /// `target` is not a resource element and ordinary l-value rules apply.
    pub(crate) fn lower_resource_lvalue(
        &mut self,
        op: Op,
        target: NodeId,
        rhs: Option<NodeId>,
        span: Span,
    ) -> Option<NodeId> {
        let read = self.resource_read_below(target)?;
        if read == Op::TextureFetch {
            let name = self.describe(target);
            return Some(self.error_node(span, SemaError::ReadOnlyResource(name)));
        }
        let Some((image, coord)) = image_load_operands(self, target) else {
            let name = self.describe(target);
            return Some(self.error_node(span, SemaError::PartialResourceWrite(name)));
        };

        let value_ty = rvalue(self.ty(target));
        let coord_ty = self.ty(coord).clone();
        let coord_tmp = self.new_temp(&coord_ty, span);
        let coord_ref = self.symbol_ref(coord_tmp, span);
        let mut seq = vec![self.assign(coord_ref, coord, span)];

        let load = |ctx: &mut SemaContext| {
            let img = ctx.duplicate_ref(image);
            let c = ctx.symbol_ref(coord_tmp, span);
            ctx.aggregate(Op::ImageLoad, &[img, c], value_ty.clone(), span)
        };
        let store = |ctx: &mut SemaContext, value: NodeId| {
            let img = ctx.duplicate_ref(image);
            let c = ctx.symbol_ref(coord_tmp, span);
            ctx.aggregate(Op::ImageStore, &[img, c, value], Type::void(), span)
        };

        let result = match (op, rhs) {
            (Op::Assign, Some(rhs)) => {
                let value_tmp = self.new_temp(&value_ty, span);
                let v = self.symbol_ref(value_tmp, span);
                seq.push(self.assign(v, rhs, span));
                let v = self.symbol_ref(value_tmp, span);
                seq.push(store(self, v));
                value_tmp
            }
            (_, Some(rhs)) if op.compound_base().is_some() => {
                let value_tmp = self.new_temp(&value_ty, span);
                let v = self.symbol_ref(value_tmp, span);
                let loaded = load(self);
                seq.push(self.assign(v, loaded, span));
                let v = self.symbol_ref(value_tmp, span);
                seq.push(self.binary(op, v, rhs, value_ty.clone(), span));
                let v = self.symbol_ref(value_tmp, span);
                seq.push(store(self, v));
                value_tmp
            }
            (Op::PreIncrement | Op::PreDecrement, None) => {
                let value_tmp = self.new_temp(&value_ty, span);
                let v = self.symbol_ref(value_tmp, span);
                let loaded = load(self);
                seq.push(self.assign(v, loaded, span));
                let v = self.symbol_ref(value_tmp, span);
                let step = if op == Op::PreIncrement { Op::AddAssign } else { Op::SubAssign };
                let one = self.one(&value_ty, span);
                seq.push(self.binary(step, v, one, value_ty.clone(), span));
                let v = self.symbol_ref(value_tmp, span);
                seq.push(store(self, v));
                value_tmp
            }
            (Op::PostIncrement | Op::PostDecrement, None) => {
                // The prior value is the result; the stepped value is stored.
                let prior = self.new_temp(&value_ty, span);
                let stepped = self.new_temp(&value_ty, span);
                let p = self.symbol_ref(prior, span);
                let loaded = load(self);
                seq.push(self.assign(p, loaded, span));
                let p = self.symbol_ref(prior, span);
                let one = self.one(&value_ty, span);
                let step = if op == Op::PostIncrement { Op::Add } else { Op::Sub };
                let next = self.binary(step, p, one, value_ty.clone(), span);
                let s = self.symbol_ref(stepped, span);
                seq.push(self.assign(s, next, span));
                let s = self.symbol_ref(stepped, span);
                seq.push(store(self, s));
                prior
            }
            _ => {
                let err = SemaError::Internal(format!("unexpected resource write {op:?}"));
                return Some(self.error_node(span, err));
            }
        };
        seq.push(self.symbol_ref(result, span));
        Some(self.comma(&seq, span))
    }

    /// One of the same type, for increments.
    pub(crate) fn one(&mut self, ty: &Type, span: Span) -> NodeId {
        let one = match ty.basic {
            BasicType::Uint | BasicType::Uint64 => self.uint_const(1, span),
            BasicType::Float | BasicType::Double => self.float_const(1.0, span),
            _ => self.int_const(1, span),
        };
        self.add_conversion(one, &rvalue(ty), span).unwrap_or(one)
    }

    /// Check that `node` may be written, reporting why not.
    pub(crate) fn check_lvalue(&mut self, node: NodeId, span: Span) -> bool {
        if self.is_error(node) {
            return false;
        }
        match self.lvalue_problem(node) {
            None => true,
            Some(err) => {
                let _ = self.error(span, err);
                false
            }
        }
    }

    fn lvalue_problem(&self, node: NodeId) -> Option<SemaError> {
        let ty = self.ty(node);
        match self.nodes.kind(node) {
            NodeKind::Symbol { .. } => {
                if ty.qualifier.memory.contains(MemoryFlags::READONLY) {
                    return Some(SemaError::ReadOnlyResource(self.describe(node)));
                }
                let storage = ty.qualifier.storage;
                if ty.is_opaque() || !storage.is_writable() {
                    return Some(SemaError::NotLValue(self.describe(node)));
                }
                None
            }
            NodeKind::Binary {
                op: Op::VectorSwizzle,
                left,
                right,
            } => {
                let repeated = self.nodes.constant_values(right).is_some_and(|values| {
                    values
                        .iter()
                        .enumerate()
                        .any(|(i, v)| values[..i].contains(v))
                });
                if repeated {
                    return Some(SemaError::NotLValue(self.describe(node)));
                }
                self.lvalue_problem(left)
            }
            NodeKind::Binary {
                op: Op::IndexDirect | Op::IndexIndirect | Op::IndexDirectStruct,
                left,
                ..
            } => {
                if self.ty(left).qualifier.memory.contains(MemoryFlags::READONLY) {
                    return Some(SemaError::ReadOnlyResource(self.describe(node)));
                }
                self.lvalue_problem(left)
            }
            NodeKind::Error => None,
            _ => {
                if ty.qualifier.storage == Storage::Const {
                    return Some(SemaError::NotLValue("constant".to_string()));
                }
                Some(SemaError::NotLValue(self.describe(node)))
            }
        }
    }

    /// Short description of an expression for diagnostics: the name of the
    /// variable it is rooted at, or its type.
    pub(crate) fn describe(&self, node: NodeId) -> String {
        match self.nodes.kind(node) {
            NodeKind::Symbol { symbol, .. } => self.symbol_name(symbol),
            NodeKind::Binary { left, .. } => self.describe(left),
            NodeKind::Aggregate { args, .. } => match self.nodes.list(args).first() {
                Some(&first) => self.describe(first),
                None => self.type_name(self.ty(node)),
            },
            _ => self.type_name(self.ty(node)),
        }
    }
}

#[cfg(test)]
mod tests;
