//! Bracket and dot dereferences.
//!
//! Both route through the flatten and split engines first: a reference to
//! a flattened aggregate walks its offset table, a reference through a
//! split IO root stays virtual until it reaches a builtin or a plain
//! member. Everything else becomes an ordinary index node.

use hlsl_ir::{
    ArrayDim, BasicType, ConstValue, Dim, NodeId, Op, ResourceKind, Sampler, Span, Type,
};
use smallvec::SmallVec;

use crate::context::rvalue;
use crate::{SemaContext, SemaError};

/// Component selectors of a vector swizzle (`xyzw` or `rgba`, never mixed).
pub(crate) fn parse_swizzle(field: &str) -> Option<SmallVec<[u8; 4]>> {
    const SETS: [&[u8; 4]; 2] = [b"xyzw", b"rgba"];
    if field.is_empty() || field.len() > 4 {
        return None;
    }
    SETS.iter().find_map(|set| {
        field
            .bytes()
            .map(|b| {
                set.iter()
                    .position(|&c| c == b)
                    .and_then(|p| u8::try_from(p).ok())
            })
            .collect()
    })
}

impl SemaContext {
    /// `base[index]`.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn handle_bracket_dereference(&mut self, span: Span, base: NodeId, index: NodeId) -> NodeId {
        if self.is_error(base) || self.is_error(index) {
            return self.placeholder(span);
        }
        if self.is_flattened(base) {
            return self.flatten_index(base, index, span);
        }
        let base_ty = self.ty(base).clone();
        if !base_ty.is_array() {
            if let Some(sampler) = base_ty.sampler {
                return self.resource_element(span, base, index, sampler);
            }
            if let Some(data) = self.buffer_data_member(&base_ty) {
                let data_ref = self.index_struct(base, data, span);
                return self.checked_index(span, data_ref, index);
            }
        }
        if base_ty.is_array() || base_ty.is_vector() || base_ty.is_matrix() {
            return self.checked_index(span, base, index);
        }
        let name = self.describe(base);
        self.error_node(span, SemaError::NotIndexable(name))
    }

    /// Position of the trailing runtime-sized `@data` member of a
    /// structured or byte-address buffer block.
    pub(crate) fn buffer_data_member(&self, ty: &Type) -> Option<usize> {
        if ty.basic != BasicType::Block {
            return None;
        }
        let members = self.structs.members(ty.fields?);
        let last = members.len().checked_sub(1)?;
        (members[last].name == self.names.data && members[last].ty.is_unsized_array())
            .then_some(last)
    }

    fn checked_index(&mut self, span: Span, base: NodeId, index: NodeId) -> NodeId {
        let Some(index) = self.index_operand(span, index) else {
            return self.placeholder(span);
        };
        let base_ty = self.ty(base).clone();
        let bound = if base_ty.is_array() {
            base_ty.arrays.outer().and_then(ArrayDim::size)
        } else if base_ty.is_matrix() {
            Some(u32::from(base_ty.matrix_rows()))
        } else {
            Some(u32::from(base_ty.vector_size()))
        };
        if let Some(value) = self.nodes.scalar_constant(index).map(ConstValue::as_i64) {
            let in_range = value >= 0 && bound.is_none_or(|b| value < i64::from(b));
            if !in_range {
                let err = SemaError::IndexOutOfRange {
                    index: value,
                    ty: self.type_name(&base_ty),
                };
                return self.error_node(span, err);
            }
        }
        self.index_with(base, index, span)
    }

    /// The index as a scalar integer.
    fn index_operand(&mut self, span: Span, index: NodeId) -> Option<NodeId> {
        let ty = self.ty(index).clone();
        if !ty.is_scalar() || !ty.is_arithmetic() {
            let err = SemaError::InvalidOperand {
                op: "[]",
                operand: self.type_name(&ty),
            };
            let _ = self.error(span, err);
            return None;
        }
        if ty.basic.is_integer() {
            Some(index)
        } else {
            self.convert_basic(index, BasicType::Int, span)
        }
    }

    /// `tex[coord]` or `rwtex[coord]` as an explicit fetch or image load.
    fn resource_element(&mut self, span: Span, base: NodeId, index: NodeId, sampler: Sampler) -> NodeId {
        let op = match sampler.kind {
            ResourceKind::Image => Op::ImageLoad,
            ResourceKind::Texture => Op::TextureFetch,
            ResourceKind::Sampler | ResourceKind::Combined => {
                let name = self.describe(base);
                return self.error_node(span, SemaError::NotIndexable(name));
            }
        };
        let coord_ty = Type::vector(BasicType::Int, sampler.coord_size());
        let Some(coord) = self.add_conversion(index, &coord_ty, span) else {
            let from = self.ty(index).clone();
            let _ = self.cannot_convert(span, &from, &coord_ty);
            return self.placeholder(span);
        };
        let mut args = vec![base, coord];
        if op == Op::TextureFetch && sampler.dim != Dim::Buffer && !sampler.ms {
            args.push(self.int_const(0, span));
        }
        let ty = Type::vector(sampler.ret, sampler.ret_size);
        self.aggregate(op, &args, ty, span)
    }

    /// `base.field`: a struct member or a vector swizzle.
    #[tracing::instrument(level = "trace", skip_all, fields(field))]
    pub fn handle_dot_dereference(&mut self, span: Span, base: NodeId, field: &str) -> NodeId {
        if self.is_error(base) {
            return self.placeholder(span);
        }
        let base_ty = self.ty(base).clone();
        if base_ty.is_struct() && !base_ty.is_array() {
            return self.member_access(span, base, &base_ty, field);
        }
        if base_ty.is_arithmetic() && !base_ty.is_matrix() {
            return self.swizzle(span, base, &base_ty, field);
        }
        let err = SemaError::UnknownMember {
            member: field.to_string(),
            ty: self.type_name(&base_ty),
        };
        self.error_node(span, err)
    }

    fn member_access(&mut self, span: Span, base: NodeId, base_ty: &Type, field: &str) -> NodeId {
        let index = self
            .interner
            .get(field)
            .zip(base_ty.fields)
            .and_then(|(name, id)| self.structs.get(id).member_index(name));
        let Some(index) = index else {
            let err = SemaError::UnknownMember {
                member: field.to_string(),
                ty: self.type_name(base_ty),
            };
            return self.error_node(span, err);
        };
        if self.is_flattened(base) {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            return self.flatten_access(base, index, span);
        }
        if self.split_root_of(base).is_some() {
            return self.split_member_access(base, index, span);
        }
        self.index_struct(base, index, span)
    }

    fn swizzle(&mut self, span: Span, base: NodeId, base_ty: &Type, field: &str) -> NodeId {
        let size = base_ty.vector_size();
        let Some(selectors) = parse_swizzle(field).filter(|s| s.iter().all(|&c| c < size)) else {
            return self.error_node(span, SemaError::InvalidSwizzle(field.to_string()));
        };
        let count = u8::try_from(selectors.len()).unwrap_or(4);
        if base_ty.is_scalar() {
            if count == 1 {
                return base;
            }
            // A scalar swizzle broadcasts.
            let ty = Type::vector(base_ty.basic, count);
            return self.aggregate(Op::Construct, &[base], rvalue(&ty), span);
        }
        if count == 1 {
            return self.index_direct(base, u32::from(selectors[0]), span);
        }
        let values: Vec<ConstValue> = selectors
            .iter()
            .map(|&c| ConstValue::Int(i64::from(c)))
            .collect();
        let selector = self.constant(&values, Type::vector(BasicType::Int, count), span);
        let ty = Type::vector(base_ty.basic, count).with_qualifier(base_ty.qualifier);
        self.binary(Op::VectorSwizzle, base, selector, ty, span)
    }
}
