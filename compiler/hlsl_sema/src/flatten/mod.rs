//! Composite flattening.
//!
//! An aggregate the binding model cannot address as a whole (a struct
//! holding resources, a uniform array when requested, a struct crossing a
//! stage boundary) is replaced by independently declared leaves. The
//! record keeps an offset table laid out level by level: a level with N
//! children owns N consecutive slots, each either pointing at the start of
//! a deeper level or naming a leaf. A reference walks the table one
//! constant index at a time; a partially walked reference is a symbol node
//! whose `flatten_subset` is the level reached so far.

use hlsl_ir::{NodeId, NodeKind, Qualifier, Span, Storage, SymbolId, Type};

use crate::context::indexed_type;
use crate::{SemaContext, SemaError};

/// One slot of a flattened aggregate's offset table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Start of the child's own level.
    Next(u32),
    /// Index into the leaf list.
    Leaf(u32),
}

/// Offset table and leaves of one flattened aggregate.
#[derive(Clone, Debug, Default)]
pub(crate) struct FlattenRecord {
    pub(crate) offsets: Vec<Slot>,
    pub(crate) leaves: Vec<SymbolId>,
}

impl FlattenRecord {
    /// Resolve a path of local indices from the level starting at `start`.
    pub(crate) fn walk(&self, start: u32, path: &[u32]) -> Option<Slot> {
        let mut slot = Slot::Next(start);
        for &index in path {
            let Slot::Next(start) = slot else {
                return None;
            };
            slot = *self.offsets.get((start + index) as usize)?;
        }
        Some(slot)
    }
}

#[derive(Default)]
struct Builder {
    record: FlattenRecord,
    next_binding: Option<u32>,
}

/// Child count of an aggregate level, `None` for an implicitly sized array.
fn child_count(ctx: &SemaContext, ty: &Type) -> Option<u32> {
    if ty.is_array() {
        ty.arrays.outer().and_then(|d| d.size())
    } else {
        ty.fields
            .map(|id| u32::try_from(ctx.structs.members(id).len()).unwrap_or(u32::MAX))
    }
}

impl SemaContext {
    /// Whether a variable of type `ty` declared with `storage` is flattened.
    pub(crate) fn should_flatten(&self, ty: &Type, storage: Storage, top_level: bool) -> bool {
        match storage {
            Storage::Uniform => {
                (ty.is_array() && self.options.flatten_uniform_arrays && top_level && ty.is_opaque())
                    || (ty.is_struct() && self.structs.contains_opaque(ty))
            }
            Storage::In | Storage::ConstReadOnly => {
                ty.is_struct() && self.structs.contains_opaque(ty)
            }
            _ => false,
        }
    }

    /// Build the flatten record of `symbol`. Returns `false` when the type
    /// cannot be flattened; the error has been reported.
    #[tracing::instrument(level = "debug", skip_all, fields(symbol = %self.symbol_name(symbol)))]
    pub(crate) fn flatten(&mut self, symbol: SymbolId, span: Span) -> bool {
        if self.flatten_map.contains_key(&symbol) {
            return true;
        }
        let sym = self.symbols.get(symbol);
        let ty = sym.ty.clone();
        let name = self.str(sym.name).to_string();
        let mut builder = Builder {
            next_binding: ty.qualifier.layout.binding,
            ..Builder::default()
        };
        if self.flatten_level(&mut builder, &ty, &name, &ty.qualifier, span).is_none() {
            return false;
        }
        tracing::debug!(leaves = builder.record.leaves.len(), "flattened");
        self.flatten_map.insert(symbol, builder.record);
        true
    }

    /// Reserve and fill one level; returns its start.
    fn flatten_level(
        &mut self,
        builder: &mut Builder,
        ty: &Type,
        name: &str,
        outer: &Qualifier,
        span: Span,
    ) -> Option<u32> {
        let Some(count) = child_count(self, ty) else {
            let _ = self.error(span, SemaError::FlattenUnsized(name.to_string()));
            return None;
        };
        let start = u32::try_from(builder.record.offsets.len()).unwrap_or(u32::MAX);
        let end = builder.record.offsets.len() + count as usize;
        builder.record.offsets.resize(end, Slot::Leaf(0));

        for i in 0..count {
            let (child, child_name) = if ty.is_array() {
                (ty.element(), format!("{name}[{i}]"))
            } else {
                let member = ty
                    .fields
                    .map(|id| self.structs.members(id)[i as usize].clone())?;
                let member_name = format!("{name}.{}", self.str(member.name));
                (member.ty, member_name)
            };
            let slot = if child.is_array() || child.is_struct() {
                Slot::Next(self.flatten_level(builder, &child, &child_name, outer, span)?)
            } else {
                Slot::Leaf(self.flatten_leaf(builder, child, &child_name, outer, span))
            };
            builder.record.offsets[(start + i) as usize] = slot;
        }
        Some(start)
    }

    fn flatten_leaf(
        &mut self,
        builder: &mut Builder,
        mut ty: Type,
        name: &str,
        outer: &Qualifier,
        span: Span,
    ) -> u32 {
        let storage = outer.storage;
        let leaf = if storage == Storage::Uniform && !ty.is_opaque() {
            // Ordinary data of a flattened uniform lives in `$Global`.
            self.grow_global_block(name, ty, span)
        } else {
            let mut qualifier = ty.qualifier;
            qualifier.storage = storage;
            if matches!(storage, Storage::Input | Storage::Output) {
                qualifier.interpolation = outer.interpolation;
                qualifier.aux |= outer.aux;
                qualifier.clear_uniform_layout();
            } else {
                qualifier.clear_interstage();
                qualifier.layout.offset = None;
            }
            if ty.is_opaque() {
                if let Some(binding) = builder.next_binding {
                    qualifier.layout.binding = Some(binding);
                    qualifier.layout.set = outer.layout.set;
                    qualifier.layout.register = outer.layout.register;
                    builder.next_binding = Some(binding + 1);
                }
            }
            ty.qualifier = qualifier;
            self.new_global(name, ty, span)
        };
        let index = u32::try_from(builder.record.leaves.len()).unwrap_or(u32::MAX);
        builder.record.leaves.push(leaf);
        index
    }

    /// The flattened symbol and level reached by `node`, if it refers to a
    /// flattened aggregate.
    pub(crate) fn flattened_position(&self, node: NodeId) -> Option<(SymbolId, u32)> {
        match self.nodes.kind(node) {
            NodeKind::Symbol {
                symbol,
                flatten_subset,
            } if self.flatten_map.contains_key(&symbol) => Some((symbol, flatten_subset.unwrap_or(0))),
            _ => None,
        }
    }

    pub(crate) fn is_flattened(&self, node: NodeId) -> bool {
        self.flattened_position(node).is_some()
    }

    /// Dereference a flattened aggregate by a constant index or member
    /// position, yielding either a deeper partial reference or a leaf.
    pub(crate) fn flatten_access(&mut self, base: NodeId, index: u32, span: Span) -> NodeId {
        let Some((symbol, start)) = self.flattened_position(base) else {
            return self.error_node(span, SemaError::Internal("flatten access on plain value".into()));
        };
        let base_ty = self.ty(base).clone();
        let in_range = index < child_count(self, &base_ty).unwrap_or(0);
        let slot = self
            .flatten_map
            .get(&symbol)
            .filter(|_| in_range)
            .and_then(|r| r.walk(start, &[index]));
        let child_ty = if base_ty.is_struct() {
            base_ty
                .fields
                .and_then(|id| self.structs.members(id).get(index as usize))
                .map_or_else(Type::error, |m| m.ty.clone())
        } else {
            indexed_type(&base_ty)
        };
        match slot {
            Some(Slot::Leaf(leaf)) => {
                let leaf = self.flatten_map[&symbol].leaves[leaf as usize];
                self.reference_symbol(leaf, span)
            }
            Some(Slot::Next(next)) => self.nodes.push(
                NodeKind::Symbol {
                    symbol,
                    flatten_subset: Some(next),
                },
                span,
                child_ty,
            ),
            None => {
                let err = SemaError::IndexOutOfRange {
                    index: i64::from(index),
                    ty: self.type_name(&base_ty),
                };
                self.error_node(span, err)
            }
        }
    }

    /// Bracket dereference of a flattened aggregate; the index must fold to
    /// a constant.
    pub(crate) fn flatten_index(&mut self, base: NodeId, index: NodeId, span: Span) -> NodeId {
        match self.nodes.scalar_constant(index).map(hlsl_ir::ConstValue::as_i64) {
            Some(i) if i >= 0 => self.flatten_access(base, u32::try_from(i).unwrap_or(u32::MAX), span),
            Some(i) => {
                let err = SemaError::IndexOutOfRange {
                    index: i,
                    ty: self.type_name(self.ty(base)),
                };
                self.error_node(span, err)
            }
            None => {
                let name = self
                    .flattened_position(base)
                    .map(|(s, _)| self.symbol_name(s))
                    .unwrap_or_default();
                self.error_node(span, SemaError::NonConstantFlattenIndex(name))
            }
        }
    }

    /// Leaves below the position `node` refers to, in declaration order.
    pub(crate) fn flattened_leaves(&self, node: NodeId) -> Vec<SymbolId> {
        let Some((symbol, start)) = self.flattened_position(node) else {
            return Vec::new();
        };
        let record = &self.flatten_map[&symbol];
        let count = child_count(self, self.ty(node)).unwrap_or(0);
        let mut out = Vec::new();
        collect_leaves(record, start, count, self, self.ty(node), &mut out);
        out
    }
}

fn collect_leaves(
    record: &FlattenRecord,
    start: u32,
    count: u32,
    ctx: &SemaContext,
    ty: &Type,
    out: &mut Vec<SymbolId>,
) {
    for i in 0..count {
        match record.offsets[(start + i) as usize] {
            Slot::Leaf(leaf) => out.push(record.leaves[leaf as usize]),
            Slot::Next(next) => {
                let child = if ty.is_array() {
                    ty.element()
                } else {
                    ty.fields
                        .map_or_else(Type::error, |id| ctx.structs.members(id)[i as usize].ty.clone())
                };
                let n = child_count(ctx, &child).unwrap_or(0);
                collect_leaves(record, next, n, ctx, &child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests;
