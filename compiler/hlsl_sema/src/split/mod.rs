//! Composite splitting of interstage IO.
//!
//! Builtin-tagged members cannot live inside an interstage block, so a
//! struct crossing the stage boundary is split: each builtin member moves
//! to an independent variable shared per (builtin, direction), and the
//! remaining members stay aggregated in a shortened copy of the struct.
//!
//! References through a split root are kept "virtual" (original types,
//! original member numbers) until they reach a member that either is a
//! builtin, which resolves to the interstage variable, or contains no
//! builtins, at which point the chain is rebased onto the split variable
//! with members renumbered.

use hlsl_ir::{
    ArrayDim, AuxFlags, BuiltIn, Member, NodeId, NodeKind, Op, Span, Storage, StructDef, StructId,
    SymbolId, Type,
};

use crate::{SemaContext, SemaError};

/// Display name of an interstage builtin variable.
fn builtin_var_name(builtin: BuiltIn) -> String {
    let debug = format!("{builtin:?}");
    let plain: String = debug.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("@{plain}")
}

impl SemaContext {
    /// Interstage struct values with builtin members are split.
    pub(crate) fn should_split(&self, ty: &Type) -> bool {
        matches!(ty.qualifier.storage, Storage::Input | Storage::Output)
            && ty.is_struct()
            && self.structs.contains_builtin(ty)
    }

    /// `ty` with builtin members removed at every level, arrays kept.
    pub(crate) fn split_type(&mut self, ty: &Type) -> Type {
        let Some(id) = ty.fields else {
            return ty.clone();
        };
        let storage = ty.qualifier.storage;
        let split = self.split_struct(id, storage);
        Type {
            fields: Some(split),
            ..ty.clone()
        }
    }

    fn split_struct(&mut self, id: StructId, storage: Storage) -> StructId {
        if let Some(&split) = self.split_types.get(&(id, storage)) {
            return split;
        }
        let def = self.structs.get(id).clone();
        let members = def
            .members
            .iter()
            .filter(|m| m.ty.qualifier.interstage_builtin().is_none())
            .map(|m| {
                let ty = if m.ty.is_struct() {
                    let mut nested = m.ty.clone();
                    nested.qualifier.storage = storage;
                    let mut split = self.split_type(&nested);
                    split.qualifier.storage = m.ty.qualifier.storage;
                    split
                } else {
                    m.ty.clone()
                };
                Member::new(m.name, ty)
            })
            .collect::<Vec<_>>();
        let split = self.structs.intern(StructDef {
            name: def.name,
            members,
        });
        self.split_types.insert((id, storage), split);
        split
    }

    /// Split `symbol`, an interstage struct variable: declare its builtin
    /// members as independent variables and the rest as one shortened
    /// variable.
    #[tracing::instrument(level = "debug", skip_all, fields(symbol = %self.symbol_name(symbol)))]
    pub(crate) fn split(&mut self, symbol: SymbolId, span: Span) {
        if self.split_io_vars.contains_key(&symbol) {
            return;
        }
        let sym = self.symbols.get(symbol);
        let ty = sym.ty.clone();
        let name = self.str(sym.name).to_string();
        let owner_dim = ty.arrays.outer();
        self.declare_split_builtins(&ty, owner_dim, span);

        let split_ty = self.split_type(&ty);
        let has_ordinary = split_ty
            .fields
            .is_some_and(|id| !self.structs.members(id).is_empty());
        let split_var = has_ordinary.then(|| self.new_global(&name, split_ty, span));
        tracing::debug!(ordinary = has_ordinary, "split");
        self.split_io_vars.insert(symbol, split_var);
    }

    fn declare_split_builtins(&mut self, ty: &Type, owner_dim: Option<ArrayDim>, span: Span) {
        let Some(id) = ty.fields else {
            return;
        };
        let storage = ty.qualifier.storage;
        let members = self.structs.members(id).to_vec();
        for member in members {
            if let Some(builtin) = member.ty.qualifier.interstage_builtin() {
                self.interstage_builtin_var(builtin, storage, &member.ty, owner_dim, span);
            } else if member.ty.is_struct() {
                let mut nested = member.ty.clone();
                nested.qualifier.storage = storage;
                self.declare_split_builtins(&nested, owner_dim, span);
            }
        }
    }

    /// The independent variable for `builtin` in direction `storage`,
    /// declared on first use. An arrayed owner lends its outer dimension.
    pub(crate) fn interstage_builtin_var(
        &mut self,
        builtin: BuiltIn,
        storage: Storage,
        member_ty: &Type,
        owner_dim: Option<ArrayDim>,
        span: Span,
    ) -> SymbolId {
        let builtin = self.stage_builtin(builtin, storage);
        if let Some(&var) = self.interstage_io.get(&(builtin, storage)) {
            return var;
        }
        let mut ty = member_ty.clone();
        if let Some(dim) = owner_dim {
            ty = ty.with_array(dim);
        }
        let mut qualifier = member_ty.qualifier;
        qualifier.clear_uniform_layout();
        qualifier.layout.location = None;
        qualifier.storage = storage;
        qualifier.builtin = Some(builtin);
        if builtin.is_per_patch() {
            qualifier.aux |= AuxFlags::PATCH;
        }
        ty.qualifier = qualifier;
        let var = self.new_global(&builtin_var_name(builtin), ty, span);
        self.interstage_io.insert((builtin, storage), var);
        var
    }

    /// Split root reached by following `node` down its index chain.
    pub(crate) fn split_root_of(&self, node: NodeId) -> Option<SymbolId> {
        match self.nodes.kind(node) {
            NodeKind::Symbol { symbol, .. } if self.split_io_vars.contains_key(&symbol) => {
                Some(symbol)
            }
            NodeKind::Binary {
                op: Op::IndexDirect | Op::IndexIndirect | Op::IndexDirectStruct,
                left,
                ..
            } => self.split_root_of(left),
            _ => None,
        }
    }

    /// Array indices applied along a virtual split chain, outermost first.
    fn pending_indices(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if let NodeKind::Binary { op, left, right } = self.nodes.kind(node) {
            self.pending_indices(left, out);
            if op.is_index() {
                out.push(right);
            }
        }
    }

    /// Member access through a split root.
    pub(crate) fn split_member_access(&mut self, base: NodeId, member: usize, span: Span) -> NodeId {
        let base_ty = self.ty(base).clone();
        let Some(member_def) = base_ty
            .fields
            .and_then(|id| self.structs.members(id).get(member).cloned())
        else {
            return self.error_node(span, SemaError::Internal("split access past members".into()));
        };
        let storage = base_ty.qualifier.storage;

        if let Some(builtin) = member_def.ty.qualifier.interstage_builtin() {
            let mut indices = Vec::new();
            self.pending_indices(base, &mut indices);
            let root = self.split_root_of(base);
            let owner_dim = root.and_then(|r| self.symbols.get(r).ty.arrays.outer());
            let var = self.interstage_builtin_var(builtin, storage, &member_def.ty, owner_dim, span);
            let var_ref = self.symbol_ref(var, span);
            return match indices.as_slice() {
                [] => var_ref,
                [index] => {
                    let index = *index;
                    self.index_with(var_ref, index, span)
                }
                _ => {
                    let name = root.map(|r| self.symbol_name(r)).unwrap_or_default();
                    self.error_node(span, SemaError::MultiIndirectSplit(name))
                }
            };
        }

        let member_index = i64::try_from(member).unwrap_or(i64::MAX);
        if member_def.ty.is_struct() && self.structs.contains_builtin(&member_def.ty) {
            // Stay virtual: the chain keeps original numbering.
            let index = self.int_const(member_index, span);
            let ty = member_def.ty.clone().with_storage(storage);
            return self.binary(Op::IndexDirectStruct, base, index, ty, span);
        }
        match self.rebase_split(base, span) {
            Some(rebased) => {
                let renumbered = self.renumber(&base_ty, member);
                self.index_struct(rebased, renumbered, span)
            }
            None => self.error_node(span, SemaError::Internal("split chain without root".into())),
        }
    }

    /// Position of original member `member` among the non-builtin ones.
    fn renumber(&self, original: &Type, member: usize) -> usize {
        original.fields.map_or(member, |id| {
            self.structs.members(id)[..member]
                .iter()
                .filter(|m| m.ty.qualifier.interstage_builtin().is_none())
                .count()
        })
    }

    /// Rebuild a virtual chain against the split variable.
    fn rebase_split(&mut self, node: NodeId, span: Span) -> Option<NodeId> {
        match self.nodes.kind(node) {
            NodeKind::Symbol { symbol, .. } => {
                let split = (*self.split_io_vars.get(&symbol)?)?;
                Some(self.symbol_ref(split, span))
            }
            NodeKind::Binary {
                op: op @ (Op::IndexDirect | Op::IndexIndirect),
                left,
                right,
            } => {
                let rebased = self.rebase_split(left, span)?;
                let ty = self.ty(rebased).element();
                Some(self.binary(op, rebased, right, ty, span))
            }
            NodeKind::Binary {
                op: Op::IndexDirectStruct,
                left,
                right,
            } => {
                let member = self.nodes.scalar_constant(right)?.as_i64();
                let member = usize::try_from(member).ok()?;
                let original = self.ty(left).clone();
                let rebased = self.rebase_split(left, span)?;
                let renumbered = self.renumber(&original, member);
                Some(self.index_struct(rebased, renumbered, span))
            }
            _ => None,
        }
    }

    /// Index `base` by `index`, constant or not.
    pub(crate) fn index_with(&mut self, base: NodeId, index: NodeId, span: Span) -> NodeId {
        match self.nodes.scalar_constant(index).map(hlsl_ir::ConstValue::as_i64) {
            Some(i) if i >= 0 => self.index_direct(base, u32::try_from(i).unwrap_or(u32::MAX), span),
            _ => self.index_indirect(base, index, span),
        }
    }
}
