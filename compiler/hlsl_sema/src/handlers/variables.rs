//! Identifier references and the implicit `$Global` uniform block.

use hlsl_ir::{Member, NodeId, Span, Storage, StructDef, Symbol, SymbolId, SymbolKind, Type};

use crate::context::{rvalue, GlobalBlock};
use crate::{SemaContext, SemaError};

impl SemaContext {
    /// A bare identifier in an expression.
    pub fn handle_variable(&mut self, span: Span, name: &str) -> NodeId {
        let name = self.intern(name);
        match self.symbols.lookup(name) {
            Some(symbol) => self.reference_symbol(symbol, span),
            None => {
                let _ = self.error(span, SemaError::Undeclared(self.str(name).to_string()));
                // Later references find this and stay quiet.
                let fallback = Symbol::variable(name, Type::error(), span);
                match self.symbols.insert(fallback) {
                    Ok(id) | Err(id) => self.symbol_ref(id, span),
                }
            }
        }
    }

    /// Reference to a resolved symbol. Constants fold to a fresh constant
    /// node, anonymous-block members become member selections.
    pub(crate) fn reference_symbol(&mut self, symbol: SymbolId, span: Span) -> NodeId {
        let sym = self.symbols.get(symbol);
        match sym.kind {
            SymbolKind::Variable {
                const_value: Some(value),
            } => {
                let ty = rvalue(&sym.ty);
                let values = self.nodes.constant_values(value).map(<[_]>::to_vec);
                match values {
                    Some(values) => self.constant(&values, ty, span),
                    None => self.symbol_ref(symbol, span),
                }
            }
            SymbolKind::AnonMember { block, index } => {
                let block_ref = self.symbol_ref(block, span);
                self.index_struct(block_ref, index as usize, span)
            }
            SymbolKind::Function(_) => {
                let err = SemaError::Undeclared(self.symbol_name(symbol));
                self.error_node(span, err)
            }
            SymbolKind::Variable { const_value: None } => self.symbol_ref(symbol, span),
        }
    }

    fn global_block(&mut self, span: Span) -> GlobalBlock {
        if let Some(block) = self.global_block {
            return block;
        }
        let fields = self.structs.alloc_growable(StructDef {
            name: Some(self.names.global_block),
            members: Vec::new(),
        });
        let ty = Type::block(fields, Storage::Uniform);
        let name = self.str(self.names.global_block).to_string();
        let symbol = self.new_global(&name, ty, span);
        let block = GlobalBlock { symbol, fields };
        self.global_block = Some(block);
        block
    }

    /// Append a member to `$Global`, returning the member symbol (not yet
    /// bound to a name).
    fn append_global_member(&mut self, name: &str, ty: Type, span: Span) -> Symbol {
        let block = self.global_block(span);
        let block_qualifier = self.symbols.get(block.symbol).ty.qualifier;
        let name = self.intern(name);

        let mut qualifier = ty.qualifier;
        qualifier.clear_interstage();
        qualifier.storage = Storage::Uniform;
        qualifier.layout.binding = None;
        qualifier.layout.set = None;
        qualifier.layout.register = None;
        let mut member = Member::new(name, ty.with_qualifier(qualifier));
        let existing = self.structs.members(block.fields).to_vec();
        self.next_member_offset(span, &block_qualifier, &existing, &mut member);

        let member_ty = member.ty.clone();
        let index = self.structs.grow(block.fields, member);
        tracing::trace!(member = self.str(name), index, "grew $Global");
        Symbol {
            name,
            ty: member_ty,
            kind: SymbolKind::AnonMember {
                block: block.symbol,
                index: u32::try_from(index).unwrap_or(u32::MAX),
            },
            span,
        }
    }

    /// Hidden `$Global` member, for data pulled out of flattened uniforms.
    pub(crate) fn grow_global_block(&mut self, name: &str, ty: Type, span: Span) -> SymbolId {
        let member = self.append_global_member(name, ty, span);
        self.symbols.add_hidden(member)
    }

    /// User-visible `$Global` member bound by name at global scope.
    pub(crate) fn declare_global_uniform(&mut self, name: &str, ty: Type, span: Span) -> SymbolId {
        let member = self.append_global_member(name, ty, span);
        match self.symbols.insert_global(member) {
            Ok(id) => id,
            Err(existing) => {
                let _ = self.error(span, SemaError::Redefinition(name.to_string()));
                existing
            }
        }
    }
}
