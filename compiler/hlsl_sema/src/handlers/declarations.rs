//! Struct, variable, constant-buffer and structured-buffer declarations.
//!
//! Where a global lands depends on its type and storage:
//!
//! ```text
//! static / const           module-private global (const folds on use)
//! groupshared              shared linkage object
//! resource handle          uniform linkage object, binding claimed
//! structured buffer        buffer block (+ hidden counter if counted)
//! struct holding resources flattened into leaves
//! anything else            member of the implicit $Global block
//! ```

use hlsl_ir::{
    ArrayDim, BasicType, Member, MemoryFlags, NodeId, Qualifier, Span, Storage, StructDef, Symbol,
    SymbolId, SymbolKind, Type,
};

use crate::context::rvalue;
use crate::{SemaContext, SemaError};

/// Structured and byte-address buffer flavors.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BufferKind {
    StructuredBuffer,
    RWStructuredBuffer,
    AppendStructuredBuffer,
    ConsumeStructuredBuffer,
    ByteAddressBuffer,
    RWByteAddressBuffer,
}

impl BufferKind {
    const ALL: [BufferKind; 6] = [
        BufferKind::StructuredBuffer,
        BufferKind::RWStructuredBuffer,
        BufferKind::AppendStructuredBuffer,
        BufferKind::ConsumeStructuredBuffer,
        BufferKind::ByteAddressBuffer,
        BufferKind::RWByteAddressBuffer,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            BufferKind::StructuredBuffer => "StructuredBuffer",
            BufferKind::RWStructuredBuffer => "RWStructuredBuffer",
            BufferKind::AppendStructuredBuffer => "AppendStructuredBuffer",
            BufferKind::ConsumeStructuredBuffer => "ConsumeStructuredBuffer",
            BufferKind::ByteAddressBuffer => "ByteAddressBuffer",
            BufferKind::RWByteAddressBuffer => "RWByteAddressBuffer",
        }
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, BufferKind::StructuredBuffer | BufferKind::ByteAddressBuffer)
    }

    /// Whether the buffer carries a hidden element counter.
    pub fn has_counter(self) -> bool {
        matches!(
            self,
            BufferKind::RWStructuredBuffer
                | BufferKind::AppendStructuredBuffer
                | BufferKind::ConsumeStructuredBuffer
        )
    }

    pub fn is_byte_address(self) -> bool {
        matches!(self, BufferKind::ByteAddressBuffer | BufferKind::RWByteAddressBuffer)
    }
}

impl SemaContext {
    /// `struct Name { members }`. Member order is kept as written.
    pub fn handle_struct_declaration(
        &mut self,
        span: Span,
        name: Option<&str>,
        members: Vec<(String, Type)>,
    ) -> Type {
        let mut list = Vec::with_capacity(members.len());
        for (member, ty) in members {
            if ty.arrays.has_inner_unsized() {
                let _ = self.error(span, SemaError::InnerUnsized(member.clone()));
            }
            list.push(Member::new(self.intern(&member), ty));
        }
        let name = name.map(|n| self.intern(n));
        let id = self.structs.intern(StructDef {
            name,
            members: list,
        });
        Type::structure(id)
    }

    /// Block type of a structured or byte-address buffer. The element array
    /// is the trailing runtime-sized `@data` member.
    pub fn structured_buffer_type(&mut self, kind: BufferKind, element: Option<Type>) -> Type {
        let element = match element {
            Some(ty) if !kind.is_byte_address() => rvalue(&ty),
            _ => Type::scalar(BasicType::Uint),
        };
        let name = self.intern(kind.type_name());
        let data = Member::new(self.names.data, element.with_array(ArrayDim::Unsized));
        let id = self.structs.intern(StructDef {
            name: Some(name),
            members: vec![data],
        });
        let mut ty = Type::block(id, Storage::Buffer);
        if kind.is_read_only() {
            ty.qualifier.memory |= MemoryFlags::READONLY;
        }
        ty
    }

    /// Flavor of a buffer block type.
    pub(crate) fn buffer_kind(&self, ty: &Type) -> Option<BufferKind> {
        if ty.basic != BasicType::Block || ty.is_array() {
            return None;
        }
        let name = self.structs.get(ty.fields?).name?;
        let name = self.str(name);
        BufferKind::ALL.into_iter().find(|k| k.type_name() == name)
    }

    pub(crate) fn is_counter_bearing(&self, ty: &Type) -> bool {
        self.buffer_kind(ty).is_some_and(BufferKind::has_counter)
    }

    /// Buffer block holding one `uint @count`.
    pub(crate) fn counter_type(&mut self) -> Type {
        let member = Member::new(self.names.count, Type::scalar(BasicType::Uint));
        let id = self.structs.intern(StructDef {
            name: Some(self.names.count),
            members: vec![member],
        });
        Type::block(id, Storage::Buffer)
    }

    /// Declare the hidden counter that travels with a counted buffer.
    pub(crate) fn declare_counter(&mut self, buffer: SymbolId, span: Span) -> SymbolId {
        let name = format!("{}@count", self.symbol_name(buffer));
        let mut ty = self.counter_type();
        let buffer_layout = self.symbols.get(buffer).ty.qualifier.layout;
        ty.qualifier.layout.set = buffer_layout.set;
        let counter = self.new_global(&name, ty, span);
        self.counters.insert(buffer, counter);
        counter
    }

    /// `cbuffer`/`tbuffer` block. Members become globally visible names
    /// resolving to member selections of the block.
    #[tracing::instrument(level = "debug", skip_all, fields(name))]
    pub fn handle_cbuffer(
        &mut self,
        span: Span,
        name: &str,
        members: Vec<(String, Type)>,
        qualifier: Qualifier,
        tbuffer: bool,
    ) -> SymbolId {
        let storage = if tbuffer { Storage::Buffer } else { Storage::Uniform };
        let mut block_qualifier = qualifier;
        block_qualifier.storage = storage;
        if tbuffer {
            block_qualifier.memory |= MemoryFlags::READONLY;
        }

        let mut list: Vec<Member> = members
            .into_iter()
            .map(|(member, ty)| {
                let mut q = ty.qualifier;
                q.clear_interstage();
                q.storage = Storage::Temporary;
                Member::new(self.intern(&member), ty.with_qualifier(q))
            })
            .collect();
        let size = self.fix_block_offsets(span, &block_qualifier, &mut list);
        tracing::debug!(members = list.len(), size, "block laid out");

        let block_name = self.intern(name);
        let id = self.structs.intern(StructDef {
            name: Some(block_name),
            members: list.clone(),
        });
        let ty = Type::block(id, storage).with_qualifier(block_qualifier);
        let block = self.new_global(name, ty, span);
        self.claim_binding(span, block, &block_qualifier);

        for (index, member) in list.into_iter().enumerate() {
            let member_name = self.str(member.name).to_string();
            let symbol = Symbol {
                name: member.name,
                ty: member.ty.with_storage(storage),
                kind: SymbolKind::AnonMember {
                    block,
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                },
                span,
            };
            if self.symbols.insert_global(symbol).is_err() {
                let _ = self.error(span, SemaError::Redefinition(member_name));
            }
        }
        block
    }

    /// Variable declaration. Global initializers are queued as unit items;
    /// a local initializer is returned as an assignment statement.
    #[tracing::instrument(level = "debug", skip_all, fields(name))]
    pub fn handle_variable_declaration(
        &mut self,
        span: Span,
        name: &str,
        ty: Type,
        init: Option<NodeId>,
    ) -> Option<NodeId> {
        let mut ty = ty;
        if ty.arrays.has_inner_unsized() {
            let _ = self.error(span, SemaError::InnerUnsized(name.to_string()));
        }
        if let Some(init) = init {
            if let (Some(ArrayDim::Unsized), Some(ArrayDim::Sized(n))) =
                (ty.arrays.outer(), self.ty(init).arrays.outer())
            {
                ty.arrays.set_outer(ArrayDim::Sized(n));
            }
        }
        if self.in_function() {
            self.declare_local(span, name, ty, init)
        } else {
            self.declare_global(span, name, ty, init);
            None
        }
    }

    fn declare_local(&mut self, span: Span, name: &str, ty: Type, init: Option<NodeId>) -> Option<NodeId> {
        let name_id = self.intern(name);
        let storage = ty.qualifier.storage;
        if storage == Storage::Const {
            if let Some(value) = init.and_then(|i| self.const_initializer(i, &ty, span)) {
                let symbol = Symbol {
                    name: name_id,
                    ty,
                    kind: SymbolKind::Variable {
                        const_value: Some(value),
                    },
                    span,
                };
                if self.symbols.insert(symbol).is_err() {
                    let _ = self.error(span, SemaError::Redefinition(name.to_string()));
                }
                return None;
            }
        }
        let mut qualifier = ty.qualifier;
        if !matches!(storage, Storage::Global | Storage::Const) {
            qualifier.storage = Storage::Temporary;
        }
        let ty = ty.with_qualifier(qualifier);
        let symbol = match self.symbols.insert(Symbol::variable(name_id, ty.clone(), span)) {
            Ok(id) => id,
            Err(_) => {
                let _ = self.error(span, SemaError::Redefinition(name.to_string()));
                return None;
            }
        };
        let init = init?;
        let target = self.symbol_ref(symbol, span);
        Some(self.initialize(span, target, &ty, init))
    }

    /// `target = init`, bypassing the l-value check so constants and
    /// read-only locals can be initialized.
    fn initialize(&mut self, span: Span, target: NodeId, ty: &Type, init: NodeId) -> NodeId {
        if self.is_error(init) {
            return self.placeholder(span);
        }
        let value = if ty.is_struct() || ty.is_array() {
            if self.ty(init).same_kind(ty) {
                init
            } else {
                let from = self.ty(init).clone();
                let _ = self.cannot_convert(span, &from, ty);
                return self.placeholder(span);
            }
        } else {
            self.convert_or_error(init, &rvalue(ty), span)
        };
        self.assign(target, value, span)
    }

    fn const_initializer(&mut self, init: NodeId, ty: &Type, span: Span) -> Option<NodeId> {
        if !ty.is_arithmetic() {
            return None;
        }
        let converted = self.add_conversion(init, &rvalue(ty), span)?;
        self.nodes.is_constant(converted).then_some(converted)
    }

    fn declare_global(&mut self, span: Span, name: &str, ty: Type, init: Option<NodeId>) {
        let storage = ty.qualifier.storage;
        match storage {
            Storage::Const | Storage::Global => {
                let folded = (storage == Storage::Const)
                    .then(|| init.and_then(|i| self.const_initializer(i, &ty, span)))
                    .flatten();
                let kind = SymbolKind::Variable {
                    const_value: folded,
                };
                let Some(symbol) = self.bind_global(span, name, ty.clone(), kind) else {
                    return;
                };
                if let (None, Some(init)) = (folded, init) {
                    let target = self.symbol_ref(symbol, span);
                    let assign = self.initialize(span, target, &ty, init);
                    self.items.push(assign);
                }
            }
            Storage::Shared => {
                if let Some(symbol) = self.bind_global(span, name, ty, SymbolKind::Variable { const_value: None }) {
                    self.linkage.push(symbol);
                }
            }
            Storage::Input | Storage::Output => {
                if let Some(symbol) = self.bind_global(span, name, ty.clone(), SymbolKind::Variable { const_value: None }) {
                    self.linkage.push(symbol);
                    if self.should_split(&ty) {
                        self.split(symbol, span);
                        self.linkage.retain(|&s| s != symbol);
                    }
                }
            }
            _ => self.declare_uniform(span, name, ty),
        }
    }

    /// A non-static global: a resource, a buffer, a flattened aggregate, or
    /// a `$Global` member.
    fn declare_uniform(&mut self, span: Span, name: &str, ty: Type) {
        let mut ty = ty;
        if ty.basic == BasicType::Block {
            ty.qualifier.storage = Storage::Buffer;
        } else {
            ty.qualifier.storage = Storage::Uniform;
        }
        let plain = SymbolKind::Variable { const_value: None };

        if ty.basic == BasicType::Block || ty.is_opaque() {
            let Some(symbol) = self.bind_global(span, name, ty.clone(), plain) else {
                return;
            };
            let qualifier = ty.qualifier;
            self.claim_binding(span, symbol, &qualifier);
            if self.should_flatten(&ty, Storage::Uniform, true) {
                self.flatten(symbol, span);
            } else {
                self.linkage.push(symbol);
            }
            if self.is_counter_bearing(&ty) {
                self.declare_counter(symbol, span);
            }
            return;
        }
        if self.should_flatten(&ty, Storage::Uniform, true) {
            if let Some(symbol) = self.bind_global(span, name, ty, plain) {
                self.flatten(symbol, span);
            }
            return;
        }
        if let Some(existing) = self.redeclared(name) {
            self.check_redeclaration(span, name, existing, &ty);
            return;
        }
        self.declare_global_uniform(name, ty, span);
    }

    fn redeclared(&self, name: &str) -> Option<SymbolId> {
        let name = self.interner.get(name)?;
        let existing = self.symbols.lookup(name)?;
        (!self.symbols.get(existing).is_function()).then_some(existing)
    }

    /// Bind `name` at global scope, checking any earlier declaration.
    fn bind_global(&mut self, span: Span, name: &str, ty: Type, kind: SymbolKind) -> Option<SymbolId> {
        if let Some(existing) = self.redeclared(name) {
            self.check_redeclaration(span, name, existing, &ty);
            return None;
        }
        let name = self.intern(name);
        let symbol = Symbol {
            name,
            ty,
            kind,
            span,
        };
        self.symbols.insert_global(symbol).ok()
    }

    /// A repeated global must agree with the first declaration in type and
    /// layout.
    fn check_redeclaration(&mut self, span: Span, name: &str, existing: SymbolId, ty: &Type) {
        let first = self.symbols.get(existing).ty.clone();
        if !first.same_kind(ty) {
            let _ = self.error(span, SemaError::Redefinition(name.to_string()));
        } else if first.qualifier.layout != ty.qualifier.layout {
            let _ = self.error(span, SemaError::InconsistentRedeclaration(name.to_string()));
        }
    }
}
