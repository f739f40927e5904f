//! The per-unit analyzer context.
//!
//! `SemaContext` owns every table the analysis touches: the IR storage
//! (interner, struct registry, node arena, symbol table), the diagnostics
//! queue, and the per-unit flatten/split/interstage-IO/counter maps. One
//! context is created per compilation unit and consumed by
//! [`finish`](SemaContext::finish); nothing in it is shared across units.
//!
//! ```text
//! SemaContext
//! ├── IR storage        interner, structs, nodes, symbols
//! ├── Diagnostics       DiagnosticQueue (running error count)
//! ├── Unit contents     top-level items, linkage list, $Global block
//! ├── Per-unit tables   flatten_map, split_io_vars, split_types,
//! │                     interstage_io, counters, bindings
//! ├── Entry point       entry, exec modes, call graph, locations
//! └── Function state    current function, loop/switch depth
//! ```

use hlsl_diagnostic::{DiagnosticConfig, DiagnosticQueue, ErrorGuaranteed};
use hlsl_ir::{
    BasicType, BuiltIn, ConstValue, Name, NodeArena, NodeId, NodeKind, Op, Qualifier, Span,
    Storage, StringInterner, StructId, StructRegistry, Symbol, SymbolId, SymbolTable, Type,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::entry::EntryState;
use crate::finish::{CallEdge, ExecutionModes};
use crate::flatten::FlattenRecord;
use crate::layout::BindingTracker;
use crate::{SemaError, SemaOptions};

/// Names the analyzer synthesizes or looks up repeatedly.
#[derive(Clone, Debug)]
pub(crate) struct WellKnownNames {
    pub(crate) global_block: Name,
    pub(crate) data: Name,
    pub(crate) count: Name,
    pub(crate) entry_output: Name,
    pub(crate) patch_constant_output: Name,
    pub(crate) patch_constant_result: Name,
}

impl WellKnownNames {
    fn new(interner: &mut StringInterner) -> Self {
        WellKnownNames {
            global_block: interner.intern("$Global"),
            data: interner.intern("@data"),
            count: interner.intern("@count"),
            entry_output: interner.intern("@entryPointOutput"),
            patch_constant_output: interner.intern("@patchConstantOutput"),
            patch_constant_result: interner.intern("@patchConstantResult"),
        }
    }
}

/// State of the function whose body is being analyzed.
#[derive(Clone, Debug)]
pub(crate) struct FunctionState {
    pub(crate) symbol: SymbolId,
    pub(crate) name: Name,
    pub(crate) ret: Type,
    /// Parameter variables in declaration order.
    pub(crate) params: Vec<SymbolId>,
}

/// The implicit `$Global` uniform block.
#[derive(Copy, Clone, Debug)]
pub(crate) struct GlobalBlock {
    pub(crate) symbol: SymbolId,
    pub(crate) fields: StructId,
}

pub struct SemaContext {
    // === Configuration ===
    pub(crate) options: SemaOptions,

    // === IR storage ===
    pub(crate) interner: StringInterner,
    pub(crate) structs: StructRegistry,
    pub(crate) nodes: NodeArena,
    pub(crate) symbols: SymbolTable,
    pub(crate) names: WellKnownNames,

    // === Diagnostics ===
    pub(crate) diagnostics: DiagnosticQueue,

    // === Unit contents ===
    /// Top-level items in source order: function definitions and global
    /// initializers.
    pub(crate) items: Vec<NodeId>,
    /// Linkage objects in declaration order.
    pub(crate) linkage: Vec<SymbolId>,
    pub(crate) global_block: Option<GlobalBlock>,

    // === Per-unit tables ===
    pub(crate) flatten_map: FxHashMap<SymbolId, FlattenRecord>,
    /// Split variable → variable holding the remaining ordinary members,
    /// `None` when every member was a builtin.
    pub(crate) split_io_vars: FxHashMap<SymbolId, Option<SymbolId>>,
    /// Struct member list → list with builtin members removed, per storage.
    pub(crate) split_types: FxHashMap<(StructId, Storage), StructId>,
    /// Independent builtin variables keyed by (builtin, direction).
    pub(crate) interstage_io: FxHashMap<(BuiltIn, Storage), SymbolId>,
    /// Counter-bearing buffer → hidden counter variable.
    pub(crate) counters: FxHashMap<SymbolId, SymbolId>,
    pub(crate) used_counters: FxHashSet<SymbolId>,
    /// Hidden counter parameters of user functions, per buffer parameter.
    pub(crate) counter_params: FxHashMap<SymbolId, SymbolId>,
    pub(crate) bindings: BindingTracker,

    // === Entry point ===
    pub(crate) entry: EntryState,
    pub(crate) exec: ExecutionModes,
    pub(crate) call_graph: Vec<CallEdge>,
    /// Geometry `Append` calls awaiting the stream output variable.
    pub(crate) gs_appends: Vec<NodeId>,
    pub(crate) next_in_location: u32,
    pub(crate) next_out_location: u32,

    // === Function state ===
    pub(crate) current: Option<FunctionState>,
    pub(crate) loop_depth: u32,
    pub(crate) switch_depth: u32,
    temp_counter: u32,
}

impl SemaContext {
    /// Create a context for one compilation unit. The builtin intrinsic
    /// table is installed at the builtin scope.
    pub fn new(options: SemaOptions) -> Self {
        let mut interner = StringInterner::new();
        let names = WellKnownNames::new(&mut interner);
        let diagnostics =
            DiagnosticQueue::with_config(DiagnosticConfig::with_error_limit(options.error_limit));
        let entry = EntryState::new(options.entry_point.as_deref().map(|n| interner.intern(n)));
        let mut ctx = SemaContext {
            options,
            interner,
            structs: StructRegistry::new(),
            nodes: NodeArena::new(),
            symbols: SymbolTable::new(),
            names,
            diagnostics,
            items: Vec::new(),
            linkage: Vec::new(),
            global_block: None,
            flatten_map: FxHashMap::default(),
            split_io_vars: FxHashMap::default(),
            split_types: FxHashMap::default(),
            interstage_io: FxHashMap::default(),
            counters: FxHashMap::default(),
            used_counters: FxHashSet::default(),
            counter_params: FxHashMap::default(),
            bindings: BindingTracker::default(),
            entry,
            exec: ExecutionModes::default(),
            call_graph: Vec::new(),
            gs_appends: Vec::new(),
            next_in_location: 0,
            next_out_location: 0,
            current: None,
            loop_depth: 0,
            switch_depth: 0,
            temp_counter: 0,
        };
        crate::builtins::install(&mut ctx);
        ctx
    }

    // ========================================
    // Accessors
    // ========================================

    #[inline]
    pub fn options(&self) -> &SemaOptions {
        &self.options
    }

    #[inline]
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn intern(&mut self, s: &str) -> Name {
        self.interner.intern(s)
    }

    #[inline]
    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    #[inline]
    pub fn structs(&self) -> &StructRegistry {
        &self.structs
    }

    #[inline]
    pub fn diagnostics(&self) -> &DiagnosticQueue {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }

    pub(crate) fn str(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    pub(crate) fn type_name(&self, ty: &Type) -> String {
        ty.display(&self.structs, &self.interner).to_string()
    }

    pub(crate) fn symbol_name(&self, symbol: SymbolId) -> String {
        self.str(self.symbols.get(symbol).name).to_string()
    }

    // ========================================
    // Diagnostics
    // ========================================

    /// Report an error and return proof of it.
    #[cold]
    pub(crate) fn error(&mut self, span: Span, err: SemaError) -> ErrorGuaranteed {
        debug_assert!(!err.is_warning(), "{err} reported as error");
        tracing::debug!(code = %err.code(), %err, "error");
        self.diagnostics.emit_error(err.into_diagnostic(span))
    }

    #[cold]
    pub(crate) fn warn(&mut self, span: Span, err: SemaError) {
        debug_assert!(err.is_warning(), "{err} reported as warning");
        self.diagnostics.warn(err.into_diagnostic(span));
    }

    /// Report an error and return a placeholder node typed as the error
    /// type, so the caller's construct continues best-effort.
    pub(crate) fn error_node(&mut self, span: Span, err: SemaError) -> NodeId {
        let _ = self.error(span, err);
        self.placeholder(span)
    }

    pub(crate) fn placeholder(&mut self, span: Span) -> NodeId {
        self.nodes.push(NodeKind::Error, span, Type::error())
    }

    pub(crate) fn cannot_convert(&mut self, span: Span, from: &Type, to: &Type) -> ErrorGuaranteed {
        let err = SemaError::CannotConvert {
            from: self.type_name(from),
            to: self.type_name(to),
        };
        self.error(span, err)
    }

    // ========================================
    // Node builders
    // ========================================

    #[inline]
    pub(crate) fn ty(&self, node: NodeId) -> &Type {
        self.nodes.ty(node)
    }

    pub(crate) fn is_error(&self, node: NodeId) -> bool {
        self.nodes.ty(node).is_error()
    }

    pub(crate) fn symbol_ref(&mut self, symbol: SymbolId, span: Span) -> NodeId {
        let ty = self.symbols.get(symbol).ty.clone();
        self.nodes.push(
            NodeKind::Symbol {
                symbol,
                flatten_subset: None,
            },
            span,
            ty,
        )
    }

    pub(crate) fn constant(&mut self, values: &[ConstValue], ty: Type, span: Span) -> NodeId {
        let values = self.nodes.push_consts(values);
        self.nodes.push(
            NodeKind::Constant { values },
            span,
            ty.with_qualifier(Qualifier::with_storage(Storage::Const)),
        )
    }

    pub(crate) fn int_const(&mut self, value: i64, span: Span) -> NodeId {
        self.constant(&[ConstValue::Int(value)], Type::scalar(BasicType::Int), span)
    }

    pub(crate) fn uint_const(&mut self, value: u64, span: Span) -> NodeId {
        self.constant(&[ConstValue::Uint(value)], Type::scalar(BasicType::Uint), span)
    }

    pub(crate) fn float_const(&mut self, value: f64, span: Span) -> NodeId {
        self.constant(&[ConstValue::float(value)], Type::scalar(BasicType::Float), span)
    }

    /// Zero of a scalar or vector type, used as a best-effort value.
    pub(crate) fn zero(&mut self, ty: &Type, span: Span) -> NodeId {
        let value = match ty.basic {
            BasicType::Bool => ConstValue::Bool(false),
            BasicType::Uint | BasicType::Uint64 => ConstValue::Uint(0),
            BasicType::Float | BasicType::Double => ConstValue::float(0.0),
            _ => ConstValue::Int(0),
        };
        let count = if ty.is_arithmetic() {
            ty.component_count() as usize
        } else {
            1
        };
        let values = vec![value; count];
        let ty = if ty.is_arithmetic() {
            rvalue(ty)
        } else {
            Type::scalar(BasicType::Int)
        };
        self.constant(&values, ty, span)
    }

    pub(crate) fn unary(&mut self, op: Op, operand: NodeId, ty: Type, span: Span) -> NodeId {
        self.nodes.push(NodeKind::Unary { op, operand }, span, ty)
    }

    pub(crate) fn binary(
        &mut self,
        op: Op,
        left: NodeId,
        right: NodeId,
        ty: Type,
        span: Span,
    ) -> NodeId {
        self.nodes.push(NodeKind::Binary { op, left, right }, span, ty)
    }

    pub(crate) fn aggregate(&mut self, op: Op, args: &[NodeId], ty: Type, span: Span) -> NodeId {
        let args = self.nodes.push_list(args);
        self.nodes.push(
            NodeKind::Aggregate {
                op,
                args,
                callee: None,
            },
            span,
            ty,
        )
    }

    pub(crate) fn call(&mut self, callee: SymbolId, args: &[NodeId], span: Span) -> NodeId {
        let ty = rvalue(&self.symbols.get(callee).ty);
        let args = self.nodes.push_list(args);
        self.nodes.push(
            NodeKind::Aggregate {
                op: Op::FunctionCall,
                args,
                callee: Some(callee),
            },
            span,
            ty,
        )
    }

    /// Raw assignment with no conversion or l-value checking.
    pub(crate) fn assign(&mut self, left: NodeId, right: NodeId, span: Span) -> NodeId {
        let ty = rvalue(self.nodes.ty(left));
        self.binary(Op::Assign, left, right, ty, span)
    }

    /// Statement sequence, typed void.
    pub(crate) fn sequence(&mut self, items: &[NodeId], span: Span) -> NodeId {
        self.aggregate(Op::Sequence, items, Type::void(), span)
    }

    /// Expression sequence whose value is the last item.
    pub(crate) fn comma(&mut self, items: &[NodeId], span: Span) -> NodeId {
        let ty = items
            .last()
            .map_or_else(Type::void, |&last| rvalue(self.nodes.ty(last)));
        self.aggregate(Op::Comma, items, ty, span)
    }

    /// Constant index into an array, vector or matrix.
    pub(crate) fn index_direct(&mut self, base: NodeId, index: u32, span: Span) -> NodeId {
        let ty = indexed_type(self.nodes.ty(base));
        let index = self.int_const(i64::from(index), span);
        self.binary(Op::IndexDirect, base, index, ty, span)
    }

    /// Run-time index into an array, vector or matrix.
    pub(crate) fn index_indirect(&mut self, base: NodeId, index: NodeId, span: Span) -> NodeId {
        let ty = indexed_type(self.nodes.ty(base));
        self.binary(Op::IndexIndirect, base, index, ty, span)
    }

    /// Member selection. The result keeps the member's own qualifiers but
    /// takes the storage class of the containing value.
    pub(crate) fn index_struct(&mut self, base: NodeId, member: usize, span: Span) -> NodeId {
        let base_ty = self.nodes.ty(base);
        let storage = base_ty.qualifier.storage;
        let ty = base_ty.fields.map_or_else(Type::error, |id| {
            self.structs.members(id)[member].ty.clone().with_storage(storage)
        });
        let index = self.int_const(i64::try_from(member).unwrap_or(i64::MAX), span);
        self.binary(Op::IndexDirectStruct, base, index, ty, span)
    }

    // ========================================
    // Synthesized variables
    // ========================================

    /// A fresh function-local temporary.
    pub(crate) fn new_temp(&mut self, ty: &Type, span: Span) -> SymbolId {
        self.temp_counter += 1;
        let name = self.interner.intern(&format!("@tmp{}", self.temp_counter));
        let ty = rvalue(ty);
        self.symbols.add_hidden(Symbol::variable(name, ty, span))
    }

    /// A hidden unit-level variable; linkage storage classes are tracked.
    pub(crate) fn new_global(&mut self, name: &str, ty: Type, span: Span) -> SymbolId {
        let name = self.interner.intern(name);
        let storage = ty.qualifier.storage;
        let id = self.symbols.add_hidden(Symbol::variable(name, ty, span));
        if storage.is_linkage() {
            self.linkage.push(id);
        }
        id
    }

    /// Whether a function body is being analyzed.
    pub(crate) fn in_function(&self) -> bool {
        self.current.is_some()
    }
}

/// Type of an r-value computed from `ty`: same shape, default qualifier.
pub(crate) fn rvalue(ty: &Type) -> Type {
    ty.clone().with_qualifier(Qualifier::default())
}

/// Result type of indexing `ty` once.
pub(crate) fn indexed_type(ty: &Type) -> Type {
    if ty.is_array() {
        ty.element()
    } else if ty.is_matrix() || ty.is_vector() {
        ty.component().with_qualifier(ty.qualifier)
    } else {
        Type::error()
    }
}
