//! Symbols and the scoped symbol table.
//!
//! Scope 0 holds builtin intrinsics, scope 1 the unit's globals, deeper
//! scopes function locals. Functions are overloadable and always global, so
//! they live in a separate name → overload-list map. Synthesized variables
//! (flattened leaves, split builtins, temporaries) are allocated with
//! [`SymbolTable::add_hidden`] and never bound to a name.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Name, NodeId, Op, Span, Type};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A formal parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Option<Name>,
    pub ty: Type,
    /// Default argument expression.
    pub default: Option<NodeId>,
}

impl Param {
    pub fn new(name: Option<Name>, ty: Type) -> Self {
        Param {
            name,
            ty,
            default: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct FunctionSig {
    pub params: Vec<Param>,
    /// Operation a builtin lowers to; `None` for user functions.
    pub builtin_op: Option<Op>,
    pub defined: bool,
}

impl FunctionSig {
    pub fn is_builtin(&self) -> bool {
        self.builtin_op.is_some()
    }

    /// Minimum argument count once trailing defaults are taken into account.
    pub fn required_args(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |i| i + 1)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SymbolKind {
    /// Variable; `const_value` holds the folded constant node of a
    /// `static const` scalar.
    Variable { const_value: Option<NodeId> },
    Function(FunctionSig),
    /// Member of an anonymous block, accessible by bare name.
    AnonMember { block: SymbolId, index: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: Name,
    /// Variable type, or return type for functions.
    pub ty: Type,
    pub kind: SymbolKind,
    pub span: Span,
}

impl Symbol {
    pub fn variable(name: Name, ty: Type, span: Span) -> Self {
        Symbol {
            name,
            ty,
            kind: SymbolKind::Variable { const_value: None },
            span,
        }
    }

    pub fn function(name: Name, ret: Type, sig: FunctionSig, span: Span) -> Self {
        Symbol {
            name,
            ty: ret,
            kind: SymbolKind::Function(sig),
            span,
        }
    }

    pub fn signature(&self) -> Option<&FunctionSig> {
        match &self.kind {
            SymbolKind::Function(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn signature_mut(&mut self) -> Option<&mut FunctionSig> {
        match &mut self.kind {
            SymbolKind::Function(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function(_))
    }
}

/// Scope level of the builtin intrinsics.
pub const BUILTIN_LEVEL: usize = 0;
/// Scope level of unit-wide declarations.
pub const GLOBAL_LEVEL: usize = 1;

#[derive(Clone, Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<FxHashMap<Name, SymbolId>>,
    functions: FxHashMap<Name, SmallVec<[SymbolId; 4]>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: Vec::new(),
            scopes: vec![FxHashMap::default(), FxHashMap::default()],
            functions: FxHashMap::default(),
        }
    }

    fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let raw = u32::try_from(self.symbols.len())
            .unwrap_or_else(|_| panic!("symbol table exceeded u32::MAX entries"));
        self.symbols.push(symbol);
        SymbolId(raw)
    }

    // === Scopes ===

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > GLOBAL_LEVEL + 1, "popped global scope");
        if self.scopes.len() > GLOBAL_LEVEL + 1 {
            self.scopes.pop();
        }
    }

    pub fn level(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn at_global_scope(&self) -> bool {
        self.level() == GLOBAL_LEVEL
    }

    // === Insertion ===

    /// Bind a variable in the innermost scope. Fails with the existing
    /// symbol on redeclaration in the same scope.
    pub fn insert(&mut self, symbol: Symbol) -> Result<SymbolId, SymbolId> {
        let name = symbol.name;
        if let Some(&existing) = self.scopes.last().and_then(|s| s.get(&name)) {
            return Err(existing);
        }
        let id = self.alloc(symbol);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, id);
        }
        Ok(id)
    }

    /// Bind a variable at global scope regardless of the current depth.
    pub fn insert_global(&mut self, symbol: Symbol) -> Result<SymbolId, SymbolId> {
        let name = symbol.name;
        if let Some(&existing) = self.scopes[GLOBAL_LEVEL].get(&name) {
            return Err(existing);
        }
        let id = self.alloc(symbol);
        self.scopes[GLOBAL_LEVEL].insert(name, id);
        Ok(id)
    }

    /// Add a function overload. Callers check for redeclaration first.
    pub fn insert_function(&mut self, symbol: Symbol) -> SymbolId {
        debug_assert!(symbol.is_function());
        let name = symbol.name;
        let id = self.alloc(symbol);
        self.functions.entry(name).or_default().push(id);
        id
    }

    /// Allocate a symbol that is not reachable by name.
    pub fn add_hidden(&mut self, symbol: Symbol) -> SymbolId {
        self.alloc(symbol)
    }

    /// Rebind an existing symbol under a new name at global scope.
    pub fn rename_function(&mut self, id: SymbolId, new_name: Name) {
        let old = self.symbols[id.index()].name;
        if let Some(list) = self.functions.get_mut(&old) {
            list.retain(|f| *f != id);
        }
        self.symbols[id.index()].name = new_name;
        self.functions.entry(new_name).or_default().push(id);
    }

    // === Lookup ===

    /// Innermost variable binding for `name`.
    pub fn lookup(&self, name: Name) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name).copied())
    }

    /// Variable binding for `name` in the innermost scope only.
    pub fn lookup_current(&self, name: Name) -> Option<SymbolId> {
        self.scopes.last().and_then(|s| s.get(&name).copied())
    }

    /// All overloads of a function name, builtins first.
    pub fn functions(&self, name: Name) -> &[SymbolId] {
        self.functions.get(&name).map_or(&[], |list| list.as_slice())
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(u32::try_from(i).unwrap_or(u32::MAX)), s))
    }
}
