//! Function declarations, definitions and calls.
//!
//! ```text
//! declarator   prototype or header; entry-point attributes land here
//! definition   opens the body scope and binds parameters
//! body end     builds Function[Parameters, body] and queues it
//! call         overload resolution, then a builtin op or a user call
//! ```
//!
//! A user call copies output arguments back through temporaries whenever
//! the argument is not a plain variable of the parameter's exact type, and
//! appends the hidden counter of every counted buffer argument.

use hlsl_ir::{
    BasicType, FunctionSig, NodeId, NodeKind, Op, Param, Span, Storage, Symbol, SymbolId, Type,
};

use crate::context::{rvalue, FunctionState};
use crate::entry::EntryAttribute;
use crate::finish::CallEdge;
use crate::{SemaContext, SemaError};

/// A formal parameter as written in a declarator.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub name: Option<String>,
    pub ty: Type,
    pub default: Option<NodeId>,
}

impl ParamDecl {
    pub fn new(name: &str, ty: Type) -> Self {
        ParamDecl {
            name: Some(name.to_string()),
            ty,
            default: None,
        }
    }
}

fn same_params(a: &[Param], b: &[Param]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.ty.same_kind(&y.ty) && x.ty.qualifier.storage == y.ty.qualifier.storage
        })
}

impl SemaContext {
    /// Function header. A declarator matching an earlier prototype reuses
    /// its symbol.
    #[tracing::instrument(level = "debug", skip_all, fields(name))]
    pub fn handle_function_declarator(
        &mut self,
        span: Span,
        name: &str,
        ret: Type,
        params: Vec<ParamDecl>,
        attributes: &[EntryAttribute],
    ) -> SymbolId {
        let name_id = self.intern(name);
        let params: Vec<Param> = params
            .into_iter()
            .map(|p| {
                let mut ty = p.ty;
                if ty.qualifier.storage == Storage::Temporary {
                    ty.qualifier.storage = Storage::In;
                }
                if ty.arrays.has_inner_unsized() {
                    let param_name = p.name.as_deref().unwrap_or(name).to_string();
                    let _ = self.error(span, SemaError::InnerUnsized(param_name));
                }
                Param {
                    name: p.name.map(|n| self.intern(&n)),
                    ty,
                    default: p.default,
                }
            })
            .collect();

        let prototype = self.symbols.functions(name_id).iter().copied().find(|&id| {
            self.symbols
                .get(id)
                .signature()
                .is_some_and(|sig| !sig.is_builtin() && same_params(&sig.params, &params))
        });
        let function = match prototype {
            Some(id) => {
                if !self.symbols.get(id).ty.same_kind(&ret) {
                    let _ = self.error(span, SemaError::Redefinition(name.to_string()));
                }
                // The defining declarator's parameter names win.
                if let Some(sig) = self.symbols.get_mut(id).signature_mut() {
                    for (old, new) in sig.params.iter_mut().zip(params) {
                        old.name = new.name.or(old.name);
                        old.default = new.default.or(old.default);
                    }
                }
                id
            }
            None => {
                let sig = FunctionSig {
                    params,
                    builtin_op: None,
                    defined: false,
                };
                self.symbols
                    .insert_function(Symbol::function(name_id, ret, sig, span))
            }
        };

        if self.entry.is_entry_name(name_id) {
            self.entry.function = Some(function);
            self.apply_entry_attributes(span, attributes);
        } else {
            for attribute in attributes {
                self.warn(span, SemaError::AttributeIgnored(attribute.name().to_string()));
            }
        }
        function
    }

    /// Open the body of `function`: push its scope and bind parameters.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %self.symbol_name(function)))]
    pub fn handle_function_definition(&mut self, span: Span, function: SymbolId) {
        let sym = self.symbols.get(function).clone();
        let Some(sig) = sym.signature() else {
            let _ = self.error(span, SemaError::Internal("definition of a non-function".into()));
            return;
        };
        if sig.defined {
            let _ = self.error(span, SemaError::Redefinition(self.str(sym.name).to_string()));
        }
        if let Some(sig) = self.symbols.get_mut(function).signature_mut() {
            sig.defined = true;
        }

        self.symbols.push_scope();
        let mut params = Vec::with_capacity(sig.params.len());
        for (i, param) in sig.params.iter().enumerate() {
            let id = match param.name {
                Some(name) => {
                    let var = Symbol::variable(name, param.ty.clone(), span);
                    match self.symbols.insert(var) {
                        Ok(id) => id,
                        Err(existing) => {
                            let _ = self.error(span, SemaError::Redefinition(self.str(name).to_string()));
                            existing
                        }
                    }
                }
                None => {
                    let name = self.intern(&format!("@param{i}"));
                    self.symbols
                        .add_hidden(Symbol::variable(name, param.ty.clone(), span))
                }
            };
            if self.should_flatten(&param.ty, param.ty.qualifier.storage, true) {
                self.flatten(id, span);
            }
            if self.is_counter_bearing(&param.ty) {
                let name = self.intern(&format!("{}@count", self.symbol_name(id)));
                let ty = self.counter_type();
                let counter = self.symbols.add_hidden(Symbol::variable(name, ty, span));
                self.counter_params.insert(id, counter);
            }
            params.push(id);
        }
        self.current = Some(FunctionState {
            symbol: function,
            name: sym.name,
            ret: sym.ty,
            params,
        });
        self.loop_depth = 0;
        self.switch_depth = 0;
    }

    /// Close the current function body and queue its definition node.
    pub fn handle_function_body_end(&mut self, span: Span, body: Option<NodeId>) -> NodeId {
        let Some(state) = self.current.take() else {
            return self.error_node(span, SemaError::Internal("function end outside a function".into()));
        };
        let mut refs = Vec::with_capacity(state.params.len());
        for &param in &state.params {
            match self.flatten_map.get(&param).map(|r| r.leaves.clone()) {
                Some(leaves) => {
                    for leaf in leaves {
                        refs.push(self.symbol_ref(leaf, span));
                    }
                }
                None => refs.push(self.symbol_ref(param, span)),
            }
            if let Some(&counter) = self.counter_params.get(&param) {
                refs.push(self.symbol_ref(counter, span));
            }
        }
        let params = self.aggregate(Op::Parameters, &refs, Type::void(), span);
        let body = body.unwrap_or_else(|| self.sequence(&[], span));
        let args = self.nodes.push_list(&[params, body]);
        let node = self.nodes.push(
            NodeKind::Aggregate {
                op: Op::Function,
                args,
                callee: Some(state.symbol),
            },
            span,
            rvalue(&state.ret),
        );
        self.symbols.pop_scope();
        self.items.push(node);
        node
    }

    /// `name(args...)`.
    #[tracing::instrument(level = "trace", skip_all, fields(name))]
    pub fn handle_function_call(&mut self, span: Span, name: &str, args: Vec<NodeId>) -> NodeId {
        if args.iter().any(|&a| self.is_error(a)) {
            return self.placeholder(span);
        }
        let name_id = self.intern(name);
        let mut args = args;
        let Some(function) = self.resolve_overload(span, name_id, &mut args) else {
            return self.placeholder(span);
        };
        let Some(sig) = self.symbols.get(function).signature().cloned() else {
            return self.placeholder(span);
        };
        match sig.builtin_op {
            Some(op) => self.builtin_call(span, function, op, &sig, &args),
            None => self.user_call(span, function, &sig, &args),
        }
    }

    fn builtin_call(&mut self, span: Span, function: SymbolId, op: Op, sig: &FunctionSig, args: &[NodeId]) -> NodeId {
        let mut converted = Vec::with_capacity(args.len());
        for (i, (&arg, param)) in args.iter().zip(&sig.params).enumerate() {
            if param.ty.qualifier.storage.is_param_output() {
                // An image element is resolved by the atomic decomposition.
                if self.nodes.op(arg) != Some(Op::ImageLoad) && !self.check_lvalue(arg, span) {
                    return self.placeholder(span);
                }
                converted.push(arg);
            } else if i == 0 && op.pins_first_argument() {
                converted.push(arg);
            } else {
                converted.push(self.convert_or_error(arg, &rvalue(&param.ty), span));
            }
        }
        let ret = rvalue(&self.symbols.get(function).ty);
        let node = self.aggregate(op, &converted, ret, span);
        self.decompose_intrinsic(node)
    }

    fn user_call(&mut self, span: Span, function: SymbolId, sig: &FunctionSig, args: &[NodeId]) -> NodeId {
        let mut call_args = Vec::with_capacity(sig.params.len());
        let mut before = Vec::new();
        let mut after = Vec::new();
        for (i, param) in sig.params.iter().enumerate() {
            let arg = match (args.get(i), param.default) {
                (Some(&arg), _) => arg,
                (None, Some(default)) => self.duplicate_ref(default),
                (None, None) => {
                    let err = SemaError::ArgumentCount {
                        name: self.symbol_name(function),
                        expected: sig.required_args(),
                        found: args.len(),
                    };
                    return self.error_node(span, err);
                }
            };
            let param_ty = rvalue(&param.ty);
            let storage = param.ty.qualifier.storage;

            if self.is_flattened(arg) {
                for leaf in self.flattened_leaves(arg) {
                    call_args.push(self.symbol_ref(leaf, span));
                }
            } else if storage.is_param_output() {
                if !self.check_lvalue(arg, span) {
                    return self.placeholder(span);
                }
                let direct = matches!(self.nodes.kind(arg), NodeKind::Symbol { .. })
                    && self.ty(arg).same_kind(&param_ty)
                    && !self.needs_member_copy(arg);
                if direct {
                    call_args.push(arg);
                } else {
                    let tmp = self.new_temp(&param_ty, span);
                    if storage.is_param_input() {
                        let source = self.duplicate_ref(arg);
                        let tmp_ref = self.symbol_ref(tmp, span);
                        before.extend(self.copy_value(tmp_ref, source, span));
                    }
                    call_args.push(self.symbol_ref(tmp, span));
                    let tmp_ref = self.symbol_ref(tmp, span);
                    after.extend(self.copy_value(arg, tmp_ref, span));
                }
            } else {
                match self.convert_argument(arg, &param_ty, span) {
                    Some(converted) => call_args.push(converted),
                    None => return self.placeholder(span),
                }
            }

            if let Some(counter) = self.counter_of(arg) {
                call_args.push(self.symbol_ref(counter, span));
            }
        }

        let call = self.call(function, &call_args, span);
        self.record_call(function);
        if before.is_empty() && after.is_empty() {
            return call;
        }
        let ret = rvalue(&self.symbols.get(function).ty);
        let mut items = before;
        if ret.is_void() {
            items.push(call);
            items.extend(after);
            return self.aggregate(Op::Comma, &items, Type::void(), span);
        }
        let result = self.new_temp(&ret, span);
        let result_ref = self.symbol_ref(result, span);
        items.push(self.assign(result_ref, call, span));
        items.extend(after);
        items.push(self.symbol_ref(result, span));
        self.comma(&items, span)
    }

    /// Assignments copying `src` into `dst`, converting scalars and vectors
    /// and going member by member through flattened or split aggregates.
    pub(crate) fn copy_value(&mut self, dst: NodeId, src: NodeId, span: Span) -> Vec<NodeId> {
        let dst_ty = self.ty(dst).clone();
        if dst_ty.is_struct() || dst_ty.is_array() {
            if !dst_ty.same_kind(self.ty(src)) {
                let from = self.ty(src).clone();
                let _ = self.cannot_convert(span, &from, &dst_ty);
                return Vec::new();
            }
            return self.copy_aggregate(dst, src, span);
        }
        let value = self.convert_or_error(src, &rvalue(&dst_ty), span);
        vec![self.assign(dst, value, span)]
    }

    fn convert_argument(&mut self, arg: NodeId, to: &Type, span: Span) -> Option<NodeId> {
        let from = self.ty(arg).clone();
        if to.is_struct() || to.is_array() || to.is_opaque() {
            if from.same_kind(to) {
                return Some(arg);
            }
            let _ = self.cannot_convert(span, &from, to);
            return None;
        }
        let converted = self.add_conversion(arg, to, span);
        if converted.is_none() {
            let _ = self.cannot_convert(span, &from, to);
        }
        converted
    }

    /// Hidden counter travelling with a counted buffer argument.
    pub(crate) fn counter_of(&mut self, arg: NodeId) -> Option<SymbolId> {
        if !self.is_counter_bearing(self.ty(arg)) {
            return None;
        }
        let symbol = self.nodes.symbol(arg)?;
        let counter = self
            .counters
            .get(&symbol)
            .or_else(|| self.counter_params.get(&symbol))
            .copied()?;
        self.used_counters.insert(counter);
        Some(counter)
    }

    fn record_call(&mut self, callee: SymbolId) {
        if let Some(state) = &self.current {
            let edge = CallEdge {
                caller: state.name,
                callee: self.symbols.get(callee).name,
            };
            tracing::trace!(caller = self.str(edge.caller), callee = self.str(edge.callee), "call");
            self.call_graph.push(edge);
        }
    }

    /// Scalar uint reference to member `@count` of a counter block.
    pub(crate) fn counter_value(&mut self, counter: SymbolId, span: Span) -> NodeId {
        let block = self.symbol_ref(counter, span);
        let value = self.index_struct(block, 0, span);
        debug_assert_eq!(self.ty(value).basic, BasicType::Uint);
        value
    }
}
