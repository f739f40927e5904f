//! Overload resolution.
//!
//! Selection runs in up to three steps:
//! 1. an exact signature match wins outright;
//! 2. otherwise the viable set is computed with widening-only conversions,
//!    then with narrowing allowed if that set is empty, and the best
//!    candidate is picked by [`better`] per parameter;
//! 3. for builtins, the arguments are promoted as the best candidate's
//!    operation would promote them and selection re-runs on the promoted
//!    types.
//!
//! A true tie is reported as ambiguous rather than resolved by order.

use hlsl_ir::{Name, NodeId, Op, Param, Span, SymbolId, Type};

use crate::convert::{better, convertible, ConversionMode};
use crate::{SemaContext, SemaError};

/// One overload as seen by selection.
#[derive(Copy, Clone, Debug)]
pub struct Candidate<'a> {
    pub id: SymbolId,
    pub params: &'a [Param],
    pub op: Option<Op>,
}

impl Candidate<'_> {
    fn fixed_params(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |i| i + 1)
    }

    fn accepts_count(&self, count: usize) -> bool {
        count >= self.fixed_params() && count <= self.params.len()
    }

    /// Every argument type equals its parameter type.
    fn is_exact(&self, args: &[Type]) -> bool {
        args.len() == self.params.len()
            && args.iter().zip(self.params).all(|(a, p)| a.same_kind(&p.ty))
    }

    fn is_viable(&self, args: &[Type], mode: ConversionMode) -> bool {
        if !self.accepts_count(args.len()) {
            return false;
        }
        args.iter().zip(self.params).enumerate().all(|(i, (arg, param))| {
            let storage = param.ty.qualifier.storage;
            let input_ok =
                !storage.is_param_input() || convertible(arg, &param.ty, self.op, i, mode);
            let output_ok =
                !storage.is_param_output() || convertible(&param.ty, arg, self.op, i, mode);
            input_ok && output_ok
        })
    }
}

/// Result of a successful selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub function: SymbolId,
    /// Another viable candidate is equally good.
    pub tie: bool,
}

/// Whether `can2` is better than `can1` for at least one argument.
fn better_param(args: &[Type], can1: &Candidate<'_>, can2: &Candidate<'_>) -> bool {
    args.iter()
        .enumerate()
        .any(|(i, arg)| better(arg, &can1.params[i].ty, &can2.params[i].ty))
}

/// Neither candidate is better than the other on any argument.
fn equivalent_params(args: &[Type], can1: &Candidate<'_>, can2: &Candidate<'_>) -> bool {
    args.iter().enumerate().all(|(i, arg)| {
        !better(arg, &can1.params[i].ty, &can2.params[i].ty)
            && !better(arg, &can2.params[i].ty, &can1.params[i].ty)
    })
}

/// Pick the best viable candidate for `args` under `mode`.
pub fn select_function(
    candidates: &[Candidate<'_>],
    args: &[Type],
    mode: ConversionMode,
) -> Option<Selection> {
    let viable: Vec<&Candidate<'_>> = candidates
        .iter()
        .filter(|c| c.is_viable(args, mode))
        .collect();
    let (&first, rest) = viable.split_first()?;
    if rest.is_empty() {
        return Some(Selection {
            function: first.id,
            tie: false,
        });
    }

    let mut incumbent = first;
    for &candidate in rest {
        if better_param(args, incumbent, candidate) && !better_param(args, candidate, incumbent) {
            incumbent = candidate;
        }
    }

    let tie = viable.iter().any(|&candidate| {
        candidate.id != incumbent.id
            && (better_param(args, incumbent, candidate)
                || equivalent_params(args, incumbent, candidate))
    });
    Some(Selection {
        function: incumbent.id,
        tie,
    })
}

/// Exact match first, then widening-only, then narrowing.
pub fn select_with_fallback(candidates: &[Candidate<'_>], args: &[Type]) -> Option<Selection> {
    if let Some(exact) = candidates.iter().find(|c| c.is_exact(args)) {
        return Some(Selection {
            function: exact.id,
            tie: false,
        });
    }
    select_function(candidates, args, ConversionMode::WideningOnly)
        .or_else(|| select_function(candidates, args, ConversionMode::AllowNarrowing))
}

impl SemaContext {
    fn candidates_for(&self, name: Name) -> Vec<Candidate<'_>> {
        self.symbols
            .functions(name)
            .iter()
            .filter_map(|&id| {
                self.symbols.get(id).signature().map(|sig| Candidate {
                    id,
                    params: &sig.params,
                    op: sig.builtin_op,
                })
            })
            .collect()
    }

    fn arg_types(&self, args: &[NodeId]) -> Vec<Type> {
        args.iter().map(|&a| self.ty(a).clone()).collect()
    }

    /// Resolve a call to `name`. On success the arguments may have been
    /// replaced by promoted versions (builtins only). Errors are reported
    /// here; `None` means the call cannot be built.
    #[tracing::instrument(level = "trace", skip_all, fields(name = self.str(name)))]
    pub(crate) fn resolve_overload(
        &mut self,
        span: Span,
        name: Name,
        args: &mut Vec<NodeId>,
    ) -> Option<SymbolId> {
        let arg_types = self.arg_types(args);
        let selection = {
            let candidates = self.candidates_for(name);
            if candidates.is_empty() {
                let err = SemaError::Undeclared(self.str(name).to_string());
                let _ = self.error(span, err);
                return None;
            }
            if let Some(exact) = candidates.iter().find(|c| c.is_exact(&arg_types)) {
                return Some(exact.id);
            }
            select_with_fallback(&candidates, &arg_types)
        };
        let Some(mut selection) = selection else {
            let err = SemaError::NoMatchingOverload(self.str(name).to_string());
            let _ = self.error(span, err);
            return None;
        };

        let builtin_op = self
            .symbols
            .get(selection.function)
            .signature()
            .and_then(|sig| sig.builtin_op);
        if let Some(op) = builtin_op {
            let promoted = self.promote_builtin_args(op, args, span);
            if let Some(promoted) = promoted {
                let promoted_types = self.arg_types(&promoted);
                if promoted_types != arg_types {
                    let candidates = self.candidates_for(name);
                    if let Some(reselected) = select_with_fallback(&candidates, &promoted_types) {
                        selection = reselected;
                        *args = promoted;
                    }
                }
            }
        }

        if selection.tie {
            let err = SemaError::AmbiguousOverload(self.str(name).to_string());
            let _ = self.error(span, err);
        }
        Some(selection.function)
    }
}
