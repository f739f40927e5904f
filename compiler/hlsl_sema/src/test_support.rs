//! Builders shared by the unit tests: small shader programs driven through
//! the public handlers the way a parser would.

use hlsl_diagnostic::ErrorCode;
use hlsl_ir::{BasicType, NodeId, Span, Stage, SymbolId, Type};

use crate::{EntryAttribute, ParamDecl, SemaContext, SemaOptions};

pub(crate) const S: Span = Span::DUMMY;

pub(crate) fn float() -> Type {
    Type::scalar(BasicType::Float)
}

pub(crate) fn float4() -> Type {
    Type::vector(BasicType::Float, 4)
}

pub(crate) fn uint() -> Type {
    Type::scalar(BasicType::Uint)
}

/// Context with no entry point, for tests that only exercise handlers.
pub(crate) fn library(stage: Stage) -> SemaContext {
    SemaContext::new(SemaOptions {
        stage,
        entry_point: None,
        ..SemaOptions::default()
    })
}

pub(crate) fn shader(stage: Stage) -> SemaContext {
    SemaContext::new(SemaOptions::for_stage(stage, "main"))
}

/// `ty : semantic`.
pub(crate) fn semantic(ctx: &mut SemaContext, ty: Type, name: &str) -> Type {
    let mut qualifier = ty.qualifier;
    ctx.handle_semantic(S, &mut qualifier, name);
    ty.with_qualifier(qualifier)
}

/// Declare and define a function whose body statements come from `body`.
pub(crate) fn define(
    ctx: &mut SemaContext,
    name: &str,
    ret: Type,
    params: Vec<ParamDecl>,
    attributes: &[EntryAttribute],
    body: impl FnOnce(&mut SemaContext) -> Vec<NodeId>,
) -> SymbolId {
    let function = ctx.handle_function_declarator(S, name, ret, params, attributes);
    ctx.handle_function_definition(S, function);
    let statements = body(ctx);
    let body = ctx.handle_sequence(S, &statements);
    ctx.handle_function_body_end(S, Some(body));
    function
}

/// Open a `void name()` body; close it with `handle_function_body_end`.
pub(crate) fn open_function(ctx: &mut SemaContext, name: &str) -> SymbolId {
    let function = ctx.handle_function_declarator(S, name, Type::void(), Vec::new(), &[]);
    ctx.handle_function_definition(S, function);
    function
}

pub(crate) fn codes(ctx: &SemaContext) -> Vec<ErrorCode> {
    ctx.diagnostics().peek().map(|d| d.code).collect()
}
