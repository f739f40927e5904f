use hlsl_diagnostic::ErrorCode;
use hlsl_ir::{
    BasicType, BranchKind, BuiltIn, ConstValue, LoopControl, NodeId, NodeKind, Op, Qualifier,
    Stage, Storage, SymbolKind, Topology, Type,
};
use pretty_assertions::assert_eq;

use crate::entry::DepthMode;
use crate::test_support::{codes, float, float4, library, open_function, semantic, S};
use crate::{ParamDecl, SemaContext};

fn local(ctx: &mut SemaContext, name: &str, ty: Type) -> NodeId {
    ctx.handle_variable_declaration(S, name, ty, None);
    ctx.handle_variable(S, name)
}

fn int() -> Type {
    Type::scalar(BasicType::Int)
}

fn float2() -> Type {
    Type::vector(BasicType::Float, 2)
}

/// Fragment-stage context inside `void f()`.
fn body() -> SemaContext {
    let mut ctx = library(Stage::Fragment);
    open_function(&mut ctx, "f");
    ctx
}

// === Names ===

#[test]
fn undeclared_name_reports_once() {
    let mut ctx = body();
    let first = ctx.handle_variable(S, "missing");
    let second = ctx.handle_variable(S, "missing");
    assert!(ctx.is_error(first));
    assert!(ctx.is_error(second));
    assert_eq!(codes(&ctx), vec![ErrorCode::E1006]);
}

#[test]
fn redeclared_local_is_rejected() {
    let mut ctx = body();
    ctx.handle_variable_declaration(S, "a", float(), None);
    ctx.handle_variable_declaration(S, "a", float(), None);
    assert_eq!(codes(&ctx), vec![ErrorCode::E1005]);
}

#[test]
fn inner_scope_may_shadow() {
    let mut ctx = body();
    ctx.handle_variable_declaration(S, "a", float(), None);
    ctx.begin_block();
    ctx.handle_variable_declaration(S, "a", int(), None);
    let inner = ctx.handle_variable(S, "a");
    assert_eq!(ctx.ty(inner).basic, BasicType::Int);
    ctx.end_block();
    let outer = ctx.handle_variable(S, "a");
    assert_eq!(ctx.ty(outer).basic, BasicType::Float);
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn cbuffer_members_are_global_names() {
    let mut ctx = library(Stage::Fragment);
    let block = ctx.handle_cbuffer(
        S,
        "Params",
        vec![("scale".into(), float()), ("tint".into(), float4())],
        Qualifier::default(),
        false,
    );
    open_function(&mut ctx, "f");
    let tint = ctx.handle_variable(S, "tint");
    let NodeKind::Binary { op, left, right } = ctx.nodes.kind(tint) else {
        panic!("block member selection");
    };
    assert_eq!(op, Op::IndexDirectStruct);
    assert_eq!(ctx.nodes.symbol(left), Some(block));
    assert_eq!(ctx.nodes.scalar_constant(right), Some(ConstValue::Int(1)));
    assert_eq!(ctx.ty(tint).qualifier.storage, Storage::Uniform);
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn loose_uniforms_join_the_global_block() {
    let mut ctx = library(Stage::Fragment);
    ctx.handle_variable_declaration(S, "exposure", float(), None);
    let name = ctx.intern("exposure");
    let symbol = ctx.symbols.lookup(name).unwrap();
    assert!(matches!(ctx.symbols.get(symbol).kind, SymbolKind::AnonMember { index: 0, .. }));
    let block = ctx.global_block.unwrap();
    assert_eq!(ctx.symbol_name(block.symbol), "$Global");
}

#[test]
fn global_constants_fold_into_references() {
    let mut ctx = library(Stage::Fragment);
    let two = ctx.float_const(2.0, S);
    ctx.handle_variable_declaration(S, "k", float().with_storage(Storage::Const), Some(two));
    open_function(&mut ctx, "f");
    let k = ctx.handle_variable(S, "k");
    assert_eq!(ctx.nodes.scalar_constant(k), Some(ConstValue::float(2.0)));
    // Folded constants queue no initializer.
    assert!(ctx.items.is_empty());
}

#[test]
fn static_initializers_are_queued() {
    let mut ctx = library(Stage::Fragment);
    let one = ctx.int_const(1, S);
    ctx.handle_variable_declaration(S, "g", float().with_storage(Storage::Global), Some(one));
    assert_eq!(ctx.items.len(), 1);
    assert_eq!(ctx.nodes.op(ctx.items[0]), Some(Op::Assign));
}

#[test]
fn local_initializer_is_an_assignment() {
    let mut ctx = body();
    let one = ctx.int_const(1, S);
    let init = ctx.handle_variable_declaration(S, "x", float(), Some(one)).unwrap();
    let NodeKind::Binary { op, right, .. } = ctx.nodes.kind(init) else {
        panic!("initializer");
    };
    assert_eq!(op, Op::Assign);
    assert_eq!(ctx.nodes.scalar_constant(right), Some(ConstValue::float(1.0)));
}

// === Functions ===

#[test]
fn prototype_and_definition_share_a_symbol() {
    let mut ctx = library(Stage::Fragment);
    let proto = ctx.handle_function_declarator(S, "g", float(), vec![ParamDecl::new("x", float())], &[]);
    let def = ctx.handle_function_declarator(S, "g", float(), vec![ParamDecl::new("y", float())], &[]);
    assert_eq!(proto, def);
    let name = ctx.intern("g");
    assert_eq!(ctx.symbols.functions(name).len(), 1);
}

#[test]
fn second_body_is_a_redefinition() {
    let mut ctx = library(Stage::Fragment);
    let g = open_function(&mut ctx, "g");
    ctx.handle_function_body_end(S, None);
    ctx.handle_function_definition(S, g);
    assert_eq!(codes(&ctx), vec![ErrorCode::E1005]);
}

#[test]
fn output_argument_copies_back_through_a_temporary() {
    let mut ctx = library(Stage::Fragment);
    let out_param = ParamDecl::new("v", float().with_storage(Storage::Out));
    let get = ctx.handle_function_declarator(S, "get", Type::void(), vec![out_param], &[]);
    ctx.handle_function_definition(S, get);
    ctx.handle_function_body_end(S, None);

    open_function(&mut ctx, "f");
    let v = local(&mut ctx, "color", float4());
    let x = ctx.handle_dot_dereference(S, v, "x");
    let call = ctx.handle_function_call(S, "get", vec![x]);
    assert_eq!(ctx.nodes.op(call), Some(Op::Comma));
    let ops: Vec<Option<Op>> = ctx.nodes.args(call).iter().map(|&n| ctx.nodes.op(n)).collect();
    assert_eq!(ops, vec![Some(Op::FunctionCall), Some(Op::Assign)]);
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn plain_output_variable_is_passed_directly() {
    let mut ctx = library(Stage::Fragment);
    let out_param = ParamDecl::new("v", float().with_storage(Storage::Out));
    let get = ctx.handle_function_declarator(S, "get", Type::void(), vec![out_param], &[]);
    ctx.handle_function_definition(S, get);
    ctx.handle_function_body_end(S, None);

    open_function(&mut ctx, "f");
    let v = local(&mut ctx, "x", float());
    let call = ctx.handle_function_call(S, "get", vec![v]);
    assert_eq!(ctx.nodes.op(call), Some(Op::FunctionCall));
}

#[test]
fn calls_are_recorded_in_the_call_graph() {
    let mut ctx = library(Stage::Fragment);
    open_function(&mut ctx, "helper");
    ctx.handle_function_body_end(S, None);
    open_function(&mut ctx, "f");
    ctx.handle_function_call(S, "helper", Vec::new());

    let edges: Vec<(&str, &str)> = ctx
        .call_graph
        .iter()
        .map(|e| (ctx.str(e.caller), ctx.str(e.callee)))
        .collect();
    assert_eq!(edges, vec![("f", "helper")]);
}

#[test]
fn missing_argument_takes_the_default() {
    let mut ctx = library(Stage::Fragment);
    let half = ctx.float_const(0.5, S);
    let param = ParamDecl {
        default: Some(half),
        ..ParamDecl::new("w", float())
    };
    let g = ctx.handle_function_declarator(S, "g", float(), vec![param], &[]);
    ctx.handle_function_definition(S, g);
    ctx.handle_function_body_end(S, None);

    open_function(&mut ctx, "f");
    let call = ctx.handle_function_call(S, "g", Vec::new());
    let args = ctx.nodes.args(call).to_vec();
    assert_eq!(args.len(), 1);
    assert_eq!(ctx.nodes.scalar_constant(args[0]), Some(ConstValue::float(0.5)));
}

#[test]
fn wrong_argument_count_matches_no_overload() {
    let mut ctx = library(Stage::Fragment);
    let g = ctx.handle_function_declarator(S, "g", float(), vec![ParamDecl::new("w", float())], &[]);
    ctx.handle_function_definition(S, g);
    ctx.handle_function_body_end(S, None);

    open_function(&mut ctx, "f");
    let call = ctx.handle_function_call(S, "g", Vec::new());
    assert!(ctx.is_error(call));
    assert_eq!(codes(&ctx), vec![ErrorCode::E2002]);
}

#[test]
fn unknown_function_is_undeclared() {
    let mut ctx = body();
    ctx.handle_function_call(S, "nowhere", Vec::new());
    assert_eq!(codes(&ctx), vec![ErrorCode::E1006]);
}

// === Operators ===

#[test]
fn mixed_arithmetic_promotes_to_float() {
    let mut ctx = body();
    let i = local(&mut ctx, "i", int());
    let f = local(&mut ctx, "x", float());
    let sum = ctx.handle_binary_math(S, Op::Add, i, f);
    assert_eq!(ctx.nodes.op(sum), Some(Op::Add));
    assert_eq!(ctx.ty(sum).basic, BasicType::Float);
}

#[test]
fn constant_operands_fold() {
    let mut ctx = body();
    let one = ctx.int_const(1, S);
    let two = ctx.int_const(2, S);
    let sum = ctx.handle_binary_math(S, Op::Add, one, two);
    assert_eq!(ctx.nodes.scalar_constant(sum), Some(ConstValue::Int(3)));

    let a = ctx.int_const(3, S);
    let b = ctx.int_const(4, S);
    let less = ctx.handle_binary_math(S, Op::LessThan, a, b);
    assert_eq!(ctx.nodes.scalar_constant(less), Some(ConstValue::Bool(true)));
}

#[test]
fn comparison_yields_bool_of_operand_shape() {
    let mut ctx = body();
    let a = local(&mut ctx, "a", float4());
    let b = local(&mut ctx, "b", float4());
    let less = ctx.handle_binary_math(S, Op::LessThan, a, b);
    assert_eq!(ctx.ty(less).basic, BasicType::Bool);
    assert_eq!(ctx.ty(less).vector_size(), 4);
}

#[test]
fn mismatched_vectors_truncate_with_a_warning() {
    let mut ctx = body();
    let a = local(&mut ctx, "a", float4());
    let b = local(&mut ctx, "b", float2());
    let sum = ctx.handle_binary_math(S, Op::Add, a, b);
    assert_eq!(ctx.ty(sum).vector_size(), 2);
    assert_eq!(ctx.error_count(), 0);
    assert_eq!(codes(&ctx), vec![ErrorCode::W1004]);
}

#[test]
fn scalar_product_keeps_the_vector_on_the_left() {
    let mut ctx = body();
    let s = local(&mut ctx, "s", float());
    let v = local(&mut ctx, "v", float4());
    let product = ctx.handle_binary_math(S, Op::Mul, s, v);
    let NodeKind::Binary { op, left, .. } = ctx.nodes.kind(product) else {
        panic!("product");
    };
    assert_eq!(op, Op::VectorTimesScalar);
    assert!(ctx.ty(left).is_vector());
}

#[test]
fn bitwise_operators_reject_floats() {
    let mut ctx = body();
    let a = local(&mut ctx, "a", float());
    let b = local(&mut ctx, "b", int());
    let node = ctx.handle_binary_math(S, Op::And, a, b);
    assert!(ctx.is_error(node));
    assert_eq!(codes(&ctx), vec![ErrorCode::E2006]);
}

#[test]
fn negation_folds_and_logical_not_yields_bool() {
    let mut ctx = body();
    let five = ctx.int_const(5, S);
    let neg = ctx.handle_unary_math(S, Op::Negative, five);
    assert_eq!(ctx.nodes.scalar_constant(neg), Some(ConstValue::Int(-5)));

    let v = local(&mut ctx, "v", float4());
    let not = ctx.handle_unary_math(S, Op::LogicalNot, v);
    assert_eq!(ctx.ty(not).basic, BasicType::Bool);
    assert_eq!(ctx.ty(not).vector_size(), 4);
}

#[test]
fn increment_requires_an_lvalue() {
    let mut ctx = body();
    let x = local(&mut ctx, "x", int());
    let inc = ctx.handle_unary_math(S, Op::PreIncrement, x);
    assert_eq!(ctx.nodes.op(inc), Some(Op::PreIncrement));

    let c = ctx.int_const(1, S);
    ctx.handle_unary_math(S, Op::PostIncrement, c);
    assert_eq!(codes(&ctx), vec![ErrorCode::E2005]);
}

#[test]
fn assignment_converts_the_right_side() {
    let mut ctx = body();
    let x = local(&mut ctx, "x", float());
    let one = ctx.int_const(1, S);
    let assign = ctx.handle_assign(S, Op::Assign, x, one);
    let NodeKind::Binary { op, right, .. } = ctx.nodes.kind(assign) else {
        panic!("assignment");
    };
    assert_eq!(op, Op::Assign);
    assert_eq!(ctx.nodes.scalar_constant(right), Some(ConstValue::float(1.0)));
}

#[test]
fn compound_scalar_multiply_keeps_vector_target() {
    let mut ctx = body();
    let v = local(&mut ctx, "v", float4());
    let two = ctx.int_const(2, S);
    let node = ctx.handle_assign(S, Op::MulAssign, v, two);
    assert_eq!(ctx.nodes.op(node), Some(Op::MulAssign));
    assert_eq!(ctx.ty(node).vector_size(), 4);
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn struct_assignment_copies_whole() {
    let mut ctx = library(Stage::Fragment);
    let ty = ctx.handle_struct_declaration(S, Some("P"), vec![("a".into(), float()), ("b".into(), float4())]);
    open_function(&mut ctx, "f");
    let x = local(&mut ctx, "x", ty.clone());
    let y = local(&mut ctx, "y", ty);
    let node = ctx.handle_assign(S, Op::Assign, x, y);
    assert_eq!(ctx.nodes.op(node), Some(Op::Assign));

    let z = local(&mut ctx, "z", float());
    let y = ctx.handle_variable(S, "y");
    ctx.handle_assign(S, Op::Assign, y, z);
    assert_eq!(codes(&ctx), vec![ErrorCode::E2001]);
}

// === Dereference ===

#[test]
fn vector_swizzles_select_components() {
    let mut ctx = body();
    let v = local(&mut ctx, "v", float4());
    let zy = ctx.handle_dot_dereference(S, v, "zy");
    let NodeKind::Binary { op, right, .. } = ctx.nodes.kind(zy) else {
        panic!("swizzle");
    };
    assert_eq!(op, Op::VectorSwizzle);
    assert_eq!(
        ctx.nodes.constant_values(right),
        Some(&[ConstValue::Int(2), ConstValue::Int(1)][..])
    );

    let v = ctx.handle_variable(S, "v");
    let g = ctx.handle_dot_dereference(S, v, "g");
    assert_eq!(ctx.nodes.op(g), Some(Op::IndexDirect));
}

#[test]
fn scalar_swizzle_broadcasts() {
    let mut ctx = body();
    let s = local(&mut ctx, "s", float());
    let xxx = ctx.handle_dot_dereference(S, s, "xxx");
    assert_eq!(ctx.nodes.op(xxx), Some(Op::Construct));
    assert_eq!(ctx.ty(xxx).vector_size(), 3);

    let s = ctx.handle_variable(S, "s");
    let x = ctx.handle_dot_dereference(S, s, "x");
    assert_eq!(ctx.nodes.symbol(x), ctx.nodes.symbol(s));
}

#[test]
fn bad_swizzles_are_rejected() {
    let mut ctx = body();
    let v = local(&mut ctx, "v", float2());
    ctx.handle_dot_dereference(S, v, "xz");
    let v = ctx.handle_variable(S, "v");
    ctx.handle_dot_dereference(S, v, "xg");
    assert_eq!(codes(&ctx), vec![ErrorCode::E1015, ErrorCode::E1015]);
}

#[test]
fn unknown_member_is_reported() {
    let mut ctx = library(Stage::Fragment);
    let ty = ctx.handle_struct_declaration(S, Some("P"), vec![("a".into(), float())]);
    open_function(&mut ctx, "f");
    let p = local(&mut ctx, "p", ty);
    let node = ctx.handle_dot_dereference(S, p, "b");
    assert!(ctx.is_error(node));
    assert_eq!(codes(&ctx), vec![ErrorCode::E1014]);
}

#[test]
fn constant_index_is_bounds_checked() {
    let mut ctx = body();
    let v = local(&mut ctx, "v", float4());
    let four = ctx.int_const(4, S);
    ctx.handle_bracket_dereference(S, v, four);
    assert_eq!(codes(&ctx), vec![ErrorCode::E2007]);
}

#[test]
fn variable_index_is_indirect() {
    let mut ctx = body();
    let arr = local(&mut ctx, "arr", float4().with_array(hlsl_ir::ArrayDim::Sized(8)));
    let i = local(&mut ctx, "i", Type::scalar(BasicType::Uint));
    let element = ctx.handle_bracket_dereference(S, arr, i);
    assert_eq!(ctx.nodes.op(element), Some(Op::IndexIndirect));
    assert!(ctx.ty(element).is_vector());
}

#[test]
fn scalars_are_not_indexable() {
    let mut ctx = body();
    let s = local(&mut ctx, "s", float());
    let zero = ctx.int_const(0, S);
    ctx.handle_bracket_dereference(S, s, zero);
    assert_eq!(codes(&ctx), vec![ErrorCode::E2008]);
}

// === Constructors and casts ===

#[test]
fn vector_constructor_concatenates_components() {
    let mut ctx = body();
    let xy = local(&mut ctx, "xy", float2());
    let z = local(&mut ctx, "z", float());
    let w = ctx.int_const(1, S);
    let node = ctx.handle_constructor(S, &float4(), &[xy, z, w]);
    assert_eq!(ctx.nodes.op(node), Some(Op::Construct));
    assert_eq!(ctx.nodes.args(node).len(), 3);
    assert_eq!(ctx.ty(node).vector_size(), 4);
}

#[test]
fn constant_constructor_folds() {
    let mut ctx = body();
    let half = ctx.float_const(0.5, S);
    let node = ctx.handle_constructor(S, &Type::vector(BasicType::Float, 3), &[half]);
    assert_eq!(ctx.nodes.constant_values(node).map(<[_]>::len), Some(3));
}

#[test]
fn constructor_component_count_must_match() {
    let mut ctx = body();
    let a = ctx.float_const(1.0, S);
    let b = ctx.float_const(2.0, S);
    let node = ctx.handle_constructor(S, &float4(), &[a, b]);
    assert!(ctx.is_error(node));
    assert_eq!(codes(&ctx), vec![ErrorCode::E2009]);
}

#[test]
fn struct_constructor_takes_one_argument_per_member() {
    let mut ctx = library(Stage::Fragment);
    let ty = ctx.handle_struct_declaration(S, Some("P"), vec![("a".into(), float()), ("b".into(), float4())]);
    open_function(&mut ctx, "f");
    let a = ctx.int_const(1, S);
    let b = local(&mut ctx, "b", float4());
    let node = ctx.handle_constructor(S, &ty, &[a, b]);
    assert_eq!(ctx.nodes.op(node), Some(Op::Construct));
    assert!(ctx.ty(node).is_struct());

    let a = ctx.int_const(1, S);
    ctx.handle_constructor(S, &ty, &[a]);
    assert_eq!(codes(&ctx), vec![ErrorCode::E2009]);
}

#[test]
fn explicit_cast_truncates_quietly() {
    let mut ctx = body();
    let v = local(&mut ctx, "v", float4());
    let x = ctx.handle_cast(S, &float(), v);
    assert_eq!(ctx.nodes.op(x), Some(Op::IndexDirect));

    let c = ctx.zero(&float4(), S);
    let xy = ctx.handle_cast(S, &Type::vector(BasicType::Int, 2), c);
    assert_eq!(
        ctx.nodes.constant_values(xy),
        Some(&[ConstValue::Int(0), ConstValue::Int(0)][..])
    );
    assert_eq!(ctx.diagnostics().warning_count(), 0);
}

#[test]
fn scalar_cast_to_struct_zero_fills() {
    let mut ctx = library(Stage::Fragment);
    let ty = ctx.handle_struct_declaration(S, Some("P"), vec![("a".into(), float()), ("b".into(), float4())]);
    open_function(&mut ctx, "f");
    let zero = ctx.int_const(0, S);
    let node = ctx.handle_cast(S, &ty, zero);
    assert_eq!(ctx.nodes.op(node), Some(Op::Construct));
    let parts = ctx.nodes.args(node).to_vec();
    assert_eq!(parts.len(), 2);
    assert!(parts.iter().all(|&p| ctx.nodes.is_constant(p)));
}

// === Statements ===

#[test]
fn conditions_must_be_scalar() {
    let mut ctx = body();
    let v = local(&mut ctx, "v", float4());
    ctx.handle_selection(S, v, None, None);
    assert_eq!(codes(&ctx), vec![ErrorCode::E2010]);
}

#[test]
fn selection_converts_condition_to_bool() {
    let mut ctx = body();
    let x = local(&mut ctx, "x", float());
    let node = ctx.handle_selection(S, x, None, None);
    let NodeKind::Selection { cond, .. } = ctx.nodes.kind(node) else {
        panic!("selection");
    };
    assert_eq!(ctx.ty(cond).basic, BasicType::Bool);
}

#[test]
fn ternary_broadcasts_a_scalar_arm() {
    let mut ctx = body();
    let c = local(&mut ctx, "c", Type::scalar(BasicType::Bool));
    let v = local(&mut ctx, "v", float4());
    let i = local(&mut ctx, "i", int());
    let node = ctx.handle_ternary(S, c, v, i);
    assert_eq!(ctx.ty(node).vector_size(), 4);
    assert_eq!(ctx.ty(node).basic, BasicType::Float);
}

#[test]
fn branches_outside_their_construct_are_misplaced() {
    let mut ctx = body();
    ctx.handle_break(S);
    ctx.handle_continue(S);
    ctx.handle_case(S, None);
    assert_eq!(
        codes(&ctx),
        vec![ErrorCode::E1012, ErrorCode::E1012, ErrorCode::E1012]
    );
}

#[test]
fn break_inside_loop_and_switch() {
    let mut ctx = body();
    ctx.begin_loop();
    let brk = ctx.handle_break(S);
    let cont = ctx.handle_continue(S);
    let loop_body = ctx.handle_sequence(S, &[brk, cont]);
    let node = ctx.handle_loop(S, None, Some(loop_body), None, true, LoopControl::None);
    assert!(matches!(ctx.nodes.kind(node), NodeKind::Loop { .. }));

    ctx.begin_switch();
    let one = ctx.int_const(1, S);
    let case = ctx.handle_case(S, Some(one));
    let brk = ctx.handle_break(S);
    let switch_body = ctx.handle_sequence(S, &[case, brk]);
    let selector = local(&mut ctx, "k", int());
    let node = ctx.handle_switch(S, selector, switch_body);
    assert!(matches!(ctx.nodes.kind(node), NodeKind::Switch { .. }));
    assert_eq!(ctx.error_count(), 0);

    // Depth is restored once the loop closes.
    ctx.handle_continue(S);
    assert_eq!(codes(&ctx), vec![ErrorCode::E1012]);
}

#[test]
fn switch_selector_must_be_an_integer() {
    let mut ctx = body();
    ctx.begin_switch();
    let body = ctx.handle_sequence(S, &[]);
    let selector = local(&mut ctx, "x", float());
    ctx.handle_switch(S, selector, body);
    assert_eq!(codes(&ctx), vec![ErrorCode::E2011]);
}

#[test]
fn loop_attributes_map_to_control() {
    let mut ctx = body();
    assert_eq!(ctx.handle_loop_attribute(S, "unroll"), LoopControl::Unroll);
    assert_eq!(ctx.handle_loop_attribute(S, "LOOP"), LoopControl::DontUnroll);
    assert_eq!(ctx.handle_loop_attribute(S, "fastopt"), LoopControl::None);
    assert_eq!(ctx.handle_loop_attribute(S, "sparkle"), LoopControl::None);
    assert_eq!(codes(&ctx), vec![ErrorCode::W1003]);
}

#[test]
fn return_converts_to_the_declared_type() {
    let mut ctx = library(Stage::Fragment);
    let g = ctx.handle_function_declarator(S, "g", float(), Vec::new(), &[]);
    ctx.handle_function_definition(S, g);
    let one = ctx.int_const(1, S);
    let ret = ctx.handle_return(S, Some(one));
    let NodeKind::Branch {
        kind: BranchKind::Return,
        value: Some(value),
    } = ctx.nodes.kind(ret)
    else {
        panic!("return with value");
    };
    assert_eq!(ctx.nodes.scalar_constant(value), Some(ConstValue::float(1.0)));

    ctx.handle_return(S, None);
    assert_eq!(codes(&ctx), vec![ErrorCode::E1013]);
}

#[test]
fn void_function_returns_no_value() {
    let mut ctx = body();
    let one = ctx.int_const(1, S);
    ctx.handle_return(S, Some(one));
    assert_eq!(codes(&ctx), vec![ErrorCode::E1013]);
}

#[test]
fn discard_is_a_fragment_branch() {
    let mut ctx = body();
    let node = ctx.handle_discard(S);
    assert!(matches!(
        ctx.nodes.kind(node),
        NodeKind::Branch {
            kind: BranchKind::Discard,
            value: None
        }
    ));
    assert_eq!(ctx.error_count(), 0);
}

// === Semantics ===

#[test]
fn system_values_become_builtins() {
    let mut ctx = library(Stage::Fragment);
    let target = semantic(&mut ctx, float4(), "SV_Target3");
    assert_eq!(target.qualifier.builtin, Some(BuiltIn::FragData(3)));
    let target = semantic(&mut ctx, float4(), "SV_TARGET");
    assert_eq!(target.qualifier.builtin, Some(BuiltIn::FragData(0)));
    let position = semantic(&mut ctx, float4(), "sv_position");
    assert_eq!(position.qualifier.builtin, Some(BuiltIn::Position));
    let clip = semantic(&mut ctx, float(), "SV_ClipDistance1");
    assert_eq!(clip.qualifier.builtin, Some(BuiltIn::ClipDistance));
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn user_semantics_are_kept_verbatim() {
    let mut ctx = library(Stage::Vertex);
    let uv = semantic(&mut ctx, float2(), "TexCoord1");
    assert_eq!(uv.qualifier.builtin, None);
    assert_eq!(uv.qualifier.semantic.map(|n| ctx.str(n).to_string()), Some("TexCoord1".into()));
}

#[test]
fn unknown_system_values_are_rejected() {
    let mut ctx = library(Stage::Fragment);
    let ty = semantic(&mut ctx, float4(), "SV_Sparkle");
    assert_eq!(ty.qualifier.builtin, None);
    semantic(&mut ctx, float4(), "SV_Target8");
    assert_eq!(codes(&ctx), vec![ErrorCode::E1004, ErrorCode::E1004]);
}

#[test]
fn conservative_depth_sets_the_depth_mode() {
    let mut ctx = library(Stage::Fragment);
    let depth = semantic(&mut ctx, float(), "SV_DepthGreaterEqual");
    assert_eq!(depth.qualifier.builtin, Some(BuiltIn::FragDepth));
    assert_eq!(ctx.exec.depth, DepthMode::Greater);
}

#[test]
fn geometry_input_must_agree() {
    let mut ctx = library(Stage::Geometry);
    assert_eq!(ctx.handle_input_geometry(S, Topology::Triangles), 3);
    assert_eq!(ctx.exec.input_primitive, Some(Topology::Triangles));
    ctx.handle_input_geometry(S, Topology::Triangles);
    assert_eq!(ctx.error_count(), 0);
    ctx.handle_input_geometry(S, Topology::Points);
    assert_eq!(codes(&ctx), vec![ErrorCode::E1010]);
    assert_eq!(ctx.exec.input_primitive, Some(Topology::Triangles));
}
