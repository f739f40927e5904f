use hlsl_diagnostic::ErrorCode;
use hlsl_ir::{ConstValue, Dim, Sampler, Stage, SymbolId};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_support::{codes, float, float4, library, open_function, uint, S};
use crate::BufferKind;

/// Global `RWTexture2D<float4> img` and `Texture2D<float4> tex`, then a
/// function body to write into.
fn images() -> SemaContext {
    let mut ctx = library(Stage::Compute);
    let image = Type::resource(Sampler::image(Dim::D2, BasicType::Float, 4));
    let texture = Type::resource(Sampler::texture(Dim::D2, BasicType::Float, 4));
    ctx.handle_variable_declaration(S, "img", image, None);
    ctx.handle_variable_declaration(S, "tex", texture, None);
    open_function(&mut ctx, "f");
    ctx
}

fn element(ctx: &mut SemaContext, resource: &str) -> NodeId {
    let base = ctx.handle_variable(S, resource);
    let coord = ctx.constant(
        &[ConstValue::Int(3), ConstValue::Int(4)],
        Type::vector(BasicType::Int, 2),
        S,
    );
    ctx.handle_bracket_dereference(S, base, coord)
}

fn ops(ctx: &SemaContext, node: NodeId) -> Vec<Option<Op>> {
    ctx.nodes.args(node).iter().map(|&n| ctx.nodes.op(n)).collect()
}

fn last_symbol(ctx: &SemaContext, node: NodeId) -> Option<SymbolId> {
    ctx.nodes.args(node).last().and_then(|&n| ctx.nodes.symbol(n))
}

// === Resource writes ===

#[test]
fn image_assignment_becomes_store() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let value = ctx.zero(&float4(), S);
    let node = ctx.handle_assign(S, Op::Assign, target, value);

    assert_eq!(ctx.nodes.op(node), Some(Op::Comma));
    assert_eq!(
        ops(&ctx, node),
        vec![Some(Op::Assign), Some(Op::Assign), Some(Op::ImageStore), None]
    );
    assert_eq!(ctx.ty(node).vector_size(), 4);
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn image_store_reads_cached_coordinate() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let value = ctx.zero(&float4(), S);
    let node = ctx.handle_assign(S, Op::Assign, target, value);

    let args = ctx.nodes.args(node).to_vec();
    let NodeKind::Binary { left: coord_tmp, .. } = ctx.nodes.kind(args[0]) else {
        panic!("coordinate cache");
    };
    let store_args = ctx.nodes.args(args[2]);
    assert_eq!(store_args.len(), 3);
    assert_eq!(ctx.nodes.symbol(store_args[1]), ctx.nodes.symbol(coord_tmp));
}

#[test]
fn compound_image_assignment_loads_first() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let value = ctx.zero(&float4(), S);
    let node = ctx.handle_assign(S, Op::AddAssign, target, value);
    assert_eq!(
        ops(&ctx, node),
        vec![
            Some(Op::Assign),
            Some(Op::Assign),
            Some(Op::AddAssign),
            Some(Op::ImageStore),
            None
        ]
    );
    let NodeKind::Binary { right: loaded, .. } = ctx.nodes.kind(ctx.nodes.args(node)[1]) else {
        panic!("load into temporary");
    };
    assert_eq!(ctx.nodes.op(loaded), Some(Op::ImageLoad));
}

#[test]
fn load_and_store_reference_image_separately() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let value = ctx.zero(&float4(), S);
    let node = ctx.handle_assign(S, Op::AddAssign, target, value);
    let args = ctx.nodes.args(node).to_vec();

    let NodeKind::Binary { right: loaded, .. } = ctx.nodes.kind(args[1]) else {
        panic!("load into temporary");
    };
    let load_image = ctx.nodes.args(loaded)[0];
    let store_image = ctx.nodes.args(args[3])[0];
    assert_ne!(load_image, store_image);
    assert_eq!(ctx.nodes.symbol(load_image), ctx.nodes.symbol(store_image));
    assert!(ctx.nodes.symbol(load_image).is_some());
}

#[test]
fn post_increment_yields_prior_value() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let node = ctx.handle_unary_math(S, Op::PostIncrement, target);
    let args = ctx.nodes.args(node).to_vec();
    assert_eq!(args.len(), 5);

    let NodeKind::Binary { left: prior, .. } = ctx.nodes.kind(args[1]) else {
        panic!("prior value");
    };
    assert_eq!(last_symbol(&ctx, node), ctx.nodes.symbol(prior));
    let NodeKind::Binary { right: next, .. } = ctx.nodes.kind(args[2]) else {
        panic!("stepped value");
    };
    assert_eq!(ctx.nodes.op(next), Some(Op::Add));
}

#[test]
fn pre_decrement_steps_in_place() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let node = ctx.handle_unary_math(S, Op::PreDecrement, target);
    assert_eq!(
        ops(&ctx, node),
        vec![
            Some(Op::Assign),
            Some(Op::Assign),
            Some(Op::SubAssign),
            Some(Op::ImageStore),
            None
        ]
    );
}

#[test]
fn texture_elements_are_read_only() {
    let mut ctx = images();
    let target = element(&mut ctx, "tex");
    let value = ctx.zero(&float4(), S);
    let node = ctx.handle_assign(S, Op::Assign, target, value);
    assert!(ctx.is_error(node));
    assert_eq!(codes(&ctx), vec![ErrorCode::E2012]);
}

#[test]
fn partial_image_element_write_is_rejected() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let x = ctx.handle_dot_dereference(S, target, "x");
    let value = ctx.float_const(1.0, S);
    ctx.handle_assign(S, Op::Assign, x, value);
    assert_eq!(codes(&ctx), vec![ErrorCode::E4001]);
}

// === Ordinary l-values ===

#[test]
fn local_variables_are_writable() {
    let mut ctx = images();
    ctx.handle_variable_declaration(S, "v", float4(), None);
    let v = ctx.handle_variable(S, "v");
    assert!(ctx.check_lvalue(v, S));

    let v = ctx.handle_variable(S, "v");
    let xy = ctx.handle_dot_dereference(S, v, "xy");
    assert!(ctx.check_lvalue(xy, S));
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn repeated_swizzle_is_not_writable() {
    let mut ctx = images();
    ctx.handle_variable_declaration(S, "v", float4(), None);
    let v = ctx.handle_variable(S, "v");
    let xx = ctx.handle_dot_dereference(S, v, "xx");
    assert!(!ctx.check_lvalue(xx, S));
    assert_eq!(codes(&ctx), vec![ErrorCode::E2005]);
}

#[test]
fn constants_and_expressions_are_not_writable() {
    let mut ctx = images();
    let c = ctx.float_const(1.0, S);
    assert!(!ctx.check_lvalue(c, S));

    ctx.handle_variable_declaration(S, "a", float(), None);
    let a = ctx.handle_variable(S, "a");
    let b = ctx.handle_variable(S, "a");
    let sum = ctx.handle_binary_math(S, Op::Add, a, b);
    assert!(!ctx.check_lvalue(sum, S));
    assert_eq!(codes(&ctx), vec![ErrorCode::E2005, ErrorCode::E2005]);
}

#[test]
fn inputs_and_uniforms_are_not_writable() {
    let mut ctx = library(Stage::Fragment);
    ctx.handle_variable_declaration(S, "i", float4().with_storage(Storage::Input), None);
    ctx.handle_variable_declaration(S, "u", float4(), None);
    open_function(&mut ctx, "f");
    let i = ctx.handle_variable(S, "i");
    let u = ctx.handle_variable(S, "u");
    assert!(!ctx.check_lvalue(i, S));
    assert!(!ctx.check_lvalue(u, S));
    assert_eq!(codes(&ctx), vec![ErrorCode::E2005, ErrorCode::E2005]);
}

#[test]
fn read_only_buffer_elements_are_rejected() {
    let mut ctx = library(Stage::Compute);
    let ro = ctx.structured_buffer_type(BufferKind::StructuredBuffer, Some(uint()));
    let rw = ctx.structured_buffer_type(BufferKind::RWStructuredBuffer, Some(uint()));
    ctx.handle_variable_declaration(S, "ro", ro, None);
    ctx.handle_variable_declaration(S, "rw", rw, None);
    open_function(&mut ctx, "f");

    for name in ["ro", "rw"] {
        let base = ctx.handle_variable(S, name);
        let zero = ctx.uint_const(0, S);
        let slot = ctx.handle_bracket_dereference(S, base, zero);
        let value = ctx.uint_const(7, S);
        ctx.handle_assign(S, Op::Assign, slot, value);
    }
    assert_eq!(codes(&ctx), vec![ErrorCode::E2012]);
}

#[test]
fn description_names_the_root_variable() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let x = ctx.handle_dot_dereference(S, target, "x");
    assert_eq!(ctx.describe(x), "img");
}

#[test]
fn image_operands_are_exposed_for_atomics() {
    let mut ctx = images();
    let target = element(&mut ctx, "img");
    let (image, coord) = image_load_operands(&ctx, target).unwrap();
    assert_eq!(ctx.symbol_name(ctx.nodes.symbol(image).unwrap()), "img");
    assert_eq!(ctx.ty(coord).vector_size(), 2);

    let x = ctx.handle_dot_dereference(S, target, "x");
    assert_eq!(image_load_operands(&ctx, x), None);
}
