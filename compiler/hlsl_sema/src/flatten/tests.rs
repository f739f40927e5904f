use hlsl_diagnostic::ErrorCode;
use hlsl_ir::{ArrayDim, BasicType, Dim, Op, Sampler, Stage, SymbolKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::test_support::{codes, float4, library, open_function, S};
use crate::SemaOptions;

/// `struct Material { Texture2D t; SamplerState s; float4 tint; }`.
fn material(ctx: &mut SemaContext) -> Type {
    let members = vec![
        ("t".to_string(), Type::resource(Sampler::texture(Dim::D2, BasicType::Float, 4))),
        ("s".to_string(), Type::resource(Sampler::sampler_state(false))),
        ("tint".to_string(), float4()),
    ];
    ctx.handle_struct_declaration(S, Some("Material"), members)
}

fn declare(ctx: &mut SemaContext, name: &str, ty: Type) -> SymbolId {
    ctx.handle_variable_declaration(S, name, ty, None);
    let name = ctx.intern(name);
    ctx.symbols.lookup(name).unwrap()
}

fn leaf_names(ctx: &SemaContext, symbol: SymbolId) -> Vec<String> {
    ctx.flatten_map[&symbol]
        .leaves
        .iter()
        .map(|&leaf| ctx.symbol_name(leaf))
        .collect()
}

#[test]
fn struct_with_resources_is_flattened() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx);
    let m = declare(&mut ctx, "m", ty);

    assert_eq!(leaf_names(&ctx, m), vec!["m.t", "m.s", "m.tint"]);
    assert_eq!(
        ctx.flatten_map[&m].offsets,
        vec![Slot::Leaf(0), Slot::Leaf(1), Slot::Leaf(2)]
    );
    // The aggregate itself is not a linkage object.
    assert!(!ctx.linkage.contains(&m));
}

#[test]
fn resource_leaves_are_uniforms_and_data_joins_global_block() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx);
    let m = declare(&mut ctx, "m", ty);
    let leaves = ctx.flatten_map[&m].leaves.clone();

    let texture = ctx.symbols.get(leaves[0]);
    assert_eq!(texture.ty.qualifier.storage, Storage::Uniform);
    assert!(ctx.linkage.contains(&leaves[0]));
    assert!(matches!(
        ctx.symbols.get(leaves[2]).kind,
        SymbolKind::AnonMember { .. }
    ));
}

#[test]
fn leaf_bindings_count_up_from_the_aggregate() {
    let mut ctx = library(Stage::Fragment);
    let mut ty = material(&mut ctx);
    ty.qualifier.layout.binding = Some(3);
    let m = declare(&mut ctx, "m", ty);
    let leaves = ctx.flatten_map[&m].leaves.clone();
    let bindings: Vec<Option<u32>> = leaves[..2]
        .iter()
        .map(|&l| ctx.symbols.get(l).ty.qualifier.layout.binding)
        .collect();
    assert_eq!(bindings, vec![Some(3), Some(4)]);
}

#[test]
fn array_of_structs_nests_levels() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx).with_array(ArrayDim::Sized(2));
    let ms = declare(&mut ctx, "ms", ty);
    let record = &ctx.flatten_map[&ms];

    assert_eq!(record.walk(0, &[]), Some(Slot::Next(0)));
    assert_eq!(record.walk(0, &[1]), Some(Slot::Next(5)));
    assert_eq!(record.walk(0, &[1, 0]), Some(Slot::Leaf(3)));
    assert_eq!(record.walk(0, &[0, 2, 0]), None);
    assert_eq!(record.walk(5, &[0]), record.walk(0, &[1, 0]));
    assert_eq!(leaf_names(&ctx, ms)[4], "ms[1].s");
}

#[test]
fn member_access_reaches_a_leaf() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx).with_array(ArrayDim::Sized(2));
    let ms = declare(&mut ctx, "ms", ty);
    open_function(&mut ctx, "f");

    let base = ctx.handle_variable(S, "ms");
    let one = ctx.int_const(1, S);
    let element = ctx.handle_bracket_dereference(S, base, one);
    assert_eq!(ctx.flattened_position(element), Some((ms, 5)));

    let texture = ctx.handle_dot_dereference(S, element, "t");
    assert_eq!(ctx.nodes.symbol(texture), Some(ctx.flatten_map[&ms].leaves[3]));
    assert!(!ctx.is_flattened(texture));
}

#[test]
fn partial_reference_lists_its_leaves() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx).with_array(ArrayDim::Sized(3));
    let ms = declare(&mut ctx, "ms", ty);
    open_function(&mut ctx, "f");

    let base = ctx.handle_variable(S, "ms");
    let two = ctx.int_const(2, S);
    let element = ctx.handle_bracket_dereference(S, base, two);
    let expected = ctx.flatten_map[&ms].leaves[6..9].to_vec();
    assert_eq!(ctx.flattened_leaves(element), expected);

    let whole = ctx.handle_variable(S, "ms");
    assert_eq!(ctx.flattened_leaves(whole), ctx.flatten_map[&ms].leaves);
}

#[test]
fn non_constant_index_is_rejected() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx).with_array(ArrayDim::Sized(2));
    declare(&mut ctx, "ms", ty);
    open_function(&mut ctx, "f");
    ctx.handle_variable_declaration(S, "i", Type::scalar(BasicType::Int), None);

    let base = ctx.handle_variable(S, "ms");
    let i = ctx.handle_variable(S, "i");
    let node = ctx.handle_bracket_dereference(S, base, i);
    assert!(ctx.is_error(node));
    assert_eq!(codes(&ctx), vec![ErrorCode::E1016]);
}

#[test]
fn out_of_range_index_is_rejected() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx).with_array(ArrayDim::Sized(2));
    declare(&mut ctx, "ms", ty);
    open_function(&mut ctx, "f");
    let base = ctx.handle_variable(S, "ms");
    let two = ctx.int_const(2, S);
    ctx.handle_bracket_dereference(S, base, two);
    assert_eq!(codes(&ctx), vec![ErrorCode::E2007]);
}

#[test]
fn implicitly_sized_aggregate_cannot_flatten() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx).with_array(ArrayDim::Unsized);
    declare(&mut ctx, "ms", ty);
    assert_eq!(codes(&ctx), vec![ErrorCode::E1017]);
}

#[test]
fn uniform_texture_arrays_flatten_on_request() {
    let texture = Type::resource(Sampler::texture(Dim::D2, BasicType::Float, 4));
    let options = SemaOptions {
        stage: Stage::Fragment,
        entry_point: None,
        flatten_uniform_arrays: true,
        ..SemaOptions::default()
    };
    let mut ctx = SemaContext::new(options);
    let texs = declare(&mut ctx, "texs", texture.clone().with_array(ArrayDim::Sized(4)));
    assert_eq!(ctx.flatten_map[&texs].leaves.len(), 4);

    let mut ctx = library(Stage::Fragment);
    let texs = declare(&mut ctx, "texs", texture.with_array(ArrayDim::Sized(4)));
    assert!(!ctx.flatten_map.contains_key(&texs));
}

#[test]
fn flattened_parameter_passes_leaves() {
    let mut ctx = library(Stage::Fragment);
    let ty = material(&mut ctx);
    declare(&mut ctx, "m", ty.clone());
    let callee = ctx.handle_function_declarator(
        S,
        "shade",
        Type::void(),
        vec![crate::ParamDecl::new("mat", ty)],
        &[],
    );
    ctx.handle_function_definition(S, callee);
    let params = ctx.current.as_ref().unwrap().params.clone();
    assert!(ctx.flatten_map.contains_key(&params[0]));
    ctx.handle_function_body_end(S, None);

    open_function(&mut ctx, "f");
    let m = ctx.handle_variable(S, "m");
    let call = ctx.handle_function_call(S, "shade", vec![m]);
    assert_eq!(ctx.nodes.op(call), Some(Op::FunctionCall));
    assert_eq!(ctx.nodes.args(call).len(), 3);
}

proptest! {
    /// Every `(element, member)` path of a flattened struct array resolves
    /// to the leaf at its declaration-order position.
    #[test]
    fn paths_resolve_in_declaration_order(len in 1u32..6) {
        let mut ctx = library(Stage::Fragment);
        let ty = material(&mut ctx).with_array(ArrayDim::Sized(len));
        let ms = declare(&mut ctx, "ms", ty);
        let record = &ctx.flatten_map[&ms];
        prop_assert_eq!(record.leaves.len() as u32, len * 3);
        for element in 0..len {
            for member in 0..3 {
                prop_assert_eq!(record.walk(0, &[element, member]), Some(Slot::Leaf(element * 3 + member)));
            }
        }
    }
}
