use hlsl_diagnostic::ErrorCode;
use hlsl_ir::{BasicType, Storage};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_support::{define, float, float4, library, open_function, semantic, shader, S};
use crate::{BufferKind, EntryAttribute, ParamDecl};

fn declare_rw_buffer(ctx: &mut SemaContext, name: &str) {
    let ty = ctx.structured_buffer_type(BufferKind::RWStructuredBuffer, Some(float4()));
    ctx.handle_variable_declaration(S, name, ty, None);
}

fn has_linkage(unit: &LoweredUnit, name: &str) -> bool {
    unit.linkage_var(name).is_some()
}

#[test]
fn clean_unit_is_handed_over() {
    let mut ctx = library(Stage::Fragment);
    define(&mut ctx, "f", Type::void(), Vec::new(), &[], |_| Vec::new());
    let result = ctx.finish();
    assert!(!result.has_errors());
    assert!(result.diagnostics.is_empty());
    assert!(result.into_unit().is_ok());
}

#[test]
fn errors_withhold_the_unit_but_keep_diagnostics() {
    let mut ctx = library(Stage::Fragment);
    open_function(&mut ctx, "f");
    let bad = ctx.handle_variable(S, "nope");
    let body = ctx.handle_sequence(S, &[bad]);
    ctx.handle_function_body_end(S, Some(body));
    let result = ctx.finish();
    assert_eq!(result.error_count, 1);
    assert_eq!(result.diagnostics[0].code, ErrorCode::E1006);
    assert!(result.into_unit().is_err());
}

#[test]
fn root_holds_items_in_source_order() {
    let mut ctx = library(Stage::Fragment);
    let global = Type {
        qualifier: hlsl_ir::Qualifier::with_storage(Storage::Global),
        ..float()
    };
    let one = ctx.float_const(1.0, S);
    ctx.handle_variable_declaration(S, "g", global, Some(one));
    let f = define(&mut ctx, "f", Type::void(), Vec::new(), &[], |_| Vec::new());
    let unit = ctx.finish().into_unit().unwrap();

    let items = unit.nodes.args(unit.root);
    assert_eq!(items.len(), 2);
    assert_eq!(unit.nodes.op(items[0]), Some(Op::Assign));
    assert_eq!(unit.definition(f), Some(items[1]));
}

#[test]
fn unused_counter_leaves_linkage() {
    let mut ctx = library(Stage::Compute);
    declare_rw_buffer(&mut ctx, "buf");
    let unit = ctx.finish().into_unit().unwrap();
    assert!(has_linkage(&unit, "buf"));
    assert!(!has_linkage(&unit, "buf@count"));
}

#[test]
fn used_counter_stays_in_linkage() {
    let mut ctx = library(Stage::Compute);
    declare_rw_buffer(&mut ctx, "buf");
    open_function(&mut ctx, "f");
    let buf = ctx.handle_variable(S, "buf");
    let inc = ctx.handle_method_call(S, buf, "IncrementCounter", Vec::new());
    let body = ctx.handle_sequence(S, &[inc]);
    ctx.handle_function_body_end(S, Some(body));
    let unit = ctx.finish().into_unit().unwrap();

    let counter = unit.linkage_var("buf@count").unwrap();
    assert_eq!(counter.ty.qualifier.storage, Storage::Buffer);
}

#[test]
fn stream_append_becomes_copy_and_emit() {
    let mut ctx = shader(Stage::Geometry);
    let mut stream = semantic(&mut ctx, float4(), "SV_Position");
    stream.stream = Some(Topology::TriangleStrip);
    stream.qualifier.storage = Storage::InOut;
    let attrs = [EntryAttribute::MaxVertexCount(3)];
    let mut append = None;
    define(&mut ctx, "main", Type::void(), vec![ParamDecl::new("s", stream)], &attrs, |ctx| {
        let s = ctx.handle_variable(S, "s");
        let zero = ctx.zero(&float4(), S);
        let node = ctx.handle_method_call(S, s, "Append", vec![zero]);
        append = Some(node);
        let s = ctx.handle_variable(S, "s");
        let restart = ctx.handle_method_call(S, s, "RestartStrip", Vec::new());
        vec![node, restart]
    });
    let unit = ctx.finish().into_unit().unwrap();

    let append = append.unwrap();
    assert_eq!(unit.nodes.op(append), Some(Op::Sequence));
    let ops: Vec<Option<Op>> = unit
        .nodes
        .args(append)
        .iter()
        .map(|&n| unit.nodes.op(n))
        .collect();
    assert_eq!(ops, vec![Some(Op::Assign), Some(Op::EmitVertex)]);
    assert_eq!(unit.exec.output_primitive, Some(Topology::TriangleStrip));
    assert_eq!(unit.exec.max_vertices, Some(3));
    assert!(has_linkage(&unit, "@Position"));
}

#[test]
fn references_pick_up_assigned_locations() {
    let mut ctx = library(Stage::Fragment);
    let input = Type {
        qualifier: hlsl_ir::Qualifier::with_storage(Storage::Input),
        ..Type::vector(BasicType::Float, 2)
    };
    ctx.handle_variable_declaration(S, "a", input.clone(), None);
    ctx.handle_variable_declaration(S, "b", input, None);
    let mut reference = None;
    define(&mut ctx, "f", Type::void(), Vec::new(), &[], |ctx| {
        let b = ctx.handle_variable(S, "b");
        reference = Some(b);
        vec![b]
    });
    let unit = ctx.finish().into_unit().unwrap();

    let b = unit.linkage_var("b").unwrap();
    assert_eq!(b.ty.qualifier.layout.location, Some(1));
    let node_ty = unit.nodes.ty(reference.unwrap());
    assert_eq!(node_ty.qualifier.layout.location, Some(1));
}

#[test]
fn execution_modes_default_to_unset() {
    let exec = ExecutionModes::default();
    assert_eq!(exec.local_size, None);
    assert_eq!(exec.depth, DepthMode::None);
    assert!(!exec.early_fragment_tests);
}
