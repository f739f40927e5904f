use hlsl_ir::{Dim, Sampler};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::SemaOptions;

fn float() -> Type {
    Type::scalar(BasicType::Float)
}

fn vec(basic: BasicType, n: u8) -> Type {
    Type::vector(basic, n)
}

const W: ConversionMode = ConversionMode::WideningOnly;
const N: ConversionMode = ConversionMode::AllowNarrowing;

#[test]
fn identical_types_always_convert() {
    let t = Type::matrix(BasicType::Float, 4, 4);
    assert!(convertible(&t, &t, None, 0, W));
}

#[test]
fn scalar_broadcasts_and_vectors_truncate() {
    assert!(convertible(&Type::scalar(BasicType::Int), &vec(BasicType::Float, 3), None, 0, W));
    assert!(convertible(&vec(BasicType::Float, 4), &vec(BasicType::Float, 3), None, 0, W));
    assert!(!convertible(&vec(BasicType::Float, 2), &vec(BasicType::Float, 3), None, 0, W));
    assert!(!convertible(&vec(BasicType::Float, 3), &float(), None, 0, W));
}

#[test]
fn narrowing_needs_second_pass() {
    let f = float();
    let i = Type::scalar(BasicType::Int);
    assert!(!convertible(&f, &i, None, 0, W));
    assert!(convertible(&f, &i, None, 0, N));
    assert!(convertible(&i, &f, None, 0, W));
}

#[test]
fn aggregates_never_convert() {
    let arr = float().with_array(hlsl_ir::ArrayDim::Sized(2));
    let arr3 = float().with_array(hlsl_ir::ArrayDim::Sized(3));
    assert!(!convertible(&arr, &arr3, None, 1, N));
}

#[test]
fn resource_handle_is_pinned() {
    let i = Type::scalar(BasicType::Int);
    let u = Type::scalar(BasicType::Uint);
    assert!(!convertible(&i, &u, Some(Op::InterlockedAdd), 0, N));
    assert!(convertible(&i, &u, Some(Op::InterlockedAdd), 1, N));
}

#[test]
fn exact_match_is_better() {
    let f = float();
    let d = Type::scalar(BasicType::Double);
    assert!(better(&f, &d, &f));
    assert!(!better(&f, &f, &d));
}

#[test]
fn matching_vector_size_is_better() {
    let from = vec(BasicType::Int, 3);
    let same_size = vec(BasicType::Float, 3);
    let broadcast = vec(BasicType::Uint, 2);
    assert!(better(&from, &broadcast, &same_size));
    assert!(!better(&from, &same_size, &broadcast));
}

#[test]
fn closer_basic_type_is_better() {
    let from = Type::scalar(BasicType::Int);
    let uint = Type::scalar(BasicType::Uint);
    let float = float();
    assert!(better(&from, &float, &uint));
    assert!(!better(&from, &uint, &float));
}

#[test]
fn exact_sampler_is_better() {
    let tex = Type::resource(Sampler::texture(Dim::D2, BasicType::Float, 4));
    let near = Type::resource(Sampler::texture(Dim::D2, BasicType::Float, 3));
    let mut from = tex.clone();
    from.qualifier.storage = hlsl_ir::Storage::Uniform;
    assert!(better(&from, &near, &tex));
}

#[test]
fn constant_conversion_folds() {
    let mut ctx = SemaContext::new(SemaOptions::default());
    let one = ctx.int_const(1, Span::DUMMY);
    let v = ctx
        .add_conversion(one, &vec(BasicType::Float, 3), Span::DUMMY)
        .unwrap();
    assert_eq!(
        ctx.nodes.constant_values(v).unwrap().to_vec(),
        vec![ConstValue::float(1.0); 3]
    );
    assert_eq!(ctx.ty(v).shape, Shape::Vector(3));
}

#[test]
fn truncation_warns_but_converts() {
    let mut ctx = SemaContext::new(SemaOptions::default());
    let sym = ctx.new_temp(&vec(BasicType::Float, 4), Span::DUMMY);
    let node = ctx.symbol_ref(sym, Span::DUMMY);
    let out = ctx
        .add_conversion(node, &vec(BasicType::Float, 2), Span::DUMMY)
        .unwrap();
    assert_eq!(ctx.nodes.op(out), Some(Op::Construct));
    assert_eq!(ctx.diagnostics.warning_count(), 1);
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn struct_conversion_fails() {
    let mut ctx = SemaContext::new(SemaOptions::default());
    let id = ctx.structs.intern(hlsl_ir::StructDef::default());
    let sym = ctx.new_temp(&Type::structure(id), Span::DUMMY);
    let node = ctx.symbol_ref(sym, Span::DUMMY);
    assert_eq!(ctx.add_conversion(node, &float(), Span::DUMMY), None);
}

#[test]
fn builtin_args_promote_to_first_numeric_type() {
    let mut ctx = SemaContext::new(SemaOptions::default());
    let a = ctx.float_const(1.5, Span::DUMMY);
    let b = ctx.int_const(2, Span::DUMMY);
    let promoted = ctx.promote_builtin_args(Op::Max, &[a, b], Span::DUMMY).unwrap();
    assert_eq!(ctx.ty(promoted[1]).basic, BasicType::Float);
    let untouched = ctx.promote_builtin_args(Op::Sin, &[b], Span::DUMMY).unwrap();
    assert_eq!(untouched, vec![b]);
}

fn arb_basic() -> impl Strategy<Value = BasicType> {
    prop_oneof![
        Just(BasicType::Bool),
        Just(BasicType::Int),
        Just(BasicType::Uint),
        Just(BasicType::Float),
        Just(BasicType::Double),
    ]
}

fn arb_type() -> impl Strategy<Value = Type> {
    (arb_basic(), 1u8..=4, any::<bool>()).prop_map(|(basic, n, matrix)| {
        if matrix && n > 1 {
            Type::matrix(basic, n, n)
        } else {
            Type::vector(basic, n)
        }
    })
}

proptest! {
    #[test]
    fn convertible_is_reflexive(t in arb_type(), arg in 0usize..3) {
        prop_assert!(convertible(&t, &t, None, arg, W));
    }

    #[test]
    fn widening_implies_narrowing_mode(a in arb_type(), b in arb_type()) {
        if convertible(&a, &b, None, 1, W) {
            prop_assert!(convertible(&a, &b, None, 1, N));
        }
    }

    #[test]
    fn better_is_asymmetric(from in arb_type(), t1 in arb_type(), t2 in arb_type()) {
        prop_assert!(!(better(&from, &t1, &t2) && better(&from, &t2, &t1)));
    }
}
