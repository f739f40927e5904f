use pretty_assertions::assert_eq;

use super::*;
use crate::{Member, StructDef};

#[test]
fn promotion_chain_order() {
    let chain = [
        BasicType::Bool,
        BasicType::Int,
        BasicType::Uint,
        BasicType::Int64,
        BasicType::Uint64,
        BasicType::Float,
        BasicType::Double,
    ];
    for pair in chain.windows(2) {
        assert!(pair[0].promotion_rank() < pair[1].promotion_rank());
        assert!(pair[0].linear_key() < pair[1].linear_key());
    }
    assert_eq!(BasicType::Sampler.promotion_rank(), None);
}

#[test]
fn one_component_vector_is_scalar() {
    assert!(Type::vector(BasicType::Float, 1).is_scalar());
    assert_eq!(Type::vector(BasicType::Float, 3).vector_size(), 3);
}

#[test]
fn element_drops_outer_dimension() {
    let ty = Type::vector(BasicType::Float, 4)
        .with_array(ArrayDim::Sized(3))
        .with_array(ArrayDim::Unsized);
    assert!(ty.is_unsized_array());
    let elem = ty.element();
    assert_eq!(elem.arrays.outer(), Some(ArrayDim::Sized(3)));
    assert!(!elem.element().is_array());
}

#[test]
fn matrix_component_is_row() {
    let m = Type::matrix(BasicType::Float, 4, 3);
    assert_eq!(m.component(), Type::vector(BasicType::Float, 4));
    assert_eq!(m.component_count(), 12);
}

#[test]
fn same_kind_ignores_qualifiers() {
    let a = Type::scalar(BasicType::Int).with_storage(Storage::Uniform);
    let b = Type::scalar(BasicType::Int);
    assert!(a.same_kind(&b));
    assert_ne!(a, b);
}

#[test]
fn sampler_similarity_ignores_return_size() {
    let a = Sampler::texture(Dim::D2, BasicType::Float, 4);
    let b = Sampler::texture(Dim::D2, BasicType::Float, 2);
    let c = Sampler::texture(Dim::D3, BasicType::Float, 4);
    assert!(a.similar(&b));
    assert!(!a.similar(&c));
    assert_eq!(Sampler { arrayed: true, ..a }.coord_size(), 3);
}

#[test]
fn total_elements() {
    let sizes = ArraySizes::from_dims(&[ArrayDim::Sized(2), ArrayDim::Sized(3)]);
    assert_eq!(sizes.total_elements(), Some(6));
    let unsized_ = ArraySizes::from_dims(&[ArrayDim::Unsized, ArrayDim::Sized(3)]);
    assert_eq!(unsized_.total_elements(), None);
    assert!(!unsized_.has_inner_unsized());
}

#[test]
fn display_names_struct_and_arrays() {
    let mut interner = StringInterner::new();
    let mut structs = StructRegistry::new();
    let name = interner.intern("VsIn");
    let field = interner.intern("pos");
    let id = structs.intern(StructDef {
        name: Some(name),
        members: vec![Member::new(field, Type::vector(BasicType::Float, 4))],
    });
    let ty = Type::structure(id).with_array(ArrayDim::Sized(3));
    assert_eq!(ty.display(&structs, &interner).to_string(), "VsIn[3]");
    let m = Type::matrix(BasicType::Float, 4, 4);
    assert_eq!(m.display(&structs, &interner).to_string(), "float4x4");
}
