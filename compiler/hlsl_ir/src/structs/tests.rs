use pretty_assertions::assert_eq;

use super::*;
use crate::{BasicType, BuiltIn, Dim, Sampler, StringInterner};

fn def(interner: &mut StringInterner, name: &str, members: &[(&str, Type)]) -> StructDef {
    StructDef {
        name: Some(interner.intern(name)),
        members: members
            .iter()
            .map(|(n, ty)| Member::new(interner.intern(n), ty.clone()))
            .collect(),
    }
}

#[test]
fn identical_content_shares_an_id() {
    let mut interner = StringInterner::new();
    let mut reg = StructRegistry::new();
    let float4 = Type::vector(BasicType::Float, 4);
    let a = reg.intern(def(&mut interner, "S", &[("a", float4.clone())]));
    let b = reg.intern(def(&mut interner, "S", &[("a", float4.clone())]));
    let c = reg.intern(def(&mut interner, "S", &[("b", float4)]));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(reg.len(), 2);
}

#[test]
fn growable_blocks_append_without_aliasing() {
    let mut interner = StringInterner::new();
    let mut reg = StructRegistry::new();
    let global = reg.alloc_growable(StructDef::default());
    let other = reg.alloc_growable(StructDef::default());
    assert_ne!(global, other);
    let x = interner.intern("x");
    let y = interner.intern("y");
    assert_eq!(reg.grow(global, Member::new(x, Type::scalar(BasicType::Float))), 0);
    assert_eq!(reg.grow(global, Member::new(y, Type::scalar(BasicType::Int))), 1);
    assert_eq!(reg.get(global).member_index(y), Some(1));
    assert!(reg.members(other).is_empty());
}

#[test]
fn contains_opaque_is_transitive() {
    let mut interner = StringInterner::new();
    let mut reg = StructRegistry::new();
    let tex = Type::resource(Sampler::texture(Dim::D2, BasicType::Float, 4));
    let inner = reg.intern(def(&mut interner, "Inner", &[("t", tex)]));
    let outer = reg.intern(def(
        &mut interner,
        "Outer",
        &[("i", Type::structure(inner)), ("f", Type::scalar(BasicType::Float))],
    ));
    assert!(reg.contains_opaque(&Type::structure(outer)));
    assert!(!reg.contains_opaque(&Type::scalar(BasicType::Float)));
}

#[test]
fn contains_builtin_sees_member_tags() {
    let mut interner = StringInterner::new();
    let mut reg = StructRegistry::new();
    let mut pos = Type::vector(BasicType::Float, 4);
    pos.qualifier.builtin = Some(BuiltIn::Position);
    let id = reg.intern(def(
        &mut interner,
        "VsOut",
        &[("pos", pos), ("uv", Type::vector(BasicType::Float, 2))],
    ));
    let ty = Type::structure(id);
    assert!(reg.contains_builtin(&ty));
    assert!(reg.contains_ordinary(&ty));
}
