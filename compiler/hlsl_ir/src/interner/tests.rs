use super::*;

#[test]
fn empty_string_is_pre_interned() {
    let interner = StringInterner::new();
    assert_eq!(interner.lookup(Name::EMPTY), "");
    assert_eq!(interner.get(""), Some(Name::EMPTY));
}

#[test]
fn interning_is_idempotent() {
    let mut interner = StringInterner::new();
    let a = interner.intern("SV_Position");
    let b = interner.intern("SV_Position");
    let c = interner.intern("SV_Target");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.lookup(c), "SV_Target");
    assert_eq!(interner.len(), 3);
}
