use super::*;

#[test]
fn param_directions() {
    assert!(Storage::In.is_param_input());
    assert!(!Storage::In.is_param_output());
    assert!(Storage::InOut.is_param_input());
    assert!(Storage::InOut.is_param_output());
    assert!(Storage::Out.is_param_output());
    assert!(!Storage::Out.is_param_input());
}

#[test]
fn input_and_uniform_are_read_only() {
    assert!(!Storage::Input.is_writable());
    assert!(!Storage::Uniform.is_writable());
    assert!(Storage::Output.is_writable());
    assert!(Storage::Temporary.is_writable());
}

#[test]
fn patch_markers_are_not_interstage() {
    let mut q = Qualifier::with_storage(Storage::Input);
    q.builtin = Some(BuiltIn::InputPatch);
    assert_eq!(q.interstage_builtin(), None);
    q.builtin = Some(BuiltIn::PrimitiveId);
    assert_eq!(q.interstage_builtin(), Some(BuiltIn::PrimitiveId));
}

#[test]
fn merge_keeps_explicit_numbers() {
    let mut dst = Qualifier::default();
    dst.layout.binding = Some(3);
    let mut src = Qualifier::with_storage(Storage::Uniform);
    src.layout.binding = Some(7);
    src.layout.set = Some(1);
    dst.merge_from(&src);
    assert_eq!(dst.storage, Storage::Uniform);
    assert_eq!(dst.layout.binding, Some(3));
    assert_eq!(dst.layout.set, Some(1));
}

#[test]
fn register_class_parse() {
    assert_eq!(RegisterClass::from_char('T'), Some(RegisterClass::Texture));
    assert_eq!(RegisterClass::from_char('u'), Some(RegisterClass::Uav));
    assert_eq!(RegisterClass::from_char('x'), None);
}
