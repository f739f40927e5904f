use std::collections::HashSet;

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn as_str_matches_variant_name() {
    for code in ErrorCode::ALL {
        assert_eq!(code.as_str(), format!("{code:?}"));
    }
}

#[test]
fn codes_are_unique() {
    let strs: HashSet<_> = ErrorCode::ALL.iter().map(ErrorCode::as_str).collect();
    assert_eq!(strs.len(), ErrorCode::ALL.len());
}

#[test]
fn every_code_has_a_description() {
    for code in ErrorCode::ALL {
        assert!(!code.description().is_empty(), "{code} has no description");
    }
}

#[test]
fn phase_predicates() {
    assert!(ErrorCode::E1006.is_structural_error());
    assert!(ErrorCode::E2003.is_type_error());
    assert!(ErrorCode::E3005.is_layout_error());
    assert!(ErrorCode::E4001.is_unimplemented());
    assert!(ErrorCode::W1001.is_warning());
    assert!(!ErrorCode::E2001.is_warning());
}

#[test]
fn display_is_code_string() {
    assert_eq!(ErrorCode::E3008.to_string(), "E3008");
}
