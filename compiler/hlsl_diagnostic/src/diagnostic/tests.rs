use pretty_assertions::assert_eq;

use super::*;

#[test]
fn builder_collects_labels_and_notes() {
    let diag = Diagnostic::error(ErrorCode::E2002)
        .with_message("no matching overloaded function found: `foo`")
        .with_label(Span::new(10, 13), "called here")
        .with_secondary_label(Span::new(0, 5), "candidate")
        .with_note("2 candidates considered");

    assert!(diag.is_error());
    assert_eq!(diag.primary_span(), Some(Span::new(10, 13)));
    assert_eq!(diag.labels.len(), 2);
    assert_eq!(diag.notes, vec!["2 candidates considered".to_string()]);
}

#[test]
fn warning_is_not_error() {
    let diag = Diagnostic::warning(ErrorCode::W1001).with_message("ignored");
    assert!(!diag.is_error());
    assert_eq!(diag.primary_span(), None);
}

#[test]
fn display_includes_code_and_message() {
    let diag = Diagnostic::error(ErrorCode::E1006)
        .with_message("undeclared identifier `x`")
        .with_label(Span::new(4, 5), "not found");
    let text = diag.to_string();
    assert!(text.starts_with("error [E1006]: undeclared identifier `x`"));
    assert!(text.contains("--> 4..5: not found"));
}
