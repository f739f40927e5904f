use pretty_assertions::assert_eq;

use super::*;

fn err(code: ErrorCode, at: u32) -> Diagnostic {
    Diagnostic::error(code)
        .with_message(format!("error at {at}"))
        .with_label(Span::point(at), "here")
}

#[test]
fn warnings_do_not_count() {
    let mut queue = DiagnosticQueue::new();
    queue.warn(Diagnostic::warning(ErrorCode::W1001).with_message("w"));
    assert_eq!(queue.error_count(), 0);
    assert_eq!(queue.warning_count(), 1);
    assert!(queue.has_errors().is_none());
}

#[test]
fn errors_count_and_guarantee() {
    let mut queue = DiagnosticQueue::new();
    let _ = queue.emit_error(err(ErrorCode::E2001, 3));
    assert_eq!(queue.error_count(), 1);
    assert!(queue.has_errors().is_some());
}

#[test]
fn flush_sorts_by_position() {
    let mut queue = DiagnosticQueue::new();
    let _ = queue.emit_error(err(ErrorCode::E2001, 30));
    let _ = queue.emit_error(err(ErrorCode::E2002, 10));
    let _ = queue.emit_error(err(ErrorCode::E2003, 20));
    let codes: Vec<_> = queue.flush().into_iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![ErrorCode::E2002, ErrorCode::E2003, ErrorCode::E2001]);
    assert_eq!(queue.error_count(), 3);
}

#[test]
fn limit_stops_storing_but_keeps_counting() {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig::with_error_limit(2));
    for at in 0..5 {
        let _ = queue.emit_error(err(ErrorCode::E2001, at));
    }
    assert_eq!(queue.error_count(), 5);
    assert!(queue.limit_reached());
    let stored = queue.flush();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[2].code, ErrorCode::E9002);
}

#[test]
fn identical_diagnostics_are_deduplicated() {
    let mut queue = DiagnosticQueue::new();
    let _ = queue.emit_error(err(ErrorCode::E2001, 1));
    let _ = queue.emit_error(err(ErrorCode::E2001, 1));
    assert_eq!(queue.error_count(), 2);
    assert_eq!(queue.peek().count(), 1);
}
