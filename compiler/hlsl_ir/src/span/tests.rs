use super::*;

#[test]
fn span_basic() {
    let span = Span::new(10, 20);
    assert_eq!(span.len(), 10);
    assert!(!span.is_empty());
    assert!(span.contains(15));
    assert!(!span.contains(20));
}

#[test]
fn span_merge_disjoint() {
    let merged = Span::new(0, 10).merge(Span::new(20, 30));
    assert_eq!(merged, Span::new(0, 30));
}

#[test]
fn dummy_span_is_empty() {
    assert!(Span::DUMMY.is_empty());
    assert!(Span::point(7).is_empty());
}

#[test]
fn span_display() {
    assert_eq!(Span::new(3, 9).to_string(), "3..9");
}
