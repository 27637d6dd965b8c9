use pretty_assertions::assert_eq;

use super::*;

fn node(text: &str, start: usize, tags: &[&str]) -> HighlightNode {
    HighlightNode {
        text: text.to_owned(),
        start,
        end: start + text.len(),
        tags: tags.iter().copied().collect(),
    }
}

#[test]
fn test_tag_list_contains() {
    let tags = TagList::new(["literal", "number"]);
    assert!(tags.contains("number"));
    assert!(!tags.contains("operator"));
    assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["literal", "number"]);
}

#[test]
fn test_tag_list_clone_shares_storage() {
    let tags = TagList::new(["operator"]);
    let copy = tags.clone();
    assert!(std::ptr::eq(tags.as_slice(), copy.as_slice()));
}

#[test]
fn test_error_kind_names() {
    assert_eq!(HighlightErrorKind::Lexical.as_str(), "lexical");
    assert_eq!(
        HighlightErrorKind::NotAllInputParsed.to_string(),
        "not-all-input-parsed"
    );
    assert!(HighlightErrorKind::Lexical.is_lexical());
    assert!(!HighlightErrorKind::EarlyExit.is_lexical());
}

#[test]
fn test_error_captures_range_text() {
    let err = HighlightError::new(
        HighlightErrorKind::Lexical,
        "unexpected characters",
        "3*ye5",
        Span::new(2, 4),
    );
    assert_eq!(err.syntax_range.text, "ye");
    assert_eq!(err.span(), Span::new(2, 4));
    assert_eq!(
        err.to_string(),
        "lexical error at 2..4: unexpected characters"
    );
}

#[test]
fn test_node_at() {
    let highlight = Highlight {
        nodes: vec![
            node("3", 0, &["number"]),
            node("*", 1, &["operator"]),
            node("5", 4, &["number"]),
        ],
        errors: Vec::new(),
    };
    assert_eq!(highlight.node_at(1).map(|n| n.text.as_str()), Some("*"));
    assert_eq!(highlight.node_at(4).map(|n| n.text.as_str()), Some("5"));
    // Gap left by an error region.
    assert!(highlight.node_at(2).is_none());
    assert!(highlight.node_at(9).is_none());
}

#[test]
fn test_errors_at_includes_empty_eof_range() {
    let highlight = Highlight {
        nodes: Vec::new(),
        errors: vec![HighlightError::new(
            HighlightErrorKind::MismatchedToken,
            "unexpected end of input",
            "(3",
            Span::empty_at(2),
        )],
    };
    assert_eq!(highlight.errors_at(2).count(), 1);
    assert_eq!(highlight.errors_at(1).count(), 0);
}
