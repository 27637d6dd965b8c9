#![expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_kinds_follow_declaration_order() {
    let mut builder = Vocabulary::builder();
    let a = builder.define(TokenDef::new("A", "a")).unwrap();
    let b = builder.define(TokenDef::new("B", "b")).unwrap();
    let vocab = builder.build();

    assert_eq!(a.index(), 0);
    assert_eq!(b.index(), 1);
    assert_eq!(vocab.kind("B"), Some(b));
    assert_eq!(vocab.kind("C"), None);
    assert_eq!(vocab.name(a), "A");
    assert_eq!(vocab.name(TokenKind::EOF), "EOF");
    assert_eq!(vocab.len(), 2);
}

#[test]
fn test_default_kind_is_eof() {
    assert!(TokenKind::default().is_eof());
    assert_eq!(format!("{:?}", TokenKind::EOF), "TokenKind(EOF)");
}

#[test]
fn test_duplicate_name_rejected() {
    let mut builder = Vocabulary::builder();
    builder.define(TokenDef::new("A", "a")).unwrap();
    let err = builder.define(TokenDef::new("A", "x")).unwrap_err();
    assert!(matches!(err, VocabularyError::DuplicateName(ref name) if name == "A"));
}

#[test]
fn test_invalid_pattern_rejected() {
    let mut builder = Vocabulary::builder();
    let err = builder.define(TokenDef::new("Bad", "(")).unwrap_err();
    assert!(matches!(err, VocabularyError::InvalidPattern { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_empty_match_rejected() {
    let mut builder = Vocabulary::builder();
    let err = builder.define(TokenDef::new("Maybe", "a*")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "pattern `a*` of token type `Maybe` can match the empty string"
    );
}

#[test]
fn test_member_of_requires_category() {
    let mut builder = Vocabulary::builder();
    let concrete = builder.define(TokenDef::new("A", "a")).unwrap();
    let err = builder
        .define(TokenDef::new("B", "b").member_of(concrete))
        .unwrap_err();
    assert!(matches!(err, VocabularyError::NotACategory { .. }));
}

#[test]
fn test_categories_match_members() {
    let mut builder = Vocabulary::builder();
    let add_op = builder.define(TokenDef::category("AdditionOperator")).unwrap();
    let plus = builder
        .define(TokenDef::new("Plus", r"\+").member_of(add_op))
        .unwrap();
    let minus = builder
        .define(TokenDef::new("Minus", "-").member_of(add_op))
        .unwrap();
    let star = builder.define(TokenDef::new("Star", r"\*")).unwrap();
    let vocab = builder.build();

    assert!(vocab.token_type(add_op).unwrap().is_category());
    assert!(vocab.matches(plus, add_op));
    assert!(vocab.matches(minus, add_op));
    assert!(vocab.matches(plus, plus));
    assert!(!vocab.matches(star, add_op));
    assert!(!vocab.matches(add_op, plus));

    assert!(vocab.overlaps(add_op, plus));
    assert!(vocab.overlaps(minus, add_op));
    assert!(!vocab.overlaps(plus, minus));
    assert!(!vocab.overlaps(star, add_op));
}

#[test]
fn test_categories_are_never_matched() {
    let mut builder = Vocabulary::builder();
    builder.define(TokenDef::category("Op")).unwrap();
    let x = builder.define(TokenDef::new("X", "x")).unwrap();
    let vocab = builder.build();

    let (ty, len) = vocab
        .match_at("xx", 0, &mut vocab.fresh_horizons())
        .unwrap();
    assert_eq!((ty.kind(), len), (x, 1));
    assert!(vocab.match_at("y", 0, &mut vocab.fresh_horizons()).is_none());
}

#[test]
fn test_first_declared_type_wins() {
    let mut builder = Vocabulary::builder();
    let keyword = builder.define(TokenDef::new("Let", "let")).unwrap();
    builder.define(TokenDef::new("Ident", "[a-z]+")).unwrap();
    let vocab = builder.build();

    let (ty, len) = vocab
        .match_at("letter", 0, &mut vocab.fresh_horizons())
        .unwrap();
    assert_eq!((ty.kind(), len), (keyword, 3));
}

#[test]
fn test_match_sees_preceding_text() {
    let mut builder = Vocabulary::builder();
    let word_start = builder.define(TokenDef::new("WordStart", r"\bx")).unwrap();
    let vocab = builder.build();
    let mut horizons = vocab.fresh_horizons();

    assert!(vocab.match_at("ax x", 1, &mut horizons).is_none());
    let (ty, len) = vocab.match_at("ax x", 3, &mut horizons).unwrap();
    assert_eq!((ty.kind(), len), (word_start, 1));
}
