#![expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use std::sync::Arc;

use lm_ir::{HighlightErrorKind, Highlighter, TagList};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{TokenDef, TokenKind, Vocabulary};

use super::*;

struct Arith {
    lexer: HighlightLexer,
    number: TokenKind,
    star: TokenKind,
}

fn arith() -> Arith {
    let mut builder = Vocabulary::builder();
    let number = builder
        .define(TokenDef::new("Number", "[0-9]+").tags(["literal", "number"]))
        .unwrap();
    let star = builder
        .define(TokenDef::new("Star", r"\*").tags(["operator"]))
        .unwrap();
    builder
        .define(TokenDef::new("Plus", r"\+").tags(["operator"]))
        .unwrap();
    builder
        .define(TokenDef::new("Whitespace", r"\s+").skipped())
        .unwrap();
    Arith {
        lexer: HighlightLexer::new(Arc::new(builder.build())),
        number,
        star,
    }
}

#[test]
fn test_tokenize_tags_and_offsets() {
    let Arith {
        lexer,
        number,
        star,
    } = arith();
    let data = lexer.highlight_data("3*5");

    assert!(data.errors.is_empty());
    let tokens: Vec<_> = data
        .tokens
        .iter()
        .map(|t| (t.token.kind, t.token.image.as_str(), t.token.start_offset, t.token.end_offset))
        .collect();
    assert_eq!(
        tokens,
        vec![(number, "3", 0, 0), (star, "*", 1, 1), (number, "5", 2, 2)]
    );
    assert_eq!(data.tokens[0].tags, TagList::new(["literal", "number"]));
    assert_eq!(data.tokens[1].tags, TagList::new(["operator"]));
}

#[test]
fn test_unmatched_run_is_one_error() {
    let Arith { lexer, .. } = arith();
    let tokenized = lexer.tokenize("3*ye5");

    assert_eq!(tokenized.tokens.len(), 3);
    assert_eq!(tokenized.errors.len(), 1);
    let err = &tokenized.errors[0];
    assert_eq!((err.offset, err.length), (2, 2));
    assert_eq!((err.line, err.column), (1, 3));
    assert_eq!(err.message, "unexpected characters `ye` at line 1, column 3");
}

#[test]
fn test_separate_runs_are_separate_errors() {
    let Arith { lexer, .. } = arith();
    let tokenized = lexer.tokenize("a1\nb");

    let positions: Vec<_> = tokenized
        .errors
        .iter()
        .map(|e| (e.offset, e.length, e.line, e.column))
        .collect();
    assert_eq!(positions, vec![(0, 1, 1, 1), (3, 1, 2, 1)]);
}

#[test]
fn test_trailing_error_run() {
    let Arith { lexer, .. } = arith();
    let tokenized = lexer.tokenize("1 é");
    assert_eq!(tokenized.errors.len(), 1);
    assert_eq!(tokenized.errors[0].offset, 2);
    assert_eq!(tokenized.errors[0].length, 'é'.len_utf8());
}

#[test]
fn test_skipped_tokens_hidden_from_parser() {
    let Arith { lexer, .. } = arith();
    let text = "1 + 2";

    let parsed: Vec<_> = lexer
        .tokenize(text)
        .tokens
        .into_iter()
        .map(|t| t.image)
        .collect();
    assert_eq!(parsed, vec!["1", "+", "2"]);

    let data = lexer.highlight_data(text);
    assert_eq!(data.tokens.len(), 5);
    assert!(data.tokens[1].skipped);
    assert!(data.tokens[1].tags.is_empty());
}

#[test]
fn test_word_boundary_respects_preceding_characters() {
    let mut builder = Vocabulary::builder();
    let keyword = builder
        .define(TokenDef::new("Keyword", r"\bif\b").tags(["keyword"]))
        .unwrap();
    builder
        .define(TokenDef::new("Letter", "[a-z]").tags(["letter"]))
        .unwrap();
    builder
        .define(TokenDef::new("Whitespace", r"\s+").skipped())
        .unwrap();
    let lexer = HighlightLexer::new(Arc::new(builder.build()));

    let tokenized = lexer.tokenize("gif if");
    assert!(tokenized.errors.is_empty());
    let keywords: Vec<_> = tokenized
        .tokens
        .iter()
        .filter(|t| t.kind == keyword)
        .map(|t| t.start_offset)
        .collect();
    assert_eq!(keywords, vec![4]);
    assert_eq!(tokenized.tokens.len(), 4);
}

#[test]
fn test_empty_input() {
    let Arith { lexer, .. } = arith();
    assert_eq!(lexer.tokenize(""), Tokenized::default());
    assert_eq!(lexer.highlight(""), lm_ir::Highlight::default());
}

#[test]
fn test_highlight_nodes_and_errors() {
    let Arith { lexer, .. } = arith();
    let highlight = lexer.highlight("3*ye5");

    let nodes: Vec<_> = highlight
        .nodes
        .iter()
        .map(|n| (n.text.as_str(), n.start, n.end))
        .collect();
    assert_eq!(nodes, vec![("3", 0, 1), ("*", 1, 2), ("5", 4, 5)]);
    assert_eq!(highlight.errors.len(), 1);
    let err = &highlight.errors[0];
    assert_eq!(err.kind, HighlightErrorKind::Lexical);
    assert_eq!(err.syntax_range.text, "ye");
    assert_eq!((err.syntax_range.start, err.syntax_range.end), (2, 4));
}

proptest! {
    #[test]
    fn prop_tokens_and_errors_tile_input(text in "[0-9+* a-c]{0,40}") {
        let Arith { lexer, .. } = arith();
        let data = lexer.highlight_data(&text);

        let mut spans: Vec<_> = data.tokens.iter().map(|t| t.token.span()).collect();
        spans.extend(data.errors.iter().map(LexError::span));
        spans.sort_by_key(|s| s.start);

        let mut pos = 0;
        for span in spans {
            prop_assert_eq!(span.start, pos);
            prop_assert!(span.end > span.start);
            pos = span.end;
        }
        prop_assert_eq!(pos, text.len());
    }

    #[test]
    fn prop_token_images_match_offsets(text in "[0-9+*]{0,30}") {
        let Arith { lexer, .. } = arith();
        for token in lexer.tokenize(&text).tokens {
            prop_assert_eq!(&text[token.start_offset..=token.end_offset], token.image.as_str());
        }
    }
}
