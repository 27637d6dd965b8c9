#![expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]

use std::sync::Arc;

use lm_ir::{HighlightErrorKind, Highlighter};
use lm_lexer::{HighlightLexer, TokenDef, Vocabulary};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{ExecutionError, GrammarBuilder, ParserConfig, RecognitionErrorKind};

use super::*;

/// `+ - * /` with the usual precedence, parentheses and unary minus.
fn calculator(config: ParserConfig) -> HighlightParser<f64> {
    let mut vocab = Vocabulary::builder();
    let add_op = vocab.define(TokenDef::category("AdditionOperator")).unwrap();
    let mul_op = vocab
        .define(TokenDef::category("MultiplicationOperator"))
        .unwrap();
    let plus = vocab
        .define(TokenDef::new("Plus", r"\+").tags(["operator"]).member_of(add_op))
        .unwrap();
    let minus = vocab
        .define(TokenDef::new("Minus", "-").tags(["operator"]).member_of(add_op))
        .unwrap();
    let star = vocab
        .define(TokenDef::new("Star", r"\*").tags(["operator"]).member_of(mul_op))
        .unwrap();
    vocab
        .define(TokenDef::new("Slash", "/").tags(["operator"]).member_of(mul_op))
        .unwrap();
    let lparen = vocab
        .define(TokenDef::new("LParen", r"\(").tags(["paren"]))
        .unwrap();
    let rparen = vocab
        .define(TokenDef::new("RParen", r"\)").tags(["paren"]))
        .unwrap();
    let number = vocab
        .define(TokenDef::new("Number", r"[0-9]+(\.[0-9]+)?").tags(["literal", "number"]))
        .unwrap();
    vocab
        .define(TokenDef::new("Whitespace", r"\s+").skipped())
        .unwrap();
    let lexer = HighlightLexer::new(Arc::new(vocab.build()));

    let mut grammar = GrammarBuilder::<f64>::new(lexer);
    grammar.rule("expression", |r| r.subrule("addition"));
    grammar.rule("addition", move |r| {
        let mut value = r.subrule("multiplication")?;
        r.many(|r| {
            let op = r.consume(add_op)?;
            let rhs = r.subrule("multiplication")?;
            r.action(|| {
                if op.kind == plus {
                    value += rhs;
                } else {
                    value -= rhs;
                }
            });
            Ok(())
        })?;
        Ok(value)
    });
    grammar.rule("multiplication", move |r| {
        let mut value = r.subrule("atomic")?;
        r.many(|r| {
            let op = r.consume(mul_op)?;
            let rhs = r.subrule("atomic")?;
            r.action(|| {
                if op.kind == star {
                    value *= rhs;
                } else {
                    value /= rhs;
                }
            });
            Ok(())
        })?;
        Ok(value)
    });
    grammar.rule("atomic", move |r| {
        r.or(&mut [
            &mut |r| {
                r.consume(lparen)?;
                let value = r.subrule("expression")?;
                r.consume(rparen)?;
                Ok(value)
            },
            &mut |r| {
                let token = r.consume(number)?;
                Ok(token.image.parse::<f64>().unwrap_or_default())
            },
            &mut |r| {
                r.consume(minus)?;
                Ok(-r.subrule("atomic")?)
            },
        ])
    });
    grammar.perform_self_analysis(config).unwrap()
}

fn recognition_kinds(execution: &Execution<f64>) -> Vec<RecognitionErrorKind> {
    execution
        .errors
        .iter()
        .filter_map(|err| match err {
            ExecutionError::Recognition(err) => Some(err.kind),
            ExecutionError::Lexical(_) => None,
        })
        .collect()
}

#[test]
fn test_arithmetic() {
    let parser = calculator(ParserConfig::default());

    assert_eq!(parser.execute("4+4"), Execution { result: Some(8.0), errors: vec![] });
    assert_eq!(parser.execute("(3+5)*2").result, Some(16.0));
    assert_eq!(parser.execute("2 + 3 * 4").result, Some(14.0));
    assert_eq!(parser.execute("10 - 4 - 3").result, Some(3.0));
    assert_eq!(parser.execute("8 / 4 / 2").result, Some(1.0));
    assert_eq!(parser.execute("-(2 - 5) * --1.5").result, Some(4.5));
}

#[test]
fn test_start_rule_defaults_to_first() {
    let parser = calculator(ParserConfig::default());
    assert_eq!(parser.start_rule(), "expression");
    assert_eq!(
        parser.rule_names().collect::<Vec<_>>(),
        vec!["expression", "addition", "multiplication", "atomic"]
    );
}

#[test]
fn test_configured_start_rule() {
    let parser = calculator(ParserConfig::default().with_start_rule("atomic"));
    let execution = parser.execute("4+4");

    assert_eq!(execution.result, Some(4.0));
    assert_eq!(
        recognition_kinds(&execution),
        vec![RecognitionErrorKind::NotAllInputParsed]
    );
}

#[test]
fn test_unexpected_end_of_input() {
    let parser = calculator(ParserConfig::default());
    let execution = parser.execute("4+");

    assert_eq!(execution.result, None);
    let [ExecutionError::Recognition(err)] = execution.errors.as_slice() else {
        panic!("expected one recognition error, got {:?}", execution.errors);
    };
    assert_eq!(err.kind, RecognitionErrorKind::NoViableAlternative);
    assert!(err.token.kind.is_eof());
    assert_eq!(err.message, "expected LParen, Number or Minus but found end of input");
    assert_eq!(
        err.rule_stack,
        vec!["expression", "addition", "multiplication", "atomic"]
    );
    assert_eq!(err.span(2), lm_ir::Span::empty_at(2));
}

#[test]
fn test_not_all_input_parsed_keeps_result() {
    let parser = calculator(ParserConfig::default());
    let execution = parser.execute("4 4");

    assert_eq!(execution.result, Some(4.0));
    let [ExecutionError::Recognition(err)] = execution.errors.as_slice() else {
        panic!("expected one recognition error, got {:?}", execution.errors);
    };
    assert_eq!(err.kind, RecognitionErrorKind::NotAllInputParsed);
    assert_eq!(err.message, "expected end of input but found `4`");
    assert_eq!(err.span(3), lm_ir::Span::new(2, 3));
}

#[test]
fn test_lexical_errors_do_not_stop_parsing() {
    let parser = calculator(ParserConfig::default());
    let execution = parser.execute("3*ye5");

    assert_eq!(execution.result, Some(15.0));
    assert_eq!(execution.errors.len(), 1);
    assert!(execution.errors[0].is_lexical());
    assert!(execution.clone().into_result().is_err());
}

#[test]
fn test_mismatch_without_recovery() {
    let parser = calculator(ParserConfig::default());
    let execution = parser.execute("(1 2)");

    assert_eq!(execution.result, None);
    assert_eq!(
        execution.errors[0].to_string(),
        "expected RParen but found `2`"
    );
}

#[test]
fn test_single_token_deletion() {
    let parser = calculator(ParserConfig::default().with_recovery(true));
    let execution = parser.execute("(1 2) * 3");

    assert_eq!(execution.result, Some(3.0));
    let [ExecutionError::Recognition(err)] = execution.errors.as_slice() else {
        panic!("expected one recognition error, got {:?}", execution.errors);
    };
    assert_eq!(err.kind, RecognitionErrorKind::MismatchedToken);
    assert_eq!(err.message, "unexpected `2`");
    assert_eq!(err.token.start_offset, 3);
}

#[test]
fn test_deep_nesting() {
    let parser = calculator(ParserConfig::default());
    let depth = 2_000;
    let text = format!("{}7{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parser.execute(&text).into_result().unwrap(), 7.0);
}

#[test]
fn test_highlight_clean_text() {
    let parser = calculator(ParserConfig::default());
    let highlight = parser.highlight("1 + 2");

    assert!(!highlight.has_errors());
    let nodes: Vec<_> = highlight
        .nodes
        .iter()
        .map(|n| (n.text.as_str(), n.start, n.end, n.tags.as_slice().to_vec()))
        .collect();
    assert_eq!(
        nodes,
        vec![
            ("1", 0, 1, vec!["literal".to_owned(), "number".to_owned()]),
            (" ", 1, 2, vec![]),
            ("+", 2, 3, vec!["operator".to_owned()]),
            (" ", 3, 4, vec![]),
            ("2", 4, 5, vec!["literal".to_owned(), "number".to_owned()]),
        ]
    );
}

#[test]
fn test_highlight_error_ranges() {
    let parser = calculator(ParserConfig::default());

    let unclosed = parser.highlight("(1+2");
    assert_eq!(unclosed.nodes.len(), 4);
    assert_eq!(unclosed.errors.len(), 1);
    assert_eq!(unclosed.errors[0].kind, HighlightErrorKind::MismatchedToken);
    assert_eq!(unclosed.errors[0].span(), lm_ir::Span::new(4, 4));
    assert_eq!(unclosed.errors[0].syntax_range.text, "");

    let trailing = parser.highlight("12 34");
    assert_eq!(trailing.errors.len(), 1);
    assert_eq!(trailing.errors[0].kind, HighlightErrorKind::NotAllInputParsed);
    assert_eq!(trailing.errors[0].syntax_range.text, "34");
    assert_eq!(trailing.errors[0].span(), lm_ir::Span::new(3, 5));
}

#[test]
fn test_highlight_combines_lexical_and_grammar_errors() {
    let parser = calculator(ParserConfig::default());
    let highlight = parser.highlight("1 + ?");

    let kinds: Vec<_> = highlight.errors.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![HighlightErrorKind::Lexical, HighlightErrorKind::NoViableAlternative]
    );
    assert_eq!(highlight.errors[0].span(), lm_ir::Span::new(4, 5));
    assert_eq!(highlight.errors[1].span(), lm_ir::Span::empty_at(5));
    assert!(highlight.errors_at(5).any(|e| e.kind == HighlightErrorKind::NoViableAlternative));
}

#[test]
fn test_parser_is_shareable() {
    fn assert_send_sync<S: Send + Sync>(_: &S) {}

    let parser = Arc::new(calculator(ParserConfig::default()));
    assert_send_sync(&parser);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let parser = Arc::clone(&parser);
            std::thread::spawn(move || parser.execute(&format!("{i} * 2")).result)
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![Some(0.0), Some(2.0), Some(4.0), Some(6.0)]);
}

proptest! {
    #[test]
    fn prop_sums_evaluate_left_to_right(values in prop::collection::vec(0u32..1000, 1..20)) {
        let parser = calculator(ParserConfig::default());
        let text = values.iter().map(u32::to_string).collect::<Vec<_>>().join(" + ");
        let expected: f64 = values.iter().map(|&v| f64::from(v)).sum();
        prop_assert_eq!(parser.execute(&text).result, Some(expected));
    }

    #[test]
    fn prop_highlight_nodes_are_ordered(text in "[0-9()+*/ a-]{0,30}") {
        let parser = calculator(ParserConfig::default());
        let highlight = parser.highlight(&text);
        for pair in highlight.nodes.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for error in &highlight.errors {
            prop_assert!(error.span().end <= text.len());
        }
    }
}
