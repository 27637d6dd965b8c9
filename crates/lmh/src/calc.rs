//! Demo calculator grammar.
//!
//! `+ - * /`, right-associative `^`, unary minus, parentheses, the
//! constants `pi`, `tau` and `e`, and `#` line comments. Comments and
//! whitespace are skipped by the parser but still highlighted.

use std::sync::Arc;

use lm_lexer::{HighlightLexer, TokenDef, Vocabulary, VocabularyError};
use lm_parse::{GrammarBuilder, GrammarError, HighlightParser, ParserConfig};
use thiserror::Error;

/// Failure to assemble the calculator grammar.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

fn constant(name: &str) -> f64 {
    match name {
        "pi" => std::f64::consts::PI,
        "tau" => std::f64::consts::TAU,
        "e" => std::f64::consts::E,
        _ => f64::NAN,
    }
}

/// Build the calculator vocabulary and its lexer.
pub fn lexer() -> Result<HighlightLexer, VocabularyError> {
    let mut vocab = Vocabulary::builder();
    let additive = vocab.define(TokenDef::category("Additive"))?;
    let multiplicative = vocab.define(TokenDef::category("Multiplicative"))?;
    vocab.define(TokenDef::new("Plus", r"\+").tags(["operator"]).member_of(additive))?;
    vocab.define(TokenDef::new("Minus", "-").tags(["operator"]).member_of(additive))?;
    vocab.define(TokenDef::new("Star", r"\*").tags(["operator"]).member_of(multiplicative))?;
    vocab.define(TokenDef::new("Slash", "/").tags(["operator"]).member_of(multiplicative))?;
    vocab.define(TokenDef::new("Caret", r"\^").tags(["operator"]))?;
    vocab.define(TokenDef::new("LParen", r"\(").tags(["paren"]))?;
    vocab.define(TokenDef::new("RParen", r"\)").tags(["paren"]))?;
    vocab.define(
        TokenDef::new("Number", r"[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?")
            .tags(["literal", "number"]),
    )?;
    vocab.define(TokenDef::new("Constant", r"(?:pi|tau|e)\b").tags(["literal", "constant"]))?;
    vocab.define(TokenDef::new("Comment", "#[^\n]*").tags(["comment"]).skipped())?;
    vocab.define(TokenDef::new("Whitespace", r"\s+").skipped())?;
    Ok(HighlightLexer::new(Arc::new(vocab.build())))
}

/// Build the calculator parser.
pub fn parser(config: ParserConfig) -> Result<HighlightParser<f64>, CalcError> {
    let lexer = lexer()?;
    let vocab = lexer.vocabulary();
    let kind = |name: &str| vocab.kind(name).unwrap_or_default();
    let (additive, multiplicative) = (kind("Additive"), kind("Multiplicative"));
    let (plus, star, caret) = (kind("Plus"), kind("Star"), kind("Caret"));
    let (minus, lparen, rparen) = (kind("Minus"), kind("LParen"), kind("RParen"));
    let (number, constant_kind) = (kind("Number"), kind("Constant"));

    let mut grammar = GrammarBuilder::<f64>::new(lexer);
    grammar
        .rule("expression", |r| r.subrule("additive"))
        .rule("additive", move |r| {
            let mut value = r.subrule("multiplicative")?;
            r.many(|r| {
                let op = r.consume(additive)?;
                let rhs = r.subrule("multiplicative")?;
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
        })
        .rule("multiplicative", move |r| {
            let mut value = r.subrule("unary")?;
            r.many(|r| {
                let op = r.consume(multiplicative)?;
                let rhs = r.subrule("unary")?;
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
        })
        .rule("unary", move |r| {
            r.or(&mut [
                &mut |r| {
                    r.consume(minus)?;
                    Ok(-r.subrule("unary")?)
                },
                &mut |r| r.subrule("power"),
            ])
        })
        .rule("power", move |r| {
            let mut value = r.subrule("primary")?;
            let exponent = r.option(|r| {
                r.consume(caret)?;
                r.subrule("unary")
            })?;
            if let Some(exponent) = exponent {
                r.action(|| value = value.powf(exponent));
            }
            Ok(value)
        })
        .rule("primary", move |r| {
            r.or(&mut [
                &mut |r| {
                    let token = r.consume(number)?;
                    Ok(token.image.parse::<f64>().unwrap_or(f64::NAN))
                },
                &mut |r| {
                    let token = r.consume(constant_kind)?;
                    Ok(constant(&token.image))
                },
                &mut |r| {
                    r.consume(lparen)?;
                    let value = r.subrule("expression")?;
                    r.consume(rparen)?;
                    Ok(value)
                },
            ])
        });
    Ok(grammar.perform_self_analysis(config)?)
}
