//! Command handlers. Each writes its report to `out` and returns whether
//! the input was free of errors.

use std::io::{self, Write};

use lm_ir::{HighlightError, Highlighter};
use lm_lexer::HighlightLexer;
use lm_parse::HighlightParser;
use tracing::debug;

/// Read `path`, or standard input for `-`.
pub fn read_source(path: &str) -> Result<String, String> {
    if path == "-" {
        return io::read_to_string(io::stdin()).map_err(|e| format!("error reading stdin: {e}"));
    }
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
        io::ErrorKind::PermissionDenied => format!("permission denied reading '{path}'"),
        io::ErrorKind::InvalidData => format!("'{path}' contains invalid UTF-8 data"),
        _ => format!("error reading '{path}': {e}"),
    })
}

fn write_errors<'e>(
    out: &mut impl Write,
    errors: impl IntoIterator<Item = &'e HighlightError>,
) -> io::Result<usize> {
    let mut count = 0;
    for error in errors {
        writeln!(out, "error: {error}")?;
        count += 1;
    }
    Ok(count)
}

/// Evaluate `expr` and print its value.
pub fn eval(parser: &HighlightParser<f64>, expr: &str, out: &mut impl Write) -> io::Result<bool> {
    let execution = parser.execute(expr);
    debug!(errors = execution.errors.len(), "evaluated expression");
    let errors: Vec<HighlightError> = execution
        .errors
        .iter()
        .map(|error| error.to_highlight_error(expr))
        .collect();
    let failed = write_errors(out, &errors)? > 0;
    match execution.result {
        Some(value) if !failed => writeln!(out, "{value}")?,
        Some(value) => writeln!(out, "partial result: {value}")?,
        None => {}
    }
    Ok(!failed)
}

/// Print the highlight nodes and errors of `source`.
pub fn highlight(
    highlighter: &impl Highlighter,
    source: &str,
    out: &mut impl Write,
) -> io::Result<bool> {
    let highlight = highlighter.highlight(source);
    for node in &highlight.nodes {
        let tags: Vec<&str> = node.tags.iter().collect();
        writeln!(
            out,
            "{:>4}..{:<4} {:<16} {:?}",
            node.start,
            node.end,
            tags.join(","),
            node.text
        )?;
    }
    Ok(write_errors(out, &highlight.errors)? == 0)
}

/// Print every token of `source`, skipped ones included.
pub fn tokens(lexer: &HighlightLexer, source: &str, out: &mut impl Write) -> io::Result<bool> {
    let data = lexer.highlight_data(source);
    let vocabulary = lexer.vocabulary();
    for tagged in &data.tokens {
        let span = tagged.token.span();
        write!(
            out,
            "{:<12} {}..{} {:?}",
            vocabulary.name(tagged.token.kind),
            span.start,
            span.end,
            tagged.token.image
        )?;
        if tagged.skipped {
            write!(out, " (skipped)")?;
        }
        writeln!(out)?;
    }
    let errors: Vec<HighlightError> = data
        .errors
        .iter()
        .map(|error| error.to_highlight_error(source))
        .collect();
    Ok(write_errors(out, &errors)? == 0)
}
