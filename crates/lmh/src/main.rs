//! `lmh`: highlight and evaluate text with the demo calculator grammar.

use std::io::Write;

use lm_parse::ParserConfig;
use lmh::{calc, commands};

fn main() {
    lmh::init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let recover = args.iter().skip(2).any(|arg| arg == "--recover");
    let operand = args.iter().skip(2).find(|arg| arg.as_str() != "--recover");
    let config = ParserConfig::default().with_recovery(recover);
    let command = args[1].as_str();

    let mut out = std::io::stdout().lock();
    let outcome = match command {
        "eval" => {
            let Some(expr) = operand else {
                eprintln!("Usage: lmh eval <expression> [--recover]");
                std::process::exit(1);
            };
            commands::eval(&build_parser(config), expr, &mut out)
        }
        "highlight" => {
            let Some(path) = operand else {
                eprintln!("Usage: lmh highlight <file|-> [--recover]");
                std::process::exit(1);
            };
            let source = read(path);
            commands::highlight(&build_parser(config), &source, &mut out)
        }
        "tokens" => {
            let Some(path) = operand else {
                eprintln!("Usage: lmh tokens <file|->");
                std::process::exit(1);
            };
            let source = read(path);
            let lexer = calc::lexer().unwrap_or_else(|e| {
                eprintln!("error: {e}");
                std::process::exit(2);
            });
            commands::tokens(&lexer, &source, &mut out)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "version" | "--version" | "-V" => {
            println!("lmh {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    let clean = match outcome.and_then(|clean| out.flush().map(|()| clean)) {
        Ok(clean) => clean,
        Err(e) => {
            eprintln!("error writing output: {e}");
            std::process::exit(2);
        }
    };
    if !clean {
        std::process::exit(1);
    }
}

fn build_parser(config: ParserConfig) -> lm_parse::HighlightParser<f64> {
    calc::parser(config).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

fn read(path: &str) -> String {
    commands::read_source(path).unwrap_or_else(|msg| {
        eprintln!("{msg}");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("lmh: highlight and evaluate arithmetic with the demo calculator grammar");
    println!();
    println!("Usage: lmh <command> [options]");
    println!();
    println!("Commands:");
    println!("  eval <expression>    Evaluate an expression and print its value");
    println!("  highlight <file|->   Print highlight nodes and errors");
    println!("  tokens <file|->      Print every token, skipped ones included");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  --recover            Skip single unexpected tokens instead of stopping");
    println!();
    println!("Environment:");
    println!("  RUST_LOG             Enable logging (e.g. RUST_LOG=lm_parse=debug)");
    println!("  LMH_LOG_TREE         Render logged spans as an indented tree");
}
