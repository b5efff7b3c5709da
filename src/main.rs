use std::env;
use std::fs;

use cinder::errors::pretty::format_all;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    if let Err(err) = run(&args) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let Some(command) = args.first() else {
        return Err(usage());
    };

    let mut json = false;
    let mut file = None;
    for arg in args.iter().skip(1) {
        if arg == "--json" {
            json = true;
            continue;
        }
        if file.is_none() {
            file = Some(arg.clone());
            continue;
        }
        return Err(format!("unknown option '{}'\n{}", arg, usage()));
    }
    let Some(file) = file else {
        return Err(usage());
    };

    let source =
        fs::read_to_string(&file).map_err(|err| format!("failed to read '{}': {}", file, err))?;

    match command.as_str() {
        "tokens" => run_tokens_command(&file, &source, json),
        "parse" => run_parse_command(&file, &source, json),
        "check" => run_check_command(&file, &source, json),
        other => Err(format!("unknown command '{}'\n{}", other, usage())),
    }
}

fn usage() -> String {
    "usage: cinder <tokens|parse|check> <file> [--json]".to_string()
}

fn run_tokens_command(file: &str, source: &str, json: bool) -> Result<(), String> {
    let tokens = cinder::tokenize(source);
    if json {
        return print_json(&tokens);
    }

    for token in &tokens {
        println!("{}", token);
    }
    let errors = cinder::lexical_errors(&tokens);
    report(file, source, &errors)
}

fn run_parse_command(file: &str, source: &str, json: bool) -> Result<(), String> {
    let output = cinder::parse(source);
    if json {
        print_json(&output)?;
    } else if let Some(ast) = &output.ast {
        println!("{:#?}", ast);
    }

    report(file, source, &output.lexical_errors)?;
    report(file, source, &output.errors)
}

fn run_check_command(file: &str, source: &str, json: bool) -> Result<(), String> {
    let output = cinder::parse(source);
    report(file, source, &output.lexical_errors)?;
    report(file, source, &output.errors)?;
    let Some(ast) = output.ast else {
        return Err(format!("could not parse '{}'", file));
    };

    let analysis = cinder::analyze(&ast);
    if json {
        print_json(&analysis)?;
    } else {
        for symbol in &analysis.symbols {
            println!(
                "{:<12} {:<9} {:<10} line {:<4} storage {}",
                symbol.name,
                symbol.ty.to_string(),
                symbol.scope_label, symbol.line, symbol.storage
            );
        }
    }

    report(file, source, &analysis.errors)?;
    println!("check passed: {}", file);
    Ok(())
}

fn report<D: cinder::errors::Diagnostic>(file: &str, source: &str, diagnostics: &[D]) -> Result<(), String> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    let rendered = format_all(file, source, diagnostics);
    Err(format!(
        "{}\n{} error(s) in '{}'",
        rendered.join("\n\n"),
        diagnostics.len(),
        file
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{}", text);
    Ok(())
}
