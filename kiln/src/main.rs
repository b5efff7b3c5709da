use std::env;
use std::fs;

use cinder::errors::pretty::format_all;
use cinder::errors::Diagnostic;
use kiln::vm::ScriptedInput;
use kiln::{CompileError, CompileOptions, Compiler};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Flags {
    emit_tokens: bool,
    emit_ast: bool,
    emit_ir: bool,
    emit_opt: bool,
    emit_llvm: bool,
    report: bool,
    run: bool,
    json: bool,
    input: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage());
    }

    let mut source_path: Option<String> = None;
    let mut flags = Flags::default();
    let mut options = CompileOptions::default();

    for arg in &args {
        match arg.as_str() {
            "--emit-tokens" => flags.emit_tokens = true,
            "--emit-ast" => flags.emit_ast = true,
            "--emit-ir" => flags.emit_ir = true,
            "--emit-opt" => flags.emit_opt = true,
            "--emit-llvm" => flags.emit_llvm = true,
            "--report" => flags.report = true,
            "--run" => flags.run = true,
            "--json" => flags.json = true,
            "--no-opt" => options.optimize = false,
            _ if arg.starts_with("--input=") => {
                let values = arg.trim_start_matches("--input=");
                flags.input = values
                    .split(',')
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ if arg.starts_with("--target=") => {
                options.target_triple = arg.trim_start_matches("--target=").to_string();
            }
            _ if arg.starts_with("--max-steps=") => {
                let value = arg.trim_start_matches("--max-steps=");
                options.max_steps = value
                    .parse()
                    .map_err(|_| format!("invalid step limit '{}'", value))?;
            }
            _ if arg.starts_with("--") => {
                return Err(format!("unknown option '{}'\n{}", arg, usage()));
            }
            _ => {
                if source_path.is_some() {
                    return Err("multiple source paths provided".to_string());
                }
                source_path = Some(arg.clone());
            }
        }
    }

    let Some(source_path) = source_path else {
        return Err(usage());
    };
    let source = fs::read_to_string(&source_path)
        .map_err(|err| format!("failed to read '{}': {}", source_path, err))?;

    if flags.emit_tokens {
        let tokens = cinder::tokenize(&source);
        if flags.json {
            print_json(&tokens)?;
        } else {
            for token in &tokens {
                println!("{}", token);
            }
        }
    }

    let compiler = Compiler::with_options(options);
    let compilation = match compiler.compile_source(&source) {
        Ok(compilation) => compilation,
        Err(err) => return Err(describe(&source_path, &source, &err)),
    };

    let nothing_selected = !(flags.emit_tokens
        || flags.emit_ast
        || flags.emit_ir
        || flags.emit_opt
        || flags.report
        || flags.run);

    if flags.emit_ast {
        if flags.json {
            print_json(&compilation.ast)?;
        } else {
            println!("{}", compilation.annotated.render());
        }
    }

    if flags.emit_ir {
        if flags.json {
            print_json(&compilation.ir)?;
        } else {
            println!("; intermediate code");
            print!("{}", compilation.ir.text);
        }
    }

    if flags.emit_opt || flags.report {
        let Some(optimized) = compilation.optimized.as_ref() else {
            return Err("optimization is disabled (--no-opt)".to_string());
        };
        if flags.emit_opt {
            if flags.json {
                print_json(&optimized.quadruples)?;
            } else {
                println!("; optimized code");
                print!("{}", kiln::ir::printer::listing(&optimized.quadruples));
            }
        }
        if flags.report {
            if flags.json {
                print_json(&optimized.report)?;
            } else {
                print!("{}", optimized.report);
            }
        }
    }

    if flags.emit_llvm || nothing_selected {
        if flags.json {
            print_json(&compilation.emission)?;
        } else {
            print!("{}", compilation.emission.text);
        }
        for warning in &compilation.emission.warnings {
            eprintln!("{}", warning);
        }
    }

    if flags.run {
        let mut input = ScriptedInput::new(flags.input);
        let execution = compiler
            .run(&compilation, &mut input)
            .map_err(|err| err.to_string())?;
        if flags.json {
            print_json(&execution)?;
        } else {
            for line in &execution.outputs {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn usage() -> String {
    "usage: kiln <file> [--emit-tokens] [--emit-ast] [--emit-ir] [--emit-opt] [--emit-llvm] \
     [--report] [--run] [--no-opt] [--json] [--input=v1,v2] [--target=<triple>] [--max-steps=<n>]"
        .to_string()
}

fn describe(file: &str, source: &str, err: &CompileError) -> String {
    match err {
        CompileError::Lexical(errors) => render(file, source, errors),
        CompileError::Syntax(errors) => render(file, source, errors),
        CompileError::Semantic(errors) => render(file, source, errors),
        CompileError::Internal(_) | CompileError::Runtime(_) => err.to_string(),
    }
}

fn render<D: Diagnostic>(file: &str, source: &str, diagnostics: &[D]) -> String {
    format!(
        "{}\n{} error(s) in '{}'",
        format_all(file, source, diagnostics).join("\n\n"),
        diagnostics.len(),
        file
    )
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{}", text);
    Ok(())
}
