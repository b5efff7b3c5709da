//! Integration tests for the kiln pipeline

use kiln::ir::{BinOp, Operand, Quadruple};
use kiln::*;

fn lower(source: &str) -> Vec<Quadruple> {
    let output = cinder::parse(source);
    let program = output.ast.expect("program should parse");
    let analysis = cinder::analyze(&program);
    assert!(analysis.is_ok(), "{:?}", analysis.errors);
    generate_ir(&program, &analysis.symbols).quadruples
}

fn count(quads: &[Quadruple], pred: impl Fn(&Quadruple) -> bool) -> usize {
    quads.iter().filter(|q| pred(q)).count()
}

#[test]
fn straight_line_code_uses_one_temporary_per_operator() {
    let quads = lower("main { int a; a = 5; int b; b = a + 3; }");
    assert_eq!(count(&quads, |q| matches!(q, Quadruple::BinaryOp { .. })), 1);
    assert_eq!(count(&quads, |q| matches!(q, Quadruple::Assign { .. })), 2);
    assert_eq!(
        quads[1],
        Quadruple::BinaryOp {
            target: Operand::Temp(0),
            op: BinOp::Add,
            left: Operand::Var("a".to_string()),
            right: Operand::Int(3),
        }
    );
}

#[test]
fn output_order_follows_the_source() {
    let quads = lower("main { cout << 1 << \"two\"; cout << 3; }");
    let outputs: Vec<&Operand> = quads
        .iter()
        .filter_map(|q| match q {
            Quadruple::Output { value } => Some(value),
            _ => None,
        })
        .collect();
    assert_eq!(
        outputs,
        vec![
            &Operand::Int(1),
            &Operand::Str("two".to_string()),
            &Operand::Int(3)
        ]
    );
}

#[test]
fn while_condition_is_emitted_once_at_the_bottom() {
    let quads = lower("main { int i = 0; while i < 3 { i = i + 1; } }");
    assert_eq!(
        count(&quads, |q| matches!(q, Quadruple::BinaryOp { op: BinOp::Lt, .. })),
        1
    );
    assert!(matches!(quads[1], Quadruple::Goto { .. }));
    assert_eq!(count(&quads, |q| matches!(q, Quadruple::IfTrueGoto { .. })), 1);
}

#[test]
fn if_else_jumps_over_the_else_branch() {
    let quads = lower("main { int x = 1; if x > 0 then x = 2; else x = 3; end }");
    let listing = kiln::ir::printer::listing(&quads);
    assert!(listing.contains("IF_FALSE t0 GOTO L0"), "{}", listing);
    assert!(listing.contains("GOTO L1"), "{}", listing);
    assert!(listing.contains("L0:"), "{}", listing);
    assert!(listing.ends_with("L1:\n"), "{}", listing);
}

#[test]
fn do_until_loops_while_condition_is_false() {
    let quads = lower("main { int i = 0; do i = i + 1; until i == 3; }");
    assert!(matches!(quads.last(), Some(Quadruple::IfFalseGoto { .. })));
}

#[test]
fn negative_literals_are_constants() {
    let quads = lower("main { int a = -4; float b = -1.5; }");
    assert_eq!(
        quads,
        vec![
            Quadruple::Assign {
                target: Operand::Var("a".to_string()),
                source: Operand::Int(-4),
            },
            Quadruple::Assign {
                target: Operand::Var("b".to_string()),
                source: Operand::Float(-1.5),
            },
        ]
    );
}

#[test]
fn shadowed_variables_lower_to_distinct_storage() {
    let quads = lower("main { int x = 1; if true then int x = 2; cout << x; end cout << x; }");
    let outputs: Vec<String> = quads
        .iter()
        .filter_map(|q| match q {
            Quadruple::Output { value } => Some(value.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(outputs, vec!["x.1", "x"]);
}

#[test]
fn functions_are_bracketed_and_calls_push_params() {
    let quads = lower(
        "main {
            function int add(int a, int b) { return a + b; }
            int r = add(1, 2);
        }",
    );
    assert_eq!(
        quads[0],
        Quadruple::FunctionBegin {
            name: "add".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
        }
    );
    assert!(quads.iter().any(|q| matches!(q, Quadruple::FunctionEnd { name } if name == "add")));
    assert_eq!(count(&quads, |q| matches!(q, Quadruple::Param { .. })), 2);
    assert!(quads.iter().any(|q| matches!(
        q,
        Quadruple::Call { target: Some(_), function, argc: 2 } if function == "add"
    )));
}

#[test]
fn every_compile_starts_counters_at_zero() {
    let source = "main { int a = 1 + 2; while a < 9 { a = a * 2; } }";
    assert_eq!(lower(source), lower(source));
}

#[test]
fn compiler_reports_the_failing_stage() {
    let compiler = Compiler::new();
    assert!(matches!(
        compiler.compile_source("main { int a = 1.2.3; }"),
        Err(CompileError::Lexical(_))
    ));
    assert!(matches!(
        compiler.compile_source("main { int a = ; }"),
        Err(CompileError::Syntax(_))
    ));
    assert!(matches!(
        compiler.compile_source("main { a = 1; }"),
        Err(CompileError::Semantic(errors)) if errors.len() == 1
    ));
}

#[test]
fn compiler_produces_every_artifact() {
    let compiler = Compiler::new();
    let compilation = compiler
        .compile_source("main { int a = 2; cout << a * 3; }")
        .expect("compile should succeed");
    assert_eq!(compilation.symbols.len(), 1);
    assert!(!compilation.ir.text.is_empty());
    assert!(compilation.optimized.is_some());
    assert!(compilation.emission.text.contains("define i32 @main()"));
}

#[test]
fn no_opt_skips_the_optimizer() {
    let compiler = Compiler::with_options(CompileOptions {
        optimize: false,
        ..CompileOptions::default()
    });
    let compilation = compiler
        .compile_source("main { int a = 2 + 3; cout << a; }")
        .expect("compile should succeed");
    assert!(compilation.optimized.is_none());
    assert_eq!(compilation.final_quadruples(), compilation.ir.quadruples.as_slice());
}

#[test]
fn compilation_serializes_to_json() {
    let compilation = Compiler::new()
        .compile_source("main { cout << 1; }")
        .expect("compile should succeed");
    let json = serde_json::to_value(&compilation).expect("serialize");
    assert!(json.get("ir").is_some());
    assert!(json.get("emission").is_some());
}

#[test]
fn lowering_without_a_symbol_table_reports_every_unresolved_name() {
    let program = cinder::parse("main { int a = 1; a = a + b; foo(); }")
        .ast
        .expect("program should parse");
    let ir = generate_ir(&program, &[]);
    assert_eq!(
        ir.diagnostics,
        vec![
            "declaration of 'a' has no symbol table entry in scope 0".to_string(),
            "unresolved name 'b'".to_string(),
            "call to unresolved function 'foo'".to_string(),
        ]
    );
}

#[test]
fn lowering_a_checked_program_has_no_diagnostics() {
    let source = "main {
        int x = 1;
        function int twice(int n) { int r = n * 2; return r; }
        if x > 0 then int x = twice(3); cout << x; end
    }";
    let program = cinder::parse(source).ast.expect("program should parse");
    let analysis = cinder::analyze(&program);
    assert!(analysis.is_ok(), "{:?}", analysis.errors);
    assert!(generate_ir(&program, &analysis.symbols).diagnostics.is_empty());
}
