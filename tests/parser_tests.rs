use cinder::parser::ast::{BinaryOp, ExprKind, StmtKind, TypeName, UnaryOp};
use cinder::parse;

fn body(source: &str) -> Vec<StmtKind> {
    let output = parse(source);
    assert!(output.success, "unexpected errors: {:?}", output.errors);
    output
        .ast
        .expect("program should parse")
        .body
        .into_iter()
        .map(|stmt| stmt.kind)
        .collect()
}

#[test]
fn parses_declarations_with_initializers() {
    let statements = body("main { int a = 1, b; float c; }");
    assert_eq!(statements.len(), 2);
    match &statements[0] {
        StmtKind::Declaration { ty, declarators } => {
            assert_eq!(*ty, TypeName::Int);
            assert_eq!(declarators.len(), 2);
            assert!(declarators[0].initializer.is_some());
            assert!(declarators[1].initializer.is_none());
            assert_eq!(declarators[1].name.name, "b");
        }
        other => panic!("expected declaration, got {:?}", other),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let statements = body("main { x = 1 + 2 * 3; }");
    let StmtKind::Assign { value, .. } = &statements[0] else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { op, rhs, .. } = &value.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Multiply, .. }));
}

#[test]
fn power_is_right_associative() {
    let statements = body("main { x = 2 ^ 3 ^ 2; }");
    let StmtKind::Assign { value, .. } = &statements[0] else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { op, lhs, rhs } = &value.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Power);
    assert!(matches!(lhs.kind, ExprKind::Int(2)));
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Power, .. }));
}

#[test]
fn unary_minus_binds_looser_than_power() {
    let statements = body("main { x = -2 ^ 2; }");
    let StmtKind::Assign { value, .. } = &statements[0] else {
        panic!("expected assignment");
    };
    assert!(matches!(
        value.kind,
        ExprKind::Unary {
            op: UnaryOp::Negate,
            ..
        }
    ));
}

#[test]
fn logical_operators_have_lowest_precedence() {
    let statements = body("main { b = x < 1 || y == 2 && z; }");
    let StmtKind::Assign { value, .. } = &statements[0] else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { op, rhs, .. } = &value.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, BinaryOp::Or);
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::And, .. }));
}

#[test]
fn parses_both_if_forms() {
    let statements = body(
        "main {
            if x > 1 then y = 1; z = 2; else y = 3; end
            if (x > 1) { y = 1; } else y = 2;
        }",
    );
    match &statements[0] {
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            assert_eq!(then_branch.len(), 2);
            assert_eq!(else_branch.as_ref().map(Vec::len), Some(1));
        }
        other => panic!("expected if, got {:?}", other),
    }
    assert!(matches!(
        &statements[1],
        StmtKind::If {
            else_branch: Some(_),
            ..
        }
    ));
}

#[test]
fn parses_loops() {
    let statements = body(
        "main {
            while i < 3 { i = i + 1; }
            do i = i - 1; until i == 0;
            do { i = i + 1; } while i < 5;
        }",
    );
    assert!(matches!(statements[0], StmtKind::While { .. }));
    assert!(matches!(statements[1], StmtKind::DoLoop { until: true, .. }));
    assert!(matches!(statements[2], StmtKind::DoLoop { until: false, .. }));
}

#[test]
fn parses_console_io() {
    let statements = body("main { cin >> a >> b; cout << a << \"x\" << a + b; }");
    match &statements[0] {
        StmtKind::Input { targets } => assert_eq!(targets.len(), 2),
        other => panic!("expected input, got {:?}", other),
    }
    match &statements[1] {
        StmtKind::Output { values } => assert_eq!(values.len(), 3),
        other => panic!("expected output, got {:?}", other),
    }
}

#[test]
fn parses_functions_calls_and_returns() {
    let statements = body(
        "main {
            function int add(int a, int b) { return a + b; }
            function void hello() { cout << \"hi\"; return; }
            hello();
            x = add(1, 2);
        }",
    );
    match &statements[0] {
        StmtKind::FunctionDef {
            name,
            return_type,
            params,
            body,
        } => {
            assert_eq!(name.name, "add");
            assert_eq!(*return_type, Some(TypeName::Int));
            assert_eq!(params.len(), 2);
            assert!(matches!(body[0].kind, StmtKind::Return { value: Some(_) }));
        }
        other => panic!("expected function, got {:?}", other),
    }
    assert!(matches!(
        &statements[1],
        StmtKind::FunctionDef {
            return_type: None,
            ..
        }
    ));
    assert!(matches!(&statements[2], StmtKind::Call { args, .. } if args.is_empty()));
    let StmtKind::Assign { value, .. } = &statements[3] else {
        panic!("expected assignment");
    };
    assert!(matches!(&value.kind, ExprKind::Call { name, args } if name == "add" && args.len() == 2));
}

#[test]
fn records_line_numbers_on_statements() {
    let output = parse("main {\n  int a;\n\n  a = 1;\n}");
    let program = output.ast.expect("program should parse");
    assert_eq!(program.body[0].line, 2);
    assert_eq!(program.body[1].line, 4);
}

#[test]
fn recovers_after_a_bad_statement() {
    let output = parse("main { int = 5; cout << 1; x = ; y = 2; }");
    assert!(!output.success);
    assert_eq!(output.errors.len(), 2);
    let program = output.ast.expect("recovery keeps the tree");
    assert_eq!(program.body.len(), 2);
    assert!(matches!(program.body[0].kind, StmtKind::Output { .. }));
    assert!(matches!(program.body[1].kind, StmtKind::Assign { .. }));
}

#[test]
fn missing_semicolon_is_reported_with_position() {
    let output = parse("main {\n  int a\n  a = 1;\n}");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].line, 3);
    assert!(output.errors[0].message.contains("expected ';'"));
}

#[test]
fn missing_main_yields_no_tree() {
    let output = parse("{ int a; }");
    assert!(output.ast.is_none());
    assert_eq!(output.errors.len(), 1);
}

#[test]
fn reserved_words_cannot_be_identifiers() {
    let output = parse("main { int switch; }");
    assert!(!output.success);
}

#[test]
fn lexical_errors_are_reported_separately() {
    let output = parse("main { int a = 3.4.5; }");
    assert_eq!(output.lexical_errors.len(), 1);
    assert!(!output.success);
}

#[test]
fn parsing_twice_gives_identical_results() {
    let source = "main { int a = 1; while a < 10 { a = a * 2; } cout << a; }";
    assert_eq!(parse(source), parse(source));
}
