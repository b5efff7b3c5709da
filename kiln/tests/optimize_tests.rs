use kiln::ir::{BinOp, Operand, Quadruple};
use kiln::optimize::{
    optimize, ConstantFolding, ConstantPropagation, DeadStoreElimination, Pass, PassManager,
};

fn var(name: &str) -> Operand {
    Operand::Var(name.to_string())
}

fn lower(source: &str) -> Vec<Quadruple> {
    let output = cinder::parse(source);
    let program = output.ast.expect("program should parse");
    let analysis = cinder::analyze(&program);
    assert!(analysis.is_ok(), "{:?}", analysis.errors);
    kiln::generate_ir(&program, &analysis.symbols).quadruples
}

#[test]
fn folds_a_constant_expression_into_an_assignment() {
    let quads = vec![
        Quadruple::BinaryOp {
            target: var("x"),
            op: BinOp::Add,
            left: Operand::Int(2),
            right: Operand::Int(3),
        },
        Quadruple::Output { value: var("x") },
    ];
    let optimized = optimize(&quads);
    assert_eq!(
        optimized.quadruples,
        vec![
            Quadruple::Assign {
                target: var("x"),
                source: Operand::Int(5),
            },
            Quadruple::Output { value: var("x") },
        ]
    );
    assert_eq!(optimized.report.count("constant-folding"), 1);
}

#[test]
fn folding_from_source_lands_on_the_temporary() {
    let quads = lower("main { int x; x = 2 + 3; cout << x; }");
    let optimized = optimize(&quads);
    assert_eq!(
        optimized.quadruples,
        vec![
            Quadruple::Assign {
                target: Operand::Temp(0),
                source: Operand::Int(5),
            },
            Quadruple::Assign {
                target: var("x"),
                source: Operand::Temp(0),
            },
            Quadruple::Output { value: var("x") },
        ]
    );
    assert_eq!(optimize(&optimized.quadruples).quadruples, optimized.quadruples);
}

#[test]
fn an_unread_source_assignment_leaves_only_the_folded_temporary() {
    let optimized = optimize(&lower("main { int x; x = 2 + 3; }"));
    assert_eq!(
        optimized.quadruples,
        vec![Quadruple::Assign {
            target: Operand::Temp(0),
            source: Operand::Int(5),
        }]
    );
}

#[test]
fn optimizing_twice_changes_nothing() {
    let quads = lower(
        "main {
            int a = 4, b;
            b = a * 2 + 1;
            int unused = b;
            while b > 0 { b = b - 3; }
            cout << b;
        }",
    );
    let once = optimize(&quads);
    let twice = optimize(&once.quadruples);
    assert_eq!(once.quadruples, twice.quadruples);
    assert!(twice.report.rewrites.is_empty());
}

#[test]
fn dead_stores_are_removed_but_reads_anywhere_keep_a_store() {
    let quads = vec![
        Quadruple::Assign {
            target: var("dead"),
            source: Operand::Int(1),
        },
        Quadruple::Assign {
            target: var("late"),
            source: Operand::Int(2),
        },
        Quadruple::Label {
            name: "L0".to_string(),
        },
        Quadruple::IfTrueGoto {
            cond: var("late"),
            label: "L0".to_string(),
        },
    ];
    let mut rewrites = Vec::new();
    let result = DeadStoreElimination.run(&quads, &mut rewrites);
    assert_eq!(result.len(), 3);
    assert_eq!(rewrites.len(), 1);
    assert!(rewrites[0].description.contains("dead = 1"));
}

#[test]
fn dead_store_elimination_never_touches_control_flow_or_io() {
    let quads = vec![
        Quadruple::Input { target: var("n") },
        Quadruple::Goto {
            label: "L1".to_string(),
        },
        Quadruple::Label {
            name: "L1".to_string(),
        },
        Quadruple::Output {
            value: Operand::Int(0),
        },
    ];
    let mut rewrites = Vec::new();
    assert_eq!(DeadStoreElimination.run(&quads, &mut rewrites), quads);
    assert!(rewrites.is_empty());
}

#[test]
fn removing_a_store_can_expose_another() {
    let quads = vec![
        Quadruple::Assign {
            target: var("a"),
            source: Operand::Int(1),
        },
        Quadruple::Assign {
            target: var("b"),
            source: var("a"),
        },
    ];
    let mut rewrites = Vec::new();
    assert!(DeadStoreElimination.run(&quads, &mut rewrites).is_empty());
    assert_eq!(rewrites.len(), 2);
}

#[test]
fn propagation_substitutes_known_constants() {
    let quads = vec![
        Quadruple::Assign {
            target: var("a"),
            source: Operand::Int(5),
        },
        Quadruple::BinaryOp {
            target: Operand::Temp(0),
            op: BinOp::Add,
            left: var("a"),
            right: Operand::Int(3),
        },
    ];
    let mut rewrites = Vec::new();
    let result = ConstantPropagation.run(&quads, &mut rewrites);
    assert!(matches!(
        &result[1],
        Quadruple::BinaryOp {
            left: Operand::Int(5),
            ..
        }
    ));
    assert_eq!(rewrites.len(), 1);
}

#[test]
fn propagation_forgets_everything_at_labels() {
    let quads = vec![
        Quadruple::Assign {
            target: var("a"),
            source: Operand::Int(5),
        },
        Quadruple::Label {
            name: "L0".to_string(),
        },
        Quadruple::BinaryOp {
            target: Operand::Temp(0),
            op: BinOp::Add,
            left: var("a"),
            right: Operand::Int(1),
        },
    ];
    let mut rewrites = Vec::new();
    assert_eq!(ConstantPropagation.run(&quads, &mut rewrites), quads);
}

#[test]
fn folding_leaves_division_by_zero_for_run_time() {
    let quads = vec![Quadruple::BinaryOp {
        target: Operand::Temp(0),
        op: BinOp::Div,
        left: Operand::Int(1),
        right: Operand::Int(0),
    }];
    let mut rewrites = Vec::new();
    assert_eq!(ConstantFolding.run(&quads, &mut rewrites), quads);
}

#[test]
fn loop_bodies_are_not_propagated_across_the_back_edge() {
    let quads = lower("main { int i = 0; while i < 3 { i = i + 1; } cout << i; }");
    let optimized = optimize(&quads);
    assert!(optimized
        .quadruples
        .iter()
        .any(|q| matches!(q, Quadruple::BinaryOp { op: BinOp::Lt, left: Operand::Var(_), .. })));
}

#[test]
fn report_lists_every_rewrite() {
    let quads = lower("main { int a = 2 * 3; cout << a + 1; }");
    let optimized = optimize(&quads);
    let report = optimized.report.to_string();
    assert!(report.starts_with("1. ["), "{}", report);
    assert!(report.contains("total:"), "{}", report);
    assert_eq!(
        optimize(&optimized.quadruples).report.to_string(),
        "no optimizations applied\n"
    );
}

#[test]
fn standard_pipeline_order() {
    assert_eq!(
        PassManager::standard().pass_names(),
        vec![
            "dead-store-elimination",
            "constant-folding",
            "constant-propagation"
        ]
    );
}
