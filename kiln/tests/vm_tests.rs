use kiln::vm::{self, ScriptedInput, VmError};
use kiln::{CompileOptions, Compiler};

fn run_with(source: &str, optimize: bool, input: &[&str]) -> Result<Vec<String>, VmError> {
    let compiler = Compiler::with_options(CompileOptions {
        optimize,
        ..CompileOptions::default()
    });
    let compilation = compiler
        .compile_source(source)
        .expect("compile should succeed");
    let mut input = ScriptedInput::new(input.iter().copied());
    vm::run(
        compilation.final_quadruples(),
        &compilation.symbols,
        &mut input,
        compiler.options.max_steps,
    )
    .map(|execution| execution.outputs)
}

fn run(source: &str) -> Vec<String> {
    run_with(source, false, &[]).expect("program should run")
}

#[test]
fn prints_values_in_order() {
    assert_eq!(
        run("main { cout << 1 + 2 << 7 / 2 << 1.5 * 2 << \"done\" << (3 > 2); }"),
        vec!["3", "3", "3.0", "done", "true"]
    );
}

#[test]
fn loops_and_branches() {
    let source = "main {
        int i = 0, sum = 0;
        while i < 5 {
            if i % 2 == 0 then sum = sum + i; else sum = sum - 1; end
            i = i + 1;
        }
        do i = i - 1; until i == 0;
        cout << sum << i;
    }";
    assert_eq!(run(source), vec!["4", "0"]);
}

#[test]
fn shadowed_variable_does_not_leak_out_of_its_scope() {
    let source = "main {
        int x = 1;
        if true then int x = 2; cout << x; end
        cout << x;
    }";
    assert_eq!(run(source), vec!["2", "1"]);
}

#[test]
fn recursive_functions_get_fresh_frames() {
    let source = "main {
        function int fact(int n) {
            if n <= 1 then return 1; end
            return n * fact(n - 1);
        }
        cout << fact(10);
    }";
    assert_eq!(run(source), vec!["3628800"]);
}

#[test]
fn int_arguments_widen_to_float_parameters() {
    let source = "main {
        function float half(float x) { return x / 2; }
        cout << half(3);
    }";
    assert_eq!(run(source), vec!["1.5"]);
}

#[test]
fn function_bodies_run_only_when_called() {
    let source = "main {
        function void hello() { cout << \"hello\"; }
        cout << \"start\";
        hello();
        hello();
    }";
    assert_eq!(run(source), vec!["start", "hello", "hello"]);
}

#[test]
fn reads_input_by_target_type() {
    let source = "main {
        int a; float f; string s;
        cin >> a >> f >> s;
        cout << a * 2 << f << s + \"!\";
    }";
    assert_eq!(
        run_with(source, false, &["21", "0.25", "hey"]).expect("program should run"),
        vec!["42", "0.25", "hey!"]
    );
}

#[test]
fn strings_compare_lexicographically() {
    let source = "main {
        string a = \"apple\", b = \"banana\";
        cout << (a < b) << (b <= a) << (a + \"s\" > a) << (a >= \"apple\");
    }";
    assert_eq!(run(source), vec!["true", "false", "true", "true"]);
}

#[test]
fn exhausted_or_malformed_input_is_an_error() {
    let source = "main { int a; cin >> a; }";
    assert_eq!(
        run_with(source, false, &[]),
        Err(VmError::MissingInput("a".to_string()))
    );
    assert!(matches!(
        run_with(source, false, &["abc"]),
        Err(VmError::BadInput { .. })
    ));
}

#[test]
fn integer_division_by_zero_stops_the_run() {
    let source = "main { int z = 0; cout << 1 / z; }";
    assert!(matches!(
        run_with(source, false, &[]),
        Err(VmError::DivisionByZero(_))
    ));
    assert!(matches!(
        run_with(source, true, &[]),
        Err(VmError::DivisionByZero(_))
    ));
}

#[test]
fn runaway_loops_hit_the_step_limit() {
    let compilation = Compiler::new()
        .compile_source("main { while true { } }")
        .expect("compile should succeed");
    let mut input = ScriptedInput::default();
    let result = vm::run(
        compilation.final_quadruples(),
        &compilation.symbols,
        &mut input,
        500,
    );
    assert_eq!(result, Err(VmError::StepLimit(500)));
}

#[test]
fn optimization_preserves_observable_output() {
    let programs = [
        "main { int a = 2 * 3; int b = a + 4; int dead = 9; cout << b * a; }",
        "main {
            int i = 0, total = 0;
            float scale = 2 ^ 3 * 1.5;
            while i < 10 {
                total = total + i ^ 2;
                i = i + 1;
            }
            cout << total << scale;
        }",
        "main {
            function int square(int n) { return n * n; }
            int k = 3;
            k = square(k) + square(2);
            if k > 10 && !(k == 12) then cout << \"big\"; else cout << \"small\"; end
            cout << k;
        }",
        "main {
            int x = 5;
            { int y = x - 7; cout << -y; }
            do x = x - 2; while x > 0;
            cout << x % 3;
        }",
    ];
    for source in programs {
        let plain = run_with(source, false, &[]).expect("unoptimized run");
        let optimized = run_with(source, true, &[]).expect("optimized run");
        assert_eq!(plain, optimized, "outputs differ for {}", source);
    }
}
