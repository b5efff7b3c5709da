use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kiln::vm::{self, ScriptedInput};
use kiln::Compiler;

const PROGRAM: &str = r#"
main {
    function int square(int n) {
        return n * n;
    }

    int total = 0, i = 0;
    float scale = 2 ^ 3 * 1.5;
    while i < 100 {
        if i % 2 == 0 then
            total = total + square(i);
        else
            total = total - 1;
        end
        i = i + 1;
    }
    cout << total << scale;
}
"#;

fn compile_benchmark(c: &mut Criterion) {
    let compiler = Compiler::new();
    c.bench_function("compile_source", |b| {
        b.iter(|| compiler.compile_source(black_box(PROGRAM)))
    });
}

fn simulate_benchmark(c: &mut Criterion) {
    let compiler = Compiler::new();
    let Ok(compilation) = compiler.compile_source(PROGRAM) else {
        return;
    };
    c.bench_function("simulate", |b| {
        b.iter(|| {
            let mut input = ScriptedInput::default();
            vm::run(
                compilation.final_quadruples(),
                &compilation.symbols,
                &mut input,
                vm::DEFAULT_MAX_STEPS,
            )
        })
    });
}

criterion_group!(benches, compile_benchmark, simulate_benchmark);
criterion_main!(benches);
