use kiln::backend::{Backend, LlvmTextBackend};
use kiln::ir::Quadruple;
use kiln::ir::Operand;
use kiln::{CompileOptions, Compiler};

fn emit(source: &str) -> kiln::backend::Emission {
    let compiler = Compiler::with_options(CompileOptions {
        optimize: false,
        ..CompileOptions::default()
    });
    compiler
        .compile_source(source)
        .expect("compile should succeed")
        .emission
}

#[test]
fn globals_and_main_are_emitted() {
    let emission = emit("main { int a = 2; cout << a * 3; }");
    let text = &emission.text;
    assert!(emission.warnings.is_empty(), "{:?}", emission.warnings);
    assert!(text.starts_with("; ModuleID = 'cinder'"));
    assert!(text.contains("declare i32 @printf(i8*, ...)"));
    assert!(text.contains("@g.a = global i64 0"));
    assert!(text.contains("define i32 @main() {"));
    assert!(text.contains("store i64 2, i64* @g.a"));
    assert!(text.contains("%t0 = mul i64 %v0, 3"));
    assert!(text.contains("c\"%lld\\0A\\00\""));
    assert!(text.contains("ret i32 0"));
}

#[test]
fn emission_is_deterministic() {
    let source = "main {
        int a = 1; float b = 2.5; string s = \"x\";
        function int f(int n) { return n + a; }
        while a < 10 { a = f(a); }
        cout << a << b << s;
    }";
    assert_eq!(emit(source), emit(source));
}

#[test]
fn ints_widen_when_stored_into_floats() {
    let text = emit("main { float f = 1; f = f + 2; }").text;
    assert!(text.contains("sitofp i64 1 to double"), "{}", text);
    assert!(text.contains("fadd double"), "{}", text);
}

#[test]
fn float_literals_are_written_as_bit_patterns() {
    let text = emit("main { float f = 1.0; }").text;
    assert!(text.contains("store double 0x3FF0000000000000, double* @g.f"), "{}", text);
}

#[test]
fn string_literals_become_private_constants() {
    let text = emit("main { cout << \"hi\"; }").text;
    assert!(text.contains("c\"hi\\00\""), "{}", text);
    assert!(text.contains("c\"%s\\0A\\00\""), "{}", text);
}

#[test]
fn booleans_print_as_words() {
    let text = emit("main { bool b = 1 < 2; cout << b; }").text;
    assert!(text.contains("icmp slt i64 1, 2"), "{}", text);
    assert!(text.contains("c\"true\\00\""), "{}", text);
    assert!(text.contains("select i1"), "{}", text);
}

#[test]
fn conditional_jumps_split_blocks() {
    let text = emit("main { int x = 1; if x > 0 then x = 2; end }").text;
    assert!(text.contains("br i1 %t0, label %cont.0, label %L0"), "{}", text);
    assert!(text.contains("cont.0:"), "{}", text);
    assert!(text.contains("br label %L0"), "{}", text);
}

#[test]
fn functions_get_their_own_definition() {
    let text = emit(
        "main {
            function int add(int a, int b) { return a + b; }
            function void hello() { cout << \"hi\"; }
            hello();
            int r = add(1, 2);
        }",
    )
    .text;
    assert!(text.contains("define i64 @fn.add(i64 %a.arg, i64 %b.arg) {"), "{}", text);
    assert!(text.contains("%a.addr = alloca i64"), "{}", text);
    assert!(text.contains("store i64 %a.arg, i64* %a.addr"), "{}", text);
    assert!(text.contains("define void @fn.hello() {"), "{}", text);
    assert!(text.contains("ret void"), "{}", text);
    assert!(text.contains("call void @fn.hello()"), "{}", text);
    assert!(text.contains("call i64 @fn.add(i64 1, i64 2)"), "{}", text);
    let add = text.find("define i64 @fn.add").expect("add defined");
    let main = text.find("define i32 @main").expect("main defined");
    assert!(add < main);
}

#[test]
fn string_operations_use_runtime_helpers() {
    let text = emit(
        "main {
            string a = \"x\";
            string b = a + \"y\";
            bool same = a == b;
            cin >> a;
        }",
    )
    .text;
    assert!(text.contains("call i8* @kiln_concat("), "{}", text);
    assert!(text.contains("call i32 @strcmp("), "{}", text);
    assert!(text.contains("call i8* @kiln_read_string()"), "{}", text);
}

#[test]
fn unknown_operands_become_zero_with_a_warning() {
    let quads = vec![Quadruple::Output {
        value: Operand::Var("ghost".to_string()),
    }];
    let emission = LlvmTextBackend::default().emit(&quads, &[]);
    assert_eq!(emission.warnings.len(), 1);
    assert!(emission.warnings[0].starts_with("warning: unknown operand 'ghost'"));
    assert!(emission.text.contains("i64 0)"), "{}", emission.text);
}

#[test]
fn bool_input_is_reported_as_unsupported() {
    let emission = emit("main { bool b; cin >> b; }");
    assert_eq!(emission.warnings.len(), 1);
    assert!(emission.text.contains("store i1 false, i1* @g.b"));
}

#[test]
fn target_triple_is_configurable() {
    let backend = LlvmTextBackend::new("aarch64-apple-darwin");
    assert_eq!(backend.name(), "llvm-text");
    let emission = backend.emit(&[], &[]);
    assert!(emission
        .text
        .contains("target triple = \"aarch64-apple-darwin\""));
}

#[test]
fn user_functions_cannot_shadow_runtime_declarations() {
    let emission = emit(
        "main {
            function int printf(int a) { return a + 1; }
            cout << printf(1);
        }",
    );
    let text = &emission.text;
    assert!(emission.warnings.is_empty(), "{:?}", emission.warnings);
    assert!(text.contains("declare i32 @printf(i8*, ...)"), "{}", text);
    assert!(text.contains("define i64 @fn.printf(i64 %a.arg) {"), "{}", text);
    assert!(text.contains("call i64 @fn.printf(i64 1)"), "{}", text);
    assert!(!text.contains("define i64 @printf"), "{}", text);
}

#[test]
fn variables_and_functions_with_one_name_get_distinct_symbols() {
    let text = emit(
        "main {
            if true { int f = 1; cout << f; }
            function int f() { return 2; }
            cout << f();
        }",
    )
    .text;
    assert!(text.contains("@g.f = global i64 0"), "{}", text);
    assert!(text.contains("define i64 @fn.f() {"), "{}", text);
    assert!(text.contains("call i64 @fn.f()"), "{}", text);
}

#[test]
fn strings_order_through_strcmp() {
    let text = emit("main { string a = \"a\"; bool b = a < \"b\"; }").text;
    assert!(text.contains("call i32 @strcmp("), "{}", text);
    assert!(text.contains("icmp slt i32"), "{}", text);
}
