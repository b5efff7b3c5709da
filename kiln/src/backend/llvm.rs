//! LLVM-IR style text backend
//!
//! Top-level variables become globals, variables owned by a function become
//! `alloca` cells in that function, temporaries become virtual registers
//! `%tN`. Every load of a variable gets a fresh `%vN` register. Console I/O
//! goes through `printf`/`scanf`; string concatenation and string input use
//! two small runtime helpers that the host links in.
//!
//! User globals are named `@g.<storage>` and user functions `@fn.<name>`, so
//! neither can collide with each other or with the runtime declarations.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{Backend, Emission};
use crate::ir::{BinOp, Operand, Quadruple, UnOp};
use cinder::semantic::scope::{Symbol, SymbolType};
use cinder::semantic::types::Type;

/// Default target triple written into the module header.
pub const DEFAULT_TARGET_TRIPLE: &str = "x86_64-pc-linux-gnu";

/// LLVM text generator.
#[derive(Debug, Clone)]
pub struct LlvmTextBackend {
    /// Triple written into the `target triple` line.
    pub target_triple: String,
}

impl LlvmTextBackend {
    /// Create a backend for `target_triple`.
    pub fn new(target_triple: impl Into<String>) -> Self {
        Self {
            target_triple: target_triple.into(),
        }
    }
}

impl Default for LlvmTextBackend {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_TRIPLE)
    }
}

impl Backend for LlvmTextBackend {
    fn emit(&self, quadruples: &[Quadruple], symbols: &[Symbol]) -> Emission {
        let emission = Emitter::new(symbols).run(&self.target_triple, quadruples);
        debug!(
            bytes = emission.text.len(),
            warnings = emission.warnings.len(),
            "emitted llvm text"
        );
        emission
    }

    fn name(&self) -> &'static str {
        "llvm-text"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LlType {
    I64,
    I32,
    Double,
    I1,
    Ptr,
    Void,
}

impl LlType {
    fn name(self) -> &'static str {
        match self {
            LlType::I64 => "i64",
            LlType::I32 => "i32",
            LlType::Double => "double",
            LlType::I1 => "i1",
            LlType::Ptr => "i8*",
            LlType::Void => "void",
        }
    }

    fn zero(self) -> &'static str {
        match self {
            LlType::I64 | LlType::I32 => "0",
            LlType::Double => "0.0",
            LlType::I1 => "false",
            LlType::Ptr => "null",
            LlType::Void => "",
        }
    }

    fn of(ty: Type) -> Self {
        match ty {
            Type::Int | Type::Unknown => LlType::I64,
            Type::Float => LlType::Double,
            Type::Bool => LlType::I1,
            Type::String => LlType::Ptr,
            Type::Void => LlType::Void,
        }
    }

    fn of_symbol(symbol: &Symbol) -> Self {
        match symbol.ty {
            SymbolType::Int | SymbolType::Function => LlType::I64,
            SymbolType::Float => LlType::Double,
            SymbolType::Bool => LlType::I1,
            SymbolType::String => LlType::Ptr,
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, LlType::I64 | LlType::Double)
    }
}

/// Code being collected for one `define`.
struct Frame {
    name: String,
    is_main: bool,
    return_type: LlType,
    params: Vec<String>,
    body: Vec<String>,
    next_reg: usize,
    next_cont: usize,
    temp_types: HashMap<usize, LlType>,
    terminated: bool,
    pending_params: Vec<(LlType, String)>,
}

impl Frame {
    fn new(name: &str, return_type: LlType, params: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            is_main: false,
            return_type,
            params,
            body: Vec::new(),
            next_reg: 0,
            next_cont: 0,
            temp_types: HashMap::new(),
            terminated: false,
            pending_params: Vec::new(),
        }
    }
}

struct Emitter<'a> {
    symbols: &'a [Symbol],
    cells: HashMap<&'a str, &'a Symbol>,
    functions: HashMap<&'a str, &'a Symbol>,
    strings: Vec<(String, usize)>,
    string_index: HashMap<String, usize>,
    warnings: Vec<String>,
    defined: Vec<String>,
    frame: Frame,
    suspended: Option<Frame>,
}

impl<'a> Emitter<'a> {
    fn new(symbols: &'a [Symbol]) -> Self {
        let mut cells = HashMap::new();
        let mut functions = HashMap::new();
        for symbol in symbols {
            if symbol.ty == SymbolType::Function {
                functions.insert(symbol.name.as_str(), symbol);
            } else {
                cells.insert(symbol.storage.as_str(), symbol);
            }
        }
        Self {
            symbols,
            cells,
            functions,
            strings: Vec::new(),
            string_index: HashMap::new(),
            warnings: Vec::new(),
            defined: Vec::new(),
            frame: Frame {
                is_main: true,
                ..Frame::new("main", LlType::I32, Vec::new())
            },
            suspended: None,
        }
    }

    fn run(mut self, triple: &str, quadruples: &[Quadruple]) -> Emission {
        for quad in quadruples {
            self.quadruple(quad);
        }
        if let Some(main) = self.suspended.take() {
            self.warn(format!("function '{}' has no end marker", self.frame.name));
            self.finish_frame(main);
        }
        let main = std::mem::replace(&mut self.frame, Frame::new("", LlType::Void, Vec::new()));
        let main_text = self.render_frame(main);

        let mut out = Vec::new();
        out.push("; ModuleID = 'cinder'".to_string());
        out.push("source_filename = \"cinder\"".to_string());
        out.push(format!("target triple = \"{}\"", triple));
        out.push(String::new());
        out.push("declare i32 @printf(i8*, ...)".to_string());
        out.push("declare i32 @scanf(i8*, ...)".to_string());
        out.push("declare i8* @kiln_concat(i8*, i8*)".to_string());
        out.push("declare i8* @kiln_read_string()".to_string());
        out.push("declare i32 @strcmp(i8*, i8*)".to_string());
        out.push("declare double @llvm.pow.f64(double, double)".to_string());

        let globals: Vec<String> = self
            .symbols
            .iter()
            .filter(|symbol| symbol.ty != SymbolType::Function && symbol.function.is_none())
            .map(|symbol| {
                let ty = LlType::of_symbol(symbol);
                format!("{} = global {} {}", global_symbol(&symbol.storage), ty.name(), ty.zero())
            })
            .collect();
        if !globals.is_empty() {
            out.push(String::new());
            out.extend(globals);
        }

        for function in &self.defined {
            out.push(String::new());
            out.push(function.clone());
        }
        out.push(String::new());
        out.push(main_text);

        if !self.strings.is_empty() {
            out.push(String::new());
            for (index, (bytes, len)) in self.strings.iter().enumerate() {
                out.push(format!(
                    "@.str.{} = private unnamed_addr constant [{} x i8] c\"{}\"",
                    index, len, bytes
                ));
            }
        }

        let mut text = out.join("\n");
        text.push('\n');
        Emission {
            text,
            warnings: self.warnings,
        }
    }

    fn quadruple(&mut self, quad: &Quadruple) {
        match quad {
            Quadruple::Label { name } => {
                if !self.frame.terminated {
                    self.push(format!("br label %{}", name));
                }
                self.frame.body.push(format!("{}:", name));
                self.frame.terminated = false;
                return;
            }
            Quadruple::FunctionBegin { name, params } => {
                self.begin_function(name, params);
                return;
            }
            Quadruple::FunctionEnd { name } => {
                self.end_function(name);
                return;
            }
            _ => {}
        }

        if self.frame.terminated {
            let label = self.cont_label();
            self.frame.body.push(format!("{}:", label));
            self.frame.terminated = false;
        }

        match quad {
            Quadruple::Assign { target, source } => {
                let (ty, value) = self.value(source);
                self.store(target, ty, value);
            }
            Quadruple::BinaryOp {
                target,
                op,
                left,
                right,
            } => {
                let lhs = self.value(left);
                let rhs = self.value(right);
                match self.binary(*op, lhs, rhs) {
                    Ok((ty, instruction)) => self.define(target, ty, instruction),
                    Err(problem) => {
                        self.warn(format!("{} in `{}`; storing 0", problem, quad));
                        let ty = if op.is_comparison() || matches!(op, BinOp::And | BinOp::Or) {
                            LlType::I1
                        } else {
                            LlType::I64
                        };
                        self.define(target, ty, zero_instruction(ty));
                    }
                }
            }
            Quadruple::UnaryOp {
                target,
                op,
                operand,
            } => {
                let (ty, value) = self.value(operand);
                let instruction = match (op, ty) {
                    (UnOp::Neg, LlType::I64) => Some(format!("sub i64 0, {}", value)),
                    (UnOp::Neg, LlType::Double) => Some(format!("fneg double {}", value)),
                    (UnOp::Not, LlType::I1) => Some(format!("xor i1 {}, true", value)),
                    _ => None,
                };
                match instruction {
                    Some(instruction) => self.define(target, ty, instruction),
                    None => {
                        self.warn(format!(
                            "operator '{}' is invalid for {} in `{}`; storing 0",
                            op.as_str(),
                            ty.name(),
                            quad
                        ));
                        let ty = if *op == UnOp::Not { LlType::I1 } else { LlType::I64 };
                        self.define(target, ty, zero_instruction(ty));
                    }
                }
            }
            Quadruple::Goto { label } => {
                self.push(format!("br label %{}", label));
                self.frame.terminated = true;
            }
            Quadruple::IfTrueGoto { cond, label } | Quadruple::IfFalseGoto { cond, label } => {
                let cond = self.condition(cond);
                let cont = self.cont_label();
                let (taken, fallthrough) = if matches!(quad, Quadruple::IfTrueGoto { .. }) {
                    (label.as_str(), cont.as_str())
                } else {
                    (cont.as_str(), label.as_str())
                };
                self.push(format!(
                    "br i1 {}, label %{}, label %{}",
                    cond, taken, fallthrough
                ));
                self.frame.body.push(format!("{}:", cont));
            }
            Quadruple::Input { target } => self.input(target),
            Quadruple::Output { value } => self.output(value),
            Quadruple::Param { value } => {
                let value = self.value(value);
                self.frame.pending_params.push(value);
            }
            Quadruple::Call {
                target,
                function,
                argc,
            } => self.call(target.as_ref(), function, *argc),
            Quadruple::Return { value } => self.ret(value.as_ref()),
            Quadruple::Label { .. } | Quadruple::FunctionBegin { .. } | Quadruple::FunctionEnd { .. } => {}
        }
    }

    fn begin_function(&mut self, name: &str, params: &[String]) {
        let return_type = self
            .functions
            .get(name)
            .and_then(|symbol| symbol.signature.as_ref())
            .map(|signature| LlType::of(signature.return_type))
            .unwrap_or(LlType::Void);
        let frame = Frame::new(name, return_type, params.to_vec());
        let outer = std::mem::replace(&mut self.frame, frame);
        if self.suspended.is_some() {
            self.warn(format!("nested function '{}' emitted separately", name));
            self.finish_frame(outer);
        } else {
            self.suspended = Some(outer);
        }
    }

    fn end_function(&mut self, name: &str) {
        let Some(outer) = self.suspended.take() else {
            self.warn(format!("end of function '{}' without a start; ignored", name));
            return;
        };
        self.finish_frame(outer);
    }

    /// Close the current function and resume `outer`.
    fn finish_frame(&mut self, outer: Frame) {
        let finished = std::mem::replace(&mut self.frame, outer);
        let text = self.render_frame(finished);
        self.defined.push(text);
    }

    fn render_frame(&mut self, mut frame: Frame) -> String {
        if !frame.terminated {
            let ret = match frame.return_type {
                LlType::Void => "ret void".to_string(),
                ty => format!("ret {} {}", ty.name(), ty.zero()),
            };
            frame.body.push(format!("  {}", ret));
        }

        let params: Vec<String> = frame
            .params
            .iter()
            .map(|storage| {
                let ty = self.cell_type(storage);
                format!("{} %{}.arg", ty.name(), storage)
            })
            .collect();

        let symbol = if frame.is_main {
            "@main".to_string()
        } else {
            function_symbol(&frame.name)
        };
        let mut lines = vec![format!(
            "define {} {}({}) {{",
            frame.return_type.name(),
            symbol,
            params.join(", ")
        )];
        lines.push("entry:".to_string());
        if !frame.is_main {
            for symbol in self.symbols.iter().filter(|symbol| {
                symbol.ty != SymbolType::Function
                    && symbol.function.as_deref() == Some(frame.name.as_str())
            }) {
                let ty = LlType::of_symbol(symbol);
                lines.push(format!("  %{}.addr = alloca {}", symbol.storage, ty.name()));
            }
            for storage in &frame.params {
                let ty = self.cell_type(storage);
                lines.push(format!(
                    "  store {} %{}.arg, {}* %{}.addr",
                    ty.name(),
                    storage,
                    ty.name(),
                    storage
                ));
            }
        }
        lines.extend(frame.body);
        lines.push("}".to_string());
        lines.join("\n")
    }

    fn push(&mut self, instruction: String) {
        self.frame.body.push(format!("  {}", instruction));
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(format!("warning: {}", message));
    }

    fn reg(&mut self) -> String {
        let reg = format!("%v{}", self.frame.next_reg);
        self.frame.next_reg += 1;
        reg
    }

    fn cont_label(&mut self) -> String {
        let label = format!("cont.{}", self.frame.next_cont);
        self.frame.next_cont += 1;
        label
    }

    fn cell_type(&self, storage: &str) -> LlType {
        self.cells
            .get(storage)
            .map(|symbol| LlType::of_symbol(symbol))
            .unwrap_or(LlType::I64)
    }

    /// Type and address of a variable's storage cell.
    fn cell(&self, storage: &str) -> Option<(LlType, String)> {
        let symbol = self.cells.get(storage)?;
        let pointer = match &symbol.function {
            None => global_symbol(&symbol.storage),
            Some(_) => format!("%{}.addr", symbol.storage),
        };
        Some((LlType::of_symbol(symbol), pointer))
    }

    fn intern(&mut self, content: &str) -> (usize, usize) {
        if let Some(&index) = self.string_index.get(content) {
            return (index, self.strings[index].1);
        }
        let mut escaped = String::new();
        for byte in content.bytes() {
            if (0x20..0x7f).contains(&byte) && byte != b'"' && byte != b'\\' {
                escaped.push(byte as char);
            } else {
                escaped.push_str(&format!("\\{:02X}", byte));
            }
        }
        escaped.push_str("\\00");
        let len = content.len() + 1;
        let index = self.strings.len();
        self.strings.push((escaped, len));
        self.string_index.insert(content.to_string(), index);
        (index, len)
    }

    fn string_pointer(&mut self, content: &str) -> String {
        let (index, len) = self.intern(content);
        let reg = self.reg();
        self.push(format!(
            "{} = getelementptr inbounds [{} x i8], [{} x i8]* @.str.{}, i64 0, i64 0",
            reg, len, len, index
        ));
        reg
    }

    fn value(&mut self, operand: &Operand) -> (LlType, String) {
        match operand {
            Operand::Int(value) => (LlType::I64, value.to_string()),
            Operand::Float(value) => (LlType::Double, float_literal(*value)),
            Operand::Bool(value) => (LlType::I1, value.to_string()),
            Operand::Str(value) => (LlType::Ptr, self.string_pointer(value)),
            Operand::Var(name) => match self.cell(name) {
                Some((ty, pointer)) => {
                    let reg = self.reg();
                    self.push(format!(
                        "{} = load {}, {}* {}",
                        reg,
                        ty.name(),
                        ty.name(),
                        pointer
                    ));
                    (ty, reg)
                }
                None => {
                    self.warn(format!("unknown operand '{}'; using 0", name));
                    (LlType::I64, "0".to_string())
                }
            },
            Operand::Temp(id) => match self.frame.temp_types.get(id) {
                Some(ty) => (*ty, format!("%t{}", id)),
                None => {
                    self.warn(format!("temporary 't{}' used before it is defined; using 0", id));
                    (LlType::I64, "0".to_string())
                }
            },
        }
    }

    /// Converts `value` to `to`, widening `i64` to `double` when needed.
    fn convert(&mut self, from: LlType, value: String, to: LlType) -> Option<String> {
        if from == to {
            return Some(value);
        }
        if from == LlType::I64 && to == LlType::Double {
            let reg = self.reg();
            self.push(format!("{} = sitofp i64 {} to double", reg, value));
            return Some(reg);
        }
        None
    }

    fn store(&mut self, target: &Operand, ty: LlType, value: String) {
        match target {
            Operand::Temp(_) => {
                let copy = format!("select i1 true, {} {}, {} {}", ty.name(), value, ty.name(), value);
                self.define(target, ty, copy);
            }
            Operand::Var(name) => {
                let Some((cell_ty, pointer)) = self.cell(name) else {
                    self.warn(format!("assignment to unknown variable '{}' dropped", name));
                    return;
                };
                let value = match self.convert(ty, value, cell_ty) {
                    Some(value) => value,
                    None => {
                        self.warn(format!(
                            "cannot store {} into '{}' of type {}; storing 0",
                            ty.name(),
                            name,
                            cell_ty.name()
                        ));
                        cell_ty.zero().to_string()
                    }
                };
                self.push(format!(
                    "store {} {}, {}* {}",
                    cell_ty.name(),
                    value,
                    cell_ty.name(),
                    pointer
                ));
            }
            literal => {
                self.warn(format!("cannot assign to literal {}", literal));
            }
        }
    }

    /// Binds the result of `instruction` (of type `ty`) to `target`.
    fn define(&mut self, target: &Operand, ty: LlType, instruction: String) {
        if let Operand::Temp(id) = target {
            self.push(format!("%t{} = {}", id, instruction));
            self.frame.temp_types.insert(*id, ty);
            return;
        }
        let reg = self.reg();
        self.push(format!("{} = {}", reg, instruction));
        self.store(target, ty, reg);
    }

    fn binary(
        &mut self,
        op: BinOp,
        (lt, lv): (LlType, String),
        (rt, rv): (LlType, String),
    ) -> Result<(LlType, String), String> {
        let invalid = || format!("operator '{}' is invalid for {} and {}", op.as_str(), lt.name(), rt.name());

        match op {
            BinOp::And | BinOp::Or => {
                if lt != LlType::I1 || rt != LlType::I1 {
                    return Err(invalid());
                }
                let name = if op == BinOp::And { "and" } else { "or" };
                Ok((LlType::I1, format!("{} i1 {}, {}", name, lv, rv)))
            }
            BinOp::Add if lt == LlType::Ptr && rt == LlType::Ptr => Ok((
                LlType::Ptr,
                format!("call i8* @kiln_concat(i8* {}, i8* {})", lv, rv),
            )),
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                if !lt.is_numeric() || !rt.is_numeric() {
                    return Err(invalid());
                }
                if lt == LlType::I64 && rt == LlType::I64 {
                    let name = match op {
                        BinOp::Add => "add",
                        BinOp::Sub => "sub",
                        BinOp::Mul => "mul",
                        BinOp::Div => "sdiv",
                        _ => "srem",
                    };
                    return Ok((LlType::I64, format!("{} i64 {}, {}", name, lv, rv)));
                }
                let (a, b) = self.widen(lt, lv, rt, rv);
                let name = match op {
                    BinOp::Add => "fadd",
                    BinOp::Sub => "fsub",
                    BinOp::Mul => "fmul",
                    BinOp::Div => "fdiv",
                    _ => "frem",
                };
                Ok((LlType::Double, format!("{} double {}, {}", name, a, b)))
            }
            BinOp::Pow => {
                if !lt.is_numeric() || !rt.is_numeric() {
                    return Err(invalid());
                }
                let integral = lt == LlType::I64 && rt == LlType::I64;
                let a = self.convert(lt, lv, LlType::Double).unwrap_or_default();
                let b = self.convert(rt, rv, LlType::Double).unwrap_or_default();
                let call = format!("call double @llvm.pow.f64(double {}, double {})", a, b);
                if !integral {
                    return Ok((LlType::Double, call));
                }
                let reg = self.reg();
                self.push(format!("{} = {}", reg, call));
                Ok((LlType::I64, format!("fptosi double {} to i64", reg)))
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if lt.is_numeric() && rt.is_numeric() {
                    if lt == LlType::I64 && rt == LlType::I64 {
                        return Ok((LlType::I1, format!("icmp {} i64 {}, {}", int_predicate(op, true), lv, rv)));
                    }
                    let (a, b) = self.widen(lt, lv, rt, rv);
                    return Ok((LlType::I1, format!("fcmp {} double {}, {}", float_predicate(op), a, b)));
                }
                if lt == LlType::I1 && rt == LlType::I1 {
                    return Ok((LlType::I1, format!("icmp {} i1 {}, {}", int_predicate(op, false), lv, rv)));
                }
                if lt == LlType::Ptr && rt == LlType::Ptr {
                    let reg = self.reg();
                    self.push(format!("{} = call i32 @strcmp(i8* {}, i8* {})", reg, lv, rv));
                    return Ok((LlType::I1, format!("icmp {} i32 {}, 0", int_predicate(op, true), reg)));
                }
                Err(invalid())
            }
        }
    }

    fn widen(&mut self, lt: LlType, lv: String, rt: LlType, rv: String) -> (String, String) {
        let a = self.convert(lt, lv, LlType::Double).unwrap_or_default();
        let b = self.convert(rt, rv, LlType::Double).unwrap_or_default();
        (a, b)
    }

    fn condition(&mut self, cond: &Operand) -> String {
        let (ty, value) = self.value(cond);
        match ty {
            LlType::I1 => value,
            LlType::I64 => {
                let reg = self.reg();
                self.push(format!("{} = icmp ne i64 {}, 0", reg, value));
                reg
            }
            other => {
                self.warn(format!("condition of type {} treated as false", other.name()));
                "false".to_string()
            }
        }
    }

    fn input(&mut self, target: &Operand) {
        let Some(name) = target.as_var() else {
            self.warn(format!("input into non-variable {} ignored", target));
            return;
        };
        let Some((ty, pointer)) = self.cell(name) else {
            self.warn(format!("input into unknown variable '{}' ignored", name));
            return;
        };
        match ty {
            LlType::I64 | LlType::Double => {
                let format = if ty == LlType::I64 { "%lld" } else { "%lf" };
                let fmt = self.string_pointer(format);
                let reg = self.reg();
                self.push(format!(
                    "{} = call i32 (i8*, ...) @scanf(i8* {}, {}* {})",
                    reg,
                    fmt,
                    ty.name(),
                    pointer
                ));
            }
            LlType::Ptr => {
                let reg = self.reg();
                self.push(format!("{} = call i8* @kiln_read_string()", reg));
                self.push(format!("store i8* {}, i8** {}", reg, pointer));
            }
            other => {
                self.warn(format!(
                    "input of type {} into '{}' is not supported; storing 0",
                    other.name(),
                    name
                ));
                self.push(format!(
                    "store {} {}, {}* {}",
                    other.name(),
                    other.zero(),
                    other.name(),
                    pointer
                ));
            }
        }
    }

    fn output(&mut self, value: &Operand) {
        let (ty, value) = self.value(value);
        let (format, ty, value) = match ty {
            LlType::I64 => ("%lld\n", ty, value),
            LlType::Double => ("%f\n", ty, value),
            LlType::Ptr => ("%s\n", ty, value),
            LlType::I1 => {
                let yes = self.string_pointer("true");
                let no = self.string_pointer("false");
                let reg = self.reg();
                self.push(format!("{} = select i1 {}, i8* {}, i8* {}", reg, value, yes, no));
                ("%s\n", LlType::Ptr, reg)
            }
            other => {
                self.warn(format!("output of type {} is not supported; printing 0", other.name()));
                ("%lld\n", LlType::I64, "0".to_string())
            }
        };
        let fmt = self.string_pointer(format);
        let reg = self.reg();
        self.push(format!(
            "{} = call i32 (i8*, ...) @printf(i8* {}, {} {})",
            reg,
            fmt,
            ty.name(),
            value
        ));
    }

    fn call(&mut self, target: Option<&Operand>, function: &str, argc: usize) {
        let split = self.frame.pending_params.len().saturating_sub(argc);
        let args = self.frame.pending_params.split_off(split);
        if args.len() != argc {
            self.warn(format!(
                "call to '{}' expects {} queued argument(s), found {}",
                function,
                argc,
                args.len()
            ));
        }

        let signature = self
            .functions
            .get(function)
            .and_then(|symbol| symbol.signature.clone());
        let Some(signature) = signature else {
            self.warn(format!("call to unknown function '{}'; using 0", function));
            if let Some(target) = target {
                self.define(target, LlType::I64, zero_instruction(LlType::I64));
            }
            return;
        };

        let mut rendered = Vec::with_capacity(args.len());
        for (index, (ty, value)) in args.into_iter().enumerate() {
            let param_ty = signature
                .params
                .get(index)
                .map(|param| LlType::of(*param))
                .unwrap_or(ty);
            let value = match self.convert(ty, value, param_ty) {
                Some(value) => value,
                None => {
                    self.warn(format!(
                        "argument {} of '{}' has type {}, expected {}; passing 0",
                        index + 1,
                        function,
                        ty.name(),
                        param_ty.name()
                    ));
                    param_ty.zero().to_string()
                }
            };
            rendered.push(format!("{} {}", param_ty.name(), value));
        }

        let return_type = LlType::of(signature.return_type);
        let call = format!(
            "call {} {}({})",
            return_type.name(),
            function_symbol(function),
            rendered.join(", ")
        );
        match (target, return_type) {
            (None, _) => self.push(call),
            (Some(target), LlType::Void) => {
                self.push(call);
                self.warn(format!("void function '{}' used as a value; using 0", function));
                self.define(target, LlType::I64, zero_instruction(LlType::I64));
            }
            (Some(target), ty) => self.define(target, ty, call),
        }
    }

    fn ret(&mut self, value: Option<&Operand>) {
        let expected = self.frame.return_type;
        let instruction = match (value, expected) {
            (None, LlType::Void) => "ret void".to_string(),
            (None, ty) => {
                self.warn(format!("missing return value in '{}'; returning 0", self.frame.name));
                format!("ret {} {}", ty.name(), ty.zero())
            }
            (Some(value), LlType::Void) => {
                self.warn(format!(
                    "value returned from void function '{}' dropped",
                    self.frame.name
                ));
                let _ = self.value(value);
                "ret void".to_string()
            }
            (Some(value), ty) => {
                let (from, rendered) = self.value(value);
                match self.convert(from, rendered, ty) {
                    Some(rendered) => format!("ret {} {}", ty.name(), rendered),
                    None => {
                        self.warn(format!(
                            "return of {} from '{}' expecting {}; returning 0",
                            from.name(),
                            self.frame.name,
                            ty.name()
                        ));
                        format!("ret {} {}", ty.name(), ty.zero())
                    }
                }
            }
        };
        self.push(instruction);
        self.frame.terminated = true;
    }
}

fn zero_instruction(ty: LlType) -> String {
    format!("select i1 true, {} {}, {} {}", ty.name(), ty.zero(), ty.name(), ty.zero())
}

fn int_predicate(op: BinOp, signed: bool) -> &'static str {
    match (op, signed) {
        (BinOp::Eq, _) => "eq",
        (BinOp::Ne, _) => "ne",
        (BinOp::Lt, true) => "slt",
        (BinOp::Le, true) => "sle",
        (BinOp::Gt, true) => "sgt",
        (BinOp::Ge, true) => "sge",
        (BinOp::Lt, false) => "ult",
        (BinOp::Le, false) => "ule",
        (BinOp::Gt, false) => "ugt",
        _ => "uge",
    }
}

fn float_predicate(op: BinOp) -> &'static str {
    match op {
        BinOp::Eq => "oeq",
        BinOp::Ne => "one",
        BinOp::Lt => "olt",
        BinOp::Le => "ole",
        BinOp::Gt => "ogt",
        _ => "oge",
    }
}

fn global_symbol(storage: &str) -> String {
    format!("@g.{}", storage)
}

fn function_symbol(name: &str) -> String {
    format!("@fn.{}", name)
}

/// Doubles are written as their exact bit pattern.
fn float_literal(value: f64) -> String {
    format!("0x{:016X}", value.to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_escaped_and_nul_terminated() {
        let mut emitter = Emitter::new(&[]);
        let (index, len) = emitter.intern("a\"b\n");
        assert_eq!(index, 0);
        assert_eq!(len, 5);
        assert_eq!(emitter.strings[0].0, "a\\22b\\0A\\00");
        assert_eq!(emitter.intern("a\"b\n"), (0, 5));
    }

    #[test]
    fn user_symbols_live_in_their_own_namespace() {
        assert_eq!(global_symbol("x.1"), "@g.x.1");
        assert_eq!(function_symbol("printf"), "@fn.printf");
    }

    #[test]
    fn float_literals_use_exact_bits() {
        assert_eq!(float_literal(1.0), "0x3FF0000000000000");
    }
}
