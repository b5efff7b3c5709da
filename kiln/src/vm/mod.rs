//! Quadruple simulator
//!
//! Executes a quadruple list directly, the way a host would run the emitted
//! program: top-level code runs in order, function bodies are skipped until
//! called, every `Input` pulls one value from an [`InputSource`] and every
//! `Output` appends one formatted line. Arithmetic follows the optimizer's
//! folding rules so optimized and unoptimized code print the same thing.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ir::printer::format_float;
use crate::ir::{BinOp, Operand, Quadruple, UnOp};
use cinder::semantic::scope::{Symbol, SymbolType};
use cinder::semantic::types::Type;

/// Default bound on executed quadruples.
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

/// Supplies console input to the simulator.
pub trait InputSource {
    /// Next raw input value for the variable `name`, or `None` when input
    /// is exhausted.
    fn next_value(&mut self, name: &str) -> Option<String>;
}

/// Input taken from a fixed list of values, in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    values: VecDeque<String>,
}

impl ScriptedInput {
    /// Queue `values` for consumption.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Values not consumed yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_value(&mut self, _name: &str) -> Option<String> {
        self.values.pop_front()
    }
}

/// A run-time value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// String
    Str(String),
}

impl Value {
    fn zero(ty: Type) -> Self {
        match ty {
            Type::Float => Value::Float(0.0),
            Type::Bool => Value::Bool(false),
            Type::String => Value::Str(String::new()),
            Type::Int | Type::Void | Type::Unknown => Value::Int(0),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
        }
    }

    /// Widens an int into a float slot; other values pass through.
    fn coerce(self, ty: Type) -> Self {
        match (self, ty) {
            (Value::Int(value), Type::Float) => Value::Float(value as f64),
            (value, _) => value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => f.write_str(&format_float(*value)),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Str(value) => f.write_str(value),
        }
    }
}

/// Observable result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    /// One entry per executed `Output`, in order
    pub outputs: Vec<String>,
    /// Number of quadruples executed
    pub steps: usize,
}

/// Run-time failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// Input was requested but the source is exhausted
    #[error("no input left for '{0}'")]
    MissingInput(String),
    /// An input value could not be parsed for the target type
    #[error("cannot read '{value}' as {ty} for '{name}'")]
    BadInput {
        /// Target variable
        name: String,
        /// Raw value supplied
        value: String,
        /// Expected type
        ty: String,
    },
    /// Integer division or remainder by zero
    #[error("division by zero at quadruple {0}")]
    DivisionByZero(usize),
    /// Execution exceeded the step bound
    #[error("step limit of {0} exceeded")]
    StepLimit(usize),
    /// Jump to a label that does not exist
    #[error("jump to unknown label '{0}'")]
    UnknownLabel(String),
    /// Call of a function that has no body
    #[error("call to unknown function '{0}'")]
    UnknownFunction(String),
    /// Read of a temporary before it was written
    #[error("temporary t{0} read before it was written")]
    UndefinedTemp(usize),
    /// Operand types do not fit the operation
    #[error("type error at quadruple {index}: {message}")]
    TypeError {
        /// Position of the failing quadruple
        index: usize,
        /// What went wrong
        message: String,
    },
}

/// Run `quadruples` to completion.
pub fn run(
    quadruples: &[Quadruple],
    symbols: &[Symbol],
    input: &mut dyn InputSource,
    max_steps: usize,
) -> Result<Execution, VmError> {
    let execution = Machine::new(quadruples, symbols).execute(input, max_steps)?;
    debug!(
        outputs = execution.outputs.len(),
        steps = execution.steps,
        "simulation finished"
    );
    Ok(execution)
}

struct FunctionInfo<'a> {
    begin: usize,
    params: &'a [String],
    return_type: Type,
}

struct Frame<'a> {
    function: Option<&'a str>,
    locals: HashMap<&'a str, Value>,
    temps: HashMap<usize, Value>,
    return_to: usize,
    target: Option<&'a Operand>,
}

impl<'a> Frame<'a> {
    fn new(function: Option<&'a str>, return_to: usize, target: Option<&'a Operand>) -> Self {
        Self {
            function,
            locals: HashMap::new(),
            temps: HashMap::new(),
            return_to,
            target,
        }
    }
}

struct Machine<'a> {
    quadruples: &'a [Quadruple],
    symbols: &'a [Symbol],
    cells: HashMap<&'a str, &'a Symbol>,
    labels: HashMap<&'a str, usize>,
    functions: HashMap<&'a str, FunctionInfo<'a>>,
    /// `FunctionBegin` index to matching `FunctionEnd` index.
    skips: HashMap<usize, usize>,
    globals: HashMap<&'a str, Value>,
    frames: Vec<Frame<'a>>,
    params: Vec<Value>,
    outputs: Vec<String>,
}

impl<'a> Machine<'a> {
    fn new(quadruples: &'a [Quadruple], symbols: &'a [Symbol]) -> Self {
        let mut cells = HashMap::new();
        let mut globals = HashMap::new();
        let mut returns = HashMap::new();
        for symbol in symbols {
            if symbol.ty == SymbolType::Function {
                let return_type = symbol
                    .signature
                    .as_ref()
                    .map(|signature| signature.return_type)
                    .unwrap_or(Type::Void);
                returns.insert(symbol.name.as_str(), return_type);
                continue;
            }
            cells.insert(symbol.storage.as_str(), symbol);
            if symbol.function.is_none() {
                globals.insert(symbol.storage.as_str(), Value::zero(symbol.value_type()));
            }
        }

        let mut labels = HashMap::new();
        let mut functions = HashMap::new();
        let mut skips = HashMap::new();
        let mut open: Vec<(usize, &'a str, &'a [String])> = Vec::new();
        for (index, quad) in quadruples.iter().enumerate() {
            match quad {
                Quadruple::Label { name } => {
                    labels.insert(name.as_str(), index);
                }
                Quadruple::FunctionBegin { name, params } => {
                    open.push((index, name.as_str(), params.as_slice()));
                }
                Quadruple::FunctionEnd { .. } => {
                    if let Some((begin, name, params)) = open.pop() {
                        skips.insert(begin, index);
                        functions.insert(
                            name,
                            FunctionInfo {
                                begin,
                                params,
                                return_type: returns.get(name).copied().unwrap_or(Type::Void),
                            },
                        );
                    }
                }
                _ => {}
            }
        }

        Self {
            quadruples,
            symbols,
            cells,
            labels,
            functions,
            skips,
            globals,
            frames: vec![Frame::new(None, quadruples.len(), None)],
            params: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn execute(mut self, input: &mut dyn InputSource, max_steps: usize) -> Result<Execution, VmError> {
        let quadruples = self.quadruples;
        let mut pc = 0;
        let mut steps = 0;

        while pc < quadruples.len() {
            steps += 1;
            if steps > max_steps {
                warn!(max_steps, "simulation hit the step limit");
                return Err(VmError::StepLimit(max_steps));
            }

            let index = pc;
            pc += 1;
            match &quadruples[index] {
                Quadruple::Assign { target, source } => {
                    let value = self.read(source)?;
                    self.write(target, value);
                }
                Quadruple::BinaryOp {
                    target,
                    op,
                    left,
                    right,
                } => {
                    let left = self.read(left)?;
                    let right = self.read(right)?;
                    let value = binary(*op, left, right, index)?;
                    self.write(target, value);
                }
                Quadruple::UnaryOp {
                    target,
                    op,
                    operand,
                } => {
                    let value = match (op, self.read(operand)?) {
                        (UnOp::Neg, Value::Int(value)) => Value::Int(value.wrapping_neg()),
                        (UnOp::Neg, Value::Float(value)) => Value::Float(-value),
                        (UnOp::Not, Value::Bool(value)) => Value::Bool(!value),
                        (op, value) => {
                            return Err(VmError::TypeError {
                                index,
                                message: format!(
                                    "operator '{}' applied to {}",
                                    op.as_str(),
                                    value.type_name()
                                ),
                            })
                        }
                    };
                    self.write(target, value);
                }
                Quadruple::Label { .. } => {}
                Quadruple::Goto { label } => pc = self.label(label)?,
                Quadruple::IfTrueGoto { cond, label } => {
                    if self.truth(cond, index)? {
                        pc = self.label(label)?;
                    }
                }
                Quadruple::IfFalseGoto { cond, label } => {
                    if !self.truth(cond, index)? {
                        pc = self.label(label)?;
                    }
                }
                Quadruple::Input { target } => {
                    let value = self.input(target, input)?;
                    self.write(target, value);
                }
                Quadruple::Output { value } => {
                    let value = self.read(value)?;
                    self.outputs.push(value.to_string());
                }
                Quadruple::FunctionBegin { .. } => {
                    // Reached by falling through: skip the body.
                    if let Some(&end) = self.skips.get(&index) {
                        pc = end + 1;
                    }
                }
                Quadruple::FunctionEnd { .. } => {
                    if let Some(next) = self.leave(None, index)? {
                        pc = next;
                    }
                }
                Quadruple::Param { value } => {
                    let value = self.read(value)?;
                    self.params.push(value);
                }
                Quadruple::Call {
                    target,
                    function,
                    argc,
                } => pc = self.call(function, *argc, target.as_ref(), pc)?,
                Quadruple::Return { value } => {
                    let value = value.as_ref().map(|value| self.read(value)).transpose()?;
                    match self.leave(value, index)? {
                        Some(next) => pc = next,
                        None => break,
                    }
                }
            }
        }

        Ok(Execution {
            outputs: self.outputs,
            steps,
        })
    }

    fn label(&self, name: &str) -> Result<usize, VmError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| VmError::UnknownLabel(name.to_string()))
    }

    fn frame(&self) -> &Frame<'a> {
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame<'a> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn is_local(&self, storage: &str) -> bool {
        let owner = self
            .cells
            .get(storage)
            .and_then(|symbol| symbol.function.as_deref());
        owner.is_some() && owner == self.frame().function
    }

    fn read(&self, operand: &Operand) -> Result<Value, VmError> {
        Ok(match operand {
            Operand::Int(value) => Value::Int(*value),
            Operand::Float(value) => Value::Float(*value),
            Operand::Bool(value) => Value::Bool(*value),
            Operand::Str(value) => Value::Str(value.clone()),
            Operand::Temp(id) => self
                .frame()
                .temps
                .get(id)
                .cloned()
                .ok_or(VmError::UndefinedTemp(*id))?,
            Operand::Var(name) => {
                let slot = if self.is_local(name) {
                    self.frame().locals.get(name.as_str())
                } else {
                    self.globals.get(name.as_str())
                };
                match slot {
                    Some(value) => value.clone(),
                    None => Value::zero(self.cell_type(name)),
                }
            }
        })
    }

    fn cell_type(&self, storage: &str) -> Type {
        self.cells
            .get(storage)
            .map(|symbol| symbol.value_type())
            .unwrap_or(Type::Unknown)
    }

    fn write(&mut self, target: &Operand, value: Value) {
        match target {
            Operand::Temp(id) => {
                self.frame_mut().temps.insert(*id, value);
            }
            Operand::Var(name) => {
                let value = value.coerce(self.cell_type(name));
                let key = match self.cells.get_key_value(name.as_str()) {
                    Some((key, _)) => *key,
                    None => {
                        warn!(variable = %name, "write to a variable without a symbol ignored");
                        return;
                    }
                };
                if self.is_local(key) {
                    self.frame_mut().locals.insert(key, value);
                } else {
                    self.globals.insert(key, value);
                }
            }
            _ => warn!(target = %target, "write to a literal ignored"),
        }
    }

    fn truth(&self, cond: &Operand, index: usize) -> Result<bool, VmError> {
        match self.read(cond)? {
            Value::Bool(value) => Ok(value),
            Value::Int(value) => Ok(value != 0),
            other => Err(VmError::TypeError {
                index,
                message: format!("condition of type {}", other.type_name()),
            }),
        }
    }

    fn input(&self, target: &Operand, source: &mut dyn InputSource) -> Result<Value, VmError> {
        let name = target.to_string();
        let raw = source
            .next_value(&name)
            .ok_or_else(|| VmError::MissingInput(name.clone()))?;
        let trimmed = raw.trim();
        let ty = target
            .as_var()
            .map(|storage| self.cell_type(storage))
            .unwrap_or(Type::Unknown);
        let bad = || VmError::BadInput {
            name: name.clone(),
            value: raw.clone(),
            ty: ty.to_string(),
        };
        match ty {
            Type::Float => trimmed.parse().map(Value::Float).map_err(|_| bad()),
            Type::Bool => match trimmed {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(bad()),
            },
            Type::String => Ok(Value::Str(raw.clone())),
            Type::Int | Type::Void | Type::Unknown => trimmed.parse().map(Value::Int).map_err(|_| bad()),
        }
    }

    fn call(
        &mut self,
        function: &str,
        argc: usize,
        target: Option<&'a Operand>,
        return_to: usize,
    ) -> Result<usize, VmError> {
        let info = self
            .functions
            .get(function)
            .ok_or_else(|| VmError::UnknownFunction(function.to_string()))?;
        let (name, begin, params) = (
            self.quadruples_name(info.begin),
            info.begin,
            info.params,
        );

        let split = self.params.len().saturating_sub(argc);
        let args = self.params.split_off(split);

        let mut frame = Frame::new(name, return_to, target);
        for symbol in self.symbols {
            if symbol.ty != SymbolType::Function && symbol.function.as_deref() == name {
                frame
                    .locals
                    .insert(symbol.storage.as_str(), Value::zero(symbol.value_type()));
            }
        }
        for (storage, value) in params.iter().zip(args) {
            let ty = self.cell_type(storage);
            frame.locals.insert(storage.as_str(), value.coerce(ty));
        }
        self.frames.push(frame);
        Ok(begin + 1)
    }

    fn quadruples_name(&self, begin: usize) -> Option<&'a str> {
        match &self.quadruples[begin] {
            Quadruple::FunctionBegin { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Pops the current call frame. Returns the resume position, or `None`
    /// when returning from top-level code ends the program.
    fn leave(&mut self, value: Option<Value>, index: usize) -> Result<Option<usize>, VmError> {
        if self.frames.len() == 1 {
            return Ok(None);
        }
        let Some(frame) = self.frames.pop() else {
            return Ok(None);
        };
        let return_type = frame
            .function
            .and_then(|name| self.functions.get(name))
            .map(|info| info.return_type)
            .unwrap_or(Type::Void);
        if let Some(target) = frame.target {
            let value = match value {
                Some(value) => value.coerce(return_type),
                None if return_type == Type::Void => {
                    return Err(VmError::TypeError {
                        index,
                        message: "void function used as a value".to_string(),
                    })
                }
                None => Value::zero(return_type),
            };
            self.write(target, value);
        }
        Ok(Some(frame.return_to))
    }
}

fn binary(op: BinOp, left: Value, right: Value, index: usize) -> Result<Value, VmError> {
    let mismatch = |left: &Value, right: &Value| VmError::TypeError {
        index,
        message: format!(
            "operator '{}' applied to {} and {}",
            op.as_str(),
            left.type_name(),
            right.type_name()
        ),
    };

    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, *a, *b, index)
            .ok_or_else(|| mismatch(&left, &right))?,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            float_binary(op, as_float(&left), as_float(&right)).ok_or_else(|| mismatch(&left, &right))
        }
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinOp::And => Ok(Value::Bool(*a && *b)),
            BinOp::Or => Ok(Value::Bool(*a || *b)),
            BinOp::Eq => Ok(Value::Bool(a == b)),
            BinOp::Ne => Ok(Value::Bool(a != b)),
            BinOp::Lt => Ok(Value::Bool(a < b)),
            BinOp::Le => Ok(Value::Bool(a <= b)),
            BinOp::Gt => Ok(Value::Bool(a > b)),
            BinOp::Ge => Ok(Value::Bool(a >= b)),
            _ => Err(mismatch(&left, &right)),
        },
        (Value::Str(a), Value::Str(b)) => match op {
            BinOp::Add => Ok(Value::Str(format!("{}{}", a, b))),
            BinOp::Eq => Ok(Value::Bool(a == b)),
            BinOp::Ne => Ok(Value::Bool(a != b)),
            BinOp::Lt => Ok(Value::Bool(a < b)),
            BinOp::Le => Ok(Value::Bool(a <= b)),
            BinOp::Gt => Ok(Value::Bool(a > b)),
            BinOp::Ge => Ok(Value::Bool(a >= b)),
            _ => Err(mismatch(&left, &right)),
        },
        _ => Err(mismatch(&left, &right)),
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(value) => *value as f64,
        Value::Float(value) => *value,
        _ => 0.0,
    }
}

/// `None` for operators that do not apply to integers.
fn int_binary(op: BinOp, a: i64, b: i64, index: usize) -> Option<Result<Value, VmError>> {
    let value = match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div | BinOp::Mod if b == 0 => return Some(Err(VmError::DivisionByZero(index))),
        BinOp::Div => a.wrapping_div(b),
        BinOp::Mod => a.wrapping_rem(b),
        BinOp::Pow => match u32::try_from(b) {
            Ok(exponent) => a.wrapping_pow(exponent),
            Err(_) => (a as f64).powf(b as f64) as i64,
        },
        BinOp::Eq => return Some(Ok(Value::Bool(a == b))),
        BinOp::Ne => return Some(Ok(Value::Bool(a != b))),
        BinOp::Lt => return Some(Ok(Value::Bool(a < b))),
        BinOp::Le => return Some(Ok(Value::Bool(a <= b))),
        BinOp::Gt => return Some(Ok(Value::Bool(a > b))),
        BinOp::Ge => return Some(Ok(Value::Bool(a >= b))),
        BinOp::And | BinOp::Or => return None,
    };
    Some(Ok(Value::Int(value)))
}

fn float_binary(op: BinOp, a: f64, b: f64) -> Option<Value> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        BinOp::Pow => a.powf(b),
        BinOp::Eq => return Some(Value::Bool(a == b)),
        BinOp::Ne => return Some(Value::Bool(a != b)),
        BinOp::Lt => return Some(Value::Bool(a < b)),
        BinOp::Le => return Some(Value::Bool(a <= b)),
        BinOp::Gt => return Some(Value::Bool(a > b)),
        BinOp::Ge => return Some(Value::Bool(a >= b)),
        BinOp::And | BinOp::Or => return None,
    };
    Some(Value::Float(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_matches_folding() {
        assert_eq!(
            binary(BinOp::Div, Value::Int(-7), Value::Int(2), 0),
            Ok(Value::Int(-3))
        );
        assert_eq!(
            binary(BinOp::Pow, Value::Int(2), Value::Int(10), 0),
            Ok(Value::Int(1024))
        );
        assert_eq!(
            binary(BinOp::Mod, Value::Int(1), Value::Int(0), 4),
            Err(VmError::DivisionByZero(4))
        );
    }

    #[test]
    fn mixed_operands_widen() {
        assert_eq!(
            binary(BinOp::Add, Value::Int(1), Value::Float(0.5), 0),
            Ok(Value::Float(1.5))
        );
    }

    #[test]
    fn scripted_input_is_consumed_in_order() {
        let mut input = ScriptedInput::new(["1", "2"]);
        assert_eq!(input.next_value("a").as_deref(), Some("1"));
        assert_eq!(input.remaining(), 1);
    }
}
