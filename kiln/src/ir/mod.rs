//! Quadruple intermediate representation
//!
//! A program lowers to one flat, ordered list of [`Quadruple`]s. Control
//! flow is expressed with labels and jumps; function bodies are bracketed
//! by `FunctionBegin`/`FunctionEnd` markers inside the same list.

pub mod printer;

use serde::Serialize;

use cinder::parser::ast::{BinaryOp as AstBinaryOp, UnaryOp as AstUnaryOp};

/// A value read or written by a quadruple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// Boolean literal
    Bool(bool),
    /// String literal, rendered quoted
    Str(String),
    /// Source variable, by storage name
    Var(String),
    /// Compiler temporary `tN`
    Temp(usize),
}

impl Operand {
    /// Literal operands never change at run time.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Operand::Int(_) | Operand::Float(_) | Operand::Bool(_) | Operand::Str(_)
        )
    }

    /// Numeric literals are the only operands folding works on.
    pub fn is_numeric_constant(&self) -> bool {
        matches!(self, Operand::Int(_) | Operand::Float(_))
    }

    /// Storage name when this operand is a source variable.
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Operand::Var(name) => Some(name),
            _ => None,
        }
    }
}

/// Binary operators of the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Source spelling of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// Whether the operator yields a boolean.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

impl From<AstBinaryOp> for BinOp {
    fn from(op: AstBinaryOp) -> Self {
        match op {
            AstBinaryOp::Add => BinOp::Add,
            AstBinaryOp::Subtract => BinOp::Sub,
            AstBinaryOp::Multiply => BinOp::Mul,
            AstBinaryOp::Divide => BinOp::Div,
            AstBinaryOp::Modulo => BinOp::Mod,
            AstBinaryOp::Power => BinOp::Pow,
            AstBinaryOp::Equal => BinOp::Eq,
            AstBinaryOp::NotEqual => BinOp::Ne,
            AstBinaryOp::Less => BinOp::Lt,
            AstBinaryOp::LessEqual => BinOp::Le,
            AstBinaryOp::Greater => BinOp::Gt,
            AstBinaryOp::GreaterEqual => BinOp::Ge,
            AstBinaryOp::And => BinOp::And,
            AstBinaryOp::Or => BinOp::Or,
        }
    }
}

/// Unary operators of the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnOp {
    /// Arithmetic negation
    Neg,
    /// Logical not
    Not,
}

impl UnOp {
    /// Source spelling of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }
}

impl From<AstUnaryOp> for UnOp {
    fn from(op: AstUnaryOp) -> Self {
        match op {
            AstUnaryOp::Negate => UnOp::Neg,
            AstUnaryOp::Not => UnOp::Not,
        }
    }
}

/// One IR instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Quadruple {
    /// `target = source`
    Assign {
        /// Destination
        target: Operand,
        /// Value copied
        source: Operand,
    },
    /// `target = left op right`
    BinaryOp {
        /// Destination
        target: Operand,
        /// Operator
        op: BinOp,
        /// Left operand
        left: Operand,
        /// Right operand
        right: Operand,
    },
    /// `target = op operand`
    UnaryOp {
        /// Destination
        target: Operand,
        /// Operator
        op: UnOp,
        /// Operand
        operand: Operand,
    },
    /// Jump target
    Label {
        /// Label name, `LN`
        name: String,
    },
    /// Unconditional jump
    Goto {
        /// Destination label
        label: String,
    },
    /// Jump when `cond` is true
    IfTrueGoto {
        /// Condition
        cond: Operand,
        /// Destination label
        label: String,
    },
    /// Jump when `cond` is false
    IfFalseGoto {
        /// Condition
        cond: Operand,
        /// Destination label
        label: String,
    },
    /// Read one value from the console into `target`
    Input {
        /// Destination
        target: Operand,
    },
    /// Write `value` to the console
    Output {
        /// Value written
        value: Operand,
    },
    /// Start of a function body
    FunctionBegin {
        /// Function name
        name: String,
        /// Storage names of the parameters, in order
        params: Vec<String>,
    },
    /// End of a function body
    FunctionEnd {
        /// Function name
        name: String,
    },
    /// Push one call argument
    Param {
        /// Argument value
        value: Operand,
    },
    /// Call `function` with the last `argc` params
    Call {
        /// Destination for the return value, if used
        target: Option<Operand>,
        /// Callee
        function: String,
        /// Argument count
        argc: usize,
    },
    /// Return from the current function
    Return {
        /// Returned value
        value: Option<Operand>,
    },
}

impl Quadruple {
    /// Operand written by this instruction.
    pub fn target(&self) -> Option<&Operand> {
        match self {
            Quadruple::Assign { target, .. }
            | Quadruple::BinaryOp { target, .. }
            | Quadruple::UnaryOp { target, .. }
            | Quadruple::Input { target } => Some(target),
            Quadruple::Call { target, .. } => target.as_ref(),
            _ => None,
        }
    }

    /// Operands read by this instruction.
    pub fn reads(&self) -> Vec<&Operand> {
        match self {
            Quadruple::Assign { source, .. } => vec![source],
            Quadruple::BinaryOp { left, right, .. } => vec![left, right],
            Quadruple::UnaryOp { operand, .. } => vec![operand],
            Quadruple::IfTrueGoto { cond, .. } | Quadruple::IfFalseGoto { cond, .. } => vec![cond],
            Quadruple::Output { value } | Quadruple::Param { value } => vec![value],
            Quadruple::Return { value } => value.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Labels and jumps. Never removed by any pass.
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Quadruple::Label { .. }
                | Quadruple::Goto { .. }
                | Quadruple::IfTrueGoto { .. }
                | Quadruple::IfFalseGoto { .. }
        )
    }
}
