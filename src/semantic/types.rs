use std::fmt;

use serde::Serialize;

use crate::parser::ast::{BinaryOp, TypeName, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    /// Result of an expression that already produced an error. Accepted
    /// everywhere so one mistake is reported once.
    Unknown,
}

impl Type {
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Type::Unknown)
    }
}

impl From<TypeName> for Type {
    fn from(name: TypeName) -> Self {
        match name {
            TypeName::Int => Type::Int,
            TypeName::Float => Type::Float,
            TypeName::Bool => Type::Bool,
            TypeName::String => Type::String,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Unknown => write!(f, "unknown"),
        }
    }
}

/// Identical types, or an `int` flowing into a `float`.
pub fn is_assignable(from: Type, to: Type) -> bool {
    if !from.is_known() || !to.is_known() {
        return true;
    }
    from == to || (from == Type::Int && to == Type::Float)
}

pub fn common_numeric_type(lhs: Type, rhs: Type) -> Option<Type> {
    match (lhs, rhs) {
        (Type::Int, Type::Int) => Some(Type::Int),
        (Type::Float, Type::Float) => Some(Type::Float),
        (Type::Int, Type::Float) | (Type::Float, Type::Int) => Some(Type::Float),
        _ => None,
    }
}

/// Result type of `lhs op rhs`, or a description of why the operands are
/// rejected. Unknown operands never produce a second error.
pub fn binary_result(op: BinaryOp, lhs: Type, rhs: Type) -> Result<Type, String> {
    if !lhs.is_known() || !rhs.is_known() {
        let ty = if op.is_arithmetic() { Type::Unknown } else { Type::Bool };
        return Ok(ty);
    }

    if op.is_logical() {
        return if lhs == Type::Bool && rhs == Type::Bool {
            Ok(Type::Bool)
        } else {
            Err(format!(
                "operator '{}' requires bool operands, found {} and {}",
                op.as_str(),
                lhs,
                rhs
            ))
        };
    }

    if op.is_equality() {
        return if common_numeric_type(lhs, rhs).is_some() || (lhs == rhs && lhs != Type::Void) {
            Ok(Type::Bool)
        } else {
            Err(format!("cannot compare {} with {}", lhs, rhs))
        };
    }

    if op.is_relational() {
        let comparable = common_numeric_type(lhs, rhs).is_some()
            || (lhs == rhs && matches!(lhs, Type::Bool | Type::String));
        return if comparable {
            Ok(Type::Bool)
        } else {
            Err(format!(
                "operator '{}' cannot order {} and {}",
                op.as_str(),
                lhs,
                rhs
            ))
        };
    }

    if op == BinaryOp::Add && lhs == Type::String && rhs == Type::String {
        return Ok(Type::String);
    }

    common_numeric_type(lhs, rhs).ok_or_else(|| {
        format!(
            "operator '{}' cannot be applied to {} and {}",
            op.as_str(),
            lhs,
            rhs
        )
    })
}

pub fn unary_result(op: UnaryOp, operand: Type) -> Result<Type, String> {
    if !operand.is_known() {
        return Ok(match op {
            UnaryOp::Negate => Type::Unknown,
            UnaryOp::Not => Type::Bool,
        });
    }
    match op {
        UnaryOp::Negate if operand.is_numeric() => Ok(operand),
        UnaryOp::Not if operand == Type::Bool => Ok(Type::Bool),
        _ => Err(format!(
            "operator '{}' cannot be applied to {}",
            op.as_str(),
            operand
        )),
    }
}
