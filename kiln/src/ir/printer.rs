//! Text rendering of quadruples

use super::*;
use std::fmt;

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(value) => write!(f, "{}", value),
            Operand::Float(value) => write!(f, "{}", format_float(*value)),
            Operand::Bool(value) => write!(f, "{}", value),
            Operand::Str(value) => write!(f, "\"{}\"", escape(value)),
            Operand::Var(name) => write!(f, "{}", name),
            Operand::Temp(id) => write!(f, "t{}", id),
        }
    }
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quadruple::Assign { target, source } => write!(f, "{} = {}", target, source),
            Quadruple::BinaryOp {
                target,
                op,
                left,
                right,
            } => write!(f, "{} = {} {} {}", target, left, op.as_str(), right),
            Quadruple::UnaryOp { target, op, operand } => {
                write!(f, "{} = {}{}", target, op.as_str(), operand)
            }
            Quadruple::Label { name } => write!(f, "{}:", name),
            Quadruple::Goto { label } => write!(f, "GOTO {}", label),
            Quadruple::IfTrueGoto { cond, label } => write!(f, "IF_TRUE {} GOTO {}", cond, label),
            Quadruple::IfFalseGoto { cond, label } => {
                write!(f, "IF_FALSE {} GOTO {}", cond, label)
            }
            Quadruple::Input { target } => write!(f, "INPUT {}", target),
            Quadruple::Output { value } => write!(f, "OUTPUT {}", value),
            Quadruple::FunctionBegin { name, params } => {
                write!(f, "FUNCTION {}({})", name, params.join(", "))
            }
            Quadruple::FunctionEnd { name } => write!(f, "END_FUNCTION {}", name),
            Quadruple::Param { value } => write!(f, "PARAM {}", value),
            Quadruple::Call {
                target,
                function,
                argc,
            } => match target {
                Some(target) => write!(f, "{} = CALL {}, {}", target, function, argc),
                None => write!(f, "CALL {}, {}", function, argc),
            },
            Quadruple::Return { value } => match value {
                Some(value) => write!(f, "RETURN {}", value),
                None => write!(f, "RETURN"),
            },
        }
    }
}

/// Numbered listing, one quadruple per line (`  0. t0 = a + 3`).
pub fn listing(quadruples: &[Quadruple]) -> String {
    let width = quadruples.len().saturating_sub(1).to_string().len().max(3);
    let mut out = String::new();
    for (index, quad) in quadruples.iter().enumerate() {
        out.push_str(&format!("{:>width$}. {}\n", index, quad, width = width));
    }
    out
}

/// Floats always carry a decimal point so `5.0` never reads as an integer.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_outputs_are_quoted_and_variables_are_not() {
        let quoted = Quadruple::Output {
            value: Operand::Str("x".to_string()),
        };
        let plain = Quadruple::Output {
            value: Operand::Var("x".to_string()),
        };
        assert_eq!(quoted.to_string(), "OUTPUT \"x\"");
        assert_eq!(plain.to_string(), "OUTPUT x");
    }

    #[test]
    fn listing_numbers_every_line() {
        let quads = vec![
            Quadruple::Label {
                name: "L0".to_string(),
            },
            Quadruple::Goto {
                label: "L0".to_string(),
            },
        ];
        assert_eq!(listing(&quads), "  0. L0:\n  1. GOTO L0\n");
    }
}
