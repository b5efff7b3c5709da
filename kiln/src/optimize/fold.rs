use super::{Pass, Rewrite};
use crate::ir::{BinOp, Operand, Quadruple};

/// Replaces a `BinaryOp` whose operands are both numeric literals with an
/// `Assign` of the computed value.
pub struct ConstantFolding;

impl Pass for ConstantFolding {
    fn run(&self, quadruples: &[Quadruple], rewrites: &mut Vec<Rewrite>) -> Vec<Quadruple> {
        quadruples
            .iter()
            .map(|quad| {
                let Quadruple::BinaryOp {
                    target,
                    op,
                    left,
                    right,
                } = quad
                else {
                    return quad.clone();
                };
                match fold_binary(*op, left, right) {
                    Some(source) => {
                        let folded = Quadruple::Assign {
                            target: target.clone(),
                            source,
                        };
                        rewrites.push(Rewrite::new(
                            self.name(),
                            format!("folded `{}` into `{}`", quad, folded),
                        ));
                        folded
                    }
                    None => quad.clone(),
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "constant-folding"
    }
}

/// Evaluates `left op right` for numeric literals. Returns `None` when the
/// result is not representable exactly as the simulator would compute it:
/// integer overflow, division or modulo by zero, negative integer
/// exponents and non-finite floats.
pub fn fold_binary(op: BinOp, left: &Operand, right: &Operand) -> Option<Operand> {
    match (left, right) {
        (Operand::Int(a), Operand::Int(b)) => fold_int(op, *a, *b),
        (Operand::Int(a), Operand::Float(b)) => fold_float(op, *a as f64, *b),
        (Operand::Float(a), Operand::Int(b)) => fold_float(op, *a, *b as f64),
        (Operand::Float(a), Operand::Float(b)) => fold_float(op, *a, *b),
        _ => None,
    }
}

fn fold_int(op: BinOp, a: i64, b: i64) -> Option<Operand> {
    let value = match op {
        BinOp::Add => a.checked_add(b)?,
        BinOp::Sub => a.checked_sub(b)?,
        BinOp::Mul => a.checked_mul(b)?,
        BinOp::Div => a.checked_div(b)?,
        BinOp::Mod => a.checked_rem(b)?,
        BinOp::Pow => {
            let exponent = u32::try_from(b).ok()?;
            a.checked_pow(exponent)?
        }
        BinOp::Eq => return Some(Operand::Bool(a == b)),
        BinOp::Ne => return Some(Operand::Bool(a != b)),
        BinOp::Lt => return Some(Operand::Bool(a < b)),
        BinOp::Le => return Some(Operand::Bool(a <= b)),
        BinOp::Gt => return Some(Operand::Bool(a > b)),
        BinOp::Ge => return Some(Operand::Bool(a >= b)),
        BinOp::And | BinOp::Or => return None,
    };
    Some(Operand::Int(value))
}

fn fold_float(op: BinOp, a: f64, b: f64) -> Option<Operand> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div | BinOp::Mod if b == 0.0 => return None,
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        BinOp::Pow => a.powf(b),
        BinOp::Eq => return Some(Operand::Bool(a == b)),
        BinOp::Ne => return Some(Operand::Bool(a != b)),
        BinOp::Lt => return Some(Operand::Bool(a < b)),
        BinOp::Le => return Some(Operand::Bool(a <= b)),
        BinOp::Gt => return Some(Operand::Bool(a > b)),
        BinOp::Ge => return Some(Operand::Bool(a >= b)),
        BinOp::And | BinOp::Or => return None,
    };
    value.is_finite().then_some(Operand::Float(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_division_truncates() {
        assert_eq!(
            fold_binary(BinOp::Div, &Operand::Int(7), &Operand::Int(2)),
            Some(Operand::Int(3))
        );
    }

    #[test]
    fn unsafe_operations_are_left_alone() {
        assert_eq!(fold_binary(BinOp::Div, &Operand::Int(1), &Operand::Int(0)), None);
        assert_eq!(fold_binary(BinOp::Mod, &Operand::Float(1.0), &Operand::Int(0)), None);
        assert_eq!(fold_binary(BinOp::Pow, &Operand::Int(2), &Operand::Int(-1)), None);
        assert_eq!(
            fold_binary(BinOp::Mul, &Operand::Int(i64::MAX), &Operand::Int(2)),
            None
        );
    }

    #[test]
    fn mixed_operands_widen_to_float() {
        assert_eq!(
            fold_binary(BinOp::Add, &Operand::Int(1), &Operand::Float(0.5)),
            Some(Operand::Float(1.5))
        );
        assert_eq!(
            fold_binary(BinOp::Lt, &Operand::Int(1), &Operand::Float(0.5)),
            Some(Operand::Bool(false))
        );
    }
}
