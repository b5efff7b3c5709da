use std::collections::HashMap;

use super::{Pass, Rewrite};
use crate::ir::{Operand, Quadruple};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Var(String),
    Temp(usize),
}

impl Slot {
    fn of(operand: &Operand) -> Option<Slot> {
        match operand {
            Operand::Var(name) => Some(Slot::Var(name.clone())),
            Operand::Temp(id) => Some(Slot::Temp(*id)),
            _ => None,
        }
    }
}

/// Substitutes known constants into `BinaryOp` operands.
///
/// Knowledge is strictly straight-line: the map is cleared at every label
/// (a join point), at function boundaries and after every call, since the
/// callee may write any global.
pub struct ConstantPropagation;

impl Pass for ConstantPropagation {
    fn run(&self, quadruples: &[Quadruple], rewrites: &mut Vec<Rewrite>) -> Vec<Quadruple> {
        let mut constants: HashMap<Slot, Operand> = HashMap::new();
        let mut output = Vec::with_capacity(quadruples.len());

        for quad in quadruples {
            let mut quad = quad.clone();

            if let Quadruple::BinaryOp { left, right, .. } = &mut quad {
                let mut substituted = Vec::new();
                for operand in [left, right] {
                    let Some(value) = Slot::of(operand).and_then(|slot| constants.get(&slot)) else {
                        continue;
                    };
                    substituted.push(format!("{} = {}", operand, value));
                    *operand = value.clone();
                }
                if !substituted.is_empty() {
                    rewrites.push(Rewrite::new(
                        self.name(),
                        format!("propagated {} into `{}`", substituted.join(", "), quad),
                    ));
                }
            }

            match &quad {
                Quadruple::Assign { target, source } => {
                    if let Some(slot) = Slot::of(target) {
                        if source.is_constant() {
                            constants.insert(slot, source.clone());
                        } else {
                            constants.remove(&slot);
                        }
                    }
                }
                Quadruple::BinaryOp { target, .. }
                | Quadruple::UnaryOp { target, .. }
                | Quadruple::Input { target } => {
                    if let Some(slot) = Slot::of(target) {
                        constants.remove(&slot);
                    }
                }
                Quadruple::Label { .. }
                | Quadruple::FunctionBegin { .. }
                | Quadruple::FunctionEnd { .. }
                | Quadruple::Call { .. } => constants.clear(),
                _ => {}
            }

            output.push(quad);
        }

        output
    }

    fn name(&self) -> &'static str {
        "constant-propagation"
    }
}
