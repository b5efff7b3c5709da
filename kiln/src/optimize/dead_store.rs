use std::collections::HashSet;

use super::{Pass, Rewrite};
use crate::ir::{Operand, Quadruple};

/// Removes `Assign`s to source variables that are never read anywhere in
/// the unit. Only `Assign` to a `Var` is a candidate; temporaries, jumps,
/// labels, I/O, calls and function markers always survive.
pub struct DeadStoreElimination;

impl Pass for DeadStoreElimination {
    fn run(&self, quadruples: &[Quadruple], rewrites: &mut Vec<Rewrite>) -> Vec<Quadruple> {
        let mut current = quadruples.to_vec();

        // Removing one store can leave the variable it read unused.
        loop {
            let used = read_variables(&current);
            let mut removed = false;
            let mut kept = Vec::with_capacity(current.len());
            for quad in current {
                let dead = matches!(
                    &quad,
                    Quadruple::Assign {
                        target: Operand::Var(name),
                        ..
                    } if !used.contains(name.as_str())
                );
                if dead {
                    rewrites.push(Rewrite::new(
                        self.name(),
                        format!("removed dead store `{}`", quad),
                    ));
                    removed = true;
                } else {
                    kept.push(quad);
                }
            }
            current = kept;
            if !removed {
                return current;
            }
        }
    }

    fn name(&self) -> &'static str {
        "dead-store-elimination"
    }
}

/// Every variable appearing as an operand, plus input targets.
fn read_variables(quadruples: &[Quadruple]) -> HashSet<String> {
    let mut used = HashSet::new();
    for quad in quadruples {
        for operand in quad.reads() {
            if let Some(name) = operand.as_var() {
                used.insert(name.to_string());
            }
        }
        if let Quadruple::Input { target } = quad {
            if let Some(name) = target.as_var() {
                used.insert(name.to_string());
            }
        }
    }
    used
}
