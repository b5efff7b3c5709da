//! Quadruple optimization passes
//!
//! Passes never edit their input: each one reads a quadruple slice and
//! returns a new list, recording every rewrite it performs. The
//! [`PassManager`] runs its passes in order and repeats the sequence until
//! a full round rewrites nothing, so optimizing an already optimized list
//! is a no-op.

mod dead_store;
mod fold;
mod propagate;

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::ir::Quadruple;

pub use dead_store::DeadStoreElimination;
pub use fold::{fold_binary, ConstantFolding};
pub use propagate::ConstantPropagation;

/// Upper bound on full rounds of the pass sequence.
pub const MAX_ROUNDS: usize = 32;

/// Optimization pass trait
pub trait Pass {
    /// Run the pass over `quadruples`, pushing one [`Rewrite`] per change.
    fn run(&self, quadruples: &[Quadruple], rewrites: &mut Vec<Rewrite>) -> Vec<Quadruple>;

    /// Get pass name
    fn name(&self) -> &'static str;
}

/// One change made by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    /// Name of the pass that made the change
    pub pass: &'static str,
    /// Human readable description
    pub description: String,
}

impl Rewrite {
    /// Create a rewrite record.
    pub fn new(pass: &'static str, description: impl Into<String>) -> Self {
        Self {
            pass,
            description: description.into(),
        }
    }
}

/// Every rewrite performed by one `optimize` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizationReport {
    /// Rewrites, in the order they were made
    pub rewrites: Vec<Rewrite>,
    /// Rounds of the pass sequence that ran
    pub rounds: usize,
}

impl OptimizationReport {
    /// Number of rewrites made by the pass called `pass`.
    pub fn count(&self, pass: &str) -> usize {
        self.rewrites.iter().filter(|r| r.pass == pass).count()
    }
}

impl fmt::Display for OptimizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rewrites.is_empty() {
            return writeln!(f, "no optimizations applied");
        }
        for (index, rewrite) in self.rewrites.iter().enumerate() {
            writeln!(f, "{}. [{}] {}", index + 1, rewrite.pass, rewrite.description)?;
        }
        writeln!(
            f,
            "total: {} rewrite(s) in {} round(s)",
            self.rewrites.len(),
            self.rounds
        )
    }
}

/// Output of [`optimize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimized {
    /// Rewritten quadruples
    pub quadruples: Vec<Quadruple>,
    /// What changed
    pub report: OptimizationReport,
}

/// Pass manager - runs optimization passes in order
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new pass manager
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// The standard pipeline: dead-store elimination, constant folding,
    /// constant propagation.
    pub fn standard() -> Self {
        let mut manager = Self::new();
        manager.add_pass(Box::new(DeadStoreElimination));
        manager.add_pass(Box::new(ConstantFolding));
        manager.add_pass(Box::new(ConstantPropagation));
        manager
    }

    /// Add an optimization pass
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Names of the registered passes, in run order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run all passes until a round changes nothing.
    pub fn run(&self, quadruples: &[Quadruple]) -> Optimized {
        let mut current = quadruples.to_vec();
        let mut report = OptimizationReport::default();

        while report.rounds < MAX_ROUNDS {
            report.rounds += 1;
            let before = report.rewrites.len();
            for pass in &self.passes {
                let start = report.rewrites.len();
                current = pass.run(&current, &mut report.rewrites);
                for rewrite in &report.rewrites[start..] {
                    trace!(pass = rewrite.pass, "{}", rewrite.description);
                }
            }
            if report.rewrites.len() == before {
                break;
            }
        }

        debug!(
            before = quadruples.len(),
            after = current.len(),
            rewrites = report.rewrites.len(),
            rounds = report.rounds,
            "optimized quadruples"
        );
        Optimized {
            quadruples: current,
            report,
        }
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Optimize with the standard pipeline. Pure: the input is not modified.
pub fn optimize(quadruples: &[Quadruple]) -> Optimized {
    PassManager::standard().run(quadruples)
}
