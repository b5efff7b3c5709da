//! AST to quadruple lowering
//!
//! The checked AST is walked once, appending quadruples to a flat list.
//! Identifiers are resolved to storage names by replaying the analyzer's
//! scope structure: a [`ScopeArena`] is entered and exited at exactly the
//! points where the analyzer did, so frame ids line up with the `scope`
//! recorded on each [`Symbol`].

use tracing::{debug, warn};

use crate::ir::printer::listing;
use crate::ir::{BinOp, Operand, Quadruple, UnOp};
use cinder::parser::ast::{Expr, ExprKind, Param, Program, Stmt, StmtKind, UnaryOp};
use cinder::semantic::scope::{ScopeArena, Symbol, SymbolType};

use super::IrOutput;

/// Lower a checked program into quadruples.
pub struct Lowering<'a> {
    /// Next temporary id.
    next_temp: usize,
    /// Next label id.
    next_label: usize,
    symbols: &'a [Symbol],
    scopes: ScopeArena,
    quadruples: Vec<Quadruple>,
    diagnostics: Vec<String>,
}

impl<'a> Lowering<'a> {
    /// Create a lowering context over the analyzer's symbols. Counters
    /// start at zero.
    pub fn new(symbols: &'a [Symbol]) -> Self {
        Self {
            next_temp: 0,
            next_label: 0,
            symbols,
            scopes: ScopeArena::new(),
            quadruples: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Generate a unique temporary.
    pub fn new_temp(&mut self) -> Operand {
        let temp = Operand::Temp(self.next_temp);
        self.next_temp += 1;
        temp
    }

    /// Generate a unique label name.
    pub fn new_label(&mut self) -> String {
        let label = format!("L{}", self.next_label);
        self.next_label += 1;
        label
    }

    /// Lower the whole program.
    pub fn lower_program(mut self, program: &Program) -> IrOutput {
        self.lower_block(&program.body);
        debug!(
            quadruples = self.quadruples.len(),
            temps = self.next_temp,
            labels = self.next_label,
            "generated intermediate code"
        );

        let text = listing(&self.quadruples);
        IrOutput {
            quadruples: self.quadruples,
            text,
            diagnostics: self.diagnostics,
        }
    }

    fn emit(&mut self, quad: Quadruple) {
        self.quadruples.push(quad);
    }

    fn lower_block(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.lower_statement(statement);
        }
    }

    fn lower_scoped(&mut self, statements: &[Stmt]) {
        self.scopes.enter();
        self.lower_block(statements);
        self.scopes.exit();
    }

    fn lower_statement(&mut self, statement: &Stmt) {
        match &statement.kind {
            StmtKind::Declaration { declarators, .. } => {
                for declarator in declarators {
                    let value = declarator
                        .initializer
                        .as_ref()
                        .map(|initializer| self.lower_expr(initializer));
                    let storage = self.declare(&declarator.name.name);
                    if let Some(source) = value {
                        self.emit(Quadruple::Assign {
                            target: Operand::Var(storage),
                            source,
                        });
                    }
                }
            }
            StmtKind::Assign { target, value } => {
                let source = self.lower_expr(value);
                let target = Operand::Var(self.storage_of(&target.name));
                self.emit(Quadruple::Assign { target, source });
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.lower_expr(condition);
                match else_branch {
                    None => {
                        let end_label = self.new_label();
                        self.emit(Quadruple::IfFalseGoto {
                            cond,
                            label: end_label.clone(),
                        });
                        self.lower_scoped(then_branch);
                        self.emit(Quadruple::Label { name: end_label });
                    }
                    Some(else_branch) => {
                        let else_label = self.new_label();
                        let end_label = self.new_label();
                        self.emit(Quadruple::IfFalseGoto {
                            cond,
                            label: else_label.clone(),
                        });
                        self.lower_scoped(then_branch);
                        self.emit(Quadruple::Goto {
                            label: end_label.clone(),
                        });
                        self.emit(Quadruple::Label { name: else_label });
                        self.lower_scoped(else_branch);
                        self.emit(Quadruple::Label { name: end_label });
                    }
                }
            }
            StmtKind::While { condition, body } => {
                // Test at the bottom: the condition is emitted once and
                // reached through `cond_label` on entry and on every loop-back.
                let body_label = self.new_label();
                let cond_label = self.new_label();
                let end_label = self.new_label();
                self.emit(Quadruple::Goto {
                    label: cond_label.clone(),
                });
                self.emit(Quadruple::Label {
                    name: body_label.clone(),
                });
                self.lower_scoped(body);
                self.emit(Quadruple::Label { name: cond_label });
                let cond = self.lower_expr(condition);
                self.emit(Quadruple::IfTrueGoto {
                    cond,
                    label: body_label,
                });
                self.emit(Quadruple::Label { name: end_label });
            }
            StmtKind::DoLoop {
                body,
                condition,
                until,
            } => {
                let body_label = self.new_label();
                let cond_label = self.new_label();
                self.emit(Quadruple::Label {
                    name: body_label.clone(),
                });
                self.lower_scoped(body);
                self.emit(Quadruple::Label { name: cond_label });
                let cond = self.lower_expr(condition);
                let jump = if *until {
                    Quadruple::IfFalseGoto {
                        cond,
                        label: body_label,
                    }
                } else {
                    Quadruple::IfTrueGoto {
                        cond,
                        label: body_label,
                    }
                };
                self.emit(jump);
            }
            StmtKind::Input { targets } => {
                for target in targets {
                    let target = Operand::Var(self.storage_of(&target.name));
                    self.emit(Quadruple::Input { target });
                }
            }
            StmtKind::Output { values } => {
                for value in values {
                    let value = self.lower_expr(value);
                    self.emit(Quadruple::Output { value });
                }
            }
            StmtKind::FunctionDef {
                name, params, body, ..
            } => self.lower_function(&name.name, params, body),
            StmtKind::Return { value } => {
                let value = value.as_ref().map(|expr| self.lower_expr(expr));
                self.emit(Quadruple::Return { value });
            }
            StmtKind::Call { name, args } => {
                self.lower_call(&name.name, args, None);
            }
            StmtKind::Block(statements) => self.lower_block(statements),
        }
    }

    fn lower_function(&mut self, name: &str, params: &[Param], body: &[Stmt]) {
        match self.find_symbol(name, true) {
            Some(symbol) => {
                let _ = self.scopes.insert_global(symbol);
            }
            None => self.internal(format!("function '{}' has no symbol table entry", name)),
        }

        self.scopes.enter();
        let params = params
            .iter()
            .map(|param| self.declare(&param.name.name))
            .collect();
        self.emit(Quadruple::FunctionBegin {
            name: name.to_string(),
            params,
        });
        self.lower_block(body);
        self.emit(Quadruple::FunctionEnd {
            name: name.to_string(),
        });
        self.scopes.exit();
    }

    fn lower_call(&mut self, function: &str, args: &[Expr], target: Option<Operand>) {
        if self.find_symbol(function, true).is_none() {
            self.internal(format!("call to unresolved function '{}'", function));
        }
        let values: Vec<Operand> = args.iter().map(|arg| self.lower_expr(arg)).collect();
        let argc = values.len();
        for value in values {
            self.emit(Quadruple::Param { value });
        }
        self.emit(Quadruple::Call {
            target,
            function: function.to_string(),
            argc,
        });
    }

    /// Lower an expression, returning the operand holding its value.
    fn lower_expr(&mut self, expr: &Expr) -> Operand {
        match &expr.kind {
            ExprKind::Int(value) => Operand::Int(*value),
            ExprKind::Float(value) => Operand::Float(*value),
            ExprKind::Bool(value) => Operand::Bool(*value),
            ExprKind::Str(value) => Operand::Str(value.clone()),
            ExprKind::Identifier(name) => Operand::Var(self.storage_of(name)),
            ExprKind::Unary {
                op: UnaryOp::Negate,
                operand,
            } => match operand.kind {
                ExprKind::Int(value) => Operand::Int(-value),
                ExprKind::Float(value) => Operand::Float(-value),
                _ => self.lower_unary(UnaryOp::Negate, operand),
            },
            ExprKind::Unary { op, operand } => self.lower_unary(*op, operand),
            ExprKind::Binary { lhs, op, rhs } => {
                let left = self.lower_expr(lhs);
                let right = self.lower_expr(rhs);
                let target = self.new_temp();
                self.emit(Quadruple::BinaryOp {
                    target: target.clone(),
                    op: BinOp::from(*op),
                    left,
                    right,
                });
                target
            }
            ExprKind::Call { name, args } => {
                let target = self.new_temp();
                self.lower_call(name, args, Some(target.clone()));
                target
            }
        }
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expr) -> Operand {
        let operand = self.lower_expr(operand);
        let target = self.new_temp();
        self.emit(Quadruple::UnaryOp {
            target: target.clone(),
            op: UnOp::from(op),
            operand,
        });
        target
    }

    /// Bind `name` in the current frame and return its storage name.
    /// A declaration the analyzer did not record in this frame is an internal
    /// error; lowering carries on with the bare name so the listing stays
    /// readable.
    fn declare(&mut self, name: &str) -> String {
        let symbol = match self.find_symbol(name, false) {
            Some(symbol) => symbol,
            None => {
                self.internal(format!(
                    "declaration of '{}' has no symbol table entry in scope {}",
                    name,
                    self.scopes.current().0
                ));
                let mut symbol = Symbol::new(name, SymbolType::Int, 0, 0);
                symbol.storage = name.to_string();
                symbol
            }
        };
        match self.scopes.insert(symbol) {
            Ok(symbol) => symbol.storage.clone(),
            Err(existing) => {
                let storage = existing.storage.clone();
                self.internal(format!("'{}' declared twice in one scope", name));
                storage
            }
        }
    }

    fn find_symbol(&self, name: &str, function: bool) -> Option<Symbol> {
        let scope = if function {
            cinder::semantic::scope::ScopeId::GLOBAL
        } else {
            self.scopes.current()
        };
        self.symbols
            .iter()
            .find(|symbol| {
                symbol.name == name
                    && symbol.scope == scope
                    && (symbol.ty == SymbolType::Function) == function
            })
            .cloned()
    }

    fn storage_of(&mut self, name: &str) -> String {
        match self.scopes.lookup(name) {
            Some(symbol) => symbol.storage.clone(),
            None => {
                self.internal(format!("unresolved name '{}'", name));
                name.to_string()
            }
        }
    }

    fn internal(&mut self, message: String) {
        warn!("{}", message);
        self.diagnostics.push(message);
    }
}
