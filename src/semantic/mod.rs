pub mod annotate;
pub mod scope;
pub mod types;

use serde::Serialize;
use tracing::debug;

use crate::errors::SemanticError;
use crate::parser::ast::{Declarator, Expr, ExprKind, Ident, Param, Program, Stmt, StmtKind, TypeName};
use annotate::AnnotatedNode;
use scope::{ScopeArena, Signature, Symbol, SymbolType};
use types::{binary_result, is_assignable, unary_result, Type};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub errors: Vec<SemanticError>,
    pub symbols: Vec<Symbol>,
    pub annotated: AnnotatedNode,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Type-checks `program` against a fresh symbol table.
pub fn analyze(program: &Program) -> Analysis {
    Analyzer::new().analyze_program(program)
}

#[derive(Debug, Clone)]
struct FunctionContext {
    name: String,
    return_type: Type,
    saw_return: bool,
}

/// Walks the program once. Scopes are entered for each `if`/`else`
/// branch, each loop body and each function body, in source order; the IR
/// generator relies on this exact order to resolve storage names.
#[derive(Debug, Default)]
pub struct Analyzer {
    scopes: ScopeArena,
    function_stack: Vec<FunctionContext>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze_program(mut self, program: &Program) -> Analysis {
        let mut errors = Vec::new();
        let children = self.check_block(&program.body, &mut errors);
        let annotated = AnnotatedNode::new("program", program.line).with_children(children);

        debug!(
            symbols = self.scopes.symbols().len(),
            errors = errors.len(),
            "analyzed program"
        );
        Analysis {
            errors,
            symbols: self.scopes.into_symbols(),
            annotated,
        }
    }

    fn check_block(&mut self, statements: &[Stmt], errors: &mut Vec<SemanticError>) -> Vec<AnnotatedNode> {
        statements
            .iter()
            .map(|statement| self.check_statement(statement, errors))
            .collect()
    }

    fn scoped_block(&mut self, kind: &'static str, line: usize, statements: &[Stmt], errors: &mut Vec<SemanticError>) -> AnnotatedNode {
        self.scopes.enter();
        let children = self.check_block(statements, errors);
        self.scopes.exit();
        AnnotatedNode::new(kind, line).with_children(children)
    }

    fn check_statement(&mut self, statement: &Stmt, errors: &mut Vec<SemanticError>) -> AnnotatedNode {
        let line = statement.line;
        match &statement.kind {
            StmtKind::Declaration { ty, declarators } => {
                let children = declarators
                    .iter()
                    .map(|declarator| self.check_declarator(*ty, declarator, errors))
                    .collect();
                AnnotatedNode::new("declaration", line)
                    .with_value(ty.as_str())
                    .with_children(children)
            }
            StmtKind::Assign { target, value } => {
                let (value_ty, value_node) = self.check_expr(value, errors);
                let target_ty = self.resolve_variable(target, errors);
                if !is_assignable(value_ty, target_ty) {
                    errors.push(SemanticError::new(
                        format!(
                            "incompatible types in assignment: cannot assign {} to '{}' of type {}",
                            value_ty, target.name, target_ty
                        ),
                        target.line,
                        Some(target.column),
                    ));
                }
                AnnotatedNode::new("assignment", line)
                    .with_value("=")
                    .with_children(vec![identifier_node(target, target_ty), value_node])
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition_node = self.check_condition("if", condition, errors);
                let mut children = vec![condition_node];
                children.push(self.scoped_block("then", line, then_branch, errors));
                let kind = match else_branch {
                    Some(else_branch) => {
                        children.push(self.scoped_block("else", line, else_branch, errors));
                        "if_else"
                    }
                    None => "if",
                };
                AnnotatedNode::new(kind, line).with_children(children)
            }
            StmtKind::While { condition, body } => {
                let condition_node = self.check_condition("while", condition, errors);
                let body_node = self.scoped_block("body", line, body, errors);
                AnnotatedNode::new("while", line).with_children(vec![condition_node, body_node])
            }
            StmtKind::DoLoop {
                body,
                condition,
                until,
            } => {
                let body_node = self.scoped_block("body", line, body, errors);
                let (kind, keyword) = if *until {
                    ("do_until", "do-until")
                } else {
                    ("do_while", "do-while")
                };
                let condition_node = self.check_condition(keyword, condition, errors);
                AnnotatedNode::new(kind, line).with_children(vec![body_node, condition_node])
            }
            StmtKind::Input { targets } => {
                let children = targets
                    .iter()
                    .map(|target| {
                        let ty = self.resolve_variable(target, errors);
                        identifier_node(target, ty)
                    })
                    .collect();
                AnnotatedNode::new("input", line).with_children(children)
            }
            StmtKind::Output { values } => {
                let children = values
                    .iter()
                    .map(|value| self.check_expr(value, errors).1)
                    .collect();
                AnnotatedNode::new("output", line).with_children(children)
            }
            StmtKind::FunctionDef {
                name,
                return_type,
                params,
                body,
            } => self.check_function(name, *return_type, params, body, line, errors),
            StmtKind::Return { value } => self.check_return(value.as_ref(), line, errors),
            StmtKind::Call { name, args } => {
                let (ty, children) = self.check_call(name, args, errors);
                AnnotatedNode::new("call", line)
                    .with_value(name.name.clone())
                    .with_type(ty)
                    .with_children(children)
            }
            StmtKind::Block(statements) => {
                let children = self.check_block(statements, errors);
                AnnotatedNode::new("block", line).with_children(children)
            }
        }
    }

    fn check_declarator(&mut self, ty: TypeName, declarator: &Declarator, errors: &mut Vec<SemanticError>) -> AnnotatedNode {
        let declared = Type::from(ty);
        let name = &declarator.name;
        let mut node = identifier_node(name, declared);

        let mut symbol = Symbol::new(name.name.clone(), SymbolType::from(ty), name.line, name.column);
        symbol.function = self.function_stack.last().map(|ctx| ctx.name.clone());

        if let Some(initializer) = &declarator.initializer {
            let (init_ty, init_node) = self.check_expr(initializer, errors);
            if !is_assignable(init_ty, declared) {
                errors.push(SemanticError::new(
                    format!(
                        "incompatible types in declaration: cannot initialize '{}' of type {} with {}",
                        name.name, declared, init_ty
                    ),
                    name.line,
                    Some(name.column),
                ));
            }
            symbol.value = literal_text(initializer);
            node.push(init_node);
        }

        if let Err(existing) = self.scopes.insert(symbol) {
            errors.push(SemanticError::new(
                format!(
                    "variable '{}' already declared in this scope (first declared at line {})",
                    name.name, existing.line
                ),
                name.line,
                Some(name.column),
            ));
        }
        node
    }

    fn check_condition(&mut self, keyword: &str, condition: &Expr, errors: &mut Vec<SemanticError>) -> AnnotatedNode {
        let (ty, node) = self.check_expr(condition, errors);
        if ty.is_known() && ty != Type::Bool {
            errors.push(SemanticError::new(
                format!("condition of '{}' must be bool, found {}", keyword, ty),
                condition.line,
                Some(condition.column),
            ));
        }
        node
    }

    fn check_function(
        &mut self,
        name: &Ident,
        return_type: Option<TypeName>,
        params: &[Param],
        body: &[Stmt],
        line: usize,
        errors: &mut Vec<SemanticError>,
    ) -> AnnotatedNode {
        let declared_return = return_type.map(Type::from).unwrap_or(Type::Void);
        let mut node = AnnotatedNode::new("function", line)
            .with_value(name.name.clone())
            .with_type(declared_return);

        // A nested definition is reported but its body is still checked; it
        // never gets a signature, so calls to it stay undeclared.
        if let Some(outer) = self.function_stack.last() {
            errors.push(SemanticError::new(
                format!(
                    "function '{}' cannot be defined inside function '{}'",
                    name.name, outer.name
                ),
                name.line,
                Some(name.column),
            ));
        } else {
            let signature = Signature {
                params: params.iter().map(|param| Type::from(param.ty)).collect(),
                return_type: declared_return,
            };
            let mut symbol =
                Symbol::new(name.name.clone(), SymbolType::Function, name.line, name.column);
            symbol.value = Some(declared_return.to_string());
            symbol.signature = Some(signature);
            if let Err(existing) = self.scopes.insert_global(symbol) {
                errors.push(SemanticError::new(
                    format!(
                        "function '{}' already declared (first declared at line {})",
                        name.name, existing.line
                    ),
                    name.line,
                    Some(name.column),
                ));
            }
        }

        self.scopes.enter();
        self.function_stack.push(FunctionContext {
            name: name.name.clone(),
            return_type: declared_return,
            saw_return: false,
        });

        for param in params {
            let mut symbol = Symbol::new(
                param.name.name.clone(),
                SymbolType::from(param.ty),
                param.name.line,
                param.name.column,
            );
            symbol.function = Some(name.name.clone());
            if self.scopes.insert(symbol).is_err() {
                errors.push(SemanticError::new(
                    format!(
                        "parameter '{}' declared more than once in function '{}'",
                        param.name.name, name.name
                    ),
                    param.name.line,
                    Some(param.name.column),
                ));
            }
            node.push(
                AnnotatedNode::new("param", param.name.line)
                    .with_value(param.name.name.clone())
                    .with_type(Type::from(param.ty)),
            );
        }

        let children = self.check_block(body, errors);
        node.push(AnnotatedNode::new("body", line).with_children(children));

        let context = self.function_stack.pop();
        self.scopes.exit();

        if let Some(context) = context {
            if context.return_type != Type::Void && !context.saw_return {
                errors.push(SemanticError::new(
                    format!(
                        "function '{}' must return a value of type {}",
                        context.name, context.return_type
                    ),
                    line,
                    Some(name.column),
                ));
            }
        }
        node
    }

    fn check_return(&mut self, value: Option<&Expr>, line: usize, errors: &mut Vec<SemanticError>) -> AnnotatedNode {
        let mut node = AnnotatedNode::new("return", line);
        let checked = value.map(|expr| {
            let (ty, child) = self.check_expr(expr, errors);
            node.push(child);
            (ty, expr)
        });

        let Some(context) = self.function_stack.last_mut() else {
            errors.push(SemanticError::new("'return' outside of a function", line, None));
            return node;
        };

        match (checked, context.return_type) {
            (None, Type::Void) => {}
            (None, expected) => {
                errors.push(SemanticError::new(
                    format!(
                        "function '{}' must return a value of type {}",
                        context.name, expected
                    ),
                    line,
                    None,
                ));
            }
            (Some((_, expr)), Type::Void) => {
                errors.push(SemanticError::new(
                    format!("void function '{}' cannot return a value", context.name),
                    expr.line,
                    Some(expr.column),
                ));
            }
            (Some((ty, expr)), expected) => {
                context.saw_return = true;
                if ty.is_known() && ty != expected {
                    errors.push(SemanticError::new(
                        format!(
                            "return type mismatch in '{}': expected {}, found {}",
                            context.name, expected, ty
                        ),
                        expr.line,
                        Some(expr.column),
                    ));
                }
            }
        }
        node
    }

    fn resolve_variable(&self, ident: &Ident, errors: &mut Vec<SemanticError>) -> Type {
        match self.scopes.lookup(&ident.name) {
            None => {
                errors.push(SemanticError::new(
                    format!("undeclared variable '{}'", ident.name),
                    ident.line,
                    Some(ident.column),
                ));
                Type::Unknown
            }
            Some(symbol) if symbol.ty == SymbolType::Function => {
                errors.push(SemanticError::new(
                    format!("function '{}' cannot be used as a variable", ident.name),
                    ident.line,
                    Some(ident.column),
                ));
                Type::Unknown
            }
            Some(symbol) => symbol.value_type(),
        }
    }

    fn check_call(&mut self, name: &Ident, args: &[Expr], errors: &mut Vec<SemanticError>) -> (Type, Vec<AnnotatedNode>) {
        let mut arg_types = Vec::with_capacity(args.len());
        let mut children = Vec::with_capacity(args.len());
        for arg in args {
            let (ty, node) = self.check_expr(arg, errors);
            arg_types.push(ty);
            children.push(node);
        }

        let signature = match self.scopes.lookup(&name.name) {
            None => {
                errors.push(SemanticError::new(
                    format!("undeclared function '{}'", name.name),
                    name.line,
                    Some(name.column),
                ));
                return (Type::Unknown, children);
            }
            Some(symbol) => match &symbol.signature {
                Some(signature) => signature.clone(),
                None => {
                    errors.push(SemanticError::new(
                        format!("'{}' is not a function", name.name),
                        name.line,
                        Some(name.column),
                    ));
                    return (Type::Unknown, children);
                }
            },
        };

        if signature.params.len() != args.len() {
            errors.push(SemanticError::new(
                format!(
                    "function '{}' expects {} argument(s), found {}",
                    name.name,
                    signature.params.len(),
                    args.len()
                ),
                name.line,
                Some(name.column),
            ));
        } else {
            for (index, ((arg_ty, param_ty), arg)) in arg_types
                .iter()
                .zip(signature.params.iter())
                .zip(args)
                .enumerate()
            {
                if !is_assignable(*arg_ty, *param_ty) {
                    errors.push(SemanticError::new(
                        format!(
                            "argument {} of '{}': expected {}, found {}",
                            index + 1,
                            name.name,
                            param_ty,
                            arg_ty
                        ),
                        arg.line,
                        Some(arg.column),
                    ));
                }
            }
        }

        (signature.return_type, children)
    }

    fn check_expr(&mut self, expr: &Expr, errors: &mut Vec<SemanticError>) -> (Type, AnnotatedNode) {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Int(value) => (
                Type::Int,
                AnnotatedNode::new("int", line).with_value(value.to_string()).with_type(Type::Int),
            ),
            ExprKind::Float(value) => (
                Type::Float,
                AnnotatedNode::new("float", line).with_value(value.to_string()).with_type(Type::Float),
            ),
            ExprKind::Bool(value) => (
                Type::Bool,
                AnnotatedNode::new("bool", line).with_value(value.to_string()).with_type(Type::Bool),
            ),
            ExprKind::Str(value) => (
                Type::String,
                AnnotatedNode::new("string", line)
                    .with_value(format!("\"{}\"", value))
                    .with_type(Type::String),
            ),
            ExprKind::Identifier(name) => {
                let ident = Ident {
                    name: name.clone(),
                    line,
                    column: expr.column,
                };
                let ty = self.resolve_variable(&ident, errors);
                (ty, identifier_node(&ident, ty))
            }
            ExprKind::Unary { op, operand } => {
                let (operand_ty, child) = self.check_expr(operand, errors);
                let ty = unary_result(*op, operand_ty).unwrap_or_else(|message| {
                    errors.push(SemanticError::new(message, line, Some(expr.column)));
                    Type::Unknown
                });
                (
                    ty,
                    AnnotatedNode::new("unary", line)
                        .with_value(op.as_str())
                        .with_type(ty)
                        .with_children(vec![child]),
                )
            }
            ExprKind::Binary { lhs, op, rhs } => {
                let (lhs_ty, lhs_node) = self.check_expr(lhs, errors);
                let (rhs_ty, rhs_node) = self.check_expr(rhs, errors);
                let ty = binary_result(*op, lhs_ty, rhs_ty).unwrap_or_else(|message| {
                    errors.push(SemanticError::new(message, line, Some(expr.column)));
                    Type::Unknown
                });
                (
                    ty,
                    AnnotatedNode::new("binary", line)
                        .with_value(op.as_str())
                        .with_type(ty)
                        .with_children(vec![lhs_node, rhs_node]),
                )
            }
            ExprKind::Call { name, args } => {
                let ident = Ident {
                    name: name.clone(),
                    line,
                    column: expr.column,
                };
                let (mut ty, children) = self.check_call(&ident, args, errors);
                if ty == Type::Void {
                    errors.push(SemanticError::new(
                        format!("void function '{}' used in an expression", name),
                        line,
                        Some(expr.column),
                    ));
                    ty = Type::Unknown;
                }
                (
                    ty,
                    AnnotatedNode::new("call", line)
                        .with_value(name.clone())
                        .with_type(ty)
                        .with_children(children),
                )
            }
        }
    }
}

fn identifier_node(ident: &Ident, ty: Type) -> AnnotatedNode {
    AnnotatedNode::new("identifier", ident.line)
        .with_value(ident.name.clone())
        .with_type(ty)
}

fn literal_text(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Int(value) => Some(value.to_string()),
        ExprKind::Float(value) => Some(value.to_string()),
        ExprKind::Bool(value) => Some(value.to_string()),
        ExprKind::Str(value) => Some(format!("\"{}\"", value)),
        _ => None,
    }
}
