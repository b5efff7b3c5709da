pub mod ast;
mod expr;

use serde::Serialize;
use tracing::debug;

use crate::errors::{LexicalError, SyntaxError};
use crate::lexer::token::{Keyword, Operator, Punctuation, Token, TokenKind};
use crate::lexer::{lexical_errors, tokenize};
use ast::{Declarator, Ident, Param, Program, Stmt, StmtKind, TypeName};

type ParseResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutput {
    /// `None` only when the `main { ... }` header itself is missing.
    pub ast: Option<Program>,
    pub errors: Vec<SyntaxError>,
    pub lexical_errors: Vec<LexicalError>,
    pub success: bool,
}

/// Lexes and parses `source`. Lexical error tokens are reported in
/// `lexical_errors` and dropped before parsing.
pub fn parse(source: &str) -> ParseOutput {
    let tokens = tokenize(source);
    let lexical = lexical_errors(&tokens);
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|token| !token.kind.is_error())
        .collect();

    let mut parser = Parser::new(tokens);
    let ast = parser.parse_program();
    let errors = parser.errors;
    let success = ast.is_some() && errors.is_empty() && lexical.is_empty();
    debug!(
        syntax_errors = errors.len(),
        lexical_errors = lexical.len(),
        success,
        "parsed source"
    );

    ParseOutput {
        ast,
        errors,
        lexical_errors: lexical,
        success,
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<SyntaxError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column + t.lexeme.chars().count()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column));
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn parse_program(&mut self) -> Option<Program> {
        let line = self.peek().line;
        if !self.matches_keyword(Keyword::Main) {
            let err = self.error_at_current("expected 'main' at start of program");
            self.errors.push(err);
            return None;
        }
        if let Err(err) = self.consume_punct(Punctuation::LeftBrace, "expected '{' after 'main'") {
            self.errors.push(err);
            return None;
        }

        let body = self.statements_until(&[]);
        if let Err(err) = self.consume_punct(Punctuation::RightBrace, "expected '}' to close 'main'") {
            self.errors.push(err);
        } else if !self.is_at_end() {
            let err = self.error_at_current("unexpected input after end of program");
            self.errors.push(err);
        }

        Some(Program { body, line })
    }

    /// Parses statements until `}`, end of input or one of `terminators`,
    /// recovering from each malformed statement.
    fn statements_until(&mut self, terminators: &[Keyword]) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end()
            && !self.check_punct(Punctuation::RightBrace)
            && !terminators.iter().any(|k| self.check_keyword(*k))
        {
            let start = self.current;
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    debug!(line = err.line, column = err.column, "syntax error: {}", err.message);
                    self.errors.push(err);
                    self.synchronize(start);
                }
            }
        }
        statements
    }

    /// Panic-mode recovery: skip past the next `;`, or stop in front of a
    /// token that can start (or close) a statement. Consumes at least one
    /// token when the failed statement made no progress.
    fn synchronize(&mut self, start: usize) {
        if self.current == start && !self.is_at_end() {
            self.advance();
            if self.previous_is_punct(Punctuation::Semicolon) {
                return;
            }
        }

        while !self.is_at_end() {
            if self.previous_is_punct(Punctuation::Semicolon) && self.current > start {
                return;
            }
            if self.check_punct(Punctuation::RightBrace) || self.check_punct(Punctuation::LeftBrace) {
                return;
            }
            if let TokenKind::Reserved(keyword) = self.peek_kind() {
                if starts_statement(*keyword) {
                    return;
                }
            }
            self.advance();
        }
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        let token = self.peek().clone();
        let kind = match &token.kind {
            TokenKind::Reserved(keyword) => match keyword {
                Keyword::Int | Keyword::Float | Keyword::Bool | Keyword::String => {
                    self.declaration()?
                }
                Keyword::If => {
                    self.advance();
                    self.if_statement()?
                }
                Keyword::While => {
                    self.advance();
                    self.while_statement()?
                }
                Keyword::Do => {
                    self.advance();
                    self.do_statement()?
                }
                Keyword::Cin => {
                    self.advance();
                    self.input_statement()?
                }
                Keyword::Cout => {
                    self.advance();
                    self.output_statement()?
                }
                Keyword::Function => {
                    self.advance();
                    self.function_definition()?
                }
                Keyword::Return => {
                    self.advance();
                    self.return_statement()?
                }
                _ => {
                    return Err(self.error_at_current("expected statement"));
                }
            },
            TokenKind::Identifier(_) => self.identifier_statement()?,
            TokenKind::Punctuation(Punctuation::LeftBrace) => StmtKind::Block(self.block()?),
            _ => return Err(self.error_at_current("expected statement")),
        };

        Ok(Stmt {
            kind,
            line: token.line,
            column: token.column,
        })
    }

    fn declaration(&mut self) -> ParseResult<StmtKind> {
        let ty = self.type_name("expected type name")?;
        let mut declarators = Vec::new();
        loop {
            let name = self.consume_identifier("expected variable name in declaration")?;
            let initializer = if self.matches_operator(Operator::Equal) {
                Some(self.expression()?)
            } else {
                None
            };
            declarators.push(Declarator { name, initializer });

            if !self.matches_punct(Punctuation::Comma) {
                break;
            }
        }
        self.consume_punct(Punctuation::Semicolon, "expected ';' after declaration")?;
        Ok(StmtKind::Declaration { ty, declarators })
    }

    fn identifier_statement(&mut self) -> ParseResult<StmtKind> {
        let name = self.consume_identifier("expected identifier")?;
        if self.matches_punct(Punctuation::LeftParen) {
            let args = self.arguments()?;
            self.consume_punct(Punctuation::Semicolon, "expected ';' after call")?;
            return Ok(StmtKind::Call { name, args });
        }

        self.consume_operator(Operator::Equal, "expected '=' after identifier")?;
        let value = self.expression()?;
        self.consume_punct(Punctuation::Semicolon, "expected ';' after assignment")?;
        Ok(StmtKind::Assign {
            target: name,
            value,
        })
    }

    fn if_statement(&mut self) -> ParseResult<StmtKind> {
        let condition = self.expression()?;

        if self.matches_keyword(Keyword::Then) && !self.check_punct(Punctuation::LeftBrace) {
            let then_branch = self.statements_until(&[Keyword::Else, Keyword::End]);
            let else_branch = if self.matches_keyword(Keyword::Else) {
                Some(self.statements_until(&[Keyword::End]))
            } else {
                None
            };
            self.consume_keyword(Keyword::End, "expected 'end' to close 'if'")?;
            return Ok(StmtKind::If {
                condition,
                then_branch,
                else_branch,
            });
        }

        let then_branch = self.body()?;
        let else_branch = if self.matches_keyword(Keyword::Else) {
            Some(self.body()?)
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> ParseResult<StmtKind> {
        let condition = self.expression()?;

        if self.matches_keyword(Keyword::Then) && !self.check_punct(Punctuation::LeftBrace) {
            let body = self.statements_until(&[Keyword::End]);
            self.consume_keyword(Keyword::End, "expected 'end' to close 'while'")?;
            return Ok(StmtKind::While { condition, body });
        }

        let body = self.body()?;
        Ok(StmtKind::While { condition, body })
    }

    fn do_statement(&mut self) -> ParseResult<StmtKind> {
        let body = if self.check_punct(Punctuation::LeftBrace) {
            self.block()?
        } else {
            self.statements_until(&[Keyword::While, Keyword::Until])
        };

        let until = if self.matches_keyword(Keyword::Until) {
            true
        } else {
            self.consume_keyword(Keyword::While, "expected 'while' or 'until' after 'do' body")?;
            false
        };
        let condition = self.expression()?;
        self.consume_punct(Punctuation::Semicolon, "expected ';' after loop condition")?;
        Ok(StmtKind::DoLoop {
            body,
            condition,
            until,
        })
    }

    fn input_statement(&mut self) -> ParseResult<StmtKind> {
        let mut targets = Vec::new();
        self.consume_operator(Operator::ShiftRight, "expected '>>' after 'cin'")?;
        targets.push(self.consume_identifier("expected variable name after '>>'")?);
        while self.matches_operator(Operator::ShiftRight) {
            targets.push(self.consume_identifier("expected variable name after '>>'")?);
        }
        self.consume_punct(Punctuation::Semicolon, "expected ';' after input statement")?;
        Ok(StmtKind::Input { targets })
    }

    fn output_statement(&mut self) -> ParseResult<StmtKind> {
        let mut values = Vec::new();
        self.consume_operator(Operator::ShiftLeft, "expected '<<' after 'cout'")?;
        values.push(self.expression()?);
        while self.matches_operator(Operator::ShiftLeft) {
            values.push(self.expression()?);
        }
        self.consume_punct(Punctuation::Semicolon, "expected ';' after output statement")?;
        Ok(StmtKind::Output { values })
    }

    fn function_definition(&mut self) -> ParseResult<StmtKind> {
        let return_type = if self.matches_keyword(Keyword::Void) {
            None
        } else {
            Some(self.type_name("expected return type or 'void' after 'function'")?)
        };
        let name = self.consume_identifier("expected function name")?;
        self.consume_punct(Punctuation::LeftParen, "expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check_punct(Punctuation::RightParen) {
            loop {
                let ty = self.type_name("expected parameter type")?;
                let name = self.consume_identifier("expected parameter name")?;
                params.push(Param { name, ty });

                if !self.matches_punct(Punctuation::Comma) {
                    break;
                }
            }
        }
        self.consume_punct(Punctuation::RightParen, "expected ')' after parameter list")?;

        if !self.check_punct(Punctuation::LeftBrace) {
            return Err(self.error_at_current("expected '{' before function body"));
        }
        let body = self.block()?;
        Ok(StmtKind::FunctionDef {
            name,
            return_type,
            params,
            body,
        })
    }

    fn return_statement(&mut self) -> ParseResult<StmtKind> {
        if self.matches_punct(Punctuation::Semicolon) {
            return Ok(StmtKind::Return { value: None });
        }
        let value = self.expression()?;
        self.consume_punct(Punctuation::Semicolon, "expected ';' after return value")?;
        Ok(StmtKind::Return { value: Some(value) })
    }

    /// A braced block or a single statement.
    fn body(&mut self) -> ParseResult<Vec<Stmt>> {
        if self.check_punct(Punctuation::LeftBrace) {
            return self.block();
        }
        Ok(vec![self.statement()?])
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.consume_punct(Punctuation::LeftBrace, "expected '{'")?;
        let statements = self.statements_until(&[]);
        self.consume_punct(Punctuation::RightBrace, "expected '}' to close block")?;
        Ok(statements)
    }

    fn type_name(&mut self, message: &str) -> ParseResult<TypeName> {
        let ty = match self.peek_kind() {
            TokenKind::Reserved(Keyword::Int) => TypeName::Int,
            TokenKind::Reserved(Keyword::Float) => TypeName::Float,
            TokenKind::Reserved(Keyword::Bool) => TypeName::Bool,
            TokenKind::Reserved(Keyword::String) => TypeName::String,
            _ => return Err(self.error_at_current(message)),
        };
        self.advance();
        Ok(ty)
    }

    pub(crate) fn arguments(&mut self) -> ParseResult<Vec<ast::Expr>> {
        let mut args = Vec::new();
        if !self.check_punct(Punctuation::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.matches_punct(Punctuation::Comma) {
                    break;
                }
            }
        }
        self.consume_punct(Punctuation::RightParen, "expected ')' after arguments")?;
        Ok(args)
    }

    pub(crate) fn error_at_current(&self, message: &str) -> SyntaxError {
        let token = self.peek();
        let found = match &token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", token.lexeme),
        };
        SyntaxError::new(format!("{}, found {}", message, found), token.line, token.column)
    }

    pub(crate) fn matches_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume_keyword(&mut self, keyword: Keyword, message: &str) -> ParseResult<()> {
        if self.matches_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error_at_current(message))
        }
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek_kind(), TokenKind::Reserved(k) if *k == keyword)
    }

    pub(crate) fn matches_operator(&mut self, operator: Operator) -> bool {
        if matches!(self.peek_kind(), TokenKind::Operator(op) if *op == operator) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume_operator(&mut self, operator: Operator, message: &str) -> ParseResult<()> {
        if self.matches_operator(operator) {
            Ok(())
        } else {
            Err(self.error_at_current(message))
        }
    }

    pub(crate) fn check_punct(&self, punctuation: Punctuation) -> bool {
        matches!(self.peek_kind(), TokenKind::Punctuation(p) if *p == punctuation)
    }

    pub(crate) fn matches_punct(&mut self, punctuation: Punctuation) -> bool {
        if self.check_punct(punctuation) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume_punct(&mut self, punctuation: Punctuation, message: &str) -> ParseResult<()> {
        if self.matches_punct(punctuation) {
            Ok(())
        } else {
            Err(self.error_at_current(message))
        }
    }

    pub(crate) fn consume_identifier(&mut self, message: &str) -> ParseResult<Ident> {
        match self.peek_kind() {
            TokenKind::Identifier(name) => {
                let ident = Ident {
                    name: name.clone(),
                    line: self.peek().line,
                    column: self.peek().column,
                };
                self.advance();
                Ok(ident)
            }
            _ => Err(self.error_at_current(message)),
        }
    }

    fn previous_is_punct(&self, punctuation: Punctuation) -> bool {
        self.current > 0
            && matches!(self.previous().kind, TokenKind::Punctuation(p) if p == punctuation)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}

fn starts_statement(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::Int
            | Keyword::Float
            | Keyword::Bool
            | Keyword::String
            | Keyword::If
            | Keyword::Else
            | Keyword::End
            | Keyword::Do
            | Keyword::While
            | Keyword::Until
            | Keyword::Cin
            | Keyword::Cout
            | Keyword::Function
            | Keyword::Return
    )
}
