pub mod token;

use tracing::debug;

use crate::errors::LexicalError;
use token::{Keyword, Operator, Punctuation, Token, TokenKind};

/// Scans `source` into tokens. Never fails: malformed input becomes
/// `TokenKind::Error` tokens and scanning resumes right after them.
/// The returned vector always ends with `TokenKind::Eof`.
pub fn tokenize(source: &str) -> Vec<Token> {
    let tokens = Lexer::new(source).lex();
    debug!(
        tokens = tokens.len(),
        errors = tokens.iter().filter(|t| t.kind.is_error()).count(),
        "lexed source"
    );
    tokens
}

/// Projects the error tokens of a token stream into diagnostics.
pub fn lexical_errors(tokens: &[Token]) -> Vec<LexicalError> {
    tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Error {
                message,
                column,
                length,
            } => Some(LexicalError {
                message: message.clone(),
                line: token.line,
                column: *column,
                length: *length,
            }),
            _ => None,
        })
        .collect()
}

struct Lexer {
    chars: Vec<char>,
    current: usize,
    start: usize,
    line: usize,
    column: usize,
    token_line: usize,
    token_column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            current: 0,
            start: 0,
            line: 1,
            column: 1,
            token_line: 1,
            token_column: 1,
            tokens: Vec::new(),
        }
    }

    fn lex(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start_token();
            self.scan_token();
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_punctuation(Punctuation::LeftParen),
            ')' => self.add_punctuation(Punctuation::RightParen),
            '{' => self.add_punctuation(Punctuation::LeftBrace),
            '}' => self.add_punctuation(Punctuation::RightBrace),
            ',' => self.add_punctuation(Punctuation::Comma),
            ';' => self.add_punctuation(Punctuation::Semicolon),
            ':' => self.add_punctuation(Punctuation::Colon),
            '+' => self.add_operator(Operator::Plus),
            '-' => self.add_operator(Operator::Minus),
            '*' => self.add_operator(Operator::Star),
            '%' => self.add_operator(Operator::Percent),
            '^' => self.add_operator(Operator::Caret),
            '!' => {
                if self.matches('=') {
                    self.add_operator(Operator::BangEqual);
                } else {
                    self.add_operator(Operator::Bang);
                }
            }
            '=' => {
                if self.matches('=') {
                    self.add_operator(Operator::EqualEqual);
                } else {
                    self.add_operator(Operator::Equal);
                }
            }
            '<' => {
                if self.matches('=') {
                    self.add_operator(Operator::LessEqual);
                } else if self.matches('<') {
                    self.add_operator(Operator::ShiftLeft);
                } else {
                    self.add_operator(Operator::Less);
                }
            }
            '>' => {
                if self.matches('=') {
                    self.add_operator(Operator::GreaterEqual);
                } else if self.matches('>') {
                    self.add_operator(Operator::ShiftRight);
                } else {
                    self.add_operator(Operator::Greater);
                }
            }
            '&' => {
                if self.matches('&') {
                    self.add_operator(Operator::AndAnd);
                } else {
                    self.add_error("expected '&&'", self.token_column, 1);
                }
            }
            '|' => {
                if self.matches('|') {
                    self.add_operator(Operator::OrOr);
                } else {
                    self.add_error("expected '||'", self.token_column, 1);
                }
            }
            '/' => {
                if self.matches('/') {
                    self.skip_line_comment();
                } else if self.matches('*') {
                    self.skip_block_comment();
                } else {
                    self.add_operator(Operator::Slash);
                }
            }
            '"' => self.string(),
            ' ' | '\r' | '\t' | '\n' => {}
            d if d.is_ascii_digit() => self.number(),
            a if is_ident_start(a) => self.identifier(),
            other => {
                self.add_error(
                    format!("unexpected character '{}'", other),
                    self.token_column,
                    1,
                );
            }
        }
    }

    fn string(&mut self) {
        let mut value = String::new();
        while !self.is_at_end() && self.peek() != '\n' {
            let c = self.advance();
            match c {
                '"' => {
                    self.add_token(TokenKind::Str(value));
                    return;
                }
                '\\' => {
                    if self.is_at_end() || self.peek() == '\n' {
                        break;
                    }
                    match self.advance() {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                }
                _ => value.push(c),
            }
        }

        self.add_error("unterminated string literal", self.token_column, 1);
    }

    /// Numbers are scanned greedily over every character that could belong
    /// to a number or an identifier so that `12abc` and `34.34.34` surface
    /// as a single error token instead of several valid ones.
    fn number(&mut self) {
        while is_ident_continue(self.peek()) || self.peek() == '.' {
            self.advance();
        }

        let lexeme: Vec<char> = self.chars[self.start..self.current].to_vec();
        let mut first_dot = None;
        for (offset, c) in lexeme.iter().enumerate() {
            if *c == '.' {
                if first_dot.is_some() {
                    self.add_error(
                        "more than one decimal point in number",
                        self.token_column + offset,
                        1,
                    );
                    return;
                }
                first_dot = Some(offset);
            } else if !c.is_ascii_digit() {
                let length = lexeme[offset..]
                    .iter()
                    .take_while(|ch| is_ident_continue(**ch))
                    .count();
                self.add_error(
                    format!(
                        "invalid character '{}' in numeric literal",
                        c
                    ),
                    self.token_column + offset,
                    length,
                );
                return;
            }
        }

        if let Some(dot) = first_dot {
            if dot + 1 == lexeme.len() {
                self.add_error(
                    "expected digits after decimal point",
                    self.token_column + dot,
                    1,
                );
                return;
            }
        }

        let text = self.current_lexeme();
        if first_dot.is_some() {
            match text.parse::<f64>() {
                Ok(value) => self.add_token(TokenKind::Real(value)),
                Err(_) => self.add_error(
                    format!("invalid real literal '{}'", text),
                    self.token_column,
                    lexeme.len(),
                ),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.add_token(TokenKind::Integer(value)),
                Err(_) => self.add_error(
                    format!("integer literal '{}' is out of range", text),
                    self.token_column,
                    lexeme.len(),
                ),
            }
        }
    }

    fn identifier(&mut self) {
        while is_ident_continue(self.peek()) {
            self.advance();
        }

        let lexeme = self.current_lexeme();
        let kind = match Keyword::from_word(&lexeme) {
            Some(keyword) => TokenKind::Reserved(keyword),
            None => TokenKind::Identifier(lexeme),
        };
        self.add_token(kind);
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }

        let lexeme = "/*".to_string();
        self.tokens.push(Token::new(
            TokenKind::Error {
                message: "unterminated block comment".to_string(),
                column: self.token_column,
                length: 2,
            },
            lexeme,
            self.token_line,
            self.token_column,
        ));
    }

    fn add_operator(&mut self, operator: Operator) {
        self.add_token(TokenKind::Operator(operator));
    }

    fn add_punctuation(&mut self, punctuation: Punctuation) {
        self.add_token(TokenKind::Punctuation(punctuation));
    }

    fn add_error(&mut self, message: impl Into<String>, column: usize, length: usize) {
        self.add_token(TokenKind::Error {
            message: message.into(),
            column,
            length,
        });
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.current_lexeme();
        self.tokens
            .push(Token::new(kind, lexeme, self.token_line, self.token_column));
    }

    fn start_token(&mut self) {
        self.start = self.current;
        self.token_line = self.line;
        self.token_column = self.column;
    }

    fn current_lexeme(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.current + 1]
        }
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}
