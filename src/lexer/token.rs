use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Keyword {
    If,
    Else,
    End,
    Do,
    While,
    Switch,
    Case,
    Int,
    Float,
    Main,
    Cin,
    Cout,
    Then,
    Until,
    True,
    False,
    Bool,
    String,
    Function,
    Return,
    Void,
    Params,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "end" => Keyword::End,
            "do" => Keyword::Do,
            "while" => Keyword::While,
            "switch" => Keyword::Switch,
            "case" => Keyword::Case,
            "int" => Keyword::Int,
            "float" => Keyword::Float,
            "main" => Keyword::Main,
            "cin" => Keyword::Cin,
            "cout" => Keyword::Cout,
            "then" => Keyword::Then,
            "until" => Keyword::Until,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "bool" => Keyword::Bool,
            "string" => Keyword::String,
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "void" => Keyword::Void,
            "params" => Keyword::Params,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::Do => "do",
            Keyword::While => "while",
            Keyword::Switch => "switch",
            Keyword::Case => "case",
            Keyword::Int => "int",
            Keyword::Float => "float",
            Keyword::Main => "main",
            Keyword::Cin => "cin",
            Keyword::Cout => "cout",
            Keyword::Then => "then",
            Keyword::Until => "until",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Bool => "bool",
            Keyword::String => "string",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::Void => "void",
            Keyword::Params => "params",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    Equal,
    AndAnd,
    OrOr,
    Bang,
    ShiftLeft,
    ShiftRight,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Caret => "^",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::EqualEqual => "==",
            Operator::BangEqual => "!=",
            Operator::Equal => "=",
            Operator::AndAnd => "&&",
            Operator::OrOr => "||",
            Operator::Bang => "!",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Punctuation {
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Colon,
}

impl Punctuation {
    pub fn as_str(self) -> &'static str {
        match self {
            Punctuation::LeftParen => "(",
            Punctuation::RightParen => ")",
            Punctuation::LeftBrace => "{",
            Punctuation::RightBrace => "}",
            Punctuation::Comma => ",",
            Punctuation::Semicolon => ";",
            Punctuation::Colon => ":",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    Reserved(Keyword),
    Identifier(String),
    Integer(i64),
    Real(f64),
    Str(String),
    Operator(Operator),
    Punctuation(Punctuation),
    /// Malformed input. `column`/`length` narrow the report to the
    /// offending characters inside the lexeme.
    Error {
        message: String,
        column: usize,
        length: usize,
    },
    Eof,
}

impl TokenKind {
    pub fn is_error(&self) -> bool {
        matches!(self, TokenKind::Error { .. })
    }

    /// Short category name, as shown in token listings.
    pub fn category(&self) -> &'static str {
        match self {
            TokenKind::Reserved(_) => "reserved",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Integer(_) => "integer",
            TokenKind::Real(_) => "real",
            TokenKind::Str(_) => "string",
            TokenKind::Operator(_) => "operator",
            TokenKind::Punctuation(_) => "punctuation",
            TokenKind::Error { .. } => "error",
            TokenKind::Eof => "eof",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Self {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4}:{:<4} {:<12} {}",
            self.line,
            self.column,
            self.kind.category(),
            self.lexeme
        )
    }
}
