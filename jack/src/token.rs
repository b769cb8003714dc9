use std::fmt;

use crate::error::Pos;

pub const SYMBOLS: &[u8] = b"{}()[].,;+-*/&|<>=~_";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Keyword {
    Class,
    Constructor,
    Method,
    Function,
    Int,
    Boolean,
    Char,
    Void,
    Var,
    Static,
    Field,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
    True,
    False,
    Null,
    This,
}

impl Keyword {
    pub const ALL: [Keyword; 21] = [
        Keyword::Class,
        Keyword::Constructor,
        Keyword::Method,
        Keyword::Function,
        Keyword::Int,
        Keyword::Boolean,
        Keyword::Char,
        Keyword::Void,
        Keyword::Var,
        Keyword::Static,
        Keyword::Field,
        Keyword::Let,
        Keyword::Do,
        Keyword::If,
        Keyword::Else,
        Keyword::While,
        Keyword::Return,
        Keyword::True,
        Keyword::False,
        Keyword::Null,
        Keyword::This,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Method => "method",
            Keyword::Function => "function",
            Keyword::Int => "int",
            Keyword::Boolean => "boolean",
            Keyword::Char => "char",
            Keyword::Void => "void",
            Keyword::Var => "var",
            Keyword::Static => "static",
            Keyword::Field => "field",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
        }
    }
}

/// A classified token. Exactly one payload per kind.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    Keyword(Keyword),
    Symbol(char),
    Ident(String),
    IntConst(u32),
    StringConst(String),
}

impl Token {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Token::Keyword(_) => "keyword",
            Token::Symbol(_) => "symbol",
            Token::Ident(_) => "identifier",
            Token::IntConst(_) => "integer",
            Token::StringConst(_) => "string",
        }
    }

    pub fn is_symbol(&self, c: char) -> bool {
        matches!(self, Token::Symbol(s) if *s == c)
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == kw)
    }
}

/// Textual form, as it appears in the source (string constants without quotes).
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(kw) => f.write_str(kw.as_str()),
            Token::Symbol(c) => write!(f, "{}", c),
            Token::Ident(name) => f.write_str(name),
            Token::IntConst(n) => write!(f, "{}", n),
            Token::StringConst(s) => f.write_str(s),
        }
    }
}

/// Describes a token (or the lack of one) for error messages.
pub fn describe(tok: Option<&Token>) -> String {
    match tok {
        None => "end of input".to_string(),
        Some(Token::StringConst(s)) => format!("string \"{}\"", s),
        Some(tok) => format!("{} '{}'", tok.kind_str(), tok),
    }
}

/// A token with the position of its first character.
#[derive(Clone, Debug)]
pub struct Lexeme {
    pub tok: Token,
    pub pos: Pos,
}
