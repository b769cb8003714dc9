use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub ln: usize,
    pub col: usize,
}

impl Pos {
    pub const START: Pos = Pos { ln: 1, col: 1 };

    pub(crate) fn step(self, c: u8) -> Pos {
        if c == b'\n' {
            Pos {
                ln: self.ln + 1,
                col: 1,
            }
        } else {
            Pos {
                ln: self.ln,
                col: self.col + 1,
            }
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ln, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Lexical,
    Syntactic,
    Semantic,
    Io,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}: unterminated string")]
    UnterminatedString(Pos),
    #[error("{0}: unterminated block comment")]
    UnterminatedComment(Pos),
    #[error("{0}: unexpected char {1:?}")]
    UnexpectedChar(Pos, char),
    #[error("{0}: string constant is not valid UTF-8")]
    InvalidString(Pos),
    #[error("{pos}: expected {expected}, got {found}")]
    UnexpectedToken {
        pos: Pos,
        expected: String,
        found: String,
    },
    #[error("{pos}: {source}")]
    Redefined {
        pos: Pos,
        #[source]
        source: AlreadyDefined,
    },
    #[error("{pos}: variable {name} undefined")]
    Undefined { pos: Pos, name: String },
    #[error("{pos}: integer constant {value} out of range")]
    IntOutOfRange { pos: Pos, value: u32 },
    #[error("{pos}: character {ch:?} out of range")]
    CharOutOfRange { pos: Pos, ch: char },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::UnterminatedString(_)
            | Error::UnterminatedComment(_)
            | Error::UnexpectedChar(_, _)
            | Error::InvalidString(_) => ErrorClass::Lexical,
            Error::UnexpectedToken { .. } => ErrorClass::Syntactic,
            Error::Redefined { .. }
            | Error::Undefined { .. }
            | Error::IntOutOfRange { .. }
            | Error::CharOutOfRange { .. } => ErrorClass::Semantic,
            Error::Io(_) => ErrorClass::Io,
        }
    }

    pub fn pos(&self) -> Option<Pos> {
        match self {
            Error::UnterminatedString(pos)
            | Error::UnterminatedComment(pos)
            | Error::UnexpectedChar(pos, _)
            | Error::InvalidString(pos)
            | Error::UnexpectedToken { pos, .. }
            | Error::Redefined { pos, .. }
            | Error::Undefined { pos, .. }
            | Error::IntOutOfRange { pos, .. }
            | Error::CharOutOfRange { pos, .. } => Some(*pos),
            Error::Io(_) => None,
        }
    }
}

/// Raised by a scope table when a name is defined twice.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("identifier '{0}' already defined")]
pub struct AlreadyDefined(pub String);
