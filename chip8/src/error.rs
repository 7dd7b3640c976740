//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
};

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug)]
pub enum Chip8Error {
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram,
    /// Subroutine call while all stack slots are taken.
    StackOverflow,
    /// Subroutine return with an empty call stack.
    StackUnderflow,
    /// Fontset data does not fit in the reserved glyph area.
    Font(String),
    /// Malformed token in a hexadecimal program image.
    HexToken {
        /// One-based position of the token in the image.
        position: usize,
        token: String,
        kind: HexTokenKind,
    },
    Io(io::Error),
    Fmt(fmt::Error),
}

/// Reason a program image token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexTokenKind {
    /// Token is not exactly 4 characters.
    Length,
    /// Token contains a character that is not a hexadecimal digit.
    Digit,
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeProgram => write!(f, "program too large for VM memory"),
            Self::StackOverflow => write!(f, "call stack overflow"),
            Self::StackUnderflow => write!(f, "call stack underflow"),
            Self::Font(msg) => write!(f, "font error: {}", msg),
            Self::HexToken {
                position,
                token,
                kind,
            } => match kind {
                HexTokenKind::Length => write!(
                    f,
                    "unexpected word length at token {position}: {token:?} must be 4 characters"
                ),
                HexTokenKind::Digit => write!(
                    f,
                    "failed to decode word at token {position}: {token:?} is not hexadecimal"
                ),
            },
            Self::Io(err) => write!(f, "{}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Fmt(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Chip8Error {
    fn from(err: io::Error) -> Self {
        Chip8Error::Io(err)
    }
}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}
