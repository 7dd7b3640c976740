//! Application errors
use std::fmt;

#[derive(Debug)]
pub struct CliError {
    pub kind: ErrorKind,
}

impl CliError {
    pub fn invalid_conf(msg: impl ToString) -> Self {
        Self {
            kind: ErrorKind::InvalidConf(msg.to_string()),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Chip8(err) => Some(err),
            ErrorKind::Io(err) => Some(err),
            ErrorKind::Config(err) => Some(err),
            ErrorKind::InvalidConf(_) | ErrorKind::MachinePanic | ErrorKind::Usage => None,
        }
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    Chip8(chip8::prelude::Chip8Error),
    Io(std::io::Error),
    /// Configuration file could not be parsed.
    Config(serde_yaml::Error),
    /// Configuration parsed, but holds a value the host can't run with.
    InvalidConf(String),
    /// The machine thread panicked instead of returning.
    MachinePanic,
    Usage,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "application error: {}", self.kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chip8(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "configuration: {err}"),
            Self::InvalidConf(msg) => write!(f, "configuration: {msg}"),
            Self::MachinePanic => write!(f, "machine thread panicked"),
            Self::Usage => write!(f, "invalid command line arguments"),
        }
    }
}

impl From<chip8::prelude::Chip8Error> for CliError {
    fn from(err: chip8::prelude::Chip8Error) -> Self {
        Self {
            kind: ErrorKind::Chip8(err),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io(err),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self {
            kind: ErrorKind::Config(err),
        }
    }
}
