use thiserror::Error;

/// Malformed input at the character level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line}")]
pub struct ScanError {
    pub message: String,
    pub line: usize,
}

impl ScanError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self { message: message.into(), line }
    }
}

/// A grammar expectation that was not met. Parsing stops at the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self { message: message.into(), line }
    }
}

/// A contract violation found while executing. Carries no line number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TielError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl TielError {
    /// Short tag naming the phase that failed.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scan(_) => "ScanError",
            Self::Parse(_) => "ParseError",
            Self::Runtime(_) => "RuntimeError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Scan(e) => &e.message,
            Self::Parse(e) => &e.message,
            Self::Runtime(e) => &e.message,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Scan(e) => Some(e.line),
            Self::Parse(e) => Some(e.line),
            Self::Runtime(_) => None,
        }
    }
}
