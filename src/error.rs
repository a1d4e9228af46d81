use crate::token::TokenKind;
use std::path::PathBuf;
use thiserror::Error;

/// Error type returned by injected collaborators.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DbuError {
    #[error("FileNotFoundError: {0}")]
    FileNotFound(String),
    #[error("IOError: {0}")]
    IO(#[from] std::io::Error),
    #[error("ConfigError: {0}")]
    Config(#[from] serde_json::Error),
    #[error("ParseError: {0}")]
    Parse(#[from] ParseError),
    #[error("RunError: {0}")]
    Run(#[from] RunError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("bad token {text:?}\n  --> {}:{line}", path.display())]
    UnknownDirective {
        path: PathBuf,
        line: usize,
        text: String,
    },
    #[error("{directive} block is never closed\n  --> {}:{line}", path.display())]
    UnterminatedBlock {
        path: PathBuf,
        line: usize,
        directive: String,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnknownDirective { line, .. } | ParseError::UnterminatedBlock { line, .. } => {
                *line
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("wrong database: script targets {found:?}, database belongs to {expected:?}")]
    WrongApplication { expected: String, found: String },

    #[error("bad version literal {value:?}, expected major.minor")]
    BadVersionLiteral { value: String },

    #[error("$lastdbu {declared} is older than the current version {current}")]
    VersionRegression { declared: String, current: String },

    #[error("$dbu_version {op} {required} does not hold for current version {current}")]
    VersionGateFailed {
        op: TokenKind,
        required: String,
        current: String,
    },

    #[error("bad object {object} in guard for {name:?}")]
    BadGuardObject { object: TokenKind, name: String },

    #[error("bad operator {op} for {directive}")]
    BadGuardOperator { directive: String, op: TokenKind },

    #[error("executor failed: {0}")]
    Executor(#[source] CallbackError),

    #[error("saving version failed: {0}")]
    SaveVersion(#[source] CallbackError),
}

/// Failure of a whole run, with the statement counter it stopped at.
#[derive(Debug, Error)]
#[error("statement #{statement}: {source}")]
pub struct RunError {
    pub statement: usize,
    #[source]
    pub source: ScriptError,
}

impl RunError {
    pub fn new(statement: usize, source: ScriptError) -> Self {
        Self { statement, source }
    }
}
