//! dbu script interpreter
//!
//! Reads migration scripts made of plain SQL groups and `$` directives, and
//! runs them against a database through three injected collaborators: a
//! schema inspector answering existence questions, a command executor, and a
//! version store.
//!
//! ```text
//! script text
//!     ↓
//! Parser (line state machine, lexer + keyword tables for directive lines)
//!     ↓
//! Script (tokens with command slots)
//!     ↓
//! Evaluator (version gates, existence guards, dispatch)
//!     ↓
//! SchemaInspector / CommandExecutor / VersionStore
//! ```

pub mod catalog;
pub mod config;
pub mod console;
pub mod error;
pub mod evaluator;
pub mod fields;
pub mod keywords;
pub mod lexer;
pub mod parser;
pub mod state;
pub mod token;
pub mod types;
pub mod version;

pub use error::{CallbackError, DbuError, ParseError, RunError, ScriptError};
pub use evaluator::{CommandExecutor, Evaluator, Flow, SchemaInspector, VersionStore};
pub use parser::{Parser, Script};
pub use token::{Field, Token, TokenKind};
pub use version::{DbuVersion, VersionInfo};

use std::path::Path;

/// Parse script text; `path` is only used in error messages.
pub fn parse(source: &str, path: &Path) -> Result<Script, ParseError> {
    Parser::new(source, path).parse()
}
