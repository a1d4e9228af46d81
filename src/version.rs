//! Schema version numbers.
//!
//! Versions are written `major.minor` in scripts and stored as
//! `major * 100 + minor`.

use crate::error::ScriptError;
use crate::token::TokenKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static VERSION_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,7})\.(\d{1,2})\s*$").expect("version literal pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DbuVersion {
    pub major: u32,
    pub minor: u32,
}

impl DbuVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn parse(literal: &str) -> Result<Self, ScriptError> {
        let bad = || ScriptError::BadVersionLiteral {
            value: literal.to_string(),
        };

        let captures = VERSION_LITERAL.captures(literal).ok_or_else(bad)?;
        let major = captures[1].parse().map_err(|_| bad())?;
        let minor = captures[2].parse().map_err(|_| bad())?;

        Ok(Self { major, minor })
    }

    pub fn encode(self) -> u32 {
        self.major * 100 + self.minor
    }

    pub fn decode(encoded: u32) -> Self {
        Self {
            major: encoded / 100,
            minor: encoded % 100,
        }
    }

    /// `self` is exactly one step ahead of `current`: the next minor of the
    /// same major, or minor 0 of the next major.
    pub fn is_next_after(self, current: u32) -> bool {
        let current = Self::decode(current);
        let next_minor = current.major == self.major && current.minor + 1 == self.minor;
        let next_major = current.major + 1 == self.major && self.minor == 0;
        next_minor || next_major
    }

    /// Evaluate a `$dbu_version` gate. Operators other than `=`, `>` and
    /// `>=` yield `None`.
    pub fn gate(self, op: TokenKind, current: u32) -> Option<bool> {
        match op {
            TokenKind::Eq => Some(current == self.encode()),
            TokenKind::Gt => Some(self.is_next_after(current)),
            TokenKind::Ge => Some(current == self.encode() || self.is_next_after(current)),
            _ => None,
        }
    }
}

impl fmt::Display for DbuVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Version state of the target database for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Stored schema version, `major * 100 + minor`.
    #[serde(default)]
    pub version: u32,
    /// Application the database belongs to.
    #[serde(default = "default_app")]
    pub app: String,
    #[serde(default)]
    pub change: String,
    #[serde(default)]
    pub show: bool,
    #[serde(default = "default_hide")]
    pub hide: bool,
}

fn default_app() -> String {
    String::from("none")
}

fn default_hide() -> bool {
    true
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            version: 0,
            app: default_app(),
            change: String::new(),
            show: false,
            hide: default_hide(),
        }
    }
}

impl VersionInfo {
    pub fn new(version: u32, app: impl Into<String>) -> Self {
        Self {
            version,
            app: app.into(),
            ..Self::default()
        }
    }

    pub fn dbu(&self) -> DbuVersion {
        DbuVersion::decode(self.version)
    }
}
