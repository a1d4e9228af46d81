//! Keyword tables.
//!
//! A single list of `(text, kind, scope)` triples drives both lookups: the
//! directive table (`$`-words and operators) and the SQL keyword table used
//! when classifying directive arguments.

use crate::token::TokenKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Directive,
    Sql,
    Both,
}

impl Scope {
    fn directive(self) -> bool {
        matches!(self, Scope::Directive | Scope::Both)
    }

    fn sql(self) -> bool {
        matches!(self, Scope::Sql | Scope::Both)
    }
}

pub const KEYWORDS: &[(&str, TokenKind, Scope)] = &[
    ("$ie", TokenKind::OneIf, Scope::Directive),
    ("$ine", TokenKind::OneNotIf, Scope::Directive),
    ("$if", TokenKind::If, Scope::Directive),
    ("$fi", TokenKind::Fi, Scope::Directive),
    ("$endif", TokenKind::Fi, Scope::Directive),
    ("$ecv_start", TokenKind::EcvStart, Scope::Directive),
    ("$ecv", TokenKind::EcvStart, Scope::Directive),
    ("$ecv_stop", TokenKind::EcvStop, Scope::Directive),
    ("$dbu_start", TokenKind::DbuStart, Scope::Directive),
    ("$dbu_end", TokenKind::DbuEnd, Scope::Directive),
    ("$lastdbu", TokenKind::DbuLast, Scope::Directive),
    ("$dbu", TokenKind::Dbu, Scope::Directive),
    ("$show", TokenKind::Show, Scope::Directive),
    ("$noshow", TokenKind::NoShow, Scope::Directive),
    ("$set", TokenKind::Set, Scope::Directive),
    ("$hide", TokenKind::Hide, Scope::Directive),
    ("$nohide", TokenKind::NoHide, Scope::Directive),
    ("$exit", TokenKind::Exit, Scope::Directive),
    ("$echo", TokenKind::Echo, Scope::Directive),
    ("$drop", TokenKind::Drop, Scope::Directive),
    ("$app_version", TokenKind::AppVersion, Scope::Directive),
    ("$dbu_version", TokenKind::DbuVersion, Scope::Directive),
    ("#", TokenKind::Comment, Scope::Directive),
    ("//", TokenKind::Comment, Scope::Directive),
    ("&&", TokenKind::Eol, Scope::Directive),
    ("exist", TokenKind::Exist, Scope::Directive),
    ("recreate", TokenKind::Recreate, Scope::Directive),
    ("field", TokenKind::Field, Scope::Directive),
    ("!", TokenKind::Not, Scope::Directive),
    ("!=", TokenKind::Ne, Scope::Directive),
    ("=", TokenKind::Eq, Scope::Directive),
    (">", TokenKind::Gt, Scope::Directive),
    ("<", TokenKind::Lt, Scope::Directive),
    (">=", TokenKind::Ge, Scope::Directive),
    ("<=", TokenKind::Le, Scope::Directive),
    ("(", TokenKind::BracketOpen, Scope::Both),
    (")", TokenKind::BracketClose, Scope::Both),
    ("add", TokenKind::Add, Scope::Sql),
    ("exists", TokenKind::Exist, Scope::Sql),
    ("not", TokenKind::Not, Scope::Sql),
    ("table", TokenKind::Table, Scope::Sql),
    ("column", TokenKind::Field, Scope::Sql),
    ("modify", TokenKind::Modify, Scope::Sql),
    ("alter", TokenKind::Alter, Scope::Sql),
    ("rename", TokenKind::Rename, Scope::Sql),
    ("procedure", TokenKind::Procedure, Scope::Sql),
    ("function", TokenKind::Function, Scope::Sql),
    ("index", TokenKind::Index, Scope::Sql),
    ("trigger", TokenKind::Trigger, Scope::Sql),
    ("exception", TokenKind::Exception, Scope::Sql),
    ("domain", TokenKind::Domain, Scope::Sql),
    ("on", TokenKind::On, Scope::Sql),
    ("to", TokenKind::To, Scope::Sql),
    ("first", TokenKind::First, Scope::Sql),
    ("after", TokenKind::After, Scope::Sql),
    ("create", TokenKind::Create, Scope::Sql),
    ("drop", TokenKind::Drop, Scope::Sql),
    ("select", TokenKind::Select, Scope::Sql),
    ("update", TokenKind::Update, Scope::Sql),
    ("delete", TokenKind::Delete, Scope::Sql),
    ("ascending", TokenKind::Ascending, Scope::Sql),
    ("descending", TokenKind::Descending, Scope::Sql),
    ("primary", TokenKind::Primary, Scope::Sql),
    ("foreign", TokenKind::Foreign, Scope::Sql),
    ("unique", TokenKind::Unique, Scope::Sql),
    ("key", TokenKind::Key, Scope::Sql),
    ("if", TokenKind::If, Scope::Sql),
];

static DIRECTIVES: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| table(Scope::directive));

static SQL: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| table(Scope::sql));

fn table(applies: fn(Scope) -> bool) -> HashMap<&'static str, TokenKind> {
    KEYWORDS
        .iter()
        .filter(|(_, _, scope)| applies(*scope))
        .map(|&(text, kind, _)| (text, kind))
        .collect()
}

/// Look up a directive keyword or operator, case-insensitively.
pub fn directive(word: &str) -> Option<TokenKind> {
    DIRECTIVES.get(word.to_lowercase().as_str()).copied()
}

/// Look up a SQL keyword, case-insensitively.
pub fn sql(word: &str) -> Option<TokenKind> {
    SQL.get(word.to_lowercase().as_str()).copied()
}

/// Classify a directive argument: directive table first, then SQL keywords,
/// otherwise a plain identifier or literal.
pub fn classify(word: &str) -> TokenKind {
    directive(word).or_else(|| sql(word)).unwrap_or(TokenKind::None)
}
