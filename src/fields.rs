//! Read-only views over a directive token's field list.
//!
//! Fields are scanned once, left to right. Missing fields leave the
//! corresponding value at its default.

use crate::token::{Token, TokenKind};

/// `$app_version = app`, `$dbu_version >= 3.4`, `$lastdbu 3.6`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub op: TokenKind,
    pub value: String,
}

/// `$if [!|not] exist[s] <object> <name>`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExistGuard {
    pub op: TokenKind,
    pub negate: bool,
    pub object: TokenKind,
    pub name: String,
}

/// `$ie|$ine <create|drop> ... <object> <name> [on <table>] ...`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OneLineGuard {
    pub action: TokenKind,
    pub object: TokenKind,
    pub name: String,
}

impl Token {
    pub fn key_value(&self) -> KeyValue {
        let mut kv = KeyValue::default();

        for (i, field) in self.fields.iter().enumerate() {
            if i == 0 && field.kind.is_operator() {
                kv.op = field.kind;
                continue;
            }
            if !field.kind.is_operator() {
                kv.value = field.text.clone();
                break;
            }
        }

        kv
    }

    pub fn exist_guard(&self) -> ExistGuard {
        let mut guard = ExistGuard::default();

        for field in &self.fields {
            match field.kind {
                kind if kind.is_schema_object() => guard.object = kind,
                TokenKind::Not => guard.negate = true,
                TokenKind::Exist => guard.op = TokenKind::Exist,
                TokenKind::None if guard.name.is_empty() => guard.name = field.text.clone(),
                _ => {}
            }
        }

        guard
    }

    pub fn one_line_guard(&self) -> OneLineGuard {
        let mut guard = OneLineGuard::default();
        let mut table = String::new();
        let mut seen_on = 0;

        for field in &self.fields {
            match field.kind {
                kind if kind.is_schema_object() => guard.object = kind,
                TokenKind::Create | TokenKind::Drop => guard.action = field.kind,
                TokenKind::On => seen_on += 1,
                TokenKind::None => {
                    if seen_on == 0 && guard.name.is_empty() {
                        guard.name = field.text.clone();
                    } else if seen_on == 1 && table.is_empty() {
                        table = field.text.clone();
                    }
                }
                _ => {}
            }
        }

        if !table.is_empty() {
            guard.name = format!("{}.{}", table, guard.name);
        }

        guard
    }
}
