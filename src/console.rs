//! Executor that prints the commands a run would send to the database.

use crate::error::CallbackError;
use crate::evaluator::{CommandExecutor, Flow};
use crate::lexer::skip_leading_word;
use crate::token::TokenKind;
use crate::types::ColumnType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, info};

static COLUMN_SPEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)\s*(?:\[\s*(\w+)\s*\])?\s*$").expect("column spec pattern"));

pub struct ConsoleExecutor<W> {
    out: W,
    variables: BTreeMap<String, String>,
    executed: usize,
}

impl<W: Write> ConsoleExecutor<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            variables: BTreeMap::new(),
            executed: 0,
        }
    }

    /// Values assigned with `$set @name value`.
    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Number of statements printed as SQL.
    pub fn executed(&self) -> usize {
        self.executed
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn sql(&mut self, statement: &str) -> Result<(), CallbackError> {
        self.executed += 1;
        writeln!(self.out, "{};", statement)?;
        Ok(())
    }
}

/// `add field T.C <type...>` as `alter table T add C <type...>`.
pub fn rewrite_add_field(command: &str) -> Option<String> {
    let words: Vec<&str> = command.split_whitespace().collect();
    match words.as_slice() {
        [_, field, target, rest @ ..] if field.eq_ignore_ascii_case("field") && !rest.is_empty() => {
            let (table, column) = target.split_once('.')?;
            if table.is_empty() || column.is_empty() || column.contains('.') {
                return None;
            }
            Some(format!("alter table {} add {} {}", table, column, rest.join(" ")))
        }
        _ => None,
    }
}

/// Text after the leading directive word.
fn argument(command: &str) -> &str {
    command[skip_leading_word(command)..].trim()
}

fn literal(column: ColumnType, raw: &str) -> String {
    let value = column.clean(raw);
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        String::from("NULL")
    } else if column.is_integer() {
        value
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Turn a verbatim block into insert statements.
///
/// The first line names the table and columns, `@TABLE,COL[type],...`; every
/// following line holds one comma separated row.
pub fn verbatim_inserts(lines: &[String]) -> Result<Vec<String>, CallbackError> {
    let (header, rows) = lines
        .split_first()
        .ok_or("empty verbatim block")?;
    let header = header
        .strip_prefix('@')
        .ok_or_else(|| format!("verbatim block must start with @table, found {:?}", header))?;

    let mut parts = header.split(',');
    let table = parts.next().unwrap_or_default().trim();
    if table.is_empty() {
        return Err("verbatim header names no table".into());
    }

    let mut names = Vec::new();
    let mut types = Vec::new();
    for spec in parts {
        let captures = COLUMN_SPEC
            .captures(spec)
            .ok_or_else(|| format!("bad column {:?} in verbatim header", spec))?;
        names.push(captures[1].to_string());
        types.push(
            captures
                .get(2)
                .map_or(ColumnType::Other, |t| ColumnType::classify(t.as_str())),
        );
    }

    let mut inserts = Vec::with_capacity(rows.len());
    for row in rows {
        let values: Vec<&str> = row.split(',').collect();
        if values.len() != names.len() {
            return Err(format!(
                "row {:?} has {} values for {} columns",
                row,
                values.len(),
                names.len()
            )
            .into());
        }

        let literals: Vec<String> = types
            .iter()
            .zip(values)
            .map(|(column, raw)| literal(*column, raw))
            .collect();
        inserts.push(format!(
            "insert into {} ({}) values ({})",
            table,
            names.join(", "),
            literals.join(", ")
        ));
    }

    Ok(inserts)
}

impl<W: Write> CommandExecutor for ConsoleExecutor<W> {
    fn execute(&mut self, command: TokenKind, slot: usize, text: &str) -> Result<Flow, CallbackError> {
        debug!(%command, slot, "console command");

        match command {
            TokenKind::Exit => {
                writeln!(self.out, "-- exit")?;
                return Ok(Flow::Stop);
            }
            TokenKind::Echo => {
                writeln!(self.out, "{}", argument(text))?;
            }
            TokenKind::Set => match argument(text).strip_prefix('@') {
                Some(assignment) => {
                    let (name, value) = assignment
                        .split_once(char::is_whitespace)
                        .map_or((assignment, ""), |(n, v)| (n, v.trim()));
                    info!(name, value, "set variable");
                    self.variables.insert(name.to_string(), value.to_string());
                }
                None => self.sql(text)?,
            },
            TokenKind::Dbu | TokenKind::DbuStart | TokenKind::DbuEnd => {
                writeln!(self.out, "-- {}", text)?;
            }
            TokenKind::Add => match rewrite_add_field(text) {
                Some(statement) => self.sql(&statement)?,
                None => self.sql(text)?,
            },
            _ if text.starts_with('$') => self.sql(&text[1..])?,
            _ => self.sql(text)?,
        }

        Ok(Flow::Continue)
    }

    fn handles_verbatim(&self) -> bool {
        true
    }

    fn execute_verbatim(&mut self, lines: &[String]) -> Result<(), CallbackError> {
        for insert in verbatim_inserts(lines)? {
            self.sql(&insert)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn console() -> ConsoleExecutor<Vec<u8>> {
        ConsoleExecutor::new(Vec::new())
    }

    fn output(console: ConsoleExecutor<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn prints_sql_and_echo() {
        let mut c = console();
        c.execute(TokenKind::None, 0, "select 1\nfrom dual").unwrap();
        c.execute(TokenKind::Echo, 1, "$echo  hello world ").unwrap();
        c.execute(TokenKind::Create, 0, "create table T (id int)").unwrap();

        assert_eq!(c.executed(), 2);
        assert_eq!(
            output(c),
            "select 1\nfrom dual;\nhello world\ncreate table T (id int);\n"
        );
    }

    #[test]
    fn exit_stops() {
        let mut c = console();
        assert_eq!(c.execute(TokenKind::Exit, 0, "$exit").unwrap(), Flow::Stop);
        assert_eq!(c.executed(), 0);
    }

    #[test]
    fn set_records_variables() {
        let mut c = console();
        c.execute(TokenKind::Set, 0, "$set @term ;").unwrap();
        c.execute(TokenKind::Set, 0, "$SET @flag").unwrap();

        assert_eq!(c.variables().get("term").map(String::as_str), Some(";"));
        assert_eq!(c.variables().get("flag").map(String::as_str), Some(""));
        assert_eq!(output(c), "");
    }

    #[test]
    fn dbu_markers_are_not_sql() {
        let mut c = console();
        c.execute(TokenKind::DbuStart, 0, "$dbu_start 3.6").unwrap();
        assert_eq!(c.executed(), 0);
        assert_eq!(output(c), "-- $dbu_start 3.6\n");
    }

    #[test]
    fn dollar_drop_runs_as_drop() {
        let mut c = console();
        c.execute(TokenKind::Drop, 0, "$drop table OLD").unwrap();
        assert_eq!(output(c), "drop table OLD;\n");
    }

    #[test]
    fn add_field_is_rewritten() {
        assert_eq!(
            rewrite_add_field("add field CUSTOMER.EMAIL varchar(80) not null").as_deref(),
            Some("alter table CUSTOMER add EMAIL varchar(80) not null")
        );
        assert_eq!(rewrite_add_field("add field EMAIL varchar(80)"), None);
        assert_eq!(rewrite_add_field("add field A.B"), None);

        let mut c = console();
        c.execute(TokenKind::Add, 0, "add field T.C integer").unwrap();
        assert_eq!(output(c), "alter table T add C integer;\n");
    }

    #[test]
    fn verbatim_rows_become_inserts() {
        let lines: Vec<String> = ["@CUSTOMER,ID[int],NAME[varchar],SINCE[timestamp]", " 1 ,O'Neil,2020-01-02T03:04:05.000", "-2,,"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            verbatim_inserts(&lines).unwrap(),
            vec![
                "insert into CUSTOMER (ID, NAME, SINCE) values (1, 'O''Neil', '2020-01-02 03:04:05')",
                "insert into CUSTOMER (ID, NAME, SINCE) values (-2, NULL, NULL)",
            ]
        );
    }

    #[test]
    fn verbatim_errors() {
        let lines = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(verbatim_inserts(&[]).is_err());
        assert!(verbatim_inserts(&lines(&["T,ID"])).is_err());
        assert!(verbatim_inserts(&lines(&["@T,ID[int]", "1,2"])).is_err());
        assert!(verbatim_inserts(&lines(&["@T,I D"])).is_err());
    }
}
