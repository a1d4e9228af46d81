use crate::keywords;
use serde::Serialize;
use std::fmt;

/// Every symbol the script language knows about.
///
/// Declaration order matters: directives declared before `Eol` are
/// inherently single-line (see [`TokenKind::is_single_line`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    #[default]
    None,

    // Single-line directives
    AppVersion,  // $app_version
    DbuVersion,  // $dbu_version
    Dbu,         // $dbu
    DbuStart,    // $dbu_start
    DbuEnd,      // $dbu_end
    DbuLast,     // $lastdbu
    Echo,        // $echo
    Show,        // $show
    NoShow,      // $noshow
    Hide,        // $hide
    NoHide,      // $nohide
    Comment,     // # //
    Fi,          // $fi $endif
    Set,         // $set

    // Boundary: everything from here on may span lines
    Eol,         // &&
    Exit,        // $exit
    EcvStart,    // $ecv_start $ecv
    EcvStop,     // $ecv_stop
    OneIf,       // $ie
    OneNotIf,    // $ine
    If,          // $if

    // Predicates and operators
    Exist,
    Not,         // ! not
    Ne,          // !=
    Eq,          // =
    Gt,          // >
    Lt,          // <
    Ge,          // >=
    Le,          // <=
    Eof,
    BracketOpen,
    BracketClose,

    // SQL-ish keywords
    Create,
    Drop,
    Add,
    Select,
    Update,
    Recreate,
    Ascending,
    Descending,
    Primary,
    Key,
    Delete,
    Table,
    Field,       // field column
    Procedure,
    Index,
    Trigger,
    On,
    To,
    First,
    After,
    Unique,
    Foreign,
    Function,
    Modify,
    Alter,
    Rename,
    Exception,
    Domain,

    // Plain SQL block
    Any,
}

impl TokenKind {
    /// Directives below the `Eol` boundary close their statement on the line
    /// they appear on, with or without a trailing `&&`.
    pub fn is_single_line(self) -> bool {
        self > TokenKind::None && self < TokenKind::Eol
    }

    /// `$if` and `$ecv_start` open a block that stays open until its closer.
    pub fn opens_block(self) -> bool {
        matches!(self, TokenKind::If | TokenKind::EcvStart)
    }

    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Not
                | TokenKind::Ne
                | TokenKind::Eq
                | TokenKind::Gt
                | TokenKind::Lt
                | TokenKind::Ge
                | TokenKind::Le
        )
    }

    /// Object types an existence guard can ask about.
    pub fn is_schema_object(self) -> bool {
        matches!(
            self,
            TokenKind::Table
                | TokenKind::Field
                | TokenKind::Index
                | TokenKind::Function
                | TokenKind::Procedure
                | TokenKind::Trigger
                | TokenKind::Exception
                | TokenKind::Domain
        )
    }
}

/// Prints the script spelling: `$` words for directives, plain keywords
/// and operator symbols for everything else.
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let directive = *self > TokenKind::None && *self <= TokenKind::If;
        let spellings = || {
            keywords::KEYWORDS
                .iter()
                .filter(move |(_, kind, _)| kind == self)
                .map(|(text, _, _)| *text)
        };

        let text = spellings()
            .find(|text| text.starts_with('$') == directive)
            .or_else(|| spellings().next())
            .unwrap_or(match self {
                TokenKind::Any => "sql",
                TokenKind::Eof => "eof",
                _ => "none",
            });
        f.write_str(text)
    }
}

/// One classified argument word of a directive line.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Field {
    pub text: String,
    pub kind: TokenKind,
}

impl Field {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Parser output unit: a directive (or plain SQL block) together with the
/// command text it guards.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Lowercase directive text, `sql` for plain blocks.
    pub key: String,
    pub fields: Vec<Field>,
    /// Command slots, each one or more source lines.
    pub commands: Vec<Vec<String>>,
    /// 1-based source line the token was opened on.
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, key: impl Into<String>, fields: Vec<Field>, line: usize) -> Self {
        Self {
            kind,
            key: key.into(),
            fields,
            commands: Vec::new(),
            line,
        }
    }

    pub fn plain(line: usize) -> Self {
        Self::new(TokenKind::Any, "sql", Vec::new(), line)
    }

    /// Append `text` to command slot `slot`, creating the slot if this is
    /// its first line.
    pub fn add(&mut self, slot: usize, text: &str) {
        if self.commands.len() == slot {
            self.commands.push(Vec::new());
        }
        if let Some(lines) = self.commands.get_mut(slot) {
            lines.push(text.to_string());
        }
    }

    /// Slot `slot` joined into one command string, empty if out of range.
    pub fn command(&self, slot: usize) -> String {
        self.commands
            .get(slot)
            .map(|lines| lines.join("\n"))
            .unwrap_or_default()
    }

    /// Every raw line of every slot, in order.
    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().flatten().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_boundary_follows_declaration_order() {
        assert!(TokenKind::AppVersion.is_single_line());
        assert!(TokenKind::Set.is_single_line());
        assert!(TokenKind::Echo.is_single_line());
        assert!(!TokenKind::Eol.is_single_line());
        assert!(!TokenKind::Exit.is_single_line());
        assert!(!TokenKind::If.is_single_line());
        assert!(!TokenKind::Any.is_single_line());
        assert!(!TokenKind::None.is_single_line());
    }

    #[test]
    fn add_opens_slots_lazily() {
        let mut token = Token::plain(1);
        token.add(0, "select 1");
        token.add(0, "from foo");
        token.add(1, "select 2");

        assert_eq!(token.commands.len(), 2);
        assert_eq!(token.command(0), "select 1\nfrom foo");
        assert_eq!(token.command(1), "select 2");
        assert_eq!(token.command(7), "");
        assert_eq!(token.lines().len(), 3);
    }

    #[test]
    fn display_uses_script_spelling() {
        assert_eq!(TokenKind::Ge.to_string(), ">=");
        assert_eq!(TokenKind::Table.to_string(), "table");
        assert_eq!(TokenKind::DbuVersion.to_string(), "$dbu_version");
        assert_eq!(TokenKind::OneIf.to_string(), "$ie");
        assert_eq!(TokenKind::EcvStart.to_string(), "$ecv_start");
        assert_eq!(TokenKind::If.to_string(), "$if");
        assert_eq!(TokenKind::Drop.to_string(), "drop");
        assert_eq!(TokenKind::Not.to_string(), "!");
        assert_eq!(TokenKind::Field.to_string(), "field");
        assert_eq!(TokenKind::Comment.to_string(), "#");
        assert_eq!(TokenKind::Any.to_string(), "sql");
        assert_eq!(TokenKind::None.to_string(), "none");
    }
}
