use crate::error::ParseError;
use crate::keywords;
use crate::lexer::{skip_leading_word, split_line};
use crate::token::{Field, Token, TokenKind};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A parsed script file.
#[derive(Debug, Clone, Serialize)]
pub struct Script {
    pub path: PathBuf,
    pub tokens: Vec<Token>,
}

/// The token currently collecting lines, with the slot the next line goes to.
struct OpenToken {
    token: Token,
    next_slot: usize,
}

impl OpenToken {
    fn new(token: Token) -> Self {
        Self {
            token,
            next_slot: 0,
        }
    }
}

/// A directive line after lexical splitting and keyword lookup.
struct Directive {
    kind: TokenKind,
    key: String,
    fields: Vec<Field>,
}

pub struct Parser<'a> {
    source: &'a str,
    file_path: PathBuf,
    tokens: Vec<Token>,
    open: Option<OpenToken>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file_name: &Path) -> Self {
        Self {
            source,
            file_path: file_name.to_path_buf(),
            tokens: Vec::new(),
            open: None,
        }
    }

    pub fn parse(mut self) -> Result<Script, ParseError> {
        let source = self.source;

        for (index, raw) in source.lines().enumerate() {
            self.parse_line(index + 1, raw)?;
        }

        if let Some(open) = self.open.take() {
            if open.token.kind.opens_block() {
                return Err(ParseError::UnterminatedBlock {
                    path: self.file_path,
                    line: open.token.line,
                    directive: open.token.key,
                });
            }
            self.tokens.push(open.token);
        }

        debug!(tokens = self.tokens.len(), path = %self.file_path.display(), "parsed script");

        Ok(Script {
            path: self.file_path,
            tokens: self.tokens,
        })
    }

    fn parse_line(&mut self, line_no: usize, raw: &str) -> Result<(), ParseError> {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(());
        }

        let (mut text, mut eol) = match text.strip_suffix("&&") {
            Some(rest) => (rest.trim_end(), true),
            None => (text, false),
        };

        if text.is_empty() {
            // A bare `&&` only terminates the statement in progress.
            self.end_statement(None);
            return Ok(());
        }

        let mut directive_kind = None;

        if text.starts_with('$') {
            let directive = self.directive(line_no, text)?;

            if matches!(directive.kind, TokenKind::Fi | TokenKind::EcvStop) {
                debug!(line = line_no, key = %directive.key, "close block");
                self.close();
                return Ok(());
            }

            // Only $if and $ecv_start blocks take directive lines as text.
            if self.open.as_ref().map_or(false, |open| !open.token.kind.opens_block()) {
                debug!(line = line_no, key = %directive.key, "directive ends open statement");
                self.close();
            }

            match self.open.as_ref().map(|open| open.token.line) {
                None => {
                    debug!(line = line_no, key = %directive.key, "open token");
                    let token = Token::new(directive.kind, directive.key, directive.fields, line_no);
                    self.open = Some(OpenToken::new(token));
                }
                Some(outer) if directive.kind.opens_block() => {
                    warn!(
                        line = line_no,
                        outer,
                        "nested {} ignored, its lines join the open block",
                        directive.key
                    );
                }
                Some(_) => {}
            }

            if directive.kind.is_single_line() {
                eol = true;
            }

            if directive.kind.opens_block() {
                return Ok(());
            }

            if matches!(directive.kind, TokenKind::OneIf | TokenKind::OneNotIf) {
                text = &text[skip_leading_word(text)..];
            }

            directive_kind = Some(directive.kind);
        } else if self.open.is_none() {
            debug!(line = line_no, "open sql token");
            self.open = Some(OpenToken::new(Token::plain(line_no)));
        }

        if let Some(open) = self.open.as_mut() {
            open.token.add(open.next_slot, text);
        }

        if eol {
            self.end_statement(directive_kind);
        }

        Ok(())
    }

    /// Advance to the next command slot and close the open token unless it is
    /// a block that only its own closer may end.
    fn end_statement(&mut self, directive: Option<TokenKind>) {
        let Some(open) = self.open.as_mut() else {
            return;
        };

        if open.token.commands.len() > open.next_slot {
            open.next_slot += 1;
        }

        let kind = open.token.kind;
        let single_line = directive.map_or(false, TokenKind::is_single_line);

        if kind.opens_block() {
            return;
        }

        if single_line || matches!(kind, TokenKind::Any | TokenKind::OneIf | TokenKind::OneNotIf) {
            self.close();
        }
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            self.tokens.push(open.token);
        }
    }

    fn directive(&self, line_no: usize, text: &str) -> Result<Directive, ParseError> {
        let words = split_line(text);
        let head = words.first().copied().unwrap_or_default();

        let kind = keywords::directive(head).ok_or_else(|| ParseError::UnknownDirective {
            path: self.file_path.clone(),
            line: line_no,
            text: head.to_string(),
        })?;

        let fields = words
            .iter()
            .skip(1)
            .map(|word| Field::new(*word, keywords::classify(word)))
            .collect();

        Ok(Directive {
            kind,
            key: head.to_lowercase(),
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Vec<Token> {
        Parser::new(source, Path::new("test.dbu"))
            .parse()
            .unwrap()
            .tokens
    }

    fn commands(token: &Token) -> Vec<String> {
        (0..token.commands.len()).map(|i| token.command(i)).collect()
    }

    #[test]
    fn plain_sql_groups_split_on_terminator() {
        let tokens = parse("select 1\nfrom foo&&\n\n# comment\nupdate foo set a = 1 &&\n");

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Any);
        assert_eq!(tokens[0].key, "sql");
        assert_eq!(commands(&tokens[0]), vec!["select 1\nfrom foo"]);
        assert_eq!(commands(&tokens[1]), vec!["update foo set a = 1"]);
        assert_eq!(tokens[1].line, 5);
    }

    #[test]
    fn trailing_group_without_terminator_is_kept() {
        let tokens = parse("select 1&&\nselect 2\nfrom dual\n");
        assert_eq!(tokens.len(), 2);
        assert_eq!(commands(&tokens[1]), vec!["select 2\nfrom dual"]);
    }

    #[test]
    fn bare_terminator_line_ends_statement() {
        let tokens = parse("select 1\n&&\nselect 2\n");
        assert_eq!(tokens.len(), 2);
        assert_eq!(commands(&tokens[0]), vec!["select 1"]);
    }

    #[test]
    fn if_block_collects_slots_until_fi() {
        let tokens = parse(
            "$if exist table FOO\nselect 1 from FOO&&\ndelete from FOO\nwhere id = 2&&\n$fi\nselect 3&&\n",
        );

        assert_eq!(tokens.len(), 2);
        let block = &tokens[0];
        assert_eq!(block.kind, TokenKind::If);
        assert_eq!(block.key, "$if");
        assert_eq!(
            block.fields,
            vec![
                Field::new("exist", TokenKind::Exist),
                Field::new("table", TokenKind::Table),
                Field::new("FOO", TokenKind::None),
            ]
        );
        assert_eq!(
            commands(block),
            vec!["select 1 from FOO", "delete from FOO\nwhere id = 2"]
        );
        assert_eq!(tokens[1].kind, TokenKind::Any);
    }

    #[test]
    fn endif_is_an_alias_and_case_is_ignored() {
        let tokens = parse("$IF ! Exist Index IX_A\ncreate index IX_A on T (A)&&\n$EndIf\n");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::If);
        assert_eq!(tokens[0].key, "$if");
        assert_eq!(tokens[0].fields[0].kind, TokenKind::Not);
    }

    #[test]
    fn one_line_if_strips_directive_word() {
        let tokens = parse("$ine create table xFile (id integer)&&\n$ie drop table endFile&&\n");

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::OneNotIf);
        assert_eq!(commands(&tokens[0]), vec!["create table xFile (id integer)"]);
        assert_eq!(tokens[1].kind, TokenKind::OneIf);
        assert_eq!(commands(&tokens[1]), vec!["drop table endFile"]);
    }

    #[test]
    fn one_line_if_may_continue_until_terminator() {
        let tokens = parse("$ine create table T (\n  id integer,\n  name varchar(20)\n)&&\nselect 1&&\n");

        assert_eq!(tokens.len(), 2);
        assert_eq!(
            commands(&tokens[0]),
            vec!["create table T (\nid integer,\nname varchar(20)\n)"]
        );
    }

    #[test]
    fn single_line_directives_close_themselves() {
        let tokens = parse("$app_version = shop\n$dbu_version >= 3.4\n$echo hello world\nselect 1&&\n");

        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::AppVersion, TokenKind::DbuVersion, TokenKind::Echo, TokenKind::Any]
        );
        assert_eq!(commands(&tokens[2]), vec!["$echo hello world"]);
    }

    #[test]
    fn single_line_directive_inside_block_keeps_block_open() {
        let tokens = parse("$if exist table T\n$echo found T\nselect 1&&\n$fi\n");

        assert_eq!(tokens.len(), 1);
        assert_eq!(commands(&tokens[0]), vec!["$echo found T", "select 1"]);
    }

    #[test]
    fn ecv_block_is_closed_by_stop() {
        let tokens = parse("$ecv_start\n@T,ID[int]\n1\n2\n$ecv_stop\nselect 1&&\n");

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::EcvStart);
        assert_eq!(tokens[0].lines(), vec!["@T,ID[int]", "1", "2"]);
    }

    #[test]
    fn directive_ends_unterminated_sql_group() {
        let tokens = parse("select 1\n$if exist table FOO\ndrop table FOO&&\n$fi\n");

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Any);
        assert_eq!(commands(&tokens[0]), vec!["select 1"]);
        assert_eq!(tokens[1].kind, TokenKind::If);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(commands(&tokens[1]), vec!["drop table FOO"]);

        let kinds: Vec<TokenKind> = parse("select 1\n$app_version = crm\nselect 2&&\n")
            .iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(kinds, vec![TokenKind::Any, TokenKind::AppVersion, TokenKind::Any]);

        let tokens = parse("select 1\n$ie drop table FOO&&\n");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::OneIf);
        assert_eq!(commands(&tokens[1]), vec!["drop table FOO"]);
    }

    #[test]
    fn directive_ends_open_exit() {
        let tokens = parse("$exit\n$echo bye\n");

        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Exit, TokenKind::Echo]);
        assert_eq!(commands(&tokens[0]), vec!["$exit"]);
    }

    #[test]
    fn unknown_directive_reports_line() {
        let err = Parser::new("select 1&&\n\n$bogus thing\n", Path::new("x.dbu"))
            .parse()
            .unwrap_err();

        assert_eq!(
            err,
            ParseError::UnknownDirective {
                path: PathBuf::from("x.dbu"),
                line: 3,
                text: "$bogus".into(),
            }
        );
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = Parser::new("select 1&&\n$if exist table T\nselect 2&&\n", Path::new("x.dbu"))
            .parse()
            .unwrap_err();

        assert!(matches!(err, ParseError::UnterminatedBlock { line: 2, .. }));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn carriage_returns_are_ignored() {
        let tokens = parse("select 1\r\nfrom foo&&\r\n");
        assert_eq!(commands(&tokens[0]), vec!["select 1\nfrom foo"]);
    }
}
