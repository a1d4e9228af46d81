use crate::error::{CallbackError, RunError, ScriptError};
use crate::fields::{ExistGuard, KeyValue, OneLineGuard};
use crate::keywords;
use crate::lexer::split_line;
use crate::parser::Script;
use crate::token::{Token, TokenKind};
use crate::version::{DbuVersion, VersionInfo};
use tracing::{debug, info, warn};

/// Existence checks against the target schema.
pub trait SchemaInspector {
    fn table_exists(&mut self, name: &str) -> bool;
    /// `name` is `table.column`.
    fn column_exists(&mut self, name: &str) -> bool;
    fn index_exists(&mut self, name: &str) -> bool;
    fn procedure_exists(&mut self, name: &str) -> bool;
    fn function_exists(&mut self, name: &str) -> bool;
    fn trigger_exists(&mut self, name: &str) -> bool;
    fn domain_exists(&mut self, name: &str) -> bool;
    fn exception_exists(&mut self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Receives every command slot whose guard holds.
pub trait CommandExecutor {
    /// `command` identifies directive-derived commands (`Exit`, `Echo`,
    /// `Set`, `Create`, `Drop`, ...) and is `TokenKind::None` for plain text.
    fn execute(&mut self, command: TokenKind, slot: usize, text: &str) -> Result<Flow, CallbackError>;

    /// Whether `$ecv_start` blocks should be handed to [`execute_verbatim`].
    ///
    /// [`execute_verbatim`]: CommandExecutor::execute_verbatim
    fn handles_verbatim(&self) -> bool {
        false
    }

    fn execute_verbatim(&mut self, _lines: &[String]) -> Result<(), CallbackError> {
        Ok(())
    }
}

/// Persists the schema version after a successful `$lastdbu` raise.
pub trait VersionStore {
    fn save_version(&mut self, version: u32) -> Result<(), CallbackError>;
}

/// How a token takes part in a run, decided once from its kind.
enum Step {
    AppVersion(KeyValue),
    LastDbu(KeyValue),
    DbuVersion(KeyValue),
    Show(bool),
    Hide(bool),
    IfExist(ExistGuard),
    OneLine { guard: OneLineGuard, invert: bool },
    Verbatim,
    Commands,
}

impl Step {
    fn of(token: &Token) -> Self {
        match token.kind {
            TokenKind::AppVersion => Step::AppVersion(token.key_value()),
            TokenKind::DbuLast => Step::LastDbu(token.key_value()),
            TokenKind::DbuVersion => Step::DbuVersion(token.key_value()),
            TokenKind::Show => Step::Show(true),
            TokenKind::NoShow => Step::Show(false),
            TokenKind::Hide => Step::Hide(true),
            TokenKind::NoHide => Step::Hide(false),
            TokenKind::If => Step::IfExist(token.exist_guard()),
            TokenKind::OneIf => Step::OneLine {
                guard: token.one_line_guard(),
                invert: false,
            },
            TokenKind::OneNotIf => Step::OneLine {
                guard: token.one_line_guard(),
                invert: true,
            },
            TokenKind::EcvStart => Step::Verbatim,
            TokenKind::None
            | TokenKind::Dbu
            | TokenKind::DbuStart
            | TokenKind::DbuEnd
            | TokenKind::Echo
            | TokenKind::Comment
            | TokenKind::Fi
            | TokenKind::Set
            | TokenKind::Eol
            | TokenKind::Exit
            | TokenKind::EcvStop
            | TokenKind::Exist
            | TokenKind::Not
            | TokenKind::Ne
            | TokenKind::Eq
            | TokenKind::Gt
            | TokenKind::Lt
            | TokenKind::Ge
            | TokenKind::Le
            | TokenKind::Eof
            | TokenKind::BracketOpen
            | TokenKind::BracketClose
            | TokenKind::Create
            | TokenKind::Drop
            | TokenKind::Add
            | TokenKind::Select
            | TokenKind::Update
            | TokenKind::Recreate
            | TokenKind::Ascending
            | TokenKind::Descending
            | TokenKind::Primary
            | TokenKind::Key
            | TokenKind::Delete
            | TokenKind::Table
            | TokenKind::Field
            | TokenKind::Procedure
            | TokenKind::Index
            | TokenKind::Trigger
            | TokenKind::On
            | TokenKind::To
            | TokenKind::First
            | TokenKind::After
            | TokenKind::Unique
            | TokenKind::Foreign
            | TokenKind::Function
            | TokenKind::Modify
            | TokenKind::Alter
            | TokenKind::Rename
            | TokenKind::Exception
            | TokenKind::Domain
            | TokenKind::Any => Step::Commands,
        }
    }
}

/// Identifier handed to the executor for a slot outside `$ie`/`$ine`.
pub fn command_id(lines: &[String]) -> TokenKind {
    let Some(first) = lines.first() else {
        return TokenKind::None;
    };
    let words = split_line(first);

    match words.as_slice() {
        [head, ..] if head.starts_with('$') => match keywords::directive(head) {
            Some(
                kind @ (TokenKind::Exit
                | TokenKind::Echo
                | TokenKind::Set
                | TokenKind::Drop
                | TokenKind::Dbu
                | TokenKind::DbuStart
                | TokenKind::DbuEnd),
            ) => kind,
            _ => TokenKind::None,
        },
        [add, field, ..]
            if keywords::sql(add) == Some(TokenKind::Add)
                && keywords::directive(field) == Some(TokenKind::Field) =>
        {
            TokenKind::Add
        }
        _ => TokenKind::None,
    }
}

/// Result of walking the tokens, before the version is saved.
enum Walk {
    Finished,
    Halted,
}

/// Runs parsed scripts against injected collaborators.
pub struct Evaluator<I, E, S> {
    pub info: VersionInfo,
    inspector: I,
    executor: E,
    store: S,
}

impl<I, E, S> Evaluator<I, E, S>
where
    I: SchemaInspector,
    E: CommandExecutor,
    S: VersionStore,
{
    pub fn new(info: VersionInfo, inspector: I, executor: E, store: S) -> Self {
        Self {
            info,
            inspector,
            executor,
            store,
        }
    }

    pub fn inspector(&self) -> &I {
        &self.inspector
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (VersionInfo, I, E, S) {
        (self.info, self.inspector, self.executor, self.store)
    }

    /// Walk `script` once and return the number of statements processed.
    ///
    /// A version raised by `$lastdbu` is saved once at the end, whether the
    /// walk finished, was stopped by the executor or failed. A failed walk
    /// reports its own error over a failed save.
    pub fn execute(&mut self, script: &Script) -> Result<usize, RunError> {
        let initial = self.info.version;
        let mut pending = None;
        let mut statement = 0;

        let walked = self.walk(script, &mut statement, &mut pending);
        match &walked {
            Ok(Walk::Finished) => debug!(statement, "script finished"),
            Ok(Walk::Halted) => info!(statement, "script halted by executor"),
            Err(e) => warn!(statement, error = %e, "script failed"),
        }

        let saved = self.save_pending(initial, pending);

        match (walked, saved) {
            (Ok(_), Ok(())) => Ok(statement),
            (Ok(_), Err(e)) => Err(RunError::new(statement, ScriptError::SaveVersion(e))),
            (Err(source), Err(e)) => {
                warn!(error = %e, "saving version after a failed run failed too");
                Err(RunError::new(statement, source))
            }
            (Err(source), Ok(())) => Err(RunError::new(statement, source)),
        }
    }

    fn save_pending(&mut self, initial: u32, pending: Option<u32>) -> Result<(), CallbackError> {
        let Some(version) = pending else {
            self.info.version = initial;
            return Ok(());
        };

        info!(from = initial, to = version, "saving schema version");
        match self.store.save_version(version) {
            Ok(()) => {
                self.info.version = version;
                Ok(())
            }
            Err(e) => {
                self.info.version = initial;
                Err(e)
            }
        }
    }

    fn walk(
        &mut self,
        script: &Script,
        statement: &mut usize,
        pending: &mut Option<u32>,
    ) -> Result<Walk, ScriptError> {
        for token in &script.tokens {
            debug!(statement = *statement, line = token.line, key = %token.key, "token");

            let eligible = match Step::of(token) {
                Step::AppVersion(kv) => {
                    self.check_app(&token.key, kv)?;
                    false
                }
                Step::LastDbu(kv) => {
                    self.raise_version(kv, pending)?;
                    false
                }
                Step::DbuVersion(kv) => {
                    self.check_gate(kv)?;
                    false
                }
                Step::Show(show) => {
                    self.info.show = show;
                    false
                }
                Step::Hide(hide) => {
                    self.info.hide = hide;
                    false
                }
                Step::IfExist(guard) => self.exist_guard(&token.key, guard)?,
                Step::OneLine { guard, invert } => {
                    let exists = self.object_exists(guard.object, &guard.name)?;
                    if exists != invert {
                        if let Flow::Stop = self.dispatch(token, Some(guard.action))? {
                            return Ok(Walk::Halted);
                        }
                    }
                    *statement += 1;
                    continue;
                }
                Step::Verbatim => {
                    *statement += self.verbatim(token)?;
                    continue;
                }
                Step::Commands => true,
            };

            if eligible {
                if let Flow::Stop = self.dispatch(token, None)? {
                    return Ok(Walk::Halted);
                }
            }
            *statement += 1;
        }

        Ok(Walk::Finished)
    }

    fn check_app(&self, directive: &str, kv: KeyValue) -> Result<(), ScriptError> {
        if kv.op != TokenKind::Eq {
            return Err(ScriptError::BadGuardOperator {
                directive: directive.to_string(),
                op: kv.op,
            });
        }
        if kv.value != self.info.app {
            return Err(ScriptError::WrongApplication {
                expected: self.info.app.clone(),
                found: kv.value,
            });
        }
        Ok(())
    }

    fn raise_version(&mut self, kv: KeyValue, pending: &mut Option<u32>) -> Result<(), ScriptError> {
        let declared = DbuVersion::parse(&kv.value)?;
        let xdbu = declared.encode();

        if xdbu > self.info.version {
            debug!(from = self.info.version, to = xdbu, "version raised");
            self.info.version = xdbu;
            *pending = Some(xdbu);
        } else if xdbu < self.info.version {
            return Err(ScriptError::VersionRegression {
                declared: declared.to_string(),
                current: self.info.dbu().to_string(),
            });
        }
        Ok(())
    }

    fn check_gate(&self, kv: KeyValue) -> Result<(), ScriptError> {
        let required = DbuVersion::parse(&kv.value)?;

        match required.gate(kv.op, self.info.version) {
            Some(true) => Ok(()),
            Some(false) => Err(ScriptError::VersionGateFailed {
                op: kv.op,
                required: required.to_string(),
                current: self.info.dbu().to_string(),
            }),
            None => Err(ScriptError::BadGuardOperator {
                directive: String::from("$dbu_version"),
                op: kv.op,
            }),
        }
    }

    fn exist_guard(&mut self, directive: &str, guard: ExistGuard) -> Result<bool, ScriptError> {
        if guard.op != TokenKind::Exist {
            return Err(ScriptError::BadGuardOperator {
                directive: directive.to_string(),
                op: guard.op,
            });
        }
        let exists = self.object_exists(guard.object, &guard.name)?;
        Ok(exists != guard.negate)
    }

    fn object_exists(&mut self, object: TokenKind, name: &str) -> Result<bool, ScriptError> {
        let exists = match object {
            TokenKind::Table | TokenKind::Field if name.contains('.') => {
                self.inspector.column_exists(name)
            }
            TokenKind::Table | TokenKind::Field => self.inspector.table_exists(name),
            TokenKind::Index => self.inspector.index_exists(name),
            TokenKind::Function => self.inspector.function_exists(name),
            TokenKind::Procedure => self.inspector.procedure_exists(name),
            TokenKind::Trigger => self.inspector.trigger_exists(name),
            TokenKind::Exception => self.inspector.exception_exists(name),
            TokenKind::Domain => self.inspector.domain_exists(name),
            other => {
                return Err(ScriptError::BadGuardObject {
                    object: other,
                    name: name.to_string(),
                })
            }
        };

        debug!(%object, name, exists, "existence check");
        Ok(exists)
    }

    /// Hand each command slot to the executor in order.
    fn dispatch(&mut self, token: &Token, action: Option<TokenKind>) -> Result<Flow, ScriptError> {
        for (slot, lines) in token.commands.iter().enumerate() {
            let command = action.unwrap_or_else(|| command_id(lines));
            let text = lines.join("\n");

            let flow = self
                .executor
                .execute(command, slot, &text)
                .map_err(ScriptError::Executor)?;

            if flow == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Returns how far the statement counter advances.
    fn verbatim(&mut self, token: &Token) -> Result<usize, ScriptError> {
        if !self.executor.handles_verbatim() {
            warn!(line = token.line, "no verbatim handler, block skipped");
            return Ok(1);
        }

        let lines = token.lines();
        self.executor
            .execute_verbatim(&lines)
            .map_err(ScriptError::Executor)?;
        Ok(lines.len().max(1))
    }
}
