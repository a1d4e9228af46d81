use dbu_script::console::ConsoleExecutor;
use dbu_script::catalog::{Catalog, CatalogFile};
use dbu_script::state::StateFile;
use dbu_script::{
    parse, CallbackError, CommandExecutor, Evaluator, Flow, SchemaInspector, ScriptError, TokenKind,
    VersionInfo, VersionStore,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::path::Path;
use tempfile::tempdir;

#[derive(Default)]
struct Tables(HashSet<String>);

impl SchemaInspector for Tables {
    fn table_exists(&mut self, name: &str) -> bool {
        self.0.contains(name)
    }
    fn column_exists(&mut self, name: &str) -> bool {
        self.0.contains(name)
    }
    fn index_exists(&mut self, _: &str) -> bool {
        false
    }
    fn procedure_exists(&mut self, _: &str) -> bool {
        false
    }
    fn function_exists(&mut self, _: &str) -> bool {
        false
    }
    fn trigger_exists(&mut self, _: &str) -> bool {
        false
    }
    fn domain_exists(&mut self, _: &str) -> bool {
        false
    }
    fn exception_exists(&mut self, _: &str) -> bool {
        false
    }
}

#[derive(Default)]
struct Commands(Vec<(TokenKind, usize, String)>);

impl CommandExecutor for Commands {
    fn execute(&mut self, command: TokenKind, slot: usize, text: &str) -> Result<Flow, CallbackError> {
        self.0.push((command, slot, text.to_string()));
        Ok(if command == TokenKind::Exit {
            Flow::Stop
        } else {
            Flow::Continue
        })
    }
}

#[derive(Default)]
struct Versions(Vec<u32>);

impl VersionStore for Versions {
    fn save_version(&mut self, version: u32) -> Result<(), CallbackError> {
        self.0.push(version);
        Ok(())
    }
}

fn evaluator(version: u32, tables: &[&str]) -> Evaluator<Tables, Commands, Versions> {
    Evaluator::new(
        VersionInfo::new(version, "shop"),
        Tables(tables.iter().map(|t| t.to_string()).collect()),
        Commands::default(),
        Versions::default(),
    )
}

const GUARDED: &str = "\
$if exist table FOO
select 1 from FOO&&
$fi
";

#[test]
fn guarded_block_runs_only_when_table_exists() {
    let script = parse(GUARDED, Path::new("guarded.dbu")).unwrap();

    let mut present = evaluator(0, &["FOO"]);
    assert_eq!(present.execute(&script).unwrap(), 1);
    assert_eq!(
        present.executor().0,
        vec![(TokenKind::None, 0, "select 1 from FOO".to_string())]
    );

    let mut missing = evaluator(0, &[]);
    assert_eq!(missing.execute(&script).unwrap(), 1);
    assert!(missing.executor().0.is_empty());
}

#[test]
fn exit_halts_remaining_statements() {
    let script = parse("select 1&&\n$exit&&\n", Path::new("exit.dbu")).unwrap();
    let mut run = evaluator(0, &[]);

    assert_eq!(run.execute(&script).unwrap(), 1);
    let kinds: Vec<TokenKind> = run.executor().0.iter().map(|c| c.0).collect();
    assert_eq!(kinds, vec![TokenKind::None, TokenKind::Exit]);
}

#[test]
fn lastdbu_saves_exactly_once() {
    let source = "\
$app_version = shop
$lastdbu 3.6
$ine create table ORDERS (id integer)&&
$if !exist column ORDERS.NOTE
add field ORDERS.NOTE varchar(200)&&
$fi
";
    let script = parse(source, Path::new("306.dbu")).unwrap();
    let mut run = evaluator(305, &[]);

    assert_eq!(run.execute(&script).unwrap(), 4);
    assert_eq!(run.store().0, vec![306]);

    let (info, _, commands, _) = run.into_parts();
    assert_eq!(info.version, 306);
    assert_eq!(
        commands.0,
        vec![
            (TokenKind::Create, 0, "create table ORDERS (id integer)".to_string()),
            (TokenKind::Add, 0, "add field ORDERS.NOTE varchar(200)".to_string()),
        ]
    );
}

#[test]
fn lastdbu_regression_fails_before_any_command() {
    let script = parse("$lastdbu 3.4\nselect 1&&\n", Path::new("old.dbu")).unwrap();
    let mut run = evaluator(305, &[]);

    let err = run.execute(&script).unwrap_err();
    assert_eq!(err.statement, 0);
    assert!(matches!(err.source, ScriptError::VersionRegression { .. }));
    assert!(run.executor().0.is_empty());
    assert!(run.store().0.is_empty());
}

#[test]
fn dbu_version_gate_stops_out_of_order_scripts() {
    let script = parse("$dbu_version > 3.7\nselect 1&&\n", Path::new("gate.dbu")).unwrap();
    let mut run = evaluator(305, &[]);

    let err = run.execute(&script).unwrap_err();
    assert!(err.to_string().starts_with("statement #0:"));
    assert!(matches!(err.source, ScriptError::VersionGateFailed { .. }));
}

#[test]
fn file_backed_adapters_run_a_migration() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    let source = "\
$lastdbu 1.1
$if exist table CUSTOMER
$echo customer table found
add field CUSTOMER.EMAIL varchar(80)&&
$fi
$ecv_start
@CUSTOMER,ID[int],NAME[varchar]
1,Ada
2,Grace
$ecv_stop
$ie drop index CUSTOMER.IX_OLD&&
";
    let script = parse(source, Path::new("101.dbu")).unwrap();

    let catalog = Catalog::from(CatalogFile {
        tables: vec!["customer".into()],
        ..CatalogFile::default()
    });
    let store = StateFile::open(&state_path, "shop").unwrap();
    let info = store.info().clone();
    let mut run = Evaluator::new(info, catalog, ConsoleExecutor::new(Vec::new()), store);

    assert_eq!(run.execute(&script).unwrap(), 6);

    let (_, _, console, _) = run.into_parts();
    assert_eq!(console.executed(), 3);
    assert_eq!(
        String::from_utf8(console.into_inner()).unwrap(),
        "customer table found\n\
         alter table CUSTOMER add EMAIL varchar(80);\n\
         insert into CUSTOMER (ID, NAME) values (1, 'Ada');\n\
         insert into CUSTOMER (ID, NAME) values (2, 'Grace');\n"
    );

    let reopened = StateFile::open(&state_path, "shop").unwrap();
    assert_eq!(reopened.info().version, 101);
}
