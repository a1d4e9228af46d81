use clap::{Parser as ClapParser, Subcommand};
use dbu_script::catalog::Catalog;
use dbu_script::config::Config;
use dbu_script::console::ConsoleExecutor;
use dbu_script::state::StateFile;
use dbu_script::{DbuError, Evaluator, Script};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(author, version, about = "dbu migration script runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script, printing the SQL it would execute
    Run {
        /// Script path, or a name in the scripts directory (.dbu optional)
        script: String,
        /// Application the database belongs to
        #[arg(long)]
        app: Option<String>,
        /// Version state file
        #[arg(long)]
        state: Option<PathBuf>,
        /// JSON schema catalog used for existence checks
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Print the parsed tokens of a script as JSON
    Parse {
        script: String,
    },
    /// List scripts in the scripts directory
    List,
    /// Manage dbu configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the active configuration
    Show,
    /// Write the default configuration file
    Init,
    /// Print the configuration file path
    Path,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DBU_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_script(name: &str, config: &Config) -> Result<Script, DbuError> {
    let path = config.resolve_script(name).ok_or_else(|| {
        DbuError::FileNotFound(format!(
            "Script '{}' not found\n\nLooked in: {}\nSet DBU_SCRIPTS_DIR or pass a path to the script.",
            name,
            config.scripts_dir.display()
        ))
    })?;

    let source = fs::read_to_string(&path)?;
    Ok(dbu_script::parse(&source, &path)?)
}

fn open_catalog(path: Option<&Path>) -> Result<Catalog, DbuError> {
    match path {
        Some(path) => Catalog::load(path),
        None => {
            warn!("no schema catalog configured, every object is treated as missing");
            Ok(Catalog::empty())
        }
    }
}

fn run_script(
    name: &str,
    app: Option<String>,
    state: Option<PathBuf>,
    catalog: Option<PathBuf>,
    config: &Config,
) -> Result<usize, DbuError> {
    let script = load_script(name, config)?;

    let state_path = state.unwrap_or_else(|| config.state_file.clone());
    let store = StateFile::open(&state_path, &config.app)?;
    let mut version = store.info().clone();
    version.app = config.resolve_app(app, &version.app);

    let inspector = open_catalog(catalog.as_deref().or(config.catalog_file.as_deref()))?;
    let executor = ConsoleExecutor::new(io::stdout().lock());

    info!(script = %script.path.display(), version = %version.dbu(), app = %version.app, "running script");

    let mut evaluator = Evaluator::new(version, inspector, executor, store);
    let processed = evaluator.execute(&script)?;

    let (version, ..) = evaluator.into_parts();
    info!(version = %version.dbu(), "run complete");
    Ok(processed)
}

fn list_scripts(config: &Config) -> Result<(), DbuError> {
    if !config.scripts_dir.is_dir() {
        return Err(DbuError::FileNotFound(format!(
            "Scripts directory not found: {}\n\nTo fix this:\n1. Create the directory\n2. Or set DBU_SCRIPTS_DIR",
            config.scripts_dir.display()
        )));
    }

    let scripts = config.list_scripts()?;
    if scripts.is_empty() {
        println!("No .dbu or .sql scripts in {}", config.scripts_dir.display());
    }
    for path in scripts {
        println!("{}", path.display());
    }
    Ok(())
}

fn config_command(command: ConfigCommands, config: &Config) -> Result<(), DbuError> {
    match command {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommands::Init => {
            let path = Config::config_path();
            if path.exists() {
                println!("Config already exists at: {}", path.display());
                println!("Remove the file to reinitialize.");
            } else {
                Config::default().save()?;
                println!("Initialized new config at: {}", path.display());
            }
        }
        ConfigCommands::Path => {
            println!("{}", Config::config_path().display());
        }
    }
    Ok(())
}

fn dispatch(command: Commands, config: &Config) -> Result<(), DbuError> {
    match command {
        Commands::Run {
            script,
            app,
            state,
            catalog,
        } => {
            let processed = run_script(&script, app, state, catalog, config)?;
            println!("-- {} statements processed", processed);
        }
        Commands::Parse { script } => {
            let script = load_script(&script, config)?;
            println!("{}", serde_json::to_string_pretty(&script)?);
        }
        Commands::List => list_scripts(config)?,
        Commands::Config { command } => config_command(command, config)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    let config = Config::load();

    match dispatch(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
