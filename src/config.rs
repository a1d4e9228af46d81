use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub install_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub env_name: String,
    /// Application checked by `$app_version`.
    #[serde(default = "default_app")]
    pub app: String,
    pub state_file: PathBuf,
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,
}

fn default_app() -> String {
    String::from("none")
}

fn env_name() -> String {
    env::var("DBU_ENV").unwrap_or_else(|_| String::from("default"))
}

fn home_dir() -> PathBuf {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    PathBuf::from(env::var(var).unwrap_or_else(|_| String::from(".")))
}

impl Default for Config {
    fn default() -> Self {
        let env_name = env_name();
        let install_dir = match env::var("DBU_INSTALL_DIR") {
            Ok(custom_dir) => PathBuf::from(custom_dir),
            Err(_) => home_dir().join(".dbu").join(&env_name),
        };

        let local_scripts = Path::new("./scripts");
        let scripts_dir = if local_scripts.is_dir() {
            local_scripts.to_path_buf()
        } else {
            install_dir.join("scripts")
        };

        let mut config = Config {
            state_file: install_dir.join("state.json"),
            install_dir,
            scripts_dir,
            env_name,
            app: default_app(),
            catalog_file: None,
        };
        config.apply_overrides(|key| env::var(key).ok());
        config
    }
}

impl Config {
    /// Load the config of the current environment, writing defaults when the
    /// file does not exist yet. A broken file falls back to defaults.
    pub fn load() -> Self {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Config::default();
            if let Err(e) = config.save() {
                warn!(path = %config_path.display(), error = %e, "could not write default config");
            }
            return config;
        }

        match Self::load_from(&config_path) {
            Ok(mut config) => {
                config.apply_overrides(|key| env::var(key).ok());
                config
            }
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "config unreadable, using defaults");
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Environment variables win over file values.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(app) = lookup("DBU_APP") {
            self.app = app;
        }
        if let Some(dir) = lookup("DBU_SCRIPTS_DIR") {
            self.scripts_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("DBU_STATE") {
            self.state_file = PathBuf::from(file);
        }
        if let Some(file) = lookup("DBU_CATALOG") {
            self.catalog_file = Some(PathBuf::from(file));
        }
    }

    /// Application for a run: `--app` first, then a configured `app`
    /// (file or `DBU_APP`), then the one recorded in the state file.
    pub fn resolve_app(&self, cli: Option<String>, stored: &str) -> String {
        cli.or_else(|| (self.app != default_app()).then(|| self.app.clone()))
            .unwrap_or_else(|| stored.to_string())
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
    }

    pub fn config_path() -> PathBuf {
        home_dir().join(".dbu").join(env_name()).join("config.json")
    }

    /// Resolve a script argument: an existing path is used as is, a bare
    /// name is looked up in `scripts_dir`, with and without `.dbu`.
    pub fn resolve_script(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        let candidate = self.scripts_dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }

        let with_ext = self.scripts_dir.join(format!("{}.dbu", name));
        with_ext.is_file().then_some(with_ext)
    }

    /// `.dbu` and `.sql` files in `scripts_dir`, sorted.
    pub fn list_scripts(&self) -> io::Result<Vec<PathBuf>> {
        let mut scripts: Vec<PathBuf> = fs::read_dir(&self.scripts_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("dbu") | Some("sql")
                )
            })
            .collect();
        scripts.sort();
        Ok(scripts)
    }
}
