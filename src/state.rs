use crate::error::{CallbackError, DbuError};
use crate::evaluator::VersionStore;
use crate::version::VersionInfo;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Version state kept in a JSON file next to the config.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    info: VersionInfo,
}

impl StateFile {
    /// Read the state at `path`. A missing file starts at version 0 for `app`.
    pub fn open(path: &Path, app: &str) -> Result<Self, DbuError> {
        let info = if path.exists() {
            let contents = fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            debug!(path = %path.display(), "no state file yet");
            VersionInfo::new(0, app)
        };

        Ok(Self {
            path: path.to_path_buf(),
            info,
        })
    }

    pub fn info(&self) -> &VersionInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self) -> Result<(), DbuError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.info)?)?;
        Ok(())
    }
}

impl VersionStore for StateFile {
    fn save_version(&mut self, version: u32) -> Result<(), CallbackError> {
        self.info.version = version;
        self.write()?;
        info!(path = %self.path.display(), version = %self.info.dbu(), "state saved");
        Ok(())
    }
}
