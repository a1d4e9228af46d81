//! Schema catalog read from a JSON file, for running scripts without a live
//! database connection.
//!
//! ```json
//! { "tables": ["CUSTOMER"], "columns": ["CUSTOMER.NAME"], "indexes": ["CUSTOMER.IX_NAME"] }
//! ```
//!
//! Names compare case-insensitively. Columns and indexes are qualified with
//! their table as `TABLE.NAME`.

use crate::error::DbuError;
use crate::evaluator::SchemaInspector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub tables: Vec<String>,
    pub columns: Vec<String>,
    pub indexes: Vec<String>,
    pub procedures: Vec<String>,
    pub functions: Vec<String>,
    pub triggers: Vec<String>,
    pub domains: Vec<String>,
    pub exceptions: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashSet<String>,
    columns: HashSet<String>,
    indexes: HashSet<String>,
    procedures: HashSet<String>,
    functions: HashSet<String>,
    triggers: HashSet<String>,
    domains: HashSet<String>,
    exceptions: HashSet<String>,
}

fn names(list: Vec<String>) -> HashSet<String> {
    list.into_iter().map(|name| name.to_uppercase()).collect()
}

impl From<CatalogFile> for Catalog {
    fn from(file: CatalogFile) -> Self {
        Self {
            tables: names(file.tables),
            columns: names(file.columns),
            indexes: names(file.indexes),
            procedures: names(file.procedures),
            functions: names(file.functions),
            triggers: names(file.triggers),
            domains: names(file.domains),
            exceptions: names(file.exceptions),
        }
    }
}

impl Catalog {
    /// An empty catalog: nothing exists.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, DbuError> {
        let contents = fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&contents)?;
        let catalog = Catalog::from(file);
        debug!(path = %path.display(), tables = catalog.tables.len(), "loaded catalog");
        Ok(catalog)
    }
}

impl SchemaInspector for Catalog {
    fn table_exists(&mut self, name: &str) -> bool {
        self.tables.contains(&name.to_uppercase())
    }

    fn column_exists(&mut self, name: &str) -> bool {
        self.columns.contains(&name.to_uppercase())
    }

    fn index_exists(&mut self, name: &str) -> bool {
        self.indexes.contains(&name.to_uppercase())
    }

    fn procedure_exists(&mut self, name: &str) -> bool {
        self.procedures.contains(&name.to_uppercase())
    }

    fn function_exists(&mut self, name: &str) -> bool {
        self.functions.contains(&name.to_uppercase())
    }

    fn trigger_exists(&mut self, name: &str) -> bool {
        self.triggers.contains(&name.to_uppercase())
    }

    fn domain_exists(&mut self, name: &str) -> bool {
        self.domains.contains(&name.to_uppercase())
    }

    fn exception_exists(&mut self, name: &str) -> bool {
        self.exceptions.contains(&name.to_uppercase())
    }
}
