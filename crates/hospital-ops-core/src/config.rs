//! Store configuration.
//!
//! Resolved once at process start-up and handed to [`RecordStore::open`](crate::store::RecordStore::open).
//! The core never reads environment variables itself; the binary decides where
//! the data directory comes from.

use std::path::{Path, PathBuf};

use crate::store::{StoreError, StoreResult, TableSpec};

/// Default extension for table files.
pub const DEFAULT_TABLE_EXTENSION: &str = "txt";

/// Where the flat-file tables live.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    data_dir: PathBuf,
    table_extension: String,
}

impl StoreConfig {
    /// Create a configuration rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        if data_dir.as_os_str().is_empty() {
            return Err(StoreError::Config("data directory cannot be empty".into()));
        }

        Ok(Self {
            data_dir,
            table_extension: DEFAULT_TABLE_EXTENSION.to_string(),
        })
    }

    /// Override the table file extension (without the leading dot).
    pub fn with_table_extension(mut self, extension: &str) -> StoreResult<Self> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(&['/', '\\'][..]) {
            return Err(StoreError::Config(format!(
                "invalid table extension: {:?}",
                extension
            )));
        }
        self.table_extension = extension.to_string();
        Ok(self)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn table_extension(&self) -> &str {
        &self.table_extension
    }

    /// Path of the file backing `table`.
    pub fn table_path(&self, table: &TableSpec) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", table.name, self.table_extension))
    }
}
