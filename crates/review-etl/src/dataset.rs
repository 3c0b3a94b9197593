//! Dataset access: locating dataset directories and reading/writing CSV tables.
//!
//! A [`DatasetStore`] turns a dataset identifier into a local directory.
//! [`LocalDatasetStore`] serves datasets from a directory tree laid out as
//! `<root>/<dataset_id>/[latest/]<file>`.

use crate::error::{EtlError, Result};
use crate::table::Table;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the version directory preferred inside a dataset directory.
pub const LATEST_VERSION_DIR: &str = "latest";

/// Provides local copies of datasets by identifier.
pub trait DatasetStore: Send + Sync {
    /// Local directory holding the dataset's files.
    fn local_copy(&self, dataset_id: &str) -> Result<PathBuf>;

    /// Path of `file_name` inside the dataset, failing if it does not exist.
    fn file_path(&self, dataset_id: &str, file_name: &str) -> Result<PathBuf> {
        let path = self.local_copy(dataset_id)?.join(file_name);
        if !path.is_file() {
            return Err(EtlError::DatasetFetch {
                dataset_id: dataset_id.to_string(),
                reason: format!("file not found: {}", path.display()),
            });
        }
        Ok(path)
    }

    /// Load `file_name` from the dataset as a table.
    fn load_table(&self, dataset_id: &str, file_name: &str) -> Result<Table> {
        let path = self.file_path(dataset_id, file_name)?;
        info!("Loading dataset from: {}", path.display());
        let table = Table::from_frame(read_csv(&path)?)?;
        info!(
            "Dataset loaded successfully: ({}, {})",
            table.height(),
            table.width()
        );
        Ok(table)
    }
}

/// Serves datasets from a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalDatasetStore {
    root: PathBuf,
}

impl LocalDatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DatasetStore for LocalDatasetStore {
    fn local_copy(&self, dataset_id: &str) -> Result<PathBuf> {
        let fetch_error = |reason: String| EtlError::DatasetFetch {
            dataset_id: dataset_id.to_string(),
            reason,
        };

        if dataset_id.trim().is_empty()
            || dataset_id.contains("..")
            || Path::new(dataset_id).is_absolute()
        {
            return Err(fetch_error("invalid dataset identifier".to_string()));
        }

        let dir = self.root.join(dataset_id);
        if !dir.is_dir() {
            return Err(fetch_error(format!(
                "dataset directory not found: {}",
                dir.display()
            )));
        }

        let latest = dir.join(LATEST_VERSION_DIR);
        if latest.is_dir() {
            debug!("Using latest version of '{}'", dataset_id);
            return Ok(latest);
        }
        Ok(dir)
    }
}

/// Read a comma-separated file with a header row.
///
/// The schema is inferred from the whole file. If parsing fails, the file is
/// read again with doubled quote artifacts and blank lines removed.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let first_attempt = CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish();

    match first_attempt {
        Ok(df) => return Ok(df),
        Err(e) => {
            warn!(
                "Standard loading of {} failed, retrying with cleaned content: {}",
                path.display(),
                e
            );
        }
    }

    let content = std::fs::read_to_string(path)?;
    let df = CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(clean_csv_content(&content)))
        .finish()?;
    Ok(df)
}

/// Strip doubled quote artifacts and blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write a table as comma-separated text with a header row and no index column.
///
/// Parent directories are created as needed.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
        info!("Created output directory: {}", parent.display());
    }

    let mut df = table.frame().clone();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)?;

    info!("Dataset saved: {}", path.display());
    Ok(())
}
