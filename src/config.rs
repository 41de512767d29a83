//! Runtime settings: where the city files live and how many rows a page shows.

use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::browser::DEFAULT_PAGE_SIZE;

/// Environment variable naming the directory holding the city CSV files.
pub const DATA_DIR_ENV: &str = "BIKESHARE_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Builds the config from a command-line value, then `BIKESHARE_DATA_DIR`, then the default.
    pub fn from_env(data_dir: Option<PathBuf>, page_size: usize) -> Result<Self> {
        Self::resolve(data_dir, std::env::var(DATA_DIR_ENV).ok(), page_size)
    }

    /// Same as [`Config::from_env`] with the environment value passed in.
    pub fn resolve(
        data_dir: Option<PathBuf>,
        env_data_dir: Option<String>,
        page_size: usize,
    ) -> Result<Self> {
        if page_size == 0 {
            bail!("Page size must be at least 1");
        }

        let data_dir = data_dir
            .or_else(|| env_data_dir.filter(|d| !d.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| Config::default().data_dir);

        Ok(Self {
            data_dir,
            page_size,
        })
    }
}
