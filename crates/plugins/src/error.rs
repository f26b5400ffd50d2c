use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read plugin directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create WebAssembly engine: {source}")]
    Engine {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to instantiate plugin {path}: {source}")]
    Instantiate {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn read_dir(path: &Path, source: std::io::Error) -> Self {
        Self::ReadDir {
            path: path.to_path_buf(),
            source,
        }
    }

    #[must_use]
    pub fn engine(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Engine {
            source: source.into(),
        }
    }

    #[must_use]
    pub fn instantiate(
        path: &Path,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Instantiate {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
