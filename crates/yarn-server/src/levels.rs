//! Level catalog loading.

use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};
use yarn_core::{LevelCatalog, PuzzleError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Cannot read level file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse level file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Level file has no levels")]
    Empty,

    #[error(transparent)]
    Invalid(#[from] PuzzleError),
}

/// Read and check every level in the file at `path`.
pub async fn read_catalog(path: &Path) -> Result<LevelCatalog, CatalogError> {
    let text = tokio::fs::read_to_string(path).await?;
    let catalog = LevelCatalog::from_json(&text)?;
    if catalog.levels.is_empty() {
        return Err(CatalogError::Empty);
    }
    for (index, level) in catalog.levels.iter().enumerate() {
        level.validate(index as u32 + 1)?;
    }
    Ok(catalog)
}

/// Level catalog from `path`, or the built-in levels if it cannot be used.
pub async fn load_catalog(path: &Path) -> LevelCatalog {
    match read_catalog(path).await {
        Ok(catalog) => {
            info!("Loaded {} levels from {}", catalog.levels.len(), path.display());
            catalog
        }
        Err(e) => {
            warn!("{} ({}); using built-in levels", e, path.display());
            LevelCatalog::builtin()
        }
    }
}
