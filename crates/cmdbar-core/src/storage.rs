use crate::error::{CmdbarError, Result};
use crate::models::Snippet;
use std::fs;
use std::path::Path;

/// Load all snippets from the database file
pub fn load_snippets(path: &Path) -> Result<Vec<Snippet>> {
    if !path.exists() {
        return Err(CmdbarError::DatabaseNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let content = fs::read_to_string(path)?;

    // Handle empty database file
    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    serde_json::from_str(&content).map_err(|e| e.into())
}

/// Save the full snippet collection to the database file
pub fn save_snippets(path: &Path, snippets: &[Snippet]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let serialized = serde_json::to_string_pretty(snippets)?;
    fs::write(path, serialized)?;

    Ok(())
}
