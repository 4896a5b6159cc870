use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a JSON input file (loan, comparison, foreign property or combined
/// parameters) into its typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let path = existing_file(path)?;
    let contents = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    debug!(path = %path.display(), bytes = contents.len(), "input file read");
    parse(&contents, &path)
}

fn parse<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    serde_json::from_str(contents)
        .map_err(|e| format!("Failed to parse '{}' at line {}: {}", path.display(), e.line(), e).into())
}

/// Absolute path of an existing regular file.
fn existing_file(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let full = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !full.is_file() {
        let what = if full.exists() { "Not a file" } else { "File not found" };
        return Err(format!("{}: {}", what, full.display()).into());
    }
    Ok(full)
}
