pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Command input from `--input <file>`, else piped stdin. `None` means the
/// caller should build the input from flags.
pub fn read_input<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(file::read_json(path)?)),
        None => stdin::read_stdin(),
    }
}
