use chrono::Local;
use dk_mortgage_core::rates::RateSheet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load the rate sheet from `path` (TOML when the extension is `.toml`,
/// JSON otherwise), or the built-in sheet. The sheet is validated and a
/// staleness notice is logged against today's date.
pub fn load_rates(path: Option<&str>) -> Result<RateSheet, Box<dyn std::error::Error>> {
    let sheet = match path {
        Some(path) => {
            let p = Path::new(path);
            let contents = fs::read_to_string(p)
                .map_err(|e| format!("Failed to read rate sheet '{}': {}", p.display(), e))?;
            let sheet = parse_rates(&contents, p)?;
            info!(path = %p.display(), as_of = %sheet.as_of, "rate sheet loaded");
            sheet
        }
        None => {
            debug!("using built-in rate sheet");
            RateSheet::default()
        }
    };

    sheet.validate()?;
    if let Some(notice) = sheet.staleness_warning(Local::now().date_naive()) {
        warn!("{notice}");
    }
    Ok(sheet)
}

fn parse_rates(contents: &str, path: &Path) -> Result<RateSheet, Box<dyn std::error::Error>> {
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let sheet = if is_toml {
        toml::from_str(contents).map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?
    } else {
        serde_json::from_str(contents).map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?
    };
    Ok(sheet)
}
