use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Parameters piped in as JSON. `None` when stdin is a terminal or the pipe
/// is empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped<T: DeserializeOwned>(buffer: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse stdin: {e}"))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dk_mortgage_core::tax::deduction::DeductionInput;
    use rust_decimal_macros::dec;

    #[test]
    fn test_blank_pipe_is_none() {
        assert!(parse_piped::<DeductionInput>("  \n").unwrap().is_none());
    }

    #[test]
    fn test_piped_json_parsed() {
        let input: DeductionInput = parse_piped(r#" {"annual_interest": "80000"} "#).unwrap().unwrap();
        assert_eq!(input.annual_interest, dec!(80_000));
    }
}
