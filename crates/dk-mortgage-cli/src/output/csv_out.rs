use serde_json::Value;
use std::io::{self, Write};
use tracing::warn;

/// Write output as CSV to stdout. Write failures (a closed pipe, say) are
/// logged rather than aborting the process.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    if let Err(e) = write_csv(&mut wtr, value) {
        warn!(error = %e, "CSV output incomplete");
    }
}

fn write_csv<W: Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match value {
        Value::Object(map) => match map.get("result") {
            // Schedule or yearly summary
            Some(Value::Array(rows)) => write_array_csv(wtr, rows)?,
            // Ranked comparison rows
            Some(result) if result.get("rows").is_some_and(Value::is_array) => {
                if let Some(Value::Array(rows)) = result.get("rows") {
                    write_array_csv(wtr, rows)?;
                }
            }
            Some(Value::Object(result)) => write_fields(wtr, result)?,
            _ => write_fields(wtr, map)?,
        },
        Value::Array(arr) => write_array_csv(wtr, arr)?,
        _ => wtr.write_record([&format_csv_value(value)])?,
    }
    wtr.flush()?;
    Ok(())
}

/// Two-column CSV: field, value.
fn write_fields<W: Write>(wtr: &mut csv::Writer<W>, map: &serde_json::Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &format_csv_value(val)])?;
    }
    Ok(())
}

fn write_array_csv<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
        return Ok(());
    };

    // Headers from the first row
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        {
            let mut wtr = csv::Writer::from_writer(&mut buf);
            write_csv(&mut wtr, value).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_comparison_rows_become_csv_rows() {
        let value = json!({
            "result": {
                "rows": [
                    { "institution": "Totalkredit", "rank": 1 },
                    { "institution": "Nykredit", "rank": 2 }
                ],
                "failures": []
            }
        });
        assert_eq!(render(&value), "institution,rank\nTotalkredit,1\nNykredit,2\n");
    }

    #[test]
    fn test_scalar_result_as_field_value_pairs() {
        let value = json!({ "result": { "aop": null, "tax_saving": "24000" } });
        assert_eq!(render(&value), "field,value\naop,\ntax_saving,24000\n");
    }

    #[test]
    fn test_write_failure_is_an_error() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
        }
        let mut wtr = csv::Writer::from_writer(Closed);
        assert!(write_csv(&mut wtr, &json!({ "result": { "a": 1 } })).is_err());
    }
}
