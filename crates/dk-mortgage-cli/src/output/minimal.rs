use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Comparison: the cheapest institution
    if let Some(Value::Object(first)) = result_obj
        .get("rows")
        .and_then(|rows| rows.as_array())
        .and_then(|rows| rows.first())
    {
        if let (Some(name), Some(cost)) = (first.get("institution"), first.get("total_lifetime_cost")) {
            println!("{}: {}", format_minimal(name), format_minimal(cost));
            return;
        }
    }

    // Schedules and yearly summaries: the row count
    if let Value::Array(rows) = result_obj {
        println!("{}", rows.len());
        return;
    }

    // Priority list of key output fields
    let priority_keys = [
        "aop",
        "combined_net",
        "net_monthly_dkk",
        "tax_saving",
        "total_cost",
        "version",
    ];

    if let Value::Object(map) = result_obj {
        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
