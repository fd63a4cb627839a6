use serde_json::Value;

/// Headline figure per command, in priority order.
const PRIORITY_KEYS: [&str; 7] = [
    "blended_value_per_share",
    "insight",
    "score",
    "ensemble_flags",
    "count",
    "version",
    "headline",
];

/// Print just the key answer from the output.
///
/// Looks for the well-known headline fields first, then falls back to the
/// first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            match map.get(key) {
                // An insight prints as "score headline"
                Some(Value::Object(insight)) if key == "insight" => {
                    let score = insight.get("score").map(format_minimal).unwrap_or_default();
                    let headline = insight.get("headline").map(format_minimal).unwrap_or_default();
                    println!("{score} {headline}");
                    return;
                }
                Some(val) if !val.is_null() => {
                    println!("{}", format_minimal(val));
                    return;
                }
                _ => {}
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Arrays (e.g. derived records) print their length
    if let Value::Array(arr) = result_obj {
        println!("{} records", arr.len());
        return;
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Bool(true) => "1",
                Value::Bool(false) => "0",
                _ => "?",
            })
            .collect(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
