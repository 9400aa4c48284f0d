use serde_json::Value;

use super::tier_rows;

/// Print just the key answer value from the output.
///
/// For a dealer/HQ table pair that is each tier's grand total closing stock
/// and WOI. Otherwise look for well-known row fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(tiers) = tier_rows(result_obj) {
        for (tier, rows) in tiers {
            let total = rows
                .iter()
                .find(|r| r.get("is_total").and_then(Value::as_bool) == Some(true));
            if let Some(total) = total {
                println!(
                    "{}: closing {}, woi {}",
                    tier,
                    total.get("closing").map(format_minimal).unwrap_or_default(),
                    total.get("woi").map(format_minimal).unwrap_or_default(),
                );
            }
        }
        return;
    }

    // Priority list of key output fields
    let priority_keys = ["woi", "closing", "sell_in_total", "sell_through"];

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
