use rust_decimal::Decimal;
use serde_json::Value;
use tabled::{Table, builder::Builder};

use super::{tier_rows, ROW_COLUMNS};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // Check if "result" key holds the primary data
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    // Print the result section
    if let Some(tiers) = tier_rows(result) {
        for (tier, rows) in tiers {
            println!("{}", tier_title(tier));
            print_row_grid(rows);
        }
    } else if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn tier_title(tier: &str) -> &str {
    match tier {
        "dealer" => "Dealer",
        "hq" => "HQ",
        other => other,
    }
}

/// One grid per tier: a line per row, summary columns only.
fn print_row_grid(rows: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(ROW_COLUMNS.iter().map(|(_, heading)| *heading));
    for row in rows {
        let record: Vec<String> = ROW_COLUMNS
            .iter()
            .map(|(field, _)| row.get(*field).map(format_figure).unwrap_or_default())
            .collect();
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}

/// Decimal strings are shown to one place; anything else as-is.
fn format_figure(value: &Value) -> String {
    match value {
        Value::String(s) => s
            .parse::<Decimal>()
            .map(|d| d.round_dp(1).normalize().to_string())
            .unwrap_or_else(|_| s.clone()),
        other => format_value(other),
    }
}

fn print_flat_object(value: &Value) {
    if let Some(tiers) = tier_rows(value) {
        for (tier, rows) in tiers {
            println!("{}", tier_title(tier));
            print_row_grid(rows);
        }
        return;
    }
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(|v| format_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_value(v)).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
