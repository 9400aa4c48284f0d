use serde_json::Value;
use std::io;

use super::{tier_rows, ROW_COLUMNS};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let tiers = map.get("result").and_then(tier_rows).or_else(|| tier_rows(value));
            if let Some(tiers) = tiers {
                write_tier_csv(&mut wtr, &tiers);
            } else if let Some(Value::Object(result)) = map.get("result") {
                // Two-column CSV: field, value
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Long format: one record per tier row, full precision.
fn write_tier_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, tiers: &[(&str, &Vec<Value>)]) {
    let mut headers = vec!["tier"];
    headers.extend(ROW_COLUMNS.iter().map(|(field, _)| *field));
    let _ = wtr.write_record(&headers);

    for (tier, rows) in tiers {
        for row in rows.iter() {
            let mut record = vec![tier.to_string()];
            record.extend(
                ROW_COLUMNS
                    .iter()
                    .map(|(field, _)| row.get(*field).map(format_csv_value).unwrap_or_default()),
            );
            let _ = wtr.write_record(&record);
        }
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(*h)
                            .map(|v| format_csv_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
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
