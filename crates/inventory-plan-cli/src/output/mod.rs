pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Columns shown for every table row, as `(field, heading)`.
pub const ROW_COLUMNS: [(&str, &str); 9] = [
    ("key", "Key"),
    ("label", "Row"),
    ("opening", "Opening"),
    ("sell_in_total", "Sell-In"),
    ("sell_out_total", "Sell-Out"),
    ("closing", "Closing"),
    ("delta", "Delta"),
    ("sell_through", "Sell-Through %"),
    ("woi", "WOI"),
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `(tier, rows)` pairs of a dealer/HQ table pair, if `value` is one.
pub fn tier_rows(value: &Value) -> Option<Vec<(&str, &Vec<Value>)>> {
    let map: &Map<String, Value> = value.as_object()?;
    let tiers: Vec<(&str, &Vec<Value>)> = ["dealer", "hq"]
        .into_iter()
        .filter_map(|tier| {
            map.get(tier)
                .and_then(|t| t.get("rows"))
                .and_then(Value::as_array)
                .map(|rows| (tier, rows))
        })
        .collect();
    if tiers.is_empty() {
        None
    } else {
        Some(tiers)
    }
}
