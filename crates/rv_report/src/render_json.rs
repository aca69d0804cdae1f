//! JSON renderer.
//!
//! Section order is fixed by the struct field order of the model; maps were
//! flattened into ordered vectors upstream, so the output is byte-stable for
//! a given results record.

use serde_json::Value;

use crate::structure::ReportModel;

/// Render the report as a JSON value.
pub fn render_report_json(model: &ReportModel) -> Value {
    // The model is plain data; serialization cannot fail.
    serde_json::to_value(model).unwrap_or(Value::Null)
}

/// Render as a pretty-printed string with a trailing newline.
pub fn render_report_json_string(model: &ReportModel) -> String {
    let mut s = serde_json::to_string_pretty(&render_report_json(model)).unwrap_or_default();
    s.push('\n');
    s
}
