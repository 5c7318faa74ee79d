use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::FieldSchema;

use super::error::FieldCoercionError;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(num) => num.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

/// Empty optional text is absent; empty required text is kept so the
/// schema's length rule reports it.
pub(super) fn string_value(
    contents: &str,
    schema: &FieldSchema,
) -> Result<Option<Value>, FieldCoercionError> {
    if contents.is_empty() && !schema.required {
        return Ok(None);
    }
    Ok(Some(Value::String(contents.to_string())))
}

pub(super) fn date_value(
    contents: &str,
    schema: &FieldSchema,
) -> Result<Option<Value>, FieldCoercionError> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        if schema.required {
            return Err(FieldCoercionError {
                pointer: schema.pointer.clone(),
                message: "date is required".to_string(),
            });
        }
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(|date| Some(Value::String(date.format(DATE_FORMAT).to_string())))
        .map_err(|_| FieldCoercionError {
            pointer: schema.pointer.clone(),
            message: format!("'{trimmed}' is not a date (expected YYYY-MM-DD)"),
        })
}
