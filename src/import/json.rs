use crate::error::{ImportError, NutriRsError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::models::RawDailyRecord;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// JSON day-series importer.
///
/// Accepts a bare array of day records, or the weekly-summary envelope
/// `{"days": [...]}`. Anything else is a validation error.
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse day records from a JSON document
    pub fn parse_str(&self, content: &str) -> Result<Vec<RawDailyRecord>> {
        let document: Value = serde_json::from_str(content).map_err(|e| ImportError::ParseError {
            format: "JSON".to_string(),
            reason: e.to_string(),
        })?;

        let days = match document {
            Value::Array(days) => days,
            Value::Object(mut envelope) => match envelope.remove("days") {
                Some(Value::Array(days)) => days,
                Some(other) => {
                    return Err(NutriRsError::Validation(format!(
                        "\"days\" must be an array, found {}",
                        kind(&other)
                    )))
                }
                None => {
                    return Err(NutriRsError::Validation(
                        "expected an array of days or an object with a \"days\" array".to_string(),
                    ))
                }
            },
            other => {
                return Err(NutriRsError::Validation(format!(
                    "expected a day-series, found {}",
                    kind(&other)
                )))
            }
        };

        days.into_iter()
            .enumerate()
            .map(|(index, day)| {
                if !day.is_object() {
                    return Err(NutriRsError::Validation(format!(
                        "day {} must be an object, found {}",
                        index,
                        kind(&day)
                    )));
                }
                serde_json::from_value(day).map_err(|e| {
                    ImportError::ParseError {
                        format: "JSON".to_string(),
                        reason: format!("day {}: {}", index, e),
                    }
                    .into()
                })
            })
            .collect()
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, &["json"])
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<RawDailyRecord>> {
        let content = fs::read_to_string(file_path)?;
        self.parse_str(&content)
    }

    fn get_format_name(&self) -> &'static str {
        "JSON"
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
