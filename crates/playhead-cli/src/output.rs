//! Output formatting for CLI

use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Print a record: pretty JSON, or `key: value` lines for text
pub fn print_record<T: Serialize>(data: &T, format: &str) -> anyhow::Result<()> {
    println!("{}", format_output(data, format)?);
    Ok(())
}

/// Format output based on selected format
pub fn format_output<T: Serialize>(data: &T, format: &str) -> anyhow::Result<String> {
    let value = serde_json::to_value(data)?;
    Ok(match OutputFormat::from(format) {
        OutputFormat::Json => serde_json::to_string_pretty(&value)?,
        OutputFormat::Text => text_lines(&value, ""),
    })
}

fn text_lines(value: &serde_json::Value, prefix: &str) -> String {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match value {
                    serde_json::Value::Object(_) => text_lines(value, &key),
                    _ => format!("{key}: {}", scalar(value)),
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => scalar(value),
    }
}

fn scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
