//! Tokenizers shared by the provider output parsers.

use std::collections::HashMap;

use crate::collector::CollectError;

/// `Key : Value` lines keyed by lowercased key. The first occurrence of a key wins.
#[derive(Debug, Default)]
pub(crate) struct Fields {
    values: HashMap<String, String>,
}

impl Fields {
    pub(crate) fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            values
                .entry(key)
                .or_insert_with(|| value.trim().to_string());
        }
        Self { values }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Required field; `name` is reported when absent.
    pub(crate) fn require(&self, key: &str, name: &'static str) -> Result<&str, CollectError> {
        self.get(key).ok_or(CollectError::MissingField(name))
    }
}

/// First whitespace-separated token parsed as a number (`"15888 bytes"` -> 15888).
pub(crate) fn leading_number(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse().ok()
}

/// Parse a required numeric field.
pub(crate) fn number(value: &str, name: &'static str) -> Result<f64, CollectError> {
    leading_number(value)
        .ok_or_else(|| CollectError::Parse(format!("{}: not a number: '{}'", name, value)))
}

/// Split a delimited record into trimmed columns.
pub(crate) fn columns(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter).map(str::trim).collect()
}

/// Parse every hex token (`0x1a`, `1A`) in raw provider output, skipping prefixes such as `rcvd:`.
pub(crate) fn hex_bytes(text: &str) -> Vec<u8> {
    text.split_whitespace()
        .filter_map(|token| {
            let token = token.trim_start_matches("0x").trim_start_matches("0X");
            if token.len() <= 2 {
                u8::from_str_radix(token, 16).ok()
            } else {
                None
            }
        })
        .collect()
}

/// Interpret common yes/no spellings used by both providers.
pub(crate) fn boolean(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "enabled" | "active" | "running" | "started/running" => Some(true),
        "false" | "no" | "off" | "disabled" | "inactive" | "stopped" => Some(false),
        _ => None,
    }
}
