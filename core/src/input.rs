use std::collections::HashMap;
use anyhow::{anyhow, Result};

/// Metadata keys accepted by `hrm task add`.
pub const TASK_KEYS: &[&str] = &["start", "close", "status", "eval", "project"];

/// Metadata keys accepted by `hrm user register` / `hrm user update`.
pub const USER_KEYS: &[&str] = &["first", "last", "patronymic", "position", "hired", "plan", "roles"];

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub name: String,
    pub metadata: HashMap<String, String>,
}

/// Splits free words from `key:value` pairs. Only the first `:` separates,
/// so `start:2024-01-01 09:00` keeps its time.
pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut name_parts = Vec::new();
    let mut metadata = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic()) {
                metadata.insert(key.to_lowercase(), value.to_string());
                continue;
            }
        }
        name_parts.push(arg.as_str());
    }

    ParsedInput {
        name: name_parts.join(" "),
        metadata,
    }
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(anyhow!("Unknown key: '{}'", key)),
        _ => Err(anyhow!("Ambiguous key: '{}' matches {:?}", key, matches)),
    }
}

/// Expands every metadata key against `candidates`; the first bad key is an error.
pub fn normalize_metadata(metadata: HashMap<String, String>, candidates: &[&str]) -> Result<HashMap<String, String>> {
    let mut normalized = HashMap::with_capacity(metadata.len());
    for (key, value) in metadata {
        let full_key = expand_key(&key, candidates)?;
        normalized.insert(full_key, value);
    }
    Ok(normalized)
}
