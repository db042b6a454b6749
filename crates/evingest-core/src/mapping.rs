//! Header mapping resolver.
//!
//! A [`HeaderMapping`] rule fills a gap in the input's column/key set:
//!
//! - no `source` → create `target` filled with `default_value`;
//! - one `source` → rename that column to `target`;
//! - several `source`s → create `target` by concatenating `"name: value | "`
//!   for each source, in declaration order.
//!
//! [`HeaderMapper`] validates a rule set against a header set and applies it
//! to records. Rules are applied highest-arity first (stable within equal
//! arity) so a combine reads its sources before a rename moves one of them.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Reverse;
use std::path::Path;

use crate::config::ConfigError;
use crate::error::ValidationError;
use crate::types::{EventRecord, FieldValue};

/// One rename/combine/default-fill rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMapping {
    pub target: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: Vec<String>,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl HeaderMapping {
    pub fn rename(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: vec![source.into()],
            default_value: None,
        }
    }

    pub fn combine<I, S>(target: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            source: sources.into_iter().map(Into::into).collect(),
            default_value: None,
        }
    }

    pub fn default_fill(target: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            target: target.into(),
            source: Vec::new(),
            default_value: Some(value.into()),
        }
    }

    pub fn arity(&self) -> usize {
        self.source.len()
    }

    /// Load a JSON array of rules, as produced by upload clients.
    pub fn load_rules(path: &Path) -> Result<Vec<HeaderMapping>, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::MappingRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::MappingParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn has_default(&self) -> bool {
        match &self.default_value {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

/// A rule set sorted for application. Built once per file.
#[derive(Debug, Clone, Default)]
pub struct HeaderMapper {
    rules: Vec<HeaderMapping>,
}

impl HeaderMapper {
    pub fn new(mut rules: Vec<HeaderMapping>) -> Self {
        rules.sort_by_key(|rule| Reverse(rule.arity()));
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[HeaderMapping] {
        &self.rules
    }

    /// Names produced by the rules.
    pub fn targets(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.target.clone()).collect()
    }

    /// Check the rule set against the raw header/key set.
    pub fn validate(&self, headers: &[String]) -> Result<(), ValidationError> {
        let mut renamed: Vec<(&str, &str)> = Vec::new();

        for rule in &self.rules {
            if headers.contains(&rule.target) {
                return Err(ValidationError::MappingTargetExists {
                    target: rule.target.clone(),
                    headers: headers.to_vec(),
                });
            }

            if rule.source.is_empty() {
                if !rule.has_default() {
                    return Err(ValidationError::MappingMissingDefault {
                        target: rule.target.clone(),
                    });
                }
                continue;
            }

            if let Some(missing) = rule.source.iter().find(|s| !headers.contains(s)) {
                return Err(ValidationError::MappingSourceNotFound {
                    target: rule.target.clone(),
                    sources: rule.source.clone(),
                    missing: missing.clone(),
                    headers: headers.to_vec(),
                });
            }

            if let [single] = rule.source.as_slice() {
                renamed.push((single.as_str(), rule.target.as_str()));
            }
        }

        for (idx, (source, _)) in renamed.iter().enumerate() {
            if renamed[..idx].iter().any(|(s, _)| s == source) {
                let targets = renamed
                    .iter()
                    .filter(|(s, _)| s == source)
                    .map(|(_, t)| t.to_string())
                    .collect();
                return Err(ValidationError::MappingAmbiguousSource {
                    source_header: source.to_string(),
                    targets,
                });
            }
        }

        Ok(())
    }

    /// Apply every rule to `record` in arity order.
    pub fn apply(&self, record: &mut EventRecord) {
        for rule in &self.rules {
            match rule.source.as_slice() {
                [] => {
                    let value = rule
                        .default_value
                        .clone()
                        .map_or(FieldValue::Null, FieldValue::from);
                    record.insert(rule.target.clone(), value);
                }
                [single] => {
                    record.rename(single, &rule.target);
                }
                sources => {
                    let mut combined = String::new();
                    for source in sources {
                        let value = record
                            .get(source)
                            .map_or_else(|| FieldValue::Null.to_text(), FieldValue::to_text);
                        combined.push_str(&format!("{source}: {value} | "));
                    }
                    record.insert(rule.target.clone(), FieldValue::Text(combined));
                }
            }
        }
    }

    /// The header set after the rules run, in output order.
    pub fn mapped_headers(&self, headers: &[String]) -> Vec<String> {
        let mut record: EventRecord = headers
            .iter()
            .map(|h| (h.clone(), FieldValue::Null))
            .collect();
        self.apply(&mut record);
        record.key_list()
    }
}

impl std::fmt::Display for HeaderMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.rules) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("[]"),
        }
    }
}
