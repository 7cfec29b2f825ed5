use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Field {
    From,
    To,
    Subject,
    Message,
    DateReceived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringPredicate {
    Contains,
    DoesNotContain,
    Equals,
    DoesNotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePredicate {
    LessThanDays,
    GreaterThanDays,
    LessThanMonths,
    GreaterThanMonths,
}

/// The predicate names of both kinds are disjoint, so the kind is recovered from the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    String(StringPredicate),
    Date(DatePredicate),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ConditionValue {
    pub fn as_text(&self) -> String {
        match self {
            ConditionValue::Integer(v) => v.to_string(),
            ConditionValue::Float(v) => format!("{v:?}"),
            ConditionValue::Text(s) => s.clone(),
        }
    }

    /// Whole-number threshold for date predicates. Fractions are truncated.
    pub fn as_threshold(&self) -> Option<i64> {
        match self {
            ConditionValue::Integer(v) => Some(*v),
            ConditionValue::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            ConditionValue::Float(_) => None,
            ConditionValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Condition {
    pub field: Field,
    pub predicate: Predicate,
    pub value: ConditionValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    MarkAsRead,
    MarkAsUnread,
    MoveMessage,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub mailbox: Option<String>,
}

impl Action {
    /// Destination for `move_message`; blank or absent means the inbox.
    pub fn mailbox_or_inbox(&self) -> &str {
        match self.mailbox.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => "Inbox",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rule {
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(rename = "match", default)]
    pub match_mode: MatchMode,
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn default_description() -> String {
    "Rule".to_string()
}

/// Reads a rules document from disk. Either the whole set loads or nothing does.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::Missing(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    parse_rules(&content)
}

/// Accepts `[rule, ...]` or `{"rules": [rule, ...]}`.
pub fn parse_rules(content: &str) -> Result<Vec<Rule>, ConfigError> {
    let document: serde_json::Value = serde_json::from_str(content)?;
    let rules = match document {
        serde_json::Value::Object(mut map) if map.contains_key("rules") => {
            map.remove("rules").unwrap_or_default()
        }
        other => other,
    };
    Ok(serde_json::from_value(rules)?)
}
