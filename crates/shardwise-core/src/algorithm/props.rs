use crate::error::{ConfigError, InternalError};
use serde::Deserialize;
use std::{collections::BTreeMap, fmt};

///
/// PropValue
///
/// One algorithm property as written in configuration. TOML integers and
/// strings are both accepted; numeric lists are written as comma-separated
/// strings (`"1, 5, 10"`) or arrays.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum PropValue {
    Int(i64),
    Text(String),
    List(Vec<Self>),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
            Self::List(values) => {
                let joined = values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{joined}")
            }
        }
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

///
/// AlgorithmProps
///
/// Typed accessors over the raw property map of one configured algorithm.
/// Every accessor reports a configuration error naming the property.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct AlgorithmProps(BTreeMap<String, PropValue>);

impl AlgorithmProps {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue)> {
        self.0.iter()
    }

    pub fn require_i128(&self, key: &str) -> Result<i128, InternalError> {
        let value = self.require(key)?;
        parse_i128(key, value)
    }

    /// Positive count property (shard count, volume).
    pub fn require_positive(&self, key: &str) -> Result<u64, InternalError> {
        let value = self.require_i128(key)?;

        u64::try_from(value)
            .ok()
            .filter(|count| *count > 0)
            .ok_or_else(|| invalid(key, format!("expected a positive integer, found {value}")))
    }

    pub fn require_i128_list(&self, key: &str) -> Result<Vec<i128>, InternalError> {
        match self.require(key)? {
            PropValue::List(items) => items.iter().map(|item| parse_i128(key, item)).collect(),
            PropValue::Int(value) => Ok(vec![i128::from(*value)]),
            PropValue::Text(text) => split_list(text)
                .map(|item| {
                    item.parse::<i128>()
                        .map_err(|_| invalid(key, format!("'{item}' is not an integer")))
                })
                .collect(),
        }
    }

    pub fn require_text_list(&self, key: &str) -> Result<Vec<String>, InternalError> {
        let items: Vec<String> = match self.require(key)? {
            PropValue::List(items) => items.iter().map(ToString::to_string).collect(),
            PropValue::Int(value) => vec![value.to_string()],
            PropValue::Text(text) => split_list(text).map(str::to_string).collect(),
        };
        if items.is_empty() {
            return Err(invalid(key, "expected at least one entry"));
        }

        Ok(items)
    }

    fn require(&self, key: &str) -> Result<&PropValue, InternalError> {
        self.0
            .get(key)
            .ok_or_else(|| invalid(key, "property is required"))
    }
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn parse_i128(key: &str, value: &PropValue) -> Result<i128, InternalError> {
    match value {
        PropValue::Int(value) => Ok(i128::from(*value)),
        PropValue::Text(text) => text
            .trim()
            .parse::<i128>()
            .map_err(|_| invalid(key, format!("'{text}' is not an integer"))),
        PropValue::List(_) => Err(invalid(key, "expected a single integer")),
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> InternalError {
    InternalError::algorithm_config(ConfigError::InvalidProperty {
        property: key.to_string(),
        reason: reason.into(),
    })
}
