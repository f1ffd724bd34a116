//! Declarative mapping of resource owner claims into id token claims.
//!
//! Deployments often name claims differently than OpenID Connect does. A mapping is a list of
//! rules loaded from configuration, each copying one source claim to a target claim with an
//! optional transform. There is no way to run arbitrary code.
use serde_json::Value;

use crate::jose::JwsPayload;

/// A list of rules applied to the claims of a resource owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsMapping {
    /// Copy every claim not named as a rule source unchanged.
    pub passthrough: bool,

    /// Rules applied in order. A later rule overwrites the target of an earlier one.
    pub rules: Vec<ClaimRule>,
}

/// Copy one claim to another name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClaimRule {
    /// The claim of the resource owner.
    pub source: String,

    /// The claim in the id token.
    pub target: String,

    /// How the value is changed on the way.
    #[serde(default)]
    pub transform: Transform,
}

/// A fixed set of value transforms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// The value as is.
    Copy,
    /// Lowercase a string, or every string of an array.
    Lowercase,
    /// Uppercase a string, or every string of an array.
    Uppercase,
    /// Split a string into an array.
    Split {
        /// Where to split.
        separator: String,
    },
    /// Join an array of strings into one string.
    Join {
        /// Inserted between elements.
        separator: String,
    },
    /// The first element of an array.
    First,
}

impl Default for ClaimsMapping {
    fn default() -> Self {
        ClaimsMapping {
            passthrough: true,
            rules: Vec::new(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::Copy
    }
}

impl ClaimsMapping {
    /// Apply all rules to the claims.
    ///
    /// Sources that are missing, or whose value does not fit the transform, produce no target.
    pub fn apply(&self, claims: &JwsPayload) -> JwsPayload {
        let mut mapped = JwsPayload::new();
        if self.passthrough {
            mapped.extend(
                claims
                    .iter()
                    .filter(|(name, _)| !self.rules.iter().any(|rule| rule.source == *name))
                    .map(|(name, value)| (name.to_string(), value.clone())),
            );
        }

        for rule in &self.rules {
            let value = match claims.get(&rule.source) {
                Some(value) => value,
                None => continue,
            };
            if let Some(value) = rule.transform.apply(value) {
                mapped.insert(rule.target.clone(), value);
            }
        }
        mapped
    }
}

impl ClaimRule {
    /// A rule renaming a claim.
    pub fn rename(source: &str, target: &str) -> Self {
        ClaimRule {
            source: source.to_string(),
            target: target.to_string(),
            transform: Transform::Copy,
        }
    }

    /// Change the transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

impl Transform {
    fn apply(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Transform::Copy, value) => Some(value.clone()),
            (Transform::Lowercase, value) => map_strings(value, str::to_lowercase),
            (Transform::Uppercase, value) => map_strings(value, str::to_uppercase),
            (Transform::Split { separator }, Value::String(string)) => Some(Value::Array(
                string
                    .split(separator.as_str())
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            (Transform::Join { separator }, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str())
                .collect::<Option<Vec<_>>>()
                .map(|parts| Value::String(parts.join(separator))),
            (Transform::First, Value::Array(items)) => items.first().cloned(),
            _ => None,
        }
    }
}

fn map_strings(value: &Value, f: fn(&str) -> String) -> Option<Value> {
    match value {
        Value::String(string) => Some(Value::String(f(string))),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(|string| Value::String(f(string))))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        _ => None,
    }
}
