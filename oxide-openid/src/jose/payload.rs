//! The open-ended claim set of a JSON web token.
use serde_json::{Map, Value};

use super::JoseError;

/// Registered and OpenID claim names.
pub mod claims {
    /// `iss`
    pub const ISSUER: &str = "iss";
    /// `sub`
    pub const SUBJECT: &str = "sub";
    /// `aud`
    pub const AUDIENCE: &str = "aud";
    /// `exp`
    pub const EXPIRATION: &str = "exp";
    /// `iat`
    pub const ISSUED_AT: &str = "iat";
    /// `jti`
    pub const JWT_ID: &str = "jti";
    /// `auth_time`
    pub const AUTH_TIME: &str = "auth_time";
    /// `nonce`
    pub const NONCE: &str = "nonce";
    /// `acr`
    pub const ACR: &str = "acr";
    /// `amr`
    pub const AMR: &str = "amr";
    /// `azp`
    pub const AZP: &str = "azp";
    /// `c_hash`
    pub const CODE_HASH: &str = "c_hash";
    /// `at_hash`
    pub const ACCESS_TOKEN_HASH: &str = "at_hash";
}

/// Claims of a token, in insertion order.
///
/// Claims are open-ended: any json value can be stored under any name. The typed accessors
/// only interpret the standard claims and return `None` when a claim is absent or does not have
/// the expected shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JwsPayload {
    claims: Map<String, Value>,
}

impl JwsPayload {
    /// An empty claim set.
    pub fn new() -> Self {
        JwsPayload::default()
    }

    /// Set a claim, replacing any previous value but keeping its position.
    pub fn insert<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<Value>,
    {
        self.claims.insert(name.into(), value.into());
    }

    /// The raw value of a claim.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Remove a claim.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.claims.shift_remove(name)
    }

    /// Whether the claim is present.
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Iterate over claims in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.claims.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of claims.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// If there are no claims.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// A claim interpreted as a string.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }

    /// A claim interpreted as a list of strings.
    ///
    /// A single string is treated as a list of one.
    pub fn strings(&self, name: &str) -> Vec<String> {
        match self.claims.get(name) {
            Some(Value::String(single)) => vec![single.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// A claim interpreted as a NumericDate, seconds since the epoch.
    pub fn timestamp(&self, name: &str) -> Option<i64> {
        match self.claims.get(name)? {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|float| float as i64)),
            Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }

    /// The `iss` claim.
    pub fn issuer(&self) -> Option<&str> {
        self.string(claims::ISSUER)
    }

    /// The `sub` claim.
    pub fn subject(&self) -> Option<&str> {
        self.string(claims::SUBJECT)
    }

    /// The audiences, `aud` may be a single string or an array.
    pub fn audiences(&self) -> Vec<String> {
        self.strings(claims::AUDIENCE)
    }

    /// The `exp` claim.
    pub fn expiration(&self) -> Option<i64> {
        self.timestamp(claims::EXPIRATION)
    }

    /// The `iat` claim.
    pub fn issued_at(&self) -> Option<i64> {
        self.timestamp(claims::ISSUED_AT)
    }

    /// The `jti` claim.
    pub fn jti(&self) -> Option<&str> {
        self.string(claims::JWT_ID)
    }

    /// The `auth_time` claim.
    pub fn auth_time(&self) -> Option<i64> {
        self.timestamp(claims::AUTH_TIME)
    }

    /// The `nonce` claim.
    pub fn nonce(&self) -> Option<&str> {
        self.string(claims::NONCE)
    }

    /// The `acr` claim.
    pub fn acr(&self) -> Option<&str> {
        self.string(claims::ACR)
    }

    /// The `amr` claim, authentication methods.
    pub fn amr(&self) -> Vec<String> {
        self.strings(claims::AMR)
    }

    /// The `azp` claim, the authorized party.
    pub fn azp(&self) -> Option<&str> {
        self.string(claims::AZP)
    }

    /// The `c_hash` claim.
    pub fn code_hash(&self) -> Option<&str> {
        self.string(claims::CODE_HASH)
    }

    /// The `at_hash` claim.
    pub fn access_token_hash(&self) -> Option<&str> {
        self.string(claims::ACCESS_TOKEN_HASH)
    }

    /// Serialize to compact json, preserving claim order.
    pub fn to_json(&self) -> Result<String, JoseError> {
        Ok(serde_json::to_string(&self.claims)?)
    }

    /// Parse a json object.
    pub fn from_json(json: &[u8]) -> Result<Self, JoseError> {
        Ok(JwsPayload {
            claims: serde_json::from_slice(json)?,
        })
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for JwsPayload {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        JwsPayload {
            claims: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl Extend<(String, Value)> for JwsPayload {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.claims.extend(iter)
    }
}
