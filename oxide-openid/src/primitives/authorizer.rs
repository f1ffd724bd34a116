//! Storage of authorization codes between authorization and redemption.
//!
//! A code is written once when the resource owner authorizes a request and read back when the
//! client redeems it. Redemption removes the record, so a code value is usable at most once.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::grant::AuthorizationCode;
use super::PrimitiveError;

/// Storage of authorization codes.
#[async_trait]
pub trait AuthorizationCodeRepository: Send + Sync {
    /// Store a code under its value, unless that value is already taken.
    ///
    /// Returns `false` without modifying the stored code if the value exists. Codes are never
    /// overwritten.
    async fn insert(&self, code: AuthorizationCode) -> Result<bool, PrimitiveError>;

    /// Look up a code without consuming it.
    async fn get(&self, code: &str) -> Result<Option<AuthorizationCode>, PrimitiveError>;

    /// Remove and return a code. At most one caller receives it.
    async fn take(&self, code: &str) -> Result<Option<AuthorizationCode>, PrimitiveError>;
}

/// A simple in-memory map of code values to their records.
#[derive(Default)]
pub struct CodeMap {
    codes: Mutex<HashMap<String, AuthorizationCode>>,
}

impl CodeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        CodeMap::default()
    }

    fn codes(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, AuthorizationCode>>, PrimitiveError> {
        self.codes
            .lock()
            .map_err(|_| PrimitiveError::Unavailable("code store poisoned".into()))
    }
}

#[async_trait]
impl AuthorizationCodeRepository for CodeMap {
    async fn insert(&self, code: AuthorizationCode) -> Result<bool, PrimitiveError> {
        let mut codes = self.codes()?;
        if codes.contains_key(&code.code) {
            return Ok(false);
        }
        codes.insert(code.code.clone(), code);
        Ok(true)
    }

    async fn get(&self, code: &str) -> Result<Option<AuthorizationCode>, PrimitiveError> {
        Ok(self.codes()?.get(code).cloned())
    }

    async fn take(&self, code: &str) -> Result<Option<AuthorizationCode>, PrimitiveError> {
        Ok(self.codes()?.remove(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn code(value: &str, client_id: &str) -> AuthorizationCode {
        let now = Utc::now();
        AuthorizationCode {
            code: value.into(),
            client_id: client_id.into(),
            subject: "owner".into(),
            redirect_uri: "https://client.example/cb".parse().unwrap(),
            scope: "openid".parse().unwrap(),
            id_token: None,
            code_challenge: None,
            code_challenge_method: None,
            created_at: now,
            until: now + Duration::minutes(10),
        }
    }

    #[test]
    fn never_overwrites() {
        let map = CodeMap::new();
        assert!(smol::block_on(map.insert(code("abc", "first"))).unwrap());
        assert!(!smol::block_on(map.insert(code("abc", "second"))).unwrap());

        let stored = smol::block_on(map.get("abc")).unwrap().unwrap();
        assert_eq!(stored.client_id, "first");
    }

    #[test]
    fn take_is_single_use() {
        let map = CodeMap::new();
        smol::block_on(map.insert(code("abc", "client"))).unwrap();
        assert!(smol::block_on(map.take("abc")).unwrap().is_some());
        assert!(smol::block_on(map.take("abc")).unwrap().is_none());
        assert!(smol::block_on(map.get("abc")).unwrap().is_none());
    }
}
