//! The replay cache of client assertion ids.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{PrimitiveError, Time};

/// Remembers the `jti` of every accepted client assertion.
///
/// ## Requirements on implementations
///
/// `insert` MUST be a single atomic insert-if-absent. Two concurrent calls with the same `jti`
/// must not both return `true`, otherwise a replayed assertion could be accepted twice.
#[async_trait]
pub trait JtiCache: Send + Sync {
    /// If the `jti` has been recorded.
    async fn exists(&self, jti: &str) -> Result<bool, PrimitiveError>;

    /// Record the `jti` until the expiry of its assertion.
    ///
    /// Returns `false` if it was already present.
    async fn insert(&self, jti: &str, until: Time) -> Result<bool, PrimitiveError>;
}

/// In-memory replay cache.
///
/// Entries are dropped once their assertion has expired, since an expired assertion is rejected
/// regardless of its `jti`.
#[derive(Default)]
pub struct JtiMap {
    seen: Mutex<HashMap<String, Time>>,
}

impl JtiMap {
    /// An empty cache.
    pub fn new() -> Self {
        JtiMap::default()
    }
}

#[async_trait]
impl JtiCache for JtiMap {
    async fn exists(&self, jti: &str) -> Result<bool, PrimitiveError> {
        let seen = self
            .seen
            .lock()
            .map_err(|_| PrimitiveError::Unavailable("replay cache poisoned".into()))?;
        Ok(seen.contains_key(jti))
    }

    async fn insert(&self, jti: &str, until: Time) -> Result<bool, PrimitiveError> {
        let now = Utc::now();
        let mut seen = self
            .seen
            .lock()
            .map_err(|_| PrimitiveError::Unavailable("replay cache poisoned".into()))?;
        seen.retain(|_, expiry| *expiry > now);
        if seen.contains_key(jti) {
            return Ok(false);
        }
        seen.insert(jti.to_string(), until);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn second_insert_fails() {
        let cache = JtiMap::new();
        let until = Utc::now() + Duration::minutes(5);
        assert!(!smol::block_on(cache.exists("jti")).unwrap());
        assert!(smol::block_on(cache.insert("jti", until)).unwrap());
        assert!(smol::block_on(cache.exists("jti")).unwrap());
        assert!(!smol::block_on(cache.insert("jti", until)).unwrap());
    }

    #[test]
    fn expired_entries_are_purged() {
        let cache = JtiMap::new();
        let past = Utc::now() - Duration::minutes(1);
        assert!(smol::block_on(cache.insert("old", past)).unwrap());
        assert!(smol::block_on(cache.insert("new", Utc::now() + Duration::minutes(1))).unwrap());
        assert!(!smol::block_on(cache.exists("old")).unwrap());
    }

    #[test]
    fn concurrent_inserts_admit_one() {
        let cache = Arc::new(JtiMap::new());
        let until = Utc::now() + Duration::minutes(5);
        let handles = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || smol::block_on(cache.insert("shared", until)).unwrap())
            })
            .collect::<Vec<_>>();
        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|inserted| *inserted)
            .count();
        assert_eq!(admitted, 1);
    }
}
