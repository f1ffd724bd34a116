//! Consents previously given by resource owners.
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::scope::Scope;
use super::PrimitiveError;

/// A resource owner's grant of scopes and claims to one client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Consent {
    /// The resource owner.
    pub subject: String,

    /// The client that received the consent.
    pub client_id: String,

    /// The granted scopes.
    pub scopes: Scope,

    /// Individually granted claims.
    pub claims: Vec<String>,
}

/// Storage of consents, queried per resource owner.
#[async_trait]
pub trait ConsentRepository: Send + Sync {
    /// All consents given by the subject.
    async fn get_consents(&self, subject: &str) -> Result<Vec<Consent>, PrimitiveError>;

    /// Record a new consent.
    async fn insert(&self, consent: Consent) -> Result<(), PrimitiveError>;
}

/// Consents kept in memory, keyed by subject.
#[derive(Default)]
pub struct ConsentMap {
    consents: RwLock<HashMap<String, Vec<Consent>>>,
}

impl ConsentMap {
    /// An empty store.
    pub fn new() -> Self {
        ConsentMap::default()
    }
}

#[async_trait]
impl ConsentRepository for ConsentMap {
    async fn get_consents(&self, subject: &str) -> Result<Vec<Consent>, PrimitiveError> {
        let consents = self
            .consents
            .read()
            .map_err(|_| PrimitiveError::Unavailable("consent store poisoned".into()))?;
        Ok(consents.get(subject).cloned().unwrap_or_default())
    }

    async fn insert(&self, consent: Consent) -> Result<(), PrimitiveError> {
        let mut consents = self
            .consents
            .write()
            .map_err(|_| PrimitiveError::Unavailable("consent store poisoned".into()))?;
        consents
            .entry(consent.subject.clone())
            .or_default()
            .push(consent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_subject() {
        let map = ConsentMap::new();
        let consent = Consent {
            subject: "owner".into(),
            client_id: "client".into(),
            scopes: "openid".parse().unwrap(),
            claims: vec!["email".into()],
        };
        smol::block_on(map.insert(consent.clone())).unwrap();

        assert_eq!(smol::block_on(map.get_consents("owner")).unwrap(), vec![consent]);
        assert!(smol::block_on(map.get_consents("other")).unwrap().is_empty());
    }
}
