//! Resolution of server and client keys.
//!
//! Keys are loaded once at start and only read afterwards. Each key is bound to a single
//! algorithm, so looking a key up by algorithm also fixes its usage.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::PrimitiveError;
use crate::jose::{JsonWebKey, KeyAlgorithm};

/// Lookup of JSON web keys.
#[async_trait]
pub trait JsonWebKeyRepository: Send + Sync {
    /// A server key for the algorithm: a signing key for id tokens, or a private key to decrypt
    /// tokens sent to the server.
    async fn get_by_algorithm(&self, algorithm: KeyAlgorithm) -> Result<Option<Arc<JsonWebKey>>, PrimitiveError>;

    /// A key registered by the client: the public key verifying its `private_key_jwt`
    /// assertions, or the public key id tokens are encrypted to.
    async fn get_for_client(
        &self,
        client_id: &str,
        algorithm: KeyAlgorithm,
    ) -> Result<Option<Arc<JsonWebKey>>, PrimitiveError>;
}

/// An immutable set of keys, shared by reference counting.
#[derive(Default)]
pub struct KeyStore {
    server: Vec<Arc<JsonWebKey>>,
    clients: HashMap<String, Vec<Arc<JsonWebKey>>>,
}

impl KeyStore {
    /// An empty store.
    pub fn new() -> Self {
        KeyStore::default()
    }

    /// Add a key of the server. An earlier key of the same algorithm takes precedence.
    pub fn add_key(&mut self, key: JsonWebKey) {
        self.server.push(Arc::new(key));
    }

    /// Register a key of a client.
    pub fn add_client_key(&mut self, client_id: &str, key: JsonWebKey) {
        self.clients
            .entry(client_id.to_string())
            .or_default()
            .push(Arc::new(key));
    }

    /// Public halves of all server keys, for publication in a key set.
    pub fn public_keys(&self) -> Vec<JsonWebKey> {
        self.server.iter().map(|key| key.to_public()).collect()
    }

    fn find(keys: &[Arc<JsonWebKey>], algorithm: KeyAlgorithm) -> Option<Arc<JsonWebKey>> {
        keys.iter().find(|key| key.algorithm() == algorithm).cloned()
    }
}

#[async_trait]
impl JsonWebKeyRepository for KeyStore {
    async fn get_by_algorithm(&self, algorithm: KeyAlgorithm) -> Result<Option<Arc<JsonWebKey>>, PrimitiveError> {
        Ok(KeyStore::find(&self.server, algorithm))
    }

    async fn get_for_client(
        &self,
        client_id: &str,
        algorithm: KeyAlgorithm,
    ) -> Result<Option<Arc<JsonWebKey>>, PrimitiveError> {
        Ok(self
            .clients
            .get(client_id)
            .and_then(|keys| KeyStore::find(keys, algorithm)))
    }
}
