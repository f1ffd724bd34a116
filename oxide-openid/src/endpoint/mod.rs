//! Polymorphic entry points of the authorization server.
//!
//! An [`Endpoint`] bundles the settings and primitives a flow needs. The flows borrow it for the
//! duration of one request, they never keep state of their own. All storage and policy is reached
//! through the primitive traits, so the same flows run against the in-memory implementations of
//! this crate and against any database backed ones.
//!
//! ```
//! # use oxide_openid::endpoint::{Authorization, Generic};
//! # use oxide_openid::primitives::prelude::*;
//! # use oxide_openid::settings::Settings;
//! let mut clients = ClientMap::new();
//! clients.register_client(Client::public(
//!     "client",
//!     "https://client.example/cb".parse().unwrap(),
//!     "openid profile".parse().unwrap(),
//! ));
//!
//! let endpoint = Generic::in_memory(Settings::default(), clients, ScopeCatalog::openid(), KeyStore::new());
//! let authorization = Authorization::new(&endpoint);
//! ```
//!
//! [`Endpoint`]: trait.Endpoint.html
use std::sync::Arc;

use crate::primitives::prelude::*;
use crate::settings::Settings;

mod authorization;
mod revocation;

#[cfg(test)]
mod tests;

pub use self::authorization::Authorization;
pub use self::revocation::Revocation;

/// The settings and primitives of an authorization server.
pub trait Endpoint: Send + Sync {
    /// Server wide settings.
    fn settings(&self) -> &Settings;

    /// The registered clients.
    fn clients(&self) -> &dyn ClientRepository;

    /// Descriptions of the known scopes.
    fn scopes(&self) -> &dyn ScopeRepository;

    /// Consents given by resource owners.
    fn consents(&self) -> &dyn ConsentRepository;

    /// Issued authorization codes.
    fn codes(&self) -> &dyn AuthorizationCodeRepository;

    /// Issued access and refresh tokens.
    fn tokens(&self) -> &dyn GrantedTokenRepository;

    /// Server and client keys.
    fn keys(&self) -> &dyn JsonWebKeyRepository;

    /// The `jti` values of consumed client assertions.
    fn replay_cache(&self) -> &dyn JtiCache;

    /// Produces authorization codes.
    fn code_generator(&self) -> &dyn TagGrant;

    /// Produces access tokens and token identifiers.
    fn token_generator(&self) -> &dyn TagGrant;
}

/// An endpoint assembled from shared primitives.
///
/// Each field can be replaced independently, for example to keep the in-memory key store while
/// tokens are stored in a database.
pub struct Generic {
    /// Server wide settings.
    pub settings: Settings,

    /// The registered clients.
    pub clients: Arc<dyn ClientRepository>,

    /// Descriptions of the known scopes.
    pub scopes: Arc<dyn ScopeRepository>,

    /// Consents given by resource owners.
    pub consents: Arc<dyn ConsentRepository>,

    /// Issued authorization codes.
    pub codes: Arc<dyn AuthorizationCodeRepository>,

    /// Issued tokens.
    pub tokens: Arc<dyn GrantedTokenRepository>,

    /// Server and client keys.
    pub keys: Arc<dyn JsonWebKeyRepository>,

    /// Consumed assertion identifiers.
    pub replay_cache: Arc<dyn JtiCache>,

    /// Produces authorization codes.
    pub code_generator: Arc<dyn TagGrant>,

    /// Produces access tokens.
    pub token_generator: Arc<dyn TagGrant>,
}

impl Generic {
    /// An endpoint keeping all grants in memory.
    ///
    /// Codes and tokens are generated with the lengths of the settings.
    pub fn in_memory(settings: Settings, clients: ClientMap, scopes: ScopeCatalog, keys: KeyStore) -> Self {
        let code_generator = Arc::new(RandomGenerator::new(settings.code_length));
        let token_generator = Arc::new(RandomGenerator::new(settings.token_length));
        Generic {
            settings,
            clients: Arc::new(clients),
            scopes: Arc::new(scopes),
            consents: Arc::new(ConsentMap::new()),
            codes: Arc::new(CodeMap::new()),
            tokens: Arc::new(TokenMap::new()),
            keys: Arc::new(keys),
            replay_cache: Arc::new(JtiMap::new()),
            code_generator,
            token_generator,
        }
    }
}

impl Endpoint for Generic {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn clients(&self) -> &dyn ClientRepository {
        self.clients.as_ref()
    }

    fn scopes(&self) -> &dyn ScopeRepository {
        self.scopes.as_ref()
    }

    fn consents(&self) -> &dyn ConsentRepository {
        self.consents.as_ref()
    }

    fn codes(&self) -> &dyn AuthorizationCodeRepository {
        self.codes.as_ref()
    }

    fn tokens(&self) -> &dyn GrantedTokenRepository {
        self.tokens.as_ref()
    }

    fn keys(&self) -> &dyn JsonWebKeyRepository {
        self.keys.as_ref()
    }

    fn replay_cache(&self) -> &dyn JtiCache {
        self.replay_cache.as_ref()
    }

    fn code_generator(&self) -> &dyn TagGrant {
        self.code_generator.as_ref()
    }

    fn token_generator(&self) -> &dyn TagGrant {
        self.token_generator.as_ref()
    }
}
