//! A collection of primitives consumed by the authorization engine.
//!
//! A primitive is the smallest independent unit of policy or storage. Each is a trait with an
//! asynchronous interface so that database backed implementations can be plugged in, and each
//! comes with a simple in-memory implementation used by the tests and by small deployments.
//!
//! ```
//! # use oxide_openid::primitives::prelude::*;
//! let mut clients = ClientMap::new();
//! clients.register_client(Client::public(
//!     "client",
//!     "https://client.example/cb".parse().unwrap(),
//!     "openid profile".parse().unwrap(),
//! ));
//!
//! let codes = CodeMap::new();
//! let tokens = TokenMap::new();
//! let replay = JtiMap::new();
//! ```
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod authorizer;
pub mod catalog;
pub mod consent;
pub mod generator;
pub mod grant;
pub mod issuer;
pub mod keys;
pub mod registrar;
pub mod replay;
pub mod scope;

/// Point in time of grants, codes and tokens.
pub type Time = DateTime<Utc>;

/// A backend failed to answer.
///
/// These never reach the requesting party in detail, the flows report them as `internal_error`.
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// The storage could not be reached or is in an inconsistent state.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A value that must be unique was already present.
    #[error("unique value already present")]
    Conflict,

    /// No random value could be generated.
    #[error("token generation failed")]
    Generation,
}

/// The time at which something created at `from` stops being valid.
///
/// Saturates instead of overflowing for absurdly long validities.
pub(crate) fn expiry(from: Time, validity: Duration) -> Time {
    chrono::Duration::from_std(validity)
        .ok()
        .and_then(|validity| from.checked_add_signed(validity))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Commonly used primitives.
pub mod prelude {
    pub use super::authorizer::{AuthorizationCodeRepository, CodeMap};
    pub use super::catalog::{ScopeCatalog, ScopeDescriptor, ScopeRepository};
    pub use super::consent::{Consent, ConsentMap, ConsentRepository};
    pub use super::generator::{RandomGenerator, TagGrant};
    pub use super::grant::{AuthorizationCode, GrantedToken};
    pub use super::issuer::{GrantedTokenRepository, TokenMap};
    pub use super::keys::{JsonWebKeyRepository, KeyStore};
    pub use super::registrar::{
        Client, ClientMap, ClientRepository, ClientSecret, GrantType, ResponseType, TokenEndpointAuthMethod,
    };
    pub use super::replay::{JtiCache, JtiMap};
    pub use super::scope::Scope;
    pub use super::{PrimitiveError, Time};
}
