//! The revocation endpoint of [rfc7009].
//!
//! [rfc7009]: https://tools.ietf.org/html/rfc7009
use chrono::Utc;

use super::Endpoint;
use crate::audit;
use crate::code_grant::authenticate::{AuthenticateInstruction, ClientAuthenticator};
use crate::code_grant::error::ProtocolError;
use crate::code_grant::revocation::{revoke_token, RevocationRequest};

/// Revokes tokens on behalf of their client.
///
/// Errors are always reported in a response body, the revocation endpoint has no redirect.
pub struct Revocation<'a, E: Endpoint + ?Sized> {
    endpoint: &'a E,
}

impl<'a, E: Endpoint + ?Sized> Revocation<'a, E> {
    /// Revoke with the primitives of the endpoint.
    pub fn new(endpoint: &'a E) -> Self {
        Revocation { endpoint }
    }

    /// Revoke `token` after authenticating the caller.
    pub async fn revoke(
        &self, token: &str, token_type_hint: Option<&str>, instruction: &AuthenticateInstruction,
    ) -> Result<(), ProtocolError> {
        let authenticator = ClientAuthenticator::new(
            self.endpoint.clients(),
            self.endpoint.keys(),
            self.endpoint.replay_cache(),
            &self.endpoint.settings().issuer_name,
        );
        let request = RevocationRequest {
            token,
            token_type_hint,
            instruction,
        };

        revoke_token(&authenticator, self.endpoint.tokens(), request, Utc::now())
            .await
            .map_err(|err| {
                audit::revocation_failed(&err);
                err
            })
    }
}
