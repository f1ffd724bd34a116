//! Issued credentials: authorization codes and granted tokens.
use url::Url;

use super::scope::Scope;
use super::Time;

/// A short-lived, single-use authorization code.
///
/// The code value is the key under which the record is stored. It is never reissued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationCode {
    /// The opaque code value.
    pub code: String,

    /// The client the code was issued to.
    pub client_id: String,

    /// The resource owner who authorized the request.
    pub subject: String,

    /// The redirect uri of the authorization request, required again at redemption.
    pub redirect_uri: Url,

    /// The scopes granted with the code.
    pub scope: Scope,

    /// The id token computed at authorization time, if requested.
    pub id_token: Option<String>,

    /// The PKCE challenge.
    pub code_challenge: Option<String>,

    /// The PKCE challenge method, `plain` or `S256`.
    pub code_challenge_method: Option<String>,

    /// When the code was created.
    pub created_at: Time,

    /// Expiration date of the code (Utc).
    pub until: Time,
}

impl AuthorizationCode {
    /// If the code can no longer be redeemed.
    pub fn is_expired(&self, now: Time) -> bool {
        self.until <= now
    }
}

/// An issued access token together with its companions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantedToken {
    /// A unique identifier of the grant, referenced by children of a refresh chain.
    pub id: String,

    /// The bearer value.
    pub access_token: String,

    /// The refresh token, if one was issued.
    pub refresh_token: Option<String>,

    /// The id token issued together with the access token.
    pub id_token: Option<String>,

    /// The granted scopes.
    pub scope: Scope,

    /// The client owning the token.
    pub client_id: String,

    /// The resource owner, absent for client credentials.
    pub subject: Option<String>,

    /// The token whose refresh token produced this one.
    pub parent_token_id: Option<String>,

    /// When the token was created.
    pub created_at: Time,

    /// Expiration date of the access token (Utc).
    pub until: Time,
}

impl GrantedToken {
    /// If the access token is no longer valid.
    pub fn is_expired(&self, now: Time) -> bool {
        self.until <= now
    }

    /// Remaining validity in whole seconds, the `expires_in` response parameter.
    pub fn expires_in(&self, now: Time) -> i64 {
        (self.until - now).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn expiration() {
        let now = Utc::now();
        let token = GrantedToken {
            id: "id".into(),
            access_token: "access".into(),
            refresh_token: None,
            id_token: None,
            scope: "openid".parse().unwrap(),
            client_id: "client".into(),
            subject: None,
            parent_token_id: None,
            created_at: now,
            until: now + Duration::seconds(3600),
        };
        assert!(!token.is_expired(now));
        assert_eq!(token.expires_in(now), 3600);
        assert!(token.is_expired(now + Duration::seconds(3600)));
        assert_eq!(token.expires_in(now + Duration::seconds(4000)), 0);
    }
}
