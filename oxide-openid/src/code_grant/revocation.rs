//! Revocation of access and refresh tokens, as defined in [rfc7009].
//!
//! [rfc7009]: https://tools.ietf.org/html/rfc7009
use super::authenticate::{AuthenticateInstruction, ClientAuthenticator};
use super::error::{ErrorCode, ProtocolError};
use crate::audit;
use crate::primitives::grant::GrantedToken;
use crate::primitives::issuer::GrantedTokenRepository;
use crate::primitives::Time;

/// Values of `token_type_hint`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TokenTypeHint {
    /// `access_token`
    AccessToken,
    /// `refresh_token`
    RefreshToken,
}

impl TokenTypeHint {
    /// The registered name.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenTypeHint::AccessToken => "access_token",
            TokenTypeHint::RefreshToken => "refresh_token",
        }
    }

    /// Parse a registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "access_token" => Some(TokenTypeHint::AccessToken),
            "refresh_token" => Some(TokenTypeHint::RefreshToken),
            _ => None,
        }
    }

    fn other(self) -> Self {
        match self {
            TokenTypeHint::AccessToken => TokenTypeHint::RefreshToken,
            TokenTypeHint::RefreshToken => TokenTypeHint::AccessToken,
        }
    }
}

wire_names!(TokenTypeHint);

/// A revocation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevocationRequest<'a> {
    /// The token to revoke.
    pub token: &'a str,

    /// The raw `token_type_hint`, `access_token` when absent.
    pub token_type_hint: Option<&'a str>,

    /// The credentials of the caller.
    pub instruction: &'a AuthenticateInstruction,
}

/// Revoke a token of the authenticated client.
///
/// The hint decides where the token is searched first, the other kind is searched after. A token
/// of another client is reported as `invalid_token` without revealing its owner. Revoking a
/// refresh token also revokes every token refreshed from it. Every failure to authenticate the
/// caller, including a rejected assertion, is reported as `invalid_client`.
pub async fn revoke_token(
    authenticator: &ClientAuthenticator<'_>, tokens: &dyn GrantedTokenRepository, request: RevocationRequest<'_>,
    now: Time,
) -> Result<(), ProtocolError> {
    let hint = match request.token_type_hint {
        None => TokenTypeHint::AccessToken,
        Some(raw) => TokenTypeHint::from_name(raw).ok_or_else(|| {
            ProtocolError::new(
                ErrorCode::UnsupportedTokenType,
                format!("the token type hint {} is not supported", raw),
            )
        })?,
    };

    // A rejected assertion is a failed client authentication here.
    let client = authenticator
        .authenticate(request.instruction, now)
        .await
        .map_err(|err| match err.kind() {
            ErrorCode::InvalidGrant => ProtocolError::new(ErrorCode::InvalidClient, err.description().to_string()),
            _ => err,
        })?;

    let token = match find(tokens, request.token, hint).await? {
        Some(found) => Some(found),
        None => find(tokens, request.token, hint.other()).await?,
    };
    let (kind, token) = token.ok_or_else(|| ProtocolError::new(ErrorCode::InvalidToken, "the token doesn't exist"))?;

    if token.client_id != client.client_id {
        return Err(ProtocolError::new(
            ErrorCode::InvalidToken,
            format!(
                "the token has not been issued for the given client id '{}'",
                client.client_id
            ),
        ));
    }

    tokens.delete(&token).await?;
    audit::token_revoked(&client.client_id, kind.as_str());
    Ok(())
}

async fn find(
    tokens: &dyn GrantedTokenRepository, value: &str, kind: TokenTypeHint,
) -> Result<Option<(TokenTypeHint, GrantedToken)>, ProtocolError> {
    let found = match kind {
        TokenTypeHint::AccessToken => tokens.get_by_access_token(value).await?,
        TokenTypeHint::RefreshToken => tokens.get_by_refresh_token(value).await?,
    };
    Ok(found.map(|token| (kind, token)))
}
