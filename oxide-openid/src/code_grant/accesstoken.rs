//! Redemption of authorization codes.
use std::borrow::Cow;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use url::Url;

use super::error::{ErrorCode, ProtocolError};
use super::parameter::CodeChallengeMethod;
use crate::jose::bytes::constant_time_eq;
use crate::primitives::authorizer::AuthorizationCodeRepository;
use crate::primitives::grant::AuthorizationCode;
use crate::primitives::Time;

/// The parameters of an authorization code token request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeRedemption<'a> {
    /// The presented code.
    pub code: &'a str,

    /// The authenticated client.
    pub client_id: &'a str,

    /// The `redirect_uri` parameter, which must equal that of the authorization request.
    pub redirect_uri: &'a str,

    /// The PKCE verifier.
    pub code_verifier: Option<&'a str>,
}

/// Consume a code and check that it may be redeemed by the request.
///
/// The code is removed before any check, so a code presented twice never succeeds twice, even
/// when the first attempt fails.
pub async fn redeem_code(
    codes: &dyn AuthorizationCodeRepository, redemption: CodeRedemption<'_>, now: Time,
) -> Result<AuthorizationCode, ProtocolError> {
    let code = codes
        .take(redemption.code)
        .await?
        .ok_or_else(|| invalid_grant("the authorization code is not correct"))?;

    if code.client_id != redemption.client_id {
        return Err(invalid_grant(format!(
            "the authorization code has not been issued for the given client id {}",
            redemption.client_id
        )));
    }

    let same_redirect = Url::parse(redemption.redirect_uri)
        .map(|url| url.as_str() == code.redirect_uri.as_str())
        .unwrap_or(false);
    if !same_redirect {
        return Err(invalid_grant(
            "the redirect_uri is not the same as the one of the authorization request",
        ));
    }

    if code.is_expired(now) {
        return Err(invalid_grant("the authorization code is obsolete"));
    }

    verify_pkce(&code, redemption.code_verifier)?;
    Ok(code)
}

fn verify_pkce(code: &AuthorizationCode, verifier: Option<&str>) -> Result<(), ProtocolError> {
    let challenge = match code.code_challenge.as_deref() {
        None => return Ok(()),
        Some(challenge) => challenge,
    };
    let verifier = verifier.ok_or_else(|| invalid_grant("the code_verifier is missing"))?;

    let method = code
        .code_challenge_method
        .as_deref()
        .map_or(Some(CodeChallengeMethod::Plain), CodeChallengeMethod::from_name);
    let expected = match method {
        Some(CodeChallengeMethod::Plain) => verifier.to_string(),
        Some(CodeChallengeMethod::S256) => URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())),
        None => return Err(invalid_grant("the code_verifier is not correct")),
    };

    if constant_time_eq(expected.as_bytes(), challenge.as_bytes()) {
        Ok(())
    } else {
        Err(invalid_grant("the code_verifier is not correct"))
    }
}

fn invalid_grant(description: impl Into<Cow<'static, str>>) -> ProtocolError {
    ProtocolError::new(ErrorCode::InvalidGrant, description)
}
