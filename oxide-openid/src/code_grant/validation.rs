//! Checks of an authorization request against the registration of its client.
//!
//! Every check takes the `state` of the request so that the error can echo it.
use std::collections::BTreeSet;

use url::Url;

use super::error::{ErrorCode, ProtocolError};
use super::parameter::{AuthorizationParameter, CodeChallengeMethod, Prompt};
use crate::primitives::registrar::{Client, GrantType, ResponseType};
use crate::primitives::scope::{Scope, OPENID};

/// Check the shape of the request before looking up the client.
///
/// Rejects missing required parameters, unknown response types or prompts, `prompt=none`
/// combined with other values and a `redirect_uri` that is not an absolute url.
pub fn validate_parameter(parameter: &AuthorizationParameter) -> Result<(), ProtocolError> {
    let state = parameter.state();
    let required = [
        ("scope", &parameter.scope),
        ("client_id", &parameter.client_id),
        ("redirect_uri", &parameter.redirect_uri),
        ("response_type", &parameter.response_type),
    ];
    for (name, value) in required.iter() {
        if value.as_deref().map_or(true, |value| value.trim().is_empty()) {
            return Err(invalid_request(format!("the parameter {} is missing", name), state));
        }
    }

    if parameter.response_types().is_none() {
        return Err(invalid_request(
            "at least one response_type parameter is not supported",
            state,
        ));
    }

    let prompts = parameter
        .prompts()
        .ok_or_else(|| invalid_request("at least one prompt parameter is not supported", state))?;
    if prompts.contains(&Prompt::None) && prompts.len() > 1 {
        return Err(invalid_request("prompt parameter should have only none value", state));
    }

    let redirect_uri = parameter.redirect_uri.as_deref().unwrap_or_default();
    if Url::parse(redirect_uri).is_err() {
        return Err(invalid_request(
            "Based on the RFC-3986 the redirection-uri is not well formed",
            state,
        ));
    }

    Ok(())
}

/// The looked up client, or `invalid_client` if there is none.
pub fn validate_client_exist(
    client: Option<Client>, client_id: &str, state: Option<&str>,
) -> Result<Client, ProtocolError> {
    client.ok_or_else(|| {
        ProtocolError::new(
            ErrorCode::InvalidClient,
            format!("the client id parameter {} doesn't exist or is not valid", client_id),
        )
        .with_state(state)
    })
}

/// The redirect uri, if it is registered for the client.
pub fn validate_redirection_url(
    redirect_uri: &str, client: &Client, state: Option<&str>,
) -> Result<Url, ProtocolError> {
    let invalid = || {
        ProtocolError::new(
            ErrorCode::InvalidRequestUri,
            format!("the redirect url {} doesn't exist or is not valid", redirect_uri),
        )
        .with_state(state)
    };

    let url = Url::parse(redirect_uri).map_err(|_| invalid())?;
    if client.has_redirect_uri(&url) {
        Ok(url)
    } else {
        Err(invalid())
    }
}

/// Parse the requested scopes, rejecting duplicates and scopes the client may not request.
pub fn validate_allowed_scopes(raw: &str, client: &Client, state: Option<&str>) -> Result<Scope, ProtocolError> {
    let mut seen = BTreeSet::new();
    let duplicates = raw
        .split_whitespace()
        .filter(|token| !seen.insert(*token))
        .collect::<BTreeSet<_>>();
    if !duplicates.is_empty() {
        return Err(invalid_scope(
            format!("duplicate scopes {} have been passed in parameter", join(duplicates)),
            state,
        ));
    }

    let requested = raw
        .parse::<Scope>()
        .map_err(|_| invalid_scope(format!("the scopes {} are not allowed or invalid", raw), state))?;
    let refused = requested
        .iter()
        .filter(|token| !client.allowed_scopes.contains(token))
        .collect::<Vec<_>>();
    if !refused.is_empty() {
        return Err(invalid_scope(
            format!("the scopes {} are not allowed or invalid", join(refused)),
            state,
        ));
    }

    Ok(requested)
}

/// The scope must contain `openid`.
pub fn require_openid(scope: &Scope, state: Option<&str>) -> Result<(), ProtocolError> {
    if scope.is_openid() {
        Ok(())
    } else {
        Err(invalid_scope(
            format!("the scope(s) {} need(s) to be specified", OPENID),
            state,
        ))
    }
}

/// The client must be registered for each of the grant types.
pub fn check_grant_types(client: &Client, grant_types: &[GrantType], state: Option<&str>) -> Result<(), ProtocolError> {
    match grant_types.iter().find(|grant| !client.supports_grant_type(**grant)) {
        None => Ok(()),
        Some(grant) => Err(invalid_request(
            format!(
                "the client {} doesn't support the grant type {}",
                client.client_id, grant
            ),
            state,
        )),
    }
}

/// The client must be registered for each of the response types.
pub fn check_response_types(
    client: &Client, response_types: &BTreeSet<ResponseType>, state: Option<&str>,
) -> Result<(), ProtocolError> {
    match response_types
        .iter()
        .find(|response_type| !client.supports_response_type(**response_type))
    {
        None => Ok(()),
        Some(response_type) => Err(ProtocolError::new(
            ErrorCode::UnauthorizedClient,
            format!(
                "the client '{}' doesn't support the response type: '{}'",
                client.client_id, response_type
            ),
        )
        .with_state(state)),
    }
}

/// A client requiring PKCE must send a challenge with a known method.
///
/// A challenge without method is taken as `plain`. An unknown method is rejected for every
/// client.
pub fn check_pkce(client: &Client, parameter: &AuthorizationParameter) -> Result<(), ProtocolError> {
    let state = parameter.state();
    if let Some(method) = parameter.code_challenge_method.as_deref() {
        if CodeChallengeMethod::from_name(method).is_none() {
            return Err(invalid_request(
                format!("the paramater code_challenge_method is not correct: {}", method),
                state,
            ));
        }
    }

    if client.require_pkce && parameter.code_challenge.is_none() {
        return Err(invalid_request(
            format!("the client {} requires PKCE", client.client_id),
            state,
        ));
    }

    Ok(())
}

fn invalid_request<D: Into<std::borrow::Cow<'static, str>>>(description: D, state: Option<&str>) -> ProtocolError {
    ProtocolError::new(ErrorCode::InvalidRequest, description).with_state(state)
}

fn invalid_scope(description: String, state: Option<&str>) -> ProtocolError {
    ProtocolError::new(ErrorCode::InvalidScope, description).with_state(state)
}

fn join<'a, I: IntoIterator<Item = &'a str>>(tokens: I) -> String {
    tokens.into_iter().collect::<Vec<_>>().join(",")
}
