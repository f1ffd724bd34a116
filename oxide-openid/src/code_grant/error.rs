//! Errors of the authorization, token and revocation endpoints.
//!
//! Codes are those of [rfc6749], [rfc7009] and [OpenID Connect Core].
//!
//! [rfc6749]: https://tools.ietf.org/html/rfc6749#section-4.1.2.1
//! [rfc7009]: https://tools.ietf.org/html/rfc7009#section-2.2.1
//! [OpenID Connect Core]: https://openid.net/specs/openid-connect-core-1_0.html#AuthError
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::vec;

use serde_json::{Map, Value};
use url::Url;

use super::parameter::ResponseMode;
use crate::jose::JoseError;
use crate::primitives::PrimitiveError;

/// The formal kind of a protocol error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    /// A parameter is missing, malformed or names an unsupported flow.
    InvalidRequest,

    /// The `redirect_uri` is not registered for the client.
    InvalidRequestUri,

    /// The client is unknown or failed to authenticate.
    InvalidClient,

    /// A client assertion or authorization code was rejected.
    InvalidGrant,

    /// The requested scope is invalid, unknown, or not allowed for the client.
    InvalidScope,

    /// The token to revoke is unknown or belongs to another client.
    InvalidToken,

    /// The `token_type_hint` names an unknown kind of token.
    UnsupportedTokenType,

    /// The client may not use the requested response type.
    UnauthorizedClient,

    /// `prompt=none` was requested but the resource owner is not logged in.
    LoginRequired,

    /// `prompt=none` was requested but a consent is missing.
    InteractionRequired,

    /// The server is misconfigured or a backend failed.
    InternalError,
}

impl ErrorCode {
    fn description(self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidRequestUri => "invalid_request_uri",
            ErrorCode::InvalidClient => "invalid_client",
            ErrorCode::InvalidGrant => "invalid_grant",
            ErrorCode::InvalidScope => "invalid_scope",
            ErrorCode::InvalidToken => "invalid_token",
            ErrorCode::UnsupportedTokenType => "unsupported_token_type",
            ErrorCode::UnauthorizedClient => "unauthorized_client",
            ErrorCode::LoginRequired => "login_required",
            ErrorCode::InteractionRequired => "interaction_required",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

impl AsRef<str> for ErrorCode {
    fn as_ref(&self) -> &str {
        self.description()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A protocol error, carrying everything needed to report it to the requesting party.
///
/// The redirect target is only present once the `redirect_uri` of the request has been checked
/// against the client registration. Before that, errors are reported in a response body and never
/// redirected, since the target could be crafted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolError {
    code: ErrorCode,
    description: Cow<'static, str>,
    state: Option<String>,
    redirect: Option<(Url, ResponseMode)>,
}

/// How a protocol error reaches the requesting party.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorResponse {
    /// Send the user agent to the url, the error is encoded in it.
    Redirect(Url),

    /// Respond with a json body of `error`, `error_description` and possibly `state`.
    Body(Value),
}

impl ProtocolError {
    /// An error with its human readable description.
    pub fn new<D>(code: ErrorCode, description: D) -> Self
    where
        D: Into<Cow<'static, str>>,
    {
        ProtocolError {
            code,
            description: description.into(),
            state: None,
            redirect: None,
        }
    }

    /// Echo the `state` of the request with the error.
    pub fn with_state(mut self, state: Option<&str>) -> Self {
        self.state = state.map(str::to_string);
        self
    }

    /// Report the error by redirecting to a verified `redirect_uri`.
    pub fn redirect_to(mut self, redirect_uri: Url, mode: ResponseMode) -> Self {
        self.redirect = Some((redirect_uri, mode));
        self
    }

    /// Get the formal kind of error.
    pub fn kind(&self) -> ErrorCode {
        self.code
    }

    /// The human readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The state echoed to the client.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// The verified redirect target, if the error may be redirected.
    pub fn redirect_uri(&self) -> Option<&Url> {
        self.redirect.as_ref().map(|(url, _)| url)
    }

    /// Replace the description.
    pub fn explain<D>(&mut self, description: D)
    where
        D: Into<Cow<'static, str>>,
    {
        self.description = description.into();
    }

    /// Iterate over the key value pairs that describe this error.
    ///
    /// These pairs must be added to the detailed description of an error. The `state` pair comes
    /// last and only if the request carried one.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Cow<'static, str>)> {
        let state = self.state.clone().map(|state| ("state", state.into()));
        vec![
            ("error", self.code.description().into()),
            ("error_description", self.description.clone()),
        ]
        .into_iter()
        .chain(state)
    }

    /// Finalize the error, choosing between redirect and body.
    pub fn into_response(self) -> ErrorResponse {
        match self.redirect.clone() {
            Some((url, mode)) => ErrorResponse::Redirect(self.into_redirect(url, mode)),
            None => ErrorResponse::Body(self.into_json()),
        }
    }

    /// Encode the error into the query or fragment of `url`.
    pub fn into_redirect(self, url: Url, mode: ResponseMode) -> Url {
        mode.append(url, self.into_iter())
    }

    /// The error as a json object.
    pub fn into_json(self) -> Value {
        let body = self
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.into_owned())))
            .collect::<Map<String, Value>>();
        Value::Object(body)
    }

    /// A failed backend, reported without detail.
    pub(crate) fn internal(err: PrimitiveError) -> Self {
        crate::audit::internal_failure(&err);
        ProtocolError::new(ErrorCode::InternalError, "an internal error occurred")
    }

    /// A failed JOSE operation of the server itself, for example a missing or unusable key.
    pub(crate) fn jose(err: JoseError) -> Self {
        crate::audit::internal_failure(&err);
        ProtocolError::new(ErrorCode::InternalError, "the token cannot be generated")
    }
}

impl From<PrimitiveError> for ProtocolError {
    fn from(err: PrimitiveError) -> Self {
        ProtocolError::internal(err)
    }
}

impl IntoIterator for ProtocolError {
    type Item = (&'static str, Cow<'static, str>);
    type IntoIter = vec::IntoIter<(&'static str, Cow<'static, str>)>;

    fn into_iter(self) -> Self::IntoIter {
        let mut vec = vec![
            ("error", Cow::Borrowed(self.code.description())),
            ("error_description", self.description),
        ];
        if let Some(state) = self.state {
            vec.push(("state", state.into()));
        }
        vec.into_iter()
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

impl error::Error for ProtocolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_end_with_state() {
        let error = ProtocolError::new(ErrorCode::InvalidRequest, "the parameter scope is missing")
            .with_state(Some("xyz"));
        let pairs = error.iter().collect::<Vec<_>>();
        assert_eq!(pairs[0], ("error", "invalid_request".into()));
        assert_eq!(pairs[1].0, "error_description");
        assert_eq!(pairs[2], ("state", "xyz".into()));
        assert_eq!(pairs, error.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn unverified_errors_are_not_redirected() {
        let error = ProtocolError::new(ErrorCode::InvalidClient, "unknown client").with_state(Some("s"));
        match error.into_response() {
            ErrorResponse::Body(body) => {
                assert_eq!(body["error"], "invalid_client");
                assert_eq!(body["state"], "s");
            }
            other => panic!("Expected a body, got {:?}", other),
        }
    }

    #[test]
    fn redirect_keeps_existing_query() {
        let target = Url::parse("https://client.example/cb?keep=1").unwrap();
        let error = ProtocolError::new(ErrorCode::InvalidScope, "no")
            .with_state(Some("s"))
            .redirect_to(target, ResponseMode::Query);
        let url = match error.into_response() {
            ErrorResponse::Redirect(url) => url,
            other => panic!("Expected a redirect, got {:?}", other),
        };
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(pairs[0], ("keep".to_string(), "1".to_string()));
        assert_eq!(pairs[1], ("error".to_string(), "invalid_scope".to_string()));
        assert_eq!(pairs[3], ("state".to_string(), "s".to_string()));
    }

    #[test]
    fn fragment_mode() {
        let target = Url::parse("https://client.example/cb").unwrap();
        let url = ProtocolError::new(ErrorCode::LoginRequired, "login")
            .into_redirect(target, ResponseMode::Fragment);
        assert!(url.query().is_none());
        assert_eq!(
            url.fragment(),
            Some("error=login_required&error_description=login")
        );
    }
}
