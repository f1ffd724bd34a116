//! Selection of the authorization flow from the requested response types.
use std::collections::BTreeSet;

use super::error::{ErrorCode, ProtocolError};
use super::parameter::AuthorizationParameter;
use crate::primitives::registrar::{GrantType, ResponseType};

/// The flows of OpenID Connect Core, section 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationFlow {
    /// `code`
    AuthorizationCode,

    /// `id_token` and `id_token token`
    Implicit,

    /// `code` combined with `id_token` or `token`.
    ///
    /// Recognized but not supported, requests fail explicitly.
    Hybrid,
}

impl AuthorizationFlow {
    /// The flow of a set of response types, if there is one.
    pub fn resolve(response_types: &BTreeSet<ResponseType>) -> Option<Self> {
        use ResponseType::{Code, IdToken, Token};

        let code = response_types.contains(&Code);
        let token = response_types.contains(&Token);
        let id_token = response_types.contains(&IdToken);
        match (code, id_token, token) {
            (true, false, false) => Some(AuthorizationFlow::AuthorizationCode),
            (false, true, _) => Some(AuthorizationFlow::Implicit),
            (true, true, _) | (true, false, true) => Some(AuthorizationFlow::Hybrid),
            _ => None,
        }
    }

    /// The grant type a client needs to use the flow.
    pub fn grant_types(self) -> &'static [GrantType] {
        match self {
            AuthorizationFlow::AuthorizationCode => &[GrantType::AuthorizationCode],
            AuthorizationFlow::Implicit => &[GrantType::Implicit],
            AuthorizationFlow::Hybrid => &[GrantType::AuthorizationCode, GrantType::Implicit],
        }
    }

    /// The name reported in audit events.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthorizationFlow::AuthorizationCode => "authorization_code",
            AuthorizationFlow::Implicit => "implicit",
            AuthorizationFlow::Hybrid => "hybrid",
        }
    }
}

/// Resolve the flow of a request.
///
/// Fails with `invalid_request` if the response types are unknown or form no flow. The error
/// carries the `state` of the request.
pub fn resolve_flow(parameter: &AuthorizationParameter) -> Result<AuthorizationFlow, ProtocolError> {
    parameter
        .response_types()
        .as_ref()
        .and_then(AuthorizationFlow::resolve)
        .ok_or_else(|| {
            ProtocolError::new(ErrorCode::InvalidRequest, "the authorization flow is not supported")
                .with_state(parameter.state())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_of(response_type: &str) -> Result<AuthorizationFlow, ProtocolError> {
        let parameter = AuthorizationParameter {
            response_type: Some(response_type.into()),
            state: Some("state".into()),
            ..AuthorizationParameter::default()
        };
        resolve_flow(&parameter)
    }

    #[test]
    fn order_is_irrelevant() {
        assert_eq!(flow_of("code").unwrap(), AuthorizationFlow::AuthorizationCode);
        assert_eq!(flow_of("code code").unwrap(), AuthorizationFlow::AuthorizationCode);
        assert_eq!(flow_of("id_token").unwrap(), AuthorizationFlow::Implicit);
        assert_eq!(flow_of("id_token token").unwrap(), AuthorizationFlow::Implicit);
        assert_eq!(flow_of("token id_token").unwrap(), AuthorizationFlow::Implicit);
        assert_eq!(flow_of("code id_token token").unwrap(), AuthorizationFlow::Hybrid);
        assert_eq!(flow_of("token code id_token").unwrap(), AuthorizationFlow::Hybrid);
        assert_eq!(flow_of("code token").unwrap(), AuthorizationFlow::Hybrid);
    }

    #[test]
    fn unknown_sets_keep_state() {
        for raw in ["token code id_token made_up", "token", "", "none"].iter() {
            let err = flow_of(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorCode::InvalidRequest);
            assert_eq!(err.description(), "the authorization flow is not supported");
            assert_eq!(err.state(), Some("state"));
        }
    }

    #[test]
    fn audit_names() {
        assert_eq!(flow_of("code").unwrap().as_str(), "authorization_code");
        assert_eq!(flow_of("id_token token").unwrap().as_str(), "implicit");
        assert_eq!(flow_of("code token").unwrap().as_str(), "hybrid");
    }
}
