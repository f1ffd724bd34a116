//! Audit events of the flows.
//!
//! All events are emitted with `tracing` under the target `oxide_openid::audit`, so they can be
//! routed separately from diagnostics. Secrets, tokens and codes are never part of an event, only
//! the names of returned parameters.
use std::fmt;

use crate::code_grant::error::ProtocolError;
use crate::code_grant::flow::AuthorizationFlow;
use crate::code_grant::parameter::AuthorizationParameter;
use crate::code_grant::response::{ActionResult, RedirectInstruction};

/// Target of every audit event.
pub const TARGET: &str = "oxide_openid::audit";

/// An authorization request was received.
pub fn authorization_start(parameter: &AuthorizationParameter) {
    tracing::info!(
        target: TARGET,
        event = "authorization.start",
        client_id = parameter.client_id.as_deref().unwrap_or_default(),
        response_type = parameter.response_type.as_deref().unwrap_or_default(),
        scope = parameter.scope.as_deref().unwrap_or_default(),
        claims = ?parameter.claims,
        "authorization request received"
    );
}

/// An authorization request was answered.
pub fn authorization_end(parameter: &AuthorizationParameter, action: &ActionResult) {
    tracing::info!(
        target: TARGET,
        event = "authorization.end",
        client_id = parameter.client_id.as_deref().unwrap_or_default(),
        action_type = action.action().type_name(),
        action_target = action.action().target_name(),
        parameters = ?action.redirect().parameter_names(),
        "authorization request answered"
    );
}

/// An authorization request failed.
pub fn authorization_error(error: &ProtocolError) {
    tracing::info!(
        target: TARGET,
        event = "authorization.error",
        code = %error.kind(),
        description = error.description(),
        redirected = error.redirect_uri().is_some(),
        "authorization request rejected"
    );
}

/// The prompt of a validated request is evaluated.
pub fn process_start(client_id: &str, flow: AuthorizationFlow, prompt: Option<&str>) {
    tracing::debug!(
        target: TARGET,
        event = "authorization.process.start",
        client_id,
        flow = flow.as_str(),
        prompt = prompt.unwrap_or_default(),
        "processing authorization request"
    );
}

/// The prompt evaluation decided the next step.
pub fn process_end(client_id: &str, flow: AuthorizationFlow, action: &ActionResult) {
    tracing::debug!(
        target: TARGET,
        event = "authorization.process.end",
        client_id,
        flow = flow.as_str(),
        action_type = action.action().type_name(),
        action_target = action.action().target_name(),
        "authorization request processed"
    );
}

/// Parameters of an authorization response were generated.
pub fn response_generated(client_id: &str, redirect: &RedirectInstruction) {
    tracing::debug!(
        target: TARGET,
        event = "authorization.response",
        client_id,
        parameters = ?redirect.parameter_names(),
        "authorization response generated"
    );
}

/// A client authenticated.
pub fn client_authenticated(client_id: &str, method: &str) {
    tracing::debug!(target: TARGET, event = "client.authenticated", client_id, method, "client authenticated");
}

/// A check of client authentication failed.
///
/// Only the name of the check is recorded, never the presented credentials.
pub fn client_authentication_failed(check: &str) {
    tracing::debug!(
        target: TARGET,
        event = "client.authentication_failed",
        check,
        "client authentication failed"
    );
}

/// A token was revoked.
pub fn token_revoked(client_id: &str, token_type: &str) {
    tracing::info!(target: TARGET, event = "token.revoked", client_id, token_type, "token revoked");
}

/// A revocation request failed.
pub fn revocation_failed(error: &ProtocolError) {
    tracing::info!(
        target: TARGET,
        event = "token.revocation_failed",
        code = %error.kind(),
        description = error.description(),
        "token revocation rejected"
    );
}

/// A backend or key failed, the requesting party only sees an internal error.
pub fn internal_failure(error: &dyn fmt::Display) {
    tracing::error!(target: TARGET, event = "internal.failure", error = %error, "internal failure");
}
