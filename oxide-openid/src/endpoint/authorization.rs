//! The authorization endpoint, answering requests of the code and implicit flows.
use std::collections::BTreeSet;

use chrono::Utc;
use url::Url;

use super::Endpoint;
use crate::audit;
use crate::code_grant::consent::ConsentMatcher;
use crate::code_grant::error::{ErrorCode, ProtocolError};
use crate::code_grant::flow::{resolve_flow, AuthorizationFlow};
use crate::code_grant::jwt::{fill_hashes, JwtGenerator};
use crate::code_grant::parameter::{AuthorizationParameter, Principal, ResponseMode};
use crate::code_grant::process::{process_request, require_principal, ProcessContext};
use crate::code_grant::response::{ActionResult, AuthorizationResponse, RedirectInstruction};
use crate::code_grant::validation::{
    check_grant_types, check_pkce, check_response_types, require_openid, validate_allowed_scopes,
    validate_client_exist, validate_parameter, validate_redirection_url,
};
use crate::primitives::consent::Consent;
use crate::primitives::grant::{AuthorizationCode, GrantedToken};
use crate::primitives::registrar::{Client, ResponseType};
use crate::primitives::scope::Scope;
use crate::primitives::{expiry, PrimitiveError, Time};

/// Fresh values tried before a code collision is reported.
const CODE_ATTEMPTS: usize = 3;

/// Answers authorization requests.
///
/// This is the recovery boundary of the flows. Errors raised before the `redirect_uri` has been
/// matched against the client registration are returned without redirect target, every later
/// error is redirected to the client together with the `state` of the request.
pub struct Authorization<'a, E: Endpoint + ?Sized> {
    endpoint: &'a E,
}

/// The checked target of a request.
struct Verified<'r> {
    client: Client,
    redirect_uri: Url,
    mode: ResponseMode,
    state: Option<&'r str>,
}

impl<'a, E: Endpoint + ?Sized> Authorization<'a, E> {
    /// Answer requests with the primitives of the endpoint.
    pub fn new(endpoint: &'a E) -> Self {
        Authorization { endpoint }
    }

    /// Validate an authorization request and decide how to continue.
    ///
    /// The result either sends the user agent back to the client with the response parameters, or
    /// to the login or consent page. `principal` is the logged in resource owner, if any.
    pub async fn get_authorization(
        &self, parameter: &AuthorizationParameter, principal: Option<&Principal>,
    ) -> Result<ActionResult, ProtocolError> {
        audit::authorization_start(parameter);
        let result = self.authorize(parameter, principal, Utc::now()).await;
        match &result {
            Ok(action) => audit::authorization_end(parameter, action),
            Err(err) => audit::authorization_error(err),
        }
        result
    }

    /// Generate the response parameters of a callback.
    ///
    /// The request must have passed [`get_authorization`] before. A code is only minted when the
    /// resource owner consented to the request, without consent it is left out of the response.
    ///
    /// [`get_authorization`]: #method.get_authorization
    pub async fn generate_authorization_response(
        &self, action: ActionResult, parameter: &AuthorizationParameter, principal: Option<&Principal>,
        client: &Client,
    ) -> Result<RedirectInstruction, ProtocolError> {
        let state = parameter.state();
        if !action.is_callback() {
            return Err(ProtocolError::new(
                ErrorCode::InvalidRequest,
                "the authorization request has not been accepted",
            )
            .with_state(state));
        }

        let redirect = action.into_redirect();
        let redirect_uri = redirect.redirect_uri().clone();
        let mode = redirect.mode();

        let result: Result<RedirectInstruction, ProtocolError> = async {
            if resolve_flow(parameter)? == AuthorizationFlow::Hybrid {
                return Err(hybrid_unsupported(state));
            }
            let principal = require_principal(principal, state)?;
            let scope = validate_allowed_scopes(parameter.scope.as_deref().unwrap_or_default(), client, state)?;
            let consent = ConsentMatcher::new(self.endpoint.consents())
                .find(&principal.subject, &client.client_id, &scope, &parameter.claims)
                .await?;
            self.respond(redirect, parameter, principal, client, &scope, consent.as_ref(), Utc::now())
                .await
        }
        .await;

        result.map_err(|err| redirected(err, state, &redirect_uri, mode))
    }

    async fn authorize(
        &self, parameter: &AuthorizationParameter, principal: Option<&Principal>, now: Time,
    ) -> Result<ActionResult, ProtocolError> {
        let state = parameter.state();
        let flow = resolve_flow(parameter)?;
        validate_parameter(parameter)?;

        let client_id = parameter.client_id.as_deref().unwrap_or_default();
        let client = self.endpoint.clients().get_by_id(client_id).await?;
        let client = validate_client_exist(client, client_id, state)?;
        let redirect_uri =
            validate_redirection_url(parameter.redirect_uri.as_deref().unwrap_or_default(), &client, state)?;

        let response_types = parameter.response_types().unwrap_or_default();
        let mode = parameter.response_mode(&response_types).ok_or_else(|| {
            ProtocolError::new(
                ErrorCode::InvalidRequest,
                format!(
                    "the response_mode {} is not supported",
                    parameter.response_mode.as_deref().unwrap_or_default()
                ),
            )
            .with_state(state)
            .redirect_to(redirect_uri.clone(), ResponseMode::for_response_types(&response_types))
        })?;
        let verified = Verified {
            client,
            redirect_uri,
            mode,
            state,
        };

        self.dispatch(flow, &verified, &response_types, parameter, principal, now)
            .await
            .map_err(|err| redirected(err, state, &verified.redirect_uri, verified.mode))
    }

    async fn dispatch(
        &self, flow: AuthorizationFlow, verified: &Verified<'_>, response_types: &BTreeSet<ResponseType>,
        parameter: &AuthorizationParameter, principal: Option<&Principal>, now: Time,
    ) -> Result<ActionResult, ProtocolError> {
        let Verified { client, state, .. } = verified;
        let state = *state;

        match flow {
            AuthorizationFlow::Hybrid => Err(hybrid_unsupported(state)),
            AuthorizationFlow::AuthorizationCode | AuthorizationFlow::Implicit => {
                check_grant_types(client, flow.grant_types(), state)?;
                check_response_types(client, response_types, state)?;
                let scope = validate_allowed_scopes(parameter.scope.as_deref().unwrap_or_default(), client, state)?;
                require_openid(&scope, state)?;
                if flow == AuthorizationFlow::AuthorizationCode {
                    check_pkce(client, parameter)?;
                }

                let consent = match principal {
                    Some(principal) => {
                        ConsentMatcher::new(self.endpoint.consents())
                            .find(&principal.subject, &client.client_id, &scope, &parameter.claims)
                            .await?
                    }
                    None => None,
                };

                audit::process_start(&client.client_id, flow, parameter.prompt.as_deref());
                let prompts = parameter.prompts().unwrap_or_default();
                let context = ProcessContext {
                    redirect_uri: verified.redirect_uri.clone(),
                    mode: verified.mode,
                    prompts: &prompts,
                    max_age: parameter.max_age,
                    state,
                };
                let action = process_request(context, principal, consent.as_ref(), now)?;
                audit::process_end(&client.client_id, flow, &action);

                if !action.is_callback() {
                    return Ok(action);
                }

                let principal = require_principal(principal, state)?;
                let redirect = action.redirect().clone();
                let redirect = self
                    .respond(redirect, parameter, principal, client, &scope, consent.as_ref(), now)
                    .await?;
                Ok(action.with_redirect(redirect))
            }
        }
    }

    /// Issue the requested credentials and write them into the redirect.
    #[allow(clippy::too_many_arguments)]
    async fn respond(
        &self, mut redirect: RedirectInstruction, parameter: &AuthorizationParameter, principal: &Principal,
        client: &Client, scope: &Scope, consent: Option<&Consent>, now: Time,
    ) -> Result<RedirectInstruction, ProtocolError> {
        let response_types = parameter.response_types().unwrap_or_default();
        let generator = JwtGenerator::new(self.endpoint.settings(), self.endpoint.scopes(), self.endpoint.keys());
        let mut payload = generator
            .generate_id_token_payload(client, principal, parameter, scope, now)
            .await?;

        let mut response = AuthorizationResponse {
            state: parameter.state.clone(),
            ..AuthorizationResponse::default()
        };

        let access_token = if response_types.contains(&ResponseType::Token) {
            Some(self.endpoint.token_generator().tag()?)
        } else {
            None
        };

        if response_types.contains(&ResponseType::Code) && consent.is_some() {
            let id_token = generator.encode_id_token(&payload, client).await?;
            let code = self
                .issue_code(parameter, principal, client, redirect.redirect_uri(), scope, id_token, now)
                .await?;
            response.code = Some(code);
        }

        if response_types.contains(&ResponseType::IdToken) {
            fill_hashes(
                &mut payload,
                generator.signing_algorithm(client),
                response.code.as_deref(),
                access_token.as_deref(),
            );
            response.id_token = Some(generator.encode_id_token(&payload, client).await?);
        }

        if let Some(access_token) = access_token {
            let token = GrantedToken {
                id: self.endpoint.token_generator().tag()?,
                access_token,
                refresh_token: None,
                id_token: response.id_token.clone(),
                scope: scope.clone(),
                client_id: client.client_id.clone(),
                subject: Some(principal.subject.clone()),
                parent_token_id: None,
                created_at: now,
                until: expiry(now, self.endpoint.settings().token_validity),
            };
            let expires_in = token.expires_in(now);
            let value = token.access_token.clone();
            self.endpoint.tokens().insert(token).await?;
            response.access_token = Some((value, expires_in));
        }

        response.write(&mut redirect);
        audit::response_generated(&client.client_id, &redirect);
        Ok(redirect)
    }

    #[allow(clippy::too_many_arguments)]
    async fn issue_code(
        &self, parameter: &AuthorizationParameter, principal: &Principal, client: &Client, redirect_uri: &Url,
        scope: &Scope, id_token: String, now: Time,
    ) -> Result<String, ProtocolError> {
        let until = expiry(now, self.endpoint.settings().authorization_code_validity);
        for _ in 0..CODE_ATTEMPTS {
            let code = AuthorizationCode {
                code: self.endpoint.code_generator().tag()?,
                client_id: client.client_id.clone(),
                subject: principal.subject.clone(),
                redirect_uri: redirect_uri.clone(),
                scope: scope.clone(),
                id_token: Some(id_token.clone()),
                code_challenge: parameter.code_challenge.clone(),
                code_challenge_method: parameter.code_challenge_method.clone(),
                created_at: now,
                until,
            };
            let value = code.code.clone();
            if self.endpoint.codes().insert(code).await? {
                return Ok(value);
            }
        }

        Err(PrimitiveError::Conflict.into())
    }
}

/// Send an error to the verified redirect uri, unless it already has a target.
fn hybrid_unsupported(state: Option<&str>) -> ProtocolError {
    ProtocolError::new(ErrorCode::InvalidRequest, "the hybrid flow is not supported").with_state(state)
}

fn redirected(err: ProtocolError, state: Option<&str>, redirect_uri: &Url, mode: ResponseMode) -> ProtocolError {
    if err.redirect_uri().is_some() {
        return err;
    }
    err.with_state(state).redirect_to(redirect_uri.clone(), mode)
}
