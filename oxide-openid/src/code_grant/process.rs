//! Deciding between answering a request and involving the resource owner.
use std::collections::BTreeSet;

use url::Url;

use super::error::{ErrorCode, ProtocolError};
use super::parameter::{Principal, Prompt, ResponseMode};
use super::response::{ActionResult, Interaction};
use crate::primitives::consent::Consent;
use crate::primitives::Time;

/// The state of a validated request, as far as the prompt is concerned.
pub struct ProcessContext<'a> {
    /// The verified redirect uri.
    pub redirect_uri: Url,

    /// Placement of the response parameters.
    pub mode: ResponseMode,

    /// The requested prompts, may be empty.
    pub prompts: &'a BTreeSet<Prompt>,

    /// The requested maximum authentication age, in seconds.
    pub max_age: Option<u64>,

    /// The state of the request.
    pub state: Option<&'a str>,
}

/// Decide the next step of a request.
///
/// Without a prompt, a missing login and then a missing consent lead to the respective page.
/// `prompt=none` turns those into `login_required` and `interaction_required` errors. An
/// authentication older than `max_age`, or of unknown age when `max_age` is given, always leads
/// to the login page.
pub fn process_request(
    context: ProcessContext, principal: Option<&Principal>, consent: Option<&Consent>, now: Time,
) -> Result<ActionResult, ProtocolError> {
    let ProcessContext {
        redirect_uri,
        mode,
        prompts,
        max_age,
        state,
    } = context;

    let error = |code, description: &'static str| {
        ProtocolError::new(code, description)
            .with_state(state)
            .redirect_to(redirect_uri.clone(), mode)
    };
    let interaction = |interaction| ActionResult::interaction(interaction, redirect_uri.clone(), mode);

    let principal = match principal {
        Some(principal) if !is_too_old(principal, max_age, now) => Some(principal),
        Some(_) if prompts.contains(&Prompt::None) => {
            return Err(error(
                ErrorCode::LoginRequired,
                "the user needs to be authenticated",
            ))
        }
        Some(_) => return Ok(interaction(Interaction::Authenticate)),
        None => None,
    };

    if prompts.contains(&Prompt::None) {
        return match (principal, consent) {
            (None, _) => Err(error(ErrorCode::LoginRequired, "the user needs to be authenticated")),
            (Some(_), None) => Err(error(
                ErrorCode::InteractionRequired,
                "the user needs to give his consent",
            )),
            (Some(_), Some(_)) => Ok(ActionResult::callback(redirect_uri.clone(), mode)),
        };
    }

    if prompts.contains(&Prompt::Login) || prompts.contains(&Prompt::SelectAccount) || principal.is_none() {
        return Ok(interaction(Interaction::Authenticate));
    }

    if prompts.contains(&Prompt::Consent) || consent.is_none() {
        return Ok(interaction(Interaction::Consent));
    }

    Ok(ActionResult::callback(redirect_uri.clone(), mode))
}

/// A callback needs an authenticated resource owner.
pub fn require_principal<'a>(
    principal: Option<&'a Principal>, state: Option<&str>,
) -> Result<&'a Principal, ProtocolError> {
    principal.ok_or_else(|| {
        ProtocolError::new(
            ErrorCode::InvalidRequest,
            "the response cannot be generated because the resource owner needs to be authenticated",
        )
        .with_state(state)
    })
}

fn is_too_old(principal: &Principal, max_age: Option<u64>, now: Time) -> bool {
    let max_age = match max_age {
        Some(max_age) => max_age,
        None => return false,
    };
    match principal.authenticated_at {
        Some(at) => {
            let age = now.signed_duration_since(at).num_seconds();
            age < 0 || age as u64 > max_age
        }
        None => true,
    }
}
