//! The outcome of an authorization request.
//!
//! An authorization request either ends with a redirect back to the client, carrying the
//! response parameters, or with an interaction of the resource owner at the server, after which
//! the request is resumed.
use url::Url;

use super::parameter::ResponseMode;

/// What the user agent should be shown next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionType {
    /// Redirect to the client.
    Callback,

    /// Show a page of the server first.
    Interaction(Interaction),
}

/// Pages of the server a request may need.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    /// The resource owner must log in.
    Authenticate,

    /// The resource owner must grant the requested scopes.
    Consent,
}

/// Parameters for the redirect to the client, in the order they were added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectInstruction {
    redirect_uri: Url,
    mode: ResponseMode,
    parameters: Vec<(String, String)>,
}

/// The decision on an authorization request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionResult {
    action: ActionType,
    redirect: RedirectInstruction,
}

impl ActionType {
    /// Name of the kind of action, for audit events.
    pub fn type_name(self) -> &'static str {
        match self {
            ActionType::Callback => "redirect_to_callback",
            ActionType::Interaction(_) => "redirect_to_action",
        }
    }

    /// Name of the target of the action, for audit events.
    pub fn target_name(self) -> &'static str {
        match self {
            ActionType::Callback => "callback",
            ActionType::Interaction(Interaction::Authenticate) => "authenticate",
            ActionType::Interaction(Interaction::Consent) => "consent",
        }
    }
}

impl RedirectInstruction {
    /// An empty instruction to a verified redirect uri.
    pub fn new(redirect_uri: Url, mode: ResponseMode) -> Self {
        RedirectInstruction {
            redirect_uri,
            mode,
            parameters: Vec::new(),
        }
    }

    /// Append a parameter.
    pub fn add_parameter<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.parameters.push((name.into(), value.into()));
    }

    /// The value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All parameters in order.
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// The names of all parameters in order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The client's redirect uri.
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Where the parameters are placed.
    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// The url the user agent is sent to.
    pub fn into_url(self) -> Url {
        self.mode.append(self.redirect_uri, self.parameters)
    }
}

impl ActionResult {
    /// Redirect to the client, parameters are added when the response is generated.
    pub fn callback(redirect_uri: Url, mode: ResponseMode) -> Self {
        ActionResult {
            action: ActionType::Callback,
            redirect: RedirectInstruction::new(redirect_uri, mode),
        }
    }

    /// Show a page of the server before returning to the client.
    pub fn interaction(interaction: Interaction, redirect_uri: Url, mode: ResponseMode) -> Self {
        ActionResult {
            action: ActionType::Interaction(interaction),
            redirect: RedirectInstruction::new(redirect_uri, mode),
        }
    }

    /// The decided action.
    pub fn action(&self) -> ActionType {
        self.action
    }

    /// If the request can be answered now.
    pub fn is_callback(&self) -> bool {
        self.action == ActionType::Callback
    }

    /// The redirect to the client.
    pub fn redirect(&self) -> &RedirectInstruction {
        &self.redirect
    }

    /// Replace the redirect, keeping the action.
    pub fn with_redirect(mut self, redirect: RedirectInstruction) -> Self {
        self.redirect = redirect;
        self
    }

    /// Take the redirect.
    pub fn into_redirect(self) -> RedirectInstruction {
        self.redirect
    }
}

/// The credentials of an authorization response before they are placed on the redirect.
///
/// Parameters are always emitted in the order `id_token`, `access_token` (with `token_type` and
/// `expires_in`), `code`, `state`, independent of the order they were generated in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationResponse {
    /// The encoded id token.
    pub id_token: Option<String>,

    /// The access token with its remaining lifetime in seconds.
    pub access_token: Option<(String, i64)>,

    /// The authorization code.
    pub code: Option<String>,

    /// The state of the request.
    pub state: Option<String>,
}

impl AuthorizationResponse {
    /// Write the parameters into the instruction.
    pub fn write(self, redirect: &mut RedirectInstruction) {
        if let Some(id_token) = self.id_token {
            redirect.add_parameter("id_token", id_token);
        }
        if let Some((access_token, expires_in)) = self.access_token {
            redirect.add_parameter("access_token", access_token);
            redirect.add_parameter("token_type", "Bearer");
            redirect.add_parameter("expires_in", expires_in.to_string());
        }
        if let Some(code) = self.code {
            redirect.add_parameter("code", code);
        }
        if let Some(state) = self.state {
            redirect.add_parameter("state", state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect() -> RedirectInstruction {
        RedirectInstruction::new("https://client.example/cb".parse().unwrap(), ResponseMode::Fragment)
    }

    #[test]
    fn fixed_parameter_order() {
        let mut instruction = redirect();
        AuthorizationResponse {
            state: Some("state".into()),
            code: Some("code".into()),
            access_token: Some(("token".into(), 3600)),
            id_token: Some("jwt".into()),
        }
        .write(&mut instruction);
        assert_eq!(
            instruction.parameter_names(),
            vec!["id_token", "access_token", "token_type", "expires_in", "code", "state"]
        );
        assert_eq!(instruction.get("expires_in"), Some("3600"));
    }

    #[test]
    fn state_only() {
        let mut instruction = redirect();
        AuthorizationResponse {
            state: Some("state".into()),
            ..AuthorizationResponse::default()
        }
        .write(&mut instruction);
        let url = instruction.into_url();
        assert_eq!(url.fragment(), Some("state=state"));
    }

    #[test]
    fn action_names() {
        let action = ActionResult::interaction(
            Interaction::Consent,
            "https://client.example/cb".parse().unwrap(),
            ResponseMode::Query,
        );
        assert!(!action.is_callback());
        assert_eq!(action.action().type_name(), "redirect_to_action");
        assert_eq!(action.action().target_name(), "consent");
    }
}
