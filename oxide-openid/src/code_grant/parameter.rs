//! The parameters of an authorization request and the party who makes it.
use std::borrow::Borrow;
use std::collections::BTreeSet;

use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::jose::JwsPayload;
use crate::primitives::registrar::ResponseType;
use crate::primitives::Time;

/// The parsed parameters of an authorization request.
///
/// Values are kept raw. Validation decides which of them are acceptable, so that a failure can
/// still echo the `state` of the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationParameter {
    /// The requesting client.
    pub client_id: Option<String>,

    /// Space separated response types.
    pub response_type: Option<String>,

    /// Space separated scopes.
    pub scope: Option<String>,

    /// Where to send the response.
    pub redirect_uri: Option<String>,

    /// Overrides where the response parameters are placed.
    pub response_mode: Option<String>,

    /// Opaque value echoed in the response.
    pub state: Option<String>,

    /// Value bound into the id token.
    pub nonce: Option<String>,

    /// Maximum age of the resource owner's authentication, in seconds.
    pub max_age: Option<u64>,

    /// User claims requested individually for the id token.
    pub claims: Vec<String>,

    /// Space separated prompt values.
    pub prompt: Option<String>,

    /// PKCE challenge.
    pub code_challenge: Option<String>,

    /// PKCE challenge method.
    pub code_challenge_method: Option<String>,
}

/// The resource owner on whose behalf a request is made.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Principal {
    /// The stable identifier of the resource owner.
    pub subject: String,

    /// Claims about the resource owner, before mapping.
    pub claims: JwsPayload,

    /// When the resource owner last authenticated.
    pub authenticated_at: Option<Time>,
}

/// Values of the `prompt` parameter.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prompt {
    /// No user interface may be shown.
    None,
    /// Force reauthentication.
    Login,
    /// Force a consent screen.
    Consent,
    /// Let the resource owner choose an account.
    SelectAccount,
}

/// Where response parameters are placed on the redirect uri.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ResponseMode {
    /// In the query, used when only a code is returned.
    Query,
    /// In the fragment, used whenever tokens are returned.
    Fragment,
}

/// Known PKCE transformations.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum CodeChallengeMethod {
    /// The challenge is the verifier.
    Plain,
    /// The challenge is the base64url encoded SHA-256 of the verifier.
    S256,
}

impl AuthorizationParameter {
    /// Read the parameters from the query of an authorization request url.
    ///
    /// Unknown parameters are ignored. A `max_age` that is not a number is dropped. The `claims`
    /// parameter is a json object and the names below its `id_token` member are collected.
    pub fn from_query(url: &Url) -> Self {
        AuthorizationParameter::from_pairs(url.query_pairs())
    }

    /// Read the parameters from key value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parameter = AuthorizationParameter::default();
        for (key, value) in pairs {
            let value = value.as_ref().to_string();
            match key.as_ref() {
                "client_id" => parameter.client_id = Some(value),
                "response_type" => parameter.response_type = Some(value),
                "scope" => parameter.scope = Some(value),
                "redirect_uri" => parameter.redirect_uri = Some(value),
                "response_mode" => parameter.response_mode = Some(value),
                "state" => parameter.state = Some(value),
                "nonce" => parameter.nonce = Some(value),
                "max_age" => parameter.max_age = value.parse().ok(),
                "claims" => parameter.claims = requested_claims(&value),
                "prompt" => parameter.prompt = Some(value),
                "code_challenge" => parameter.code_challenge = Some(value),
                "code_challenge_method" => parameter.code_challenge_method = Some(value),
                _ => (),
            }
        }
        parameter
    }

    /// The state to echo, if any.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// The response types, or `None` if any of them is unknown or none is given.
    ///
    /// Duplicates collapse and order is irrelevant.
    pub fn response_types(&self) -> Option<BTreeSet<ResponseType>> {
        parse_set(self.response_type.as_deref()?, ResponseType::from_name)
    }

    /// The requested response mode, or the default of the response types when absent.
    ///
    /// `None` if the requested mode is unknown.
    pub fn response_mode(&self, types: &BTreeSet<ResponseType>) -> Option<ResponseMode> {
        match self.response_mode.as_deref() {
            None => Some(ResponseMode::for_response_types(types)),
            Some(raw) => ResponseMode::from_name(raw),
        }
    }

    /// The prompt values, empty when absent and `None` if any is unknown.
    pub fn prompts(&self) -> Option<BTreeSet<Prompt>> {
        match self.prompt.as_deref() {
            None => Some(BTreeSet::new()),
            Some(raw) if raw.trim().is_empty() => Some(BTreeSet::new()),
            Some(raw) => parse_set(raw, Prompt::from_name),
        }
    }
}

impl Principal {
    /// A principal with claims but without a recorded authentication time.
    pub fn new(subject: &str, claims: JwsPayload) -> Self {
        Principal {
            subject: subject.to_string(),
            claims,
            authenticated_at: None,
        }
    }

    /// Record the time of authentication.
    pub fn authenticated_at(mut self, time: Time) -> Self {
        self.authenticated_at = Some(time);
        self
    }
}

impl Prompt {
    /// The registered name.
    pub fn as_str(self) -> &'static str {
        match self {
            Prompt::None => "none",
            Prompt::Login => "login",
            Prompt::Consent => "consent",
            Prompt::SelectAccount => "select_account",
        }
    }

    /// Parse a registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Prompt::None),
            "login" => Some(Prompt::Login),
            "consent" => Some(Prompt::Consent),
            "select_account" => Some(Prompt::SelectAccount),
            _ => None,
        }
    }
}

impl ResponseMode {
    /// The mode for a set of response types.
    pub fn for_response_types(types: &BTreeSet<ResponseType>) -> Self {
        if types.iter().any(|ty| *ty != ResponseType::Code) {
            ResponseMode::Fragment
        } else {
            ResponseMode::Query
        }
    }

    /// The registered name.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseMode::Query => "query",
            ResponseMode::Fragment => "fragment",
        }
    }

    /// Parse a registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "query" => Some(ResponseMode::Query),
            "fragment" => Some(ResponseMode::Fragment),
            _ => None,
        }
    }

    /// Append url encoded pairs to the query or fragment, after anything already there.
    pub fn append<I, K, V>(self, mut url: Url, pairs: I) -> Url
    where
        I: IntoIterator,
        I::Item: Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        match self {
            ResponseMode::Query => {
                url.query_pairs_mut().extend_pairs(pairs);
            }
            ResponseMode::Fragment => {
                let existing = url.fragment().unwrap_or("").to_string();
                let mut serializer = form_urlencoded::Serializer::new(existing);
                serializer.extend_pairs(pairs);
                let fragment = serializer.finish();
                url.set_fragment(Some(&fragment));
            }
        }
        url
    }
}

impl CodeChallengeMethod {
    /// The registered name.
    pub fn as_str(self) -> &'static str {
        match self {
            CodeChallengeMethod::Plain => "plain",
            CodeChallengeMethod::S256 => "S256",
        }
    }

    /// Parse a registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "plain" => Some(CodeChallengeMethod::Plain),
            "S256" => Some(CodeChallengeMethod::S256),
            _ => None,
        }
    }
}

wire_names!(Prompt, ResponseMode, CodeChallengeMethod);

fn parse_set<T: Ord>(raw: &str, parse: fn(&str) -> Option<T>) -> Option<BTreeSet<T>> {
    let set = raw
        .split_whitespace()
        .map(parse)
        .collect::<Option<BTreeSet<T>>>()?;
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

fn requested_claims(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(request)) => match request.get("id_token") {
            Some(Value::Object(claims)) => claims.keys().cloned().collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_types_are_a_set() {
        let parameter = AuthorizationParameter {
            response_type: Some("token id_token token".into()),
            ..AuthorizationParameter::default()
        };
        let expected = vec![ResponseType::Token, ResponseType::IdToken]
            .into_iter()
            .collect::<BTreeSet<_>>();
        assert_eq!(parameter.response_types(), Some(expected));

        let unknown = AuthorizationParameter {
            response_type: Some("token code id_token made_up".into()),
            ..AuthorizationParameter::default()
        };
        assert_eq!(unknown.response_types(), None);
        assert_eq!(AuthorizationParameter::default().response_types(), None);
    }

    #[test]
    fn from_query() {
        let url = Url::parse(
            "https://server.example/authorize?client_id=c&response_type=code&scope=openid%20email\
             &state=s&max_age=nan&prompt=login&claims=%7B%22id_token%22%3A%7B%22email%22%3Anull%7D%7D",
        )
        .unwrap();
        let parameter = AuthorizationParameter::from_query(&url);
        assert_eq!(parameter.client_id.as_deref(), Some("c"));
        assert_eq!(parameter.scope.as_deref(), Some("openid email"));
        assert_eq!(parameter.state(), Some("s"));
        assert_eq!(parameter.max_age, None);
        assert_eq!(parameter.claims, vec!["email".to_string()]);
        assert!(parameter.prompts().unwrap().contains(&Prompt::Login));
    }

    #[test]
    fn unknown_prompt() {
        let parameter = AuthorizationParameter {
            prompt: Some("login never".into()),
            ..AuthorizationParameter::default()
        };
        assert_eq!(parameter.prompts(), None);
        assert_eq!(AuthorizationParameter::default().prompts(), Some(BTreeSet::new()));
    }

    #[test]
    fn requested_response_mode() {
        let id_token = vec![ResponseType::IdToken].into_iter().collect::<BTreeSet<_>>();
        let mut parameter = AuthorizationParameter::default();
        assert_eq!(parameter.response_mode(&id_token), Some(ResponseMode::Fragment));

        parameter.response_mode = Some("query".into());
        assert_eq!(parameter.response_mode(&id_token), Some(ResponseMode::Query));

        parameter.response_mode = Some("form_post".into());
        assert_eq!(parameter.response_mode(&id_token), None);
    }

    #[test]
    fn fragment_appends() {
        let url = Url::parse("https://client.example/cb#a=1").unwrap();
        let url = ResponseMode::Fragment.append(url, &[("b", "two words")]);
        assert_eq!(url.fragment(), Some("a=1&b=two+words"));
    }
}
