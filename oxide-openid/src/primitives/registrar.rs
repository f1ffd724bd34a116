//! Registrars administer a database of known clients.
//!
//! The engine only reads client registrations. How clients are registered, updated or removed is
//! not covered by this library, the in-memory `ClientMap` offers a plain `register_client`.
use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use url::Url;

use super::scope::Scope;
use super::PrimitiveError;
use crate::jose::bytes::constant_time_eq;
use crate::jose::{JweAlg, JweEnc, JwsAlg};

/// Read access to registered clients.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Resolve a client by its id.
    async fn get_by_id(&self, client_id: &str) -> Result<Option<Client>, PrimitiveError>;
}

/// A registered client.
///
/// Redirect uris are compared verbatim by their serialization, as motivated in the rfc.
#[derive(Clone, Debug)]
pub struct Client {
    /// The unique id of the client.
    pub client_id: String,

    /// Secrets the client may authenticate with.
    pub secrets: Vec<ClientSecret>,

    /// All registered redirect uris.
    pub redirect_uris: Vec<Url>,

    /// The scopes the client may request.
    pub allowed_scopes: Scope,

    /// Allowed grant types.
    pub grant_types: Vec<GrantType>,

    /// Allowed values of `response_type`.
    pub response_types: Vec<ResponseType>,

    /// How the client authenticates at the token and revocation endpoints.
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,

    /// The algorithm client assertions must be signed with, any when unset.
    pub token_endpoint_auth_signing_alg: Option<JwsAlg>,

    /// Signature algorithm of id tokens, the server default when unset.
    pub id_token_signed_response_alg: Option<JwsAlg>,

    /// Key management algorithm of id tokens, no encryption when unset.
    pub id_token_encrypted_response_alg: Option<JweAlg>,

    /// Content encryption of id tokens, the server default when unset.
    pub id_token_encrypted_response_enc: Option<JweEnc>,

    /// Whether authorization requests must carry a PKCE challenge.
    pub require_pkce: bool,
}

/// A typed client secret.
#[derive(Clone, PartialEq, Eq)]
pub enum ClientSecret {
    /// A secret shared between client and server, also keying `client_secret_jwt` assertions.
    Shared(String),

    /// An explicit marker for clients without secret.
    None,
}

/// Grant types of RFC 6749 and RFC 7523.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum GrantType {
    /// `authorization_code`
    AuthorizationCode,
    /// `implicit`
    Implicit,
    /// `refresh_token`
    RefreshToken,
    /// `client_credentials`
    ClientCredentials,
    /// `password`
    Password,
    /// `urn:ietf:params:oauth:grant-type:jwt-bearer`
    JwtBearer,
}

/// The individual values of the `response_type` parameter.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResponseType {
    /// `code`
    Code,
    /// `token`
    Token,
    /// `id_token`
    IdToken,
}

/// Client authentication methods of OpenID Connect Core, section 9.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TokenEndpointAuthMethod {
    /// Secret in the `Authorization: Basic` header.
    ClientSecretBasic,
    /// Secret in the request body.
    ClientSecretPost,
    /// Assertion signed with HMAC keyed by the client secret.
    ClientSecretJwt,
    /// Assertion signed with a registered private key of the client.
    PrivateKeyJwt,
    /// Public client, no authentication.
    None,
}

/// A very simple, in-memory hash map of client ids to Client entries.
#[derive(Default)]
pub struct ClientMap {
    clients: HashMap<String, Client>,
}

impl Client {
    /// Create a public client, allowed only the authorization code grant.
    pub fn public(client_id: &str, redirect_uri: Url, allowed_scopes: Scope) -> Client {
        Client {
            client_id: client_id.to_string(),
            secrets: vec![ClientSecret::None],
            redirect_uris: vec![redirect_uri],
            allowed_scopes,
            grant_types: vec![GrantType::AuthorizationCode],
            response_types: vec![ResponseType::Code],
            token_endpoint_auth_method: TokenEndpointAuthMethod::None,
            token_endpoint_auth_signing_alg: None,
            id_token_signed_response_alg: None,
            id_token_encrypted_response_alg: None,
            id_token_encrypted_response_enc: None,
            require_pkce: false,
        }
    }

    /// Create a confidential client authenticating with `client_secret_basic`.
    pub fn confidential(client_id: &str, redirect_uri: Url, allowed_scopes: Scope, secret: &str) -> Client {
        Client {
            secrets: vec![ClientSecret::Shared(secret.to_string())],
            token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretBasic,
            ..Client::public(client_id, redirect_uri, allowed_scopes)
        }
    }

    /// Add additional redirect uris.
    pub fn with_additional_redirect_uris(mut self, uris: Vec<Url>) -> Self {
        self.redirect_uris.extend(uris);
        self
    }

    /// Replace the allowed grant types.
    pub fn with_grant_types(mut self, grant_types: Vec<GrantType>) -> Self {
        self.grant_types = grant_types;
        self
    }

    /// Replace the allowed response types.
    pub fn with_response_types(mut self, response_types: Vec<ResponseType>) -> Self {
        self.response_types = response_types;
        self
    }

    /// Choose the authentication method at the token endpoint.
    pub fn with_auth_method(mut self, method: TokenEndpointAuthMethod) -> Self {
        self.token_endpoint_auth_method = method;
        self
    }

    /// Sign id tokens with the given algorithm.
    pub fn with_id_token_signing(mut self, alg: JwsAlg) -> Self {
        self.id_token_signed_response_alg = Some(alg);
        self
    }

    /// Encrypt id tokens for the client.
    pub fn with_id_token_encryption(mut self, alg: JweAlg, enc: Option<JweEnc>) -> Self {
        self.id_token_encrypted_response_alg = Some(alg);
        self.id_token_encrypted_response_enc = enc;
        self
    }

    /// Require a PKCE challenge on authorization requests.
    pub fn requiring_pkce(mut self) -> Self {
        self.require_pkce = true;
        self
    }

    /// If the exact redirect uri is registered.
    pub fn has_redirect_uri(&self, uri: &Url) -> bool {
        self.redirect_uris
            .iter()
            .any(|registered| registered.as_str() == uri.as_str())
    }

    /// If the client may use the grant type.
    pub fn supports_grant_type(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    /// If the client may request the response type.
    pub fn supports_response_type(&self, response_type: ResponseType) -> bool {
        self.response_types.contains(&response_type)
    }

    /// The first shared secret, keying `client_secret_jwt` assertions.
    pub fn shared_secret(&self) -> Option<&str> {
        self.secrets.iter().find_map(|secret| match secret {
            ClientSecret::Shared(secret) => Some(secret.as_str()),
            ClientSecret::None => None,
        })
    }

    /// Compare a presented secret against every registered shared secret.
    ///
    /// All secrets are compared, the comparison itself does not short-circuit.
    pub fn check_secret(&self, presented: &str) -> bool {
        self.secrets.iter().fold(false, |matched, secret| {
            let equal = match secret {
                ClientSecret::Shared(secret) => constant_time_eq(secret.as_bytes(), presented.as_bytes()),
                ClientSecret::None => false,
            };
            matched | equal
        })
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ClientSecret::Shared(_) => write!(f, "<shared>"),
            ClientSecret::None => write!(f, "<none>"),
        }
    }
}

impl GrantType {
    /// The registered name.
    pub fn as_str(self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::Implicit => "implicit",
            GrantType::RefreshToken => "refresh_token",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::Password => "password",
            GrantType::JwtBearer => "urn:ietf:params:oauth:grant-type:jwt-bearer",
        }
    }

    /// Look up a grant type by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "authorization_code" => Some(GrantType::AuthorizationCode),
            "implicit" => Some(GrantType::Implicit),
            "refresh_token" => Some(GrantType::RefreshToken),
            "client_credentials" => Some(GrantType::ClientCredentials),
            "password" => Some(GrantType::Password),
            "urn:ietf:params:oauth:grant-type:jwt-bearer" => Some(GrantType::JwtBearer),
            _ => None,
        }
    }
}

impl ResponseType {
    /// The registered name.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Code => "code",
            ResponseType::Token => "token",
            ResponseType::IdToken => "id_token",
        }
    }

    /// Look up a response type by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "code" => Some(ResponseType::Code),
            "token" => Some(ResponseType::Token),
            "id_token" => Some(ResponseType::IdToken),
            _ => None,
        }
    }
}

impl TokenEndpointAuthMethod {
    /// The registered name.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenEndpointAuthMethod::ClientSecretBasic => "client_secret_basic",
            TokenEndpointAuthMethod::ClientSecretPost => "client_secret_post",
            TokenEndpointAuthMethod::ClientSecretJwt => "client_secret_jwt",
            TokenEndpointAuthMethod::PrivateKeyJwt => "private_key_jwt",
            TokenEndpointAuthMethod::None => "none",
        }
    }

    /// Look up a method by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "client_secret_basic" => Some(TokenEndpointAuthMethod::ClientSecretBasic),
            "client_secret_post" => Some(TokenEndpointAuthMethod::ClientSecretPost),
            "client_secret_jwt" => Some(TokenEndpointAuthMethod::ClientSecretJwt),
            "private_key_jwt" => Some(TokenEndpointAuthMethod::PrivateKeyJwt),
            "none" => Some(TokenEndpointAuthMethod::None),
            _ => None,
        }
    }
}

wire_names!(GrantType, ResponseType, TokenEndpointAuthMethod);

impl ClientMap {
    /// Create an empty map without any clients in it.
    pub fn new() -> ClientMap {
        ClientMap::default()
    }

    /// Insert or update the client record.
    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }
}

impl Extend<Client> for ClientMap {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Client>,
    {
        iter.into_iter().for_each(|client| self.register_client(client))
    }
}

impl FromIterator<Client> for ClientMap {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Client>,
    {
        let mut into = ClientMap::new();
        into.extend(iter);
        into
    }
}

#[async_trait]
impl ClientRepository for ClientMap {
    async fn get_by_id(&self, client_id: &str) -> Result<Option<Client>, PrimitiveError> {
        Ok(self.clients.get(client_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::confidential(
            "ClientId",
            "https://client.example/endpoint".parse().unwrap(),
            "openid profile".parse().unwrap(),
            "SuperSecret",
        )
    }

    #[test]
    fn secrets() {
        let mut client = client();
        assert!(client.check_secret("SuperSecret"));
        assert!(!client.check_secret("SuperSecre"));
        assert!(!client.check_secret(""));

        client.secrets.insert(0, ClientSecret::Shared("Rotated".into()));
        assert!(client.check_secret("SuperSecret"));
        assert!(client.check_secret("Rotated"));
        assert_eq!(client.shared_secret(), Some("Rotated"));

        let public = Client::public("p", "https://p.example".parse().unwrap(), Scope::default());
        assert!(!public.check_secret(""));
        assert_eq!(public.shared_secret(), None);
        assert_eq!(format!("{:?}", client.secrets), "[<shared>, <shared>]");
    }

    #[test]
    fn redirect_is_exact() {
        let client = client();
        assert!(client.has_redirect_uri(&"https://client.example/endpoint".parse().unwrap()));
        assert!(!client.has_redirect_uri(&"https://client.example/endpoint/".parse().unwrap()));
        assert!(!client.has_redirect_uri(&"https://client.example/endpoint?x=1".parse().unwrap()));
    }

    #[test]
    fn wire_names() {
        for grant_type in [
            GrantType::AuthorizationCode,
            GrantType::Implicit,
            GrantType::RefreshToken,
            GrantType::ClientCredentials,
            GrantType::Password,
            GrantType::JwtBearer,
        ]
        .iter()
        {
            assert_eq!(grant_type.as_str().parse::<GrantType>(), Ok(*grant_type));
        }
        assert!("id_token token".parse::<ResponseType>().is_err());
        assert_eq!(
            serde_json::to_string(&TokenEndpointAuthMethod::PrivateKeyJwt).unwrap(),
            "\"private_key_jwt\""
        );
    }

    #[test]
    fn map_lookup() {
        let map: ClientMap = vec![client()].into_iter().collect();
        let found = smol::block_on(map.get_by_id("ClientId")).unwrap();
        assert_eq!(found.map(|client| client.client_id), Some("ClientId".to_string()));
        assert!(smol::block_on(map.get_by_id("Other")).unwrap().is_none());
    }
}
