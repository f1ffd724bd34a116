//! Authentication of clients at the token and revocation endpoints.
//!
//! Clients present either a shared secret, in the `Authorization: Basic` header or the request
//! body, or a signed JWT assertion as defined in [rfc7523]. The registered authentication method
//! of the client decides which presentation is accepted.
//!
//! [rfc7523]: https://tools.ietf.org/html/rfc7523#section-2.2
use std::str::from_utf8;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{TimeZone, Utc};

use super::error::{ErrorCode, ProtocolError};
use crate::audit;
use crate::jose::{claims, jws, JsonWebKey, JwsAlg, JwsPayload, KeyAlgorithm};
use crate::primitives::keys::JsonWebKeyRepository;
use crate::primitives::registrar::{Client, ClientRepository, TokenEndpointAuthMethod};
use crate::primitives::replay::JtiCache;
use crate::primitives::Time;

/// The `client_assertion_type` of JWT assertions.
pub const JWT_BEARER_ASSERTION: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Claims every client assertion must carry.
const REQUIRED_CLAIMS: [&str; 5] = [
    claims::SUBJECT,
    claims::ISSUER,
    claims::AUDIENCE,
    claims::EXPIRATION,
    claims::JWT_ID,
];

/// The credentials presented with a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthenticateInstruction {
    /// Client id of the `Authorization: Basic` header.
    pub client_id_from_header: Option<String>,

    /// Secret of the `Authorization: Basic` header.
    pub secret_from_header: Option<String>,

    /// The `client_id` body parameter.
    pub client_id_from_body: Option<String>,

    /// The `client_secret` body parameter.
    pub secret_from_body: Option<String>,

    /// The `client_assertion_type` body parameter.
    pub client_assertion_type: Option<String>,

    /// The `client_assertion` body parameter.
    pub client_assertion: Option<String>,
}

/// The header could not be parsed as Basic credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidHeader;

impl AuthenticateInstruction {
    /// Credentials of an `Authorization` header value.
    pub fn from_authorization_header(header: &str) -> Result<Self, InvalidHeader> {
        if !header.starts_with("Basic ") {
            return Err(InvalidHeader);
        }

        let combined = match STANDARD.decode(&header[6..]) {
            Err(_) => return Err(InvalidHeader),
            Ok(vec) => vec,
        };

        let mut split = combined.splitn(2, |&c| c == b':');
        let client_bin = split.next().ok_or(InvalidHeader)?;
        let passwd = split.next().ok_or(InvalidHeader)?;
        let client = from_utf8(client_bin).map_err(|_| InvalidHeader)?;
        let passwd = from_utf8(passwd).map_err(|_| InvalidHeader)?;

        Ok(AuthenticateInstruction::basic(client, passwd))
    }

    /// Credentials of the `Authorization: Basic` header.
    pub fn basic(client_id: &str, secret: &str) -> Self {
        AuthenticateInstruction {
            client_id_from_header: Some(client_id.to_string()),
            secret_from_header: Some(secret.to_string()),
            ..AuthenticateInstruction::default()
        }
    }

    /// Credentials in the request body.
    pub fn post(client_id: &str, secret: &str) -> Self {
        AuthenticateInstruction {
            client_id_from_body: Some(client_id.to_string()),
            secret_from_body: Some(secret.to_string()),
            ..AuthenticateInstruction::default()
        }
    }

    /// A public client naming itself.
    pub fn public(client_id: &str) -> Self {
        AuthenticateInstruction {
            client_id_from_body: Some(client_id.to_string()),
            ..AuthenticateInstruction::default()
        }
    }

    /// A JWT client assertion.
    pub fn assertion(assertion: &str) -> Self {
        AuthenticateInstruction {
            client_assertion_type: Some(JWT_BEARER_ASSERTION.to_string()),
            client_assertion: Some(assertion.to_string()),
            ..AuthenticateInstruction::default()
        }
    }
}

/// Authenticates clients against their registration.
///
/// Every failed check of a client assertion is reported as `invalid_grant`, all other failures as
/// `invalid_client`. The description names the first failed check.
pub struct ClientAuthenticator<'a> {
    clients: &'a dyn ClientRepository,
    keys: &'a dyn JsonWebKeyRepository,
    replay: &'a dyn JtiCache,
    issuer_name: &'a str,
}

impl<'a> ClientAuthenticator<'a> {
    /// An authenticator expecting `issuer_name` in the audience of assertions.
    pub fn new(
        clients: &'a dyn ClientRepository, keys: &'a dyn JsonWebKeyRepository, replay: &'a dyn JtiCache,
        issuer_name: &'a str,
    ) -> Self {
        ClientAuthenticator {
            clients,
            keys,
            replay,
            issuer_name,
        }
    }

    /// Resolve the client of the request and check its credentials.
    pub async fn authenticate(
        &self, instruction: &AuthenticateInstruction, now: Time,
    ) -> Result<Client, ProtocolError> {
        if instruction.client_assertion_type.is_some() || instruction.client_assertion.is_some() {
            return self.authenticate_assertion(instruction, now).await;
        }

        let (client_id, secret, method) = match instruction {
            AuthenticateInstruction {
                client_id_from_header: Some(client_id),
                secret_from_header: Some(secret),
                ..
            } => (client_id, Some(secret), TokenEndpointAuthMethod::ClientSecretBasic),
            AuthenticateInstruction {
                client_id_from_body: Some(client_id),
                secret_from_body: Some(secret),
                ..
            } => (client_id, Some(secret), TokenEndpointAuthMethod::ClientSecretPost),
            AuthenticateInstruction {
                client_id_from_body: Some(client_id),
                ..
            } => (client_id, None, TokenEndpointAuthMethod::None),
            _ => return Err(client_error("credentials", "the client cannot be authenticated")),
        };

        let client = self
            .clients
            .get_by_id(client_id)
            .await?
            .ok_or_else(|| client_error("client", "the client cannot be authenticated"))?;

        if client.token_endpoint_auth_method != method {
            return Err(client_error("method", mismatch_description(method)));
        }

        if let Some(secret) = secret {
            if !client.check_secret(secret) {
                return Err(client_error("secret", mismatch_description(method)));
            }
        }

        audit::client_authenticated(&client.client_id, method.as_str());
        Ok(client)
    }

    async fn authenticate_assertion(
        &self, instruction: &AuthenticateInstruction, now: Time,
    ) -> Result<Client, ProtocolError> {
        let assertion = match (&instruction.client_assertion_type, &instruction.client_assertion) {
            (Some(kind), Some(assertion)) if kind == JWT_BEARER_ASSERTION => assertion.as_str(),
            _ => return Err(client_error("assertion_type", "the client cannot be authenticated")),
        };

        if !jws::is_jws(assertion) {
            return Err(grant_error("jws", "the client assertion is not a JWS token"));
        }

        let payload = jws::insecure_payload(assertion)
            .map_err(|_| grant_error("payload", "the jws payload cannot be extracted"))?;

        if let Some(missing) = REQUIRED_CLAIMS.iter().find(|name| !has_value(&payload, name)) {
            return Err(grant_error("claims", format!("the claim {} is not valid", missing)));
        }

        let issuer = payload.issuer().unwrap_or_default();
        let body_client = instruction.client_id_from_body.as_deref();
        if payload.subject() != Some(issuer) || body_client.map_or(false, |id| id != issuer) {
            return Err(grant_error("client_id", "the client id passed in JWT is not correct"));
        }

        let client = self
            .clients
            .get_by_id(issuer)
            .await?
            .ok_or_else(|| grant_error("client", "the client id passed in JWT is not correct"))?;

        let key = self.verification_key(&client, assertion).await?;
        jws::verify(assertion, Some(&key))
            .map_err(|_| grant_error("signature", "the signature is not correct"))?;

        if !payload.audiences().iter().any(|aud| aud == self.issuer_name) {
            return Err(grant_error("audience", "the audience passed in JWT is not correct"));
        }

        let until = payload
            .expiration()
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
            .ok_or_else(|| grant_error("claims", format!("the claim {} is not valid", claims::EXPIRATION)))?;
        if until <= now {
            return Err(grant_error("expiration", "the received JWT has expired"));
        }

        let jti = payload.jti().unwrap_or_default();
        if !self.replay.insert(jti, until).await? {
            return Err(grant_error("jti", "the jwt token has already been used"));
        }

        audit::client_authenticated(&client.client_id, client.token_endpoint_auth_method.as_str());
        Ok(client)
    }

    /// The key the client signs its assertions with.
    ///
    /// `client_secret_jwt` clients use HMAC keyed by their secret, `private_key_jwt` clients a
    /// registered RSA key. The algorithm of the header must fit the method and the registered
    /// `token_endpoint_auth_signing_alg`.
    async fn verification_key(&self, client: &Client, assertion: &str) -> Result<JsonWebKey, ProtocolError> {
        let invalid = || grant_error("signature", "the signature is not correct");
        let alg = jws::decode_header(assertion).map_err(|_| invalid())?.alg;
        if alg == JwsAlg::None || client.token_endpoint_auth_signing_alg.map_or(false, |expected| expected != alg) {
            return Err(invalid());
        }

        match client.token_endpoint_auth_method {
            TokenEndpointAuthMethod::ClientSecretJwt if alg.is_symmetric() => {
                let secret = client.shared_secret().ok_or_else(invalid)?;
                Ok(JsonWebKey::symmetric(
                    client.client_id.as_str(),
                    KeyAlgorithm::Sign(alg),
                    secret.as_bytes(),
                ))
            }
            TokenEndpointAuthMethod::PrivateKeyJwt if !alg.is_symmetric() => {
                let key = self
                    .keys
                    .get_for_client(&client.client_id, KeyAlgorithm::Sign(alg))
                    .await?
                    .ok_or_else(invalid)?;
                Ok(key.to_public())
            }
            _ => Err(invalid()),
        }
    }
}

fn has_value(payload: &JwsPayload, name: &str) -> bool {
    match name {
        claims::AUDIENCE => payload.audiences().iter().any(|aud| !aud.is_empty()),
        claims::EXPIRATION => payload.expiration().is_some(),
        _ => payload.string(name).map_or(false, |value| !value.is_empty()),
    }
}

fn mismatch_description(method: TokenEndpointAuthMethod) -> &'static str {
    match method {
        TokenEndpointAuthMethod::ClientSecretBasic => "the client cannot be authenticated with secret basic",
        TokenEndpointAuthMethod::ClientSecretPost => "the client cannot be authenticated with secret post",
        _ => "the client cannot be authenticated",
    }
}

fn client_error(check: &str, description: &'static str) -> ProtocolError {
    audit::client_authentication_failed(check);
    ProtocolError::new(ErrorCode::InvalidClient, description)
}

fn grant_error<D>(check: &str, description: D) -> ProtocolError
where
    D: Into<std::borrow::Cow<'static, str>>,
{
    audit::client_authentication_failed(check);
    ProtocolError::new(ErrorCode::InvalidGrant, description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jose::key::tests::client_key;
    use crate::primitives::keys::KeyStore;
    use crate::primitives::registrar::ClientMap;
    use crate::primitives::replay::JtiMap;
    use chrono::Duration;

    const ISSUER: &str = "https://server.example";

    struct Fixture {
        clients: ClientMap,
        keys: KeyStore,
        replay: JtiMap,
    }

    impl Fixture {
        fn new() -> Self {
            let redirect = "https://client.example/cb".parse::<url::Url>().unwrap();
            let scope = "openid".parse::<crate::primitives::scope::Scope>().unwrap();
            let mut clients = ClientMap::new();
            clients.register_client(Client::confidential("basic", redirect.clone(), scope.clone(), "secret"));
            clients.register_client(
                Client::confidential("post", redirect.clone(), scope.clone(), "secret")
                    .with_auth_method(TokenEndpointAuthMethod::ClientSecretPost),
            );
            clients.register_client(Client::public("public", redirect.clone(), scope.clone()));
            clients.register_client(
                Client::confidential("signed", redirect.clone(), scope.clone(), "unused")
                    .with_auth_method(TokenEndpointAuthMethod::PrivateKeyJwt),
            );
            clients.register_client(
                Client::confidential("hmac", redirect, scope, "a shared secret of enough length")
                    .with_auth_method(TokenEndpointAuthMethod::ClientSecretJwt),
            );

            let mut keys = KeyStore::new();
            keys.add_client_key("signed", client_key(KeyAlgorithm::Sign(JwsAlg::RS256)).to_public());

            Fixture {
                clients,
                keys,
                replay: JtiMap::new(),
            }
        }

        fn authenticator(&self) -> ClientAuthenticator<'_> {
            ClientAuthenticator::new(&self.clients, &self.keys, &self.replay, ISSUER)
        }

        fn authenticate(&self, instruction: &AuthenticateInstruction) -> Result<Client, ProtocolError> {
            smol::block_on(self.authenticator().authenticate(instruction, Utc::now()))
        }
    }

    fn claims(client_id: &str, jti: &str) -> JwsPayload {
        let now = Utc::now();
        let mut payload = JwsPayload::new();
        payload.insert("iss", client_id);
        payload.insert("sub", client_id);
        payload.insert("aud", vec![ISSUER]);
        payload.insert("exp", (now + Duration::minutes(5)).timestamp());
        payload.insert("iat", now.timestamp());
        payload.insert("jti", jti);
        payload
    }

    fn private_key_jwt(payload: &JwsPayload) -> AuthenticateInstruction {
        let key = client_key(KeyAlgorithm::Sign(JwsAlg::RS256));
        AuthenticateInstruction::assertion(&jws::sign(payload, JwsAlg::RS256, Some(&key)).unwrap())
    }

    fn assert_grant_error(result: Result<Client, ProtocolError>, description: &str) {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorCode::InvalidGrant);
        assert_eq!(err.description(), description);
    }

    #[test]
    fn basic_header() {
        let fixture = Fixture::new();
        let header = format!("Basic {}", STANDARD.encode("basic:secret"));
        let instruction = AuthenticateInstruction::from_authorization_header(&header).unwrap();
        assert_eq!(fixture.authenticate(&instruction).unwrap().client_id, "basic");

        let wrong = AuthenticateInstruction::basic("basic", "guess");
        let err = fixture.authenticate(&wrong).unwrap_err();
        assert_eq!(err.kind(), ErrorCode::InvalidClient);

        assert_eq!(
            AuthenticateInstruction::from_authorization_header("Bearer abc"),
            Err(InvalidHeader)
        );
    }

    #[test]
    fn registered_method_must_match() {
        let fixture = Fixture::new();
        assert!(fixture.authenticate(&AuthenticateInstruction::post("post", "secret")).is_ok());

        let err = fixture
            .authenticate(&AuthenticateInstruction::post("basic", "secret"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorCode::InvalidClient);
        assert_eq!(err.description(), "the client cannot be authenticated with secret post");

        assert!(fixture.authenticate(&AuthenticateInstruction::public("public")).is_ok());
        assert!(fixture.authenticate(&AuthenticateInstruction::public("basic")).is_err());
        assert!(fixture.authenticate(&AuthenticateInstruction::default()).is_err());
    }

    #[test]
    fn private_key_assertion() {
        let fixture = Fixture::new();
        let client = fixture.authenticate(&private_key_jwt(&claims("signed", "one"))).unwrap();
        assert_eq!(client.client_id, "signed");
    }

    #[test]
    fn replayed_assertion() {
        let fixture = Fixture::new();
        let instruction = private_key_jwt(&claims("signed", "once"));
        assert!(fixture.authenticate(&instruction).is_ok());
        assert_grant_error(
            fixture.authenticate(&instruction),
            "the jwt token has already been used",
        );
    }

    #[test]
    fn concurrent_replay_admits_one() {
        let fixture = Fixture::new();
        let instruction = private_key_jwt(&claims("signed", "raced"));
        let admitted = std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| fixture.authenticate(&instruction).is_ok()))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });
        assert_eq!(admitted, 1);
    }

    #[test]
    fn failed_checks_do_not_burn_the_jti() {
        let fixture = Fixture::new();
        let mut payload = claims("signed", "kept");
        payload.insert("aud", vec!["https://other.example"]);
        assert_grant_error(
            fixture.authenticate(&private_key_jwt(&payload)),
            "the audience passed in JWT is not correct",
        );
        assert!(fixture.authenticate(&private_key_jwt(&claims("signed", "kept"))).is_ok());
    }

    #[test]
    fn invalid_assertions() {
        let fixture = Fixture::new();
        assert_grant_error(
            fixture.authenticate(&AuthenticateInstruction::assertion("not a token")),
            "the client assertion is not a JWS token",
        );

        let mut payload = claims("signed", "a");
        payload.remove("jti");
        assert_grant_error(
            fixture.authenticate(&private_key_jwt(&payload)),
            "the claim jti is not valid",
        );

        let mut payload = claims("signed", "b");
        payload.insert("sub", "someone");
        assert_grant_error(
            fixture.authenticate(&private_key_jwt(&payload)),
            "the client id passed in JWT is not correct",
        );

        assert_grant_error(
            fixture.authenticate(&private_key_jwt(&claims("unknown", "c"))),
            "the client id passed in JWT is not correct",
        );

        let mut payload = claims("signed", "d");
        payload.insert("exp", (Utc::now() - Duration::seconds(1)).timestamp());
        assert_grant_error(
            fixture.authenticate(&private_key_jwt(&payload)),
            "the received JWT has expired",
        );

        let unsigned = jws::sign(&claims("signed", "e"), JwsAlg::None, None).unwrap();
        assert_grant_error(
            fixture.authenticate(&AuthenticateInstruction::assertion(&unsigned)),
            "the signature is not correct",
        );
    }

    #[test]
    fn tampered_assertion() {
        let fixture = Fixture::new();
        let AuthenticateInstruction { client_assertion, .. } = private_key_jwt(&claims("signed", "f"));
        let signed = client_assertion.unwrap();
        let mut parts = signed.split('.').map(str::to_string).collect::<Vec<_>>();
        let mut other = claims("signed", "g");
        other.insert("iat", 0);
        parts[1] = crate::jose::bytes::b64_encode(other.to_json().unwrap());
        let tampered = parts.join(".");
        assert_grant_error(
            fixture.authenticate(&AuthenticateInstruction::assertion(&tampered)),
            "the signature is not correct",
        );
    }

    #[test]
    fn client_secret_assertion() {
        let fixture = Fixture::new();
        let key = JsonWebKey::symmetric(
            "hmac",
            KeyAlgorithm::Sign(JwsAlg::HS256),
            "a shared secret of enough length",
        );
        let token = jws::sign(&claims("hmac", "h"), JwsAlg::HS256, Some(&key)).unwrap();
        let client = fixture.authenticate(&AuthenticateInstruction::assertion(&token)).unwrap();
        assert_eq!(client.client_id, "hmac");

        let wrong = JsonWebKey::symmetric("hmac", KeyAlgorithm::Sign(JwsAlg::HS256), "guessed");
        let token = jws::sign(&claims("hmac", "i"), JwsAlg::HS256, Some(&wrong)).unwrap();
        assert_grant_error(
            fixture.authenticate(&AuthenticateInstruction::assertion(&token)),
            "the signature is not correct",
        );
    }
}
