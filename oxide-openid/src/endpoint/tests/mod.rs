use chrono::Utc;

use super::Generic;
use crate::code_grant::parameter::{AuthorizationParameter, Principal};
use crate::jose::key::tests::{client_key, server_key};
use crate::jose::{JweAlg, JwsAlg, JwsPayload, KeyAlgorithm};
use crate::primitives::prelude::*;
use crate::settings::Settings;

use self::defaults::*;

pub mod defaults {
    pub const EXAMPLE_CLIENT_ID: &str = "clientId";
    pub const EXAMPLE_OWNER_ID: &str = "Owner";
    pub const EXAMPLE_PASSPHRASE: &str = "VGhpcyBpcyBhIHZlcnkgc2VjdXJlIHBhc3NwaHJhc2UK";
    pub const EXAMPLE_REDIRECT_URI: &str = "https://client.example/endpoint";
    pub const EXAMPLE_SCOPE: &str = "openid profile email";
    pub const EXAMPLE_ISSUER: &str = "https://server.example";
    pub const EXAMPLE_STATE: &str = "state";
}

/// A confidential client allowed the code and implicit flows.
fn example_client(client_id: &str) -> Client {
    Client::confidential(
        client_id,
        EXAMPLE_REDIRECT_URI.parse().unwrap(),
        EXAMPLE_SCOPE.parse().unwrap(),
        EXAMPLE_PASSPHRASE,
    )
    .with_grant_types(vec![GrantType::AuthorizationCode, GrantType::Implicit])
    .with_response_types(vec![ResponseType::Code, ResponseType::IdToken, ResponseType::Token])
}

/// An in-memory endpoint signing with the test server key.
fn endpoint(clients: ClientMap, mut keys: KeyStore) -> Generic {
    keys.add_key(server_key(KeyAlgorithm::Sign(JwsAlg::RS256)));
    let settings = Settings {
        issuer_name: EXAMPLE_ISSUER.into(),
        ..Settings::default()
    };
    Generic::in_memory(settings, clients, ScopeCatalog::openid(), keys)
}

/// The public key verifying id tokens of the endpoint.
fn verification_key() -> crate::jose::JsonWebKey {
    server_key(KeyAlgorithm::Sign(JwsAlg::RS256)).to_public()
}

/// The private key of a client receiving encrypted id tokens.
fn decryption_key() -> crate::jose::JsonWebKey {
    client_key(KeyAlgorithm::Encrypt(JweAlg::RsaOaep))
}

fn request(client_id: &str, response_type: &str) -> AuthorizationParameter {
    AuthorizationParameter {
        client_id: Some(client_id.into()),
        response_type: Some(response_type.into()),
        scope: Some("openid".into()),
        redirect_uri: Some(EXAMPLE_REDIRECT_URI.into()),
        state: Some(EXAMPLE_STATE.into()),
        nonce: Some("nonce".into()),
        ..AuthorizationParameter::default()
    }
}

fn owner() -> Principal {
    let mut claims = JwsPayload::new();
    claims.insert("email", "owner@example.com");
    claims.insert("name", "Owner");
    Principal::new(EXAMPLE_OWNER_ID, claims).authenticated_at(Utc::now())
}

fn consent(client_id: &str, scopes: &str) -> Consent {
    Consent {
        subject: EXAMPLE_OWNER_ID.into(),
        client_id: client_id.into(),
        scopes: scopes.parse().unwrap(),
        claims: Vec::new(),
    }
}

mod revocation;
