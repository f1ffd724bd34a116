use chrono::{Duration, Utc};
use smol::block_on;

use super::defaults::*;
use super::{endpoint, example_client};
use crate::code_grant::authenticate::AuthenticateInstruction;
use crate::code_grant::error::{ErrorCode, ProtocolError};
use crate::endpoint::{Endpoint, Generic, Revocation};
use crate::jose::key::tests::client_key;
use crate::jose::{jws, JwsAlg, JwsPayload, KeyAlgorithm};
use crate::primitives::prelude::*;

struct RevocationSetup {
    endpoint: Generic,
}

impl RevocationSetup {
    fn new() -> RevocationSetup {
        let mut clients = ClientMap::new();
        clients.register_client(example_client(EXAMPLE_CLIENT_ID));
        clients.register_client(example_client("other"));
        clients.register_client(
            example_client("signed").with_auth_method(TokenEndpointAuthMethod::PrivateKeyJwt),
        );

        let mut keys = KeyStore::new();
        keys.add_client_key("signed", client_key(KeyAlgorithm::Sign(JwsAlg::RS256)).to_public());

        let setup = RevocationSetup {
            endpoint: endpoint(clients, keys),
        };
        setup.grant(token("parent", EXAMPLE_CLIENT_ID, "access", Some("refresh"), None));
        setup.grant(token("child", EXAMPLE_CLIENT_ID, "child-access", Some("child-refresh"), Some("parent")));
        setup.grant(token("signed", "signed", "signed-access", None, None));
        setup
    }

    fn grant(&self, token: GrantedToken) {
        block_on(self.endpoint.tokens().insert(token)).unwrap();
    }

    fn revoke(
        &self, token: &str, hint: Option<&str>, instruction: &AuthenticateInstruction,
    ) -> Result<(), ProtocolError> {
        block_on(Revocation::new(&self.endpoint).revoke(token, hint, instruction))
    }

    fn access(&self, value: &str) -> Option<GrantedToken> {
        block_on(self.endpoint.tokens().get_by_access_token(value)).unwrap()
    }
}

fn token(id: &str, client_id: &str, access: &str, refresh: Option<&str>, parent: Option<&str>) -> GrantedToken {
    let now = Utc::now();
    GrantedToken {
        id: id.into(),
        access_token: access.into(),
        refresh_token: refresh.map(str::to_string),
        id_token: None,
        scope: "openid".parse().unwrap(),
        client_id: client_id.into(),
        subject: Some(EXAMPLE_OWNER_ID.into()),
        parent_token_id: parent.map(str::to_string),
        created_at: now,
        until: now + Duration::hours(1),
    }
}

fn credentials(client_id: &str) -> AuthenticateInstruction {
    AuthenticateInstruction::basic(client_id, EXAMPLE_PASSPHRASE)
}

fn assertion(jti: &str) -> AuthenticateInstruction {
    let now = Utc::now();
    let mut claims = JwsPayload::new();
    claims.insert("iss", "signed");
    claims.insert("sub", "signed");
    claims.insert("aud", vec![EXAMPLE_ISSUER]);
    claims.insert("exp", (now + Duration::minutes(5)).timestamp());
    claims.insert("iat", now.timestamp());
    claims.insert("jti", jti);
    let key = client_key(KeyAlgorithm::Sign(JwsAlg::RS256));
    AuthenticateInstruction::assertion(&jws::sign(&claims, JwsAlg::RS256, Some(&key)).unwrap())
}

#[test]
fn missing_refresh_token() {
    let setup = RevocationSetup::new();
    let err = setup
        .revoke("unknown", Some("refresh_token"), &credentials(EXAMPLE_CLIENT_ID))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorCode::InvalidToken);
    assert_eq!(err.description(), "the token doesn't exist");
}

#[test]
fn foreign_token() {
    let setup = RevocationSetup::new();
    let err = setup
        .revoke("access", None, &credentials("other"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorCode::InvalidToken);
    assert_eq!(
        err.description(),
        "the token has not been issued for the given client id 'other'"
    );
    assert!(setup.access("access").is_some());
}

#[test]
fn caller_must_authenticate() {
    let setup = RevocationSetup::new();
    let wrong = AuthenticateInstruction::basic(EXAMPLE_CLIENT_ID, "wrong");
    let err = setup.revoke("access", None, &wrong).unwrap_err();
    assert_eq!(err.kind(), ErrorCode::InvalidClient);
    assert!(setup.access("access").is_some());

    let err = setup
        .revoke("access", Some("id_token"), &credentials(EXAMPLE_CLIENT_ID))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorCode::UnsupportedTokenType);
}

#[test]
fn refresh_chain() {
    let setup = RevocationSetup::new();
    setup
        .revoke("refresh", Some("refresh_token"), &credentials(EXAMPLE_CLIENT_ID))
        .unwrap();
    assert!(setup.access("access").is_none());
    assert!(setup.access("child-access").is_none());
}

#[test]
fn hint_falls_back() {
    let setup = RevocationSetup::new();
    setup
        .revoke("child-refresh", None, &credentials(EXAMPLE_CLIENT_ID))
        .unwrap();
    assert!(setup.access("child-access").is_none());
    assert!(setup.access("access").is_some());
}

#[test]
fn private_key_jwt_is_single_use() {
    let setup = RevocationSetup::new();
    let instruction = assertion("revocation-1");
    setup.revoke("signed-access", None, &instruction).unwrap();
    assert!(setup.access("signed-access").is_none());

    let err = setup.revoke("signed-access", None, &instruction).unwrap_err();
    assert_eq!(err.kind(), ErrorCode::InvalidClient);
    assert_eq!(err.description(), "the jwt token has already been used");
}

#[test]
fn rejected_assertion_is_invalid_client() {
    let setup = RevocationSetup::new();
    let key = client_key(KeyAlgorithm::Sign(JwsAlg::RS256));
    let now = Utc::now();
    let mut claims = JwsPayload::new();
    claims.insert("iss", "signed");
    claims.insert("sub", "signed");
    claims.insert("aud", vec!["https://elsewhere.example"]);
    claims.insert("exp", (now + Duration::minutes(5)).timestamp());
    claims.insert("iat", now.timestamp());
    claims.insert("jti", "revocation-audience");
    let instruction = AuthenticateInstruction::assertion(&jws::sign(&claims, JwsAlg::RS256, Some(&key)).unwrap());

    let err = setup.revoke("signed-access", None, &instruction).unwrap_err();
    assert_eq!(err.kind(), ErrorCode::InvalidClient);
    assert!(setup.access("signed-access").is_some());
}
