//! Generation of id tokens.
//!
//! The claims are assembled from the resource owner, the granted scopes and the request, then
//! signed with the algorithm the client registered and encrypted to the client if it asked for
//! encryption.
use std::sync::Arc;

use super::error::{ErrorCode, ProtocolError};
use super::parameter::{AuthorizationParameter, Principal};
use crate::jose::bytes::{b64_encode, sha2_digest};
use crate::jose::{claims, jwe, jws, JsonWebKey, JweAlg, JweEnc, JwsAlg, JwsPayload, KeyAlgorithm};
use crate::primitives::catalog::ScopeRepository;
use crate::primitives::keys::JsonWebKeyRepository;
use crate::primitives::registrar::Client;
use crate::primitives::scope::Scope;
use crate::primitives::{expiry, Time};
use crate::settings::Settings;

/// The authentication context class of a password login.
pub const PASSWORD_ACR: &str = "openid.pape.auth_level.ns.password=1";

/// The authentication method of a password login.
pub const PASSWORD_AMR: &str = "password";

/// Claims that are set by the server and never copied from the resource owner.
const PROTECTED: &[&str] = &[
    claims::ISSUER,
    claims::SUBJECT,
    claims::AUDIENCE,
    claims::EXPIRATION,
    claims::ISSUED_AT,
    claims::JWT_ID,
    claims::AUTH_TIME,
    claims::NONCE,
    claims::ACR,
    claims::AMR,
    claims::AZP,
    claims::CODE_HASH,
    claims::ACCESS_TOKEN_HASH,
];

/// Builds, signs and encrypts id tokens.
pub struct JwtGenerator<'a> {
    settings: &'a Settings,
    scopes: &'a dyn ScopeRepository,
    keys: &'a dyn JsonWebKeyRepository,
}

impl<'a> JwtGenerator<'a> {
    /// A generator using the server settings and keys.
    pub fn new(
        settings: &'a Settings, scopes: &'a dyn ScopeRepository, keys: &'a dyn JsonWebKeyRepository,
    ) -> Self {
        JwtGenerator { settings, scopes, keys }
    }

    /// The claims of an id token for the resource owner.
    ///
    /// User claims are those released by the granted scopes plus those requested individually,
    /// after the claims mapping has been applied.
    pub async fn generate_id_token_payload(
        &self, client: &Client, principal: &Principal, parameter: &AuthorizationParameter, scope: &Scope,
        now: Time,
    ) -> Result<JwsPayload, ProtocolError> {
        let issuer = self.settings.issuer_name.as_str();
        let mut audiences = vec![client.client_id.clone()];
        if client.client_id != issuer {
            audiences.push(issuer.to_string());
        }

        let mut payload = JwsPayload::new();
        payload.insert(claims::ISSUER, issuer);
        payload.insert(claims::SUBJECT, principal.subject.as_str());
        payload.insert(claims::AUDIENCE, audiences.clone());
        payload.insert(
            claims::EXPIRATION,
            expiry(now, self.settings.id_token_validity).timestamp(),
        );
        payload.insert(claims::ISSUED_AT, now.timestamp());
        if let Some(authenticated_at) = principal.authenticated_at {
            payload.insert(claims::AUTH_TIME, authenticated_at.timestamp());
        }
        if let Some(nonce) = parameter.nonce.as_deref() {
            payload.insert(claims::NONCE, nonce);
        }
        payload.insert(claims::ACR, PASSWORD_ACR);
        payload.insert(claims::AMR, vec![PASSWORD_AMR]);
        if audiences.len() > 1 {
            payload.insert(claims::AZP, client.client_id.as_str());
        }

        let names = scope.iter().collect::<Vec<_>>();
        let descriptors = self.scopes.search_by_names(&names).await?;
        let released = descriptors
            .iter()
            .flat_map(|descriptor| descriptor.claims.iter())
            .chain(parameter.claims.iter());

        let mapped = self.settings.claims_mapping.apply(&principal.claims);
        for name in released {
            if PROTECTED.contains(&name.as_str()) || payload.contains(name) {
                continue;
            }
            if let Some(value) = mapped.get(name) {
                payload.insert(name.as_str(), value.clone());
            }
        }

        Ok(payload)
    }

    /// The signature algorithm of id tokens for the client.
    pub fn signing_algorithm(&self, client: &Client) -> JwsAlg {
        client
            .id_token_signed_response_alg
            .unwrap_or(self.settings.default_id_token_signing_alg)
    }

    /// Sign the payload.
    ///
    /// HMAC algorithms are keyed with the client secret, RSA algorithms with the server key of
    /// the algorithm. There is no fallback to `none`, a missing key is an error.
    pub async fn sign(&self, payload: &JwsPayload, alg: JwsAlg, client: &Client) -> Result<String, ProtocolError> {
        let key = match alg {
            JwsAlg::None => None,
            alg if alg.is_symmetric() => {
                let secret = client.shared_secret().ok_or_else(cannot_sign)?;
                Some(Arc::new(JsonWebKey::symmetric(
                    client.client_id.as_str(),
                    KeyAlgorithm::Sign(alg),
                    secret.as_bytes(),
                )))
            }
            alg => Some(
                self.keys
                    .get_by_algorithm(KeyAlgorithm::Sign(alg))
                    .await?
                    .ok_or_else(cannot_sign)?,
            ),
        };

        jws::sign(payload, alg, key.as_deref()).map_err(ProtocolError::jose)
    }

    /// Encrypt a signed token to the key the client registered for `alg`.
    pub async fn encrypt(
        &self, jws: &str, alg: JweAlg, enc: JweEnc, client_id: &str,
    ) -> Result<String, ProtocolError> {
        let key = self
            .keys
            .get_for_client(client_id, KeyAlgorithm::Encrypt(alg))
            .await?
            .ok_or_else(|| ProtocolError::new(ErrorCode::InternalError, "the id token cannot be encrypted"))?;
        jwe::encrypt(jws.as_bytes(), alg, enc, &key).map_err(ProtocolError::jose)
    }

    /// Sign the payload, then encrypt it if the client registered an encryption algorithm.
    ///
    /// Content encryption falls back to the server default when the client only named the key
    /// management algorithm.
    pub async fn encode_id_token(&self, payload: &JwsPayload, client: &Client) -> Result<String, ProtocolError> {
        let signed = self.sign(payload, self.signing_algorithm(client), client).await?;
        match client.id_token_encrypted_response_alg {
            None => Ok(signed),
            Some(alg) => {
                let enc = client
                    .id_token_encrypted_response_enc
                    .unwrap_or(self.settings.default_content_encryption);
                self.encrypt(&signed, alg, enc, &client.client_id).await
            }
        }
    }
}

/// Bind a code and an access token into the claims, as `c_hash` and `at_hash`.
pub fn fill_hashes(payload: &mut JwsPayload, alg: JwsAlg, code: Option<&str>, access_token: Option<&str>) {
    if let Some(access_token) = access_token {
        payload.insert(claims::ACCESS_TOKEN_HASH, left_hash(alg, access_token));
    }
    if let Some(code) = code {
        payload.insert(claims::CODE_HASH, left_hash(alg, code));
    }
}

/// The base64url encoded left half of the digest of `value`, hashed as the signature of `alg`.
pub fn left_hash(alg: JwsAlg, value: &str) -> String {
    let digest = sha2_digest(alg.digest_bits(), value.as_bytes());
    b64_encode(&digest[..digest.len() / 2])
}

fn cannot_sign() -> ProtocolError {
    ProtocolError::new(ErrorCode::InternalError, "the id token cannot be signed")
}
