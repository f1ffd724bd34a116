//! Compact JSON web signatures (RFC 7515).
//!
//! Keyed algorithms are delegated to `jsonwebtoken`. Unsecured tokens, `alg` `none`, are
//! handled here since that crate refuses them.
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;

use super::algorithm::{JwsAlg, KeyAlgorithm};
use super::bytes::{b64_decode, b64_encode};
use super::key::{JsonWebKey, KeyMaterial};
use super::payload::JwsPayload;
use super::JoseError;

/// The protected header of a signed token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// The signature algorithm.
    pub alg: JwsAlg,

    /// The id of the signing key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// The media type of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl JwsHeader {
    fn unsecured() -> Self {
        JwsHeader {
            alg: JwsAlg::None,
            kid: None,
            typ: Some("JWT".to_string()),
        }
    }
}

/// Sign a payload into a compact JWS.
///
/// The key must be registered for exactly `alg`. Unsecured tokens, `alg` `none`, are produced
/// without a key and carry an empty signature.
pub fn sign(payload: &JwsPayload, alg: JwsAlg, key: Option<&JsonWebKey>) -> Result<String, JoseError> {
    if let Some(key) = key {
        check_key(alg, key)?;
    }

    let (algorithm, key) = match (signing_algorithm(alg), key) {
        (None, _) => {
            let header = serde_json::to_vec(&JwsHeader::unsecured())?;
            return Ok(format!("{}.{}.", b64_encode(header), b64_encode(payload.to_json()?)));
        }
        (Some(_), None) => return Err(JoseError::MissingKey(alg.as_str())),
        (Some(algorithm), Some(key)) => (algorithm, key),
    };

    let mut header = Header::new(algorithm);
    header.kid = Some(key.kid().to_string());
    jsonwebtoken::encode(&header, payload, &encoding_key(key)?).map_err(jwt_error)
}

/// Verify a compact JWS and return its header and claims.
///
/// Without a key only an unsecured token with an empty signature verifies. With a key, the
/// header must name the algorithm the key is registered for. Claims are not validated here,
/// expiry and audience are the business of the caller.
pub fn verify(token: &str, key: Option<&JsonWebKey>) -> Result<(JwsHeader, JwsPayload), JoseError> {
    let (header_part, payload_part, signature_part) = split(token)?;
    let header: JwsHeader = serde_json::from_slice(&b64_decode(header_part)?)?;

    let key = match (header.alg, key) {
        (JwsAlg::None, None) if signature_part.is_empty() => {
            let payload = JwsPayload::from_json(&b64_decode(payload_part)?)?;
            return Ok((header, payload));
        }
        (JwsAlg::None, None) => return Err(JoseError::InvalidSignature),
        (alg, None) => return Err(JoseError::MissingKey(alg.as_str())),
        (alg, Some(key)) => {
            check_key(alg, key)?;
            key
        }
    };

    let algorithm = signing_algorithm(header.alg).ok_or(JoseError::AlgorithmMismatch(header.alg.as_str()))?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<JwsPayload>(token, &decoding_key(key)?, &validation).map_err(jwt_error)?;
    Ok((header, data.claims))
}

/// Decode the header without checking the signature.
pub fn decode_header(token: &str) -> Result<JwsHeader, JoseError> {
    let (header, _, _) = split(token)?;
    Ok(serde_json::from_slice(&b64_decode(header)?)?)
}

/// Decode the claims without checking the signature.
///
/// Used to find out which key should verify the token. Never trust the result on its own.
pub fn insecure_payload(token: &str) -> Result<JwsPayload, JoseError> {
    let (_, payload, _) = split(token)?;
    JwsPayload::from_json(&b64_decode(payload)?)
}

/// If the string has the shape of a compact JWS, three segments.
pub fn is_jws(token: &str) -> bool {
    split(token).is_ok()
}

fn split(token: &str) -> Result<(&str, &str, &str), JoseError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) if !header.is_empty() && !payload.is_empty() => {
            Ok((header, payload, signature))
        }
        _ => Err(JoseError::Malformed("expected three segments")),
    }
}

fn check_key(alg: JwsAlg, key: &JsonWebKey) -> Result<(), JoseError> {
    if key.algorithm() == KeyAlgorithm::Sign(alg) {
        Ok(())
    } else {
        Err(JoseError::AlgorithmMismatch(alg.as_str()))
    }
}

fn signing_algorithm(alg: JwsAlg) -> Option<Algorithm> {
    match alg {
        JwsAlg::None => None,
        JwsAlg::HS256 => Some(Algorithm::HS256),
        JwsAlg::HS384 => Some(Algorithm::HS384),
        JwsAlg::HS512 => Some(Algorithm::HS512),
        JwsAlg::RS256 => Some(Algorithm::RS256),
        JwsAlg::RS384 => Some(Algorithm::RS384),
        JwsAlg::RS512 => Some(Algorithm::RS512),
    }
}

fn encoding_key(key: &JsonWebKey) -> Result<EncodingKey, JoseError> {
    match key.material() {
        KeyMaterial::Symmetric(secret) => Ok(EncodingKey::from_secret(secret)),
        KeyMaterial::Rsa {
            private: Some(private),
            ..
        } => {
            let pem = private
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|_| JoseError::Malformed("rsa private key"))?;
            EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(jwt_error)
        }
        KeyMaterial::Rsa { private: None, .. } => Err(JoseError::NotPrivate),
    }
}

fn decoding_key(key: &JsonWebKey) -> Result<DecodingKey, JoseError> {
    match key.material() {
        KeyMaterial::Symmetric(secret) => Ok(DecodingKey::from_secret(secret)),
        KeyMaterial::Rsa { public, .. } => {
            let modulus = b64_encode(public.n().to_bytes_be());
            let exponent = b64_encode(public.e().to_bytes_be());
            DecodingKey::from_rsa_components(&modulus, &exponent).map_err(jwt_error)
        }
    }
}

fn jwt_error(err: jsonwebtoken::errors::Error) -> JoseError {
    match err.kind() {
        ErrorKind::InvalidSignature => JoseError::InvalidSignature,
        _ => JoseError::Jwt(err),
    }
}
