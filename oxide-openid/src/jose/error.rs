use thiserror::Error;

/// Failures of the JOSE layer.
///
/// None of these carry partial output. Callers at the protocol boundary map them to a fixed
/// error code and never forward the detail to the requesting party.
#[derive(Debug, Error)]
pub enum JoseError {
    /// The compact serialization did not have the expected structure.
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    /// A segment was not valid base64url.
    #[error("invalid base64url segment")]
    Encoding(#[from] base64::DecodeError),

    /// A header or payload segment was not valid json.
    #[error("invalid json segment")]
    Json(#[from] serde_json::Error),

    /// The key is registered for a different algorithm than the one requested.
    #[error("the key is not usable with algorithm `{0}`")]
    AlgorithmMismatch(&'static str),

    /// An algorithm other than `none` was requested without a key.
    #[error("no key supplied for algorithm `{0}`")]
    MissingKey(&'static str),

    /// The operation needs private key material which the key does not hold.
    #[error("the key holds no private part")]
    NotPrivate,

    /// The signature did not verify.
    #[error("the signature is not correct")]
    InvalidSignature,

    /// The JWT library rejected a key or token.
    #[error("jwt processing failed")]
    Jwt(#[source] jsonwebtoken::errors::Error),

    /// The JWE authentication tag did not verify.
    #[error("the authentication tag is not correct")]
    InvalidTag,

    /// An RSA primitive failed.
    #[error("rsa operation failed")]
    Rsa(#[from] rsa::Error),

    /// Symmetric cipher setup or padding failed.
    #[error("content encryption failed")]
    Cipher,

    /// The operating system random source failed.
    #[error("random source unavailable")]
    Random,
}
