//! Signing and encryption of JSON web tokens.
//!
//! Tokens use the compact serialization only. A JWS is `header.payload.signature`, a JWE is
//! `header.encrypted_key.iv.ciphertext.tag`, every segment base64url encoded without padding.
//!
//! Keys are bound to one algorithm when created. Both [`jws::sign`] and [`jwe::encrypt`] refuse
//! a key registered for another algorithm than the one requested.
pub mod algorithm;
pub mod bytes;
pub mod jwe;
pub mod jws;
pub mod key;
pub mod payload;

mod error;

pub use self::algorithm::{JweAlg, JweEnc, JwsAlg, KeyAlgorithm, KeyUsage};
pub use self::error::JoseError;
pub use self::jwe::JweHeader;
pub use self::jws::JwsHeader;
pub use self::key::{JsonWebKey, KeyMaterial};
pub use self::payload::{claims, JwsPayload};
