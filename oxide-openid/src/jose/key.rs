//! Key material for signing and key wrapping.
use std::fmt;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use super::algorithm::{KeyAlgorithm, KeyUsage};
use super::bytes::b64_decode;
use super::JoseError;

/// A key bound to a single algorithm.
///
/// The algorithm is fixed at construction so that a key registered for one algorithm can never
/// be used under another one.
#[derive(Clone)]
pub struct JsonWebKey {
    kid: String,
    algorithm: KeyAlgorithm,
    material: KeyMaterial,
}

/// The cryptographic content of a key.
#[derive(Clone)]
pub enum KeyMaterial {
    /// An RSA key, with or without its private part.
    Rsa {
        /// The public key.
        public: RsaPublicKey,
        /// The private key, if held.
        private: Option<RsaPrivateKey>,
    },

    /// A shared secret, `kty` `oct`.
    Symmetric(Vec<u8>),
}

impl JsonWebKey {
    /// Wrap an RSA private key.
    pub fn rsa_private(kid: impl Into<String>, algorithm: KeyAlgorithm, private: RsaPrivateKey) -> Self {
        JsonWebKey {
            kid: kid.into(),
            algorithm,
            material: KeyMaterial::Rsa {
                public: private.to_public_key(),
                private: Some(private),
            },
        }
    }

    /// Wrap an RSA public key, usable to verify or to encrypt.
    pub fn rsa_public(kid: impl Into<String>, algorithm: KeyAlgorithm, public: RsaPublicKey) -> Self {
        JsonWebKey {
            kid: kid.into(),
            algorithm,
            material: KeyMaterial::Rsa {
                public,
                private: None,
            },
        }
    }

    /// Load an RSA private key from PEM, either PKCS#8 or PKCS#1.
    pub fn rsa_private_pem(kid: impl Into<String>, algorithm: KeyAlgorithm, pem: &str) -> Result<Self, JoseError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|_| JoseError::Malformed("rsa private key pem"))?;
        Ok(JsonWebKey::rsa_private(kid, algorithm, private))
    }

    /// Load an RSA public key from a SubjectPublicKeyInfo PEM.
    pub fn rsa_public_pem(kid: impl Into<String>, algorithm: KeyAlgorithm, pem: &str) -> Result<Self, JoseError> {
        let public = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|_| JoseError::Malformed("rsa public key pem"))?;
        Ok(JsonWebKey::rsa_public(kid, algorithm, public))
    }

    /// Build an RSA public key from the base64url `n` and `e` members of a JWK.
    pub fn rsa_components(
        kid: impl Into<String>, algorithm: KeyAlgorithm, modulus: &str, exponent: &str,
    ) -> Result<Self, JoseError> {
        let n = BigUint::from_bytes_be(&b64_decode(modulus)?);
        let e = BigUint::from_bytes_be(&b64_decode(exponent)?);
        let public = RsaPublicKey::new(n, e)?;
        Ok(JsonWebKey::rsa_public(kid, algorithm, public))
    }

    /// A shared secret key.
    pub fn symmetric(kid: impl Into<String>, algorithm: KeyAlgorithm, secret: impl Into<Vec<u8>>) -> Self {
        JsonWebKey {
            kid: kid.into(),
            algorithm,
            material: KeyMaterial::Symmetric(secret.into()),
        }
    }

    /// The key id, `kid`.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The algorithm this key is restricted to.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// The usage implied by the algorithm.
    pub fn usage(&self) -> KeyUsage {
        self.algorithm.usage()
    }

    /// Access the key material.
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// A copy of this key without private parts.
    ///
    /// Symmetric keys have no public part and are returned unchanged.
    pub fn to_public(&self) -> JsonWebKey {
        let material = match &self.material {
            KeyMaterial::Rsa { public, .. } => KeyMaterial::Rsa {
                public: public.clone(),
                private: None,
            },
            KeyMaterial::Symmetric(secret) => KeyMaterial::Symmetric(secret.clone()),
        };
        JsonWebKey {
            kid: self.kid.clone(),
            algorithm: self.algorithm,
            material,
        }
    }

    /// The `kty` name of the key.
    pub fn key_type(&self) -> &'static str {
        match self.material {
            KeyMaterial::Rsa { .. } => "RSA",
            KeyMaterial::Symmetric(_) => "oct",
        }
    }

    pub(crate) fn rsa_public_key(&self) -> Option<&RsaPublicKey> {
        match &self.material {
            KeyMaterial::Rsa { public, .. } => Some(public),
            KeyMaterial::Symmetric(_) => None,
        }
    }

    pub(crate) fn rsa_private_key(&self) -> Result<&RsaPrivateKey, JoseError> {
        match &self.material {
            KeyMaterial::Rsa {
                private: Some(private),
                ..
            } => Ok(private),
            _ => Err(JoseError::NotPrivate),
        }
    }

    pub(crate) fn secret(&self) -> Option<&[u8]> {
        match &self.material {
            KeyMaterial::Symmetric(secret) => Some(secret),
            KeyMaterial::Rsa { .. } => None,
        }
    }
}

impl fmt::Debug for JsonWebKey {
    // Never print key material.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("JsonWebKey")
            .field("kid", &self.kid)
            .field("kty", &self.key_type())
            .field("alg", &self.algorithm.as_str())
            .field("use", &self.usage().as_str())
            .finish()
    }
}
