//! Algorithm identifiers of JWA (RFC 7518) and their registered names.
//!
//! Every enum here converts to and from its wire name through a `match`, so adding a variant
//! without naming it fails to compile.

/// Digital signature and MAC algorithms for JWS.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum JwsAlg {
    /// Unsecured JWS, an empty signature.
    ///
    /// Only produced when a client explicitly registered it.
    None,
    /// HMAC using SHA-256.
    HS256,
    /// HMAC using SHA-384.
    HS384,
    /// HMAC using SHA-512.
    HS512,
    /// RSASSA-PKCS1-v1_5 using SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512.
    RS512,
}

/// Key management algorithms for JWE, wrapping the content encryption key.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum JweAlg {
    /// RSAES-PKCS1-v1_5.
    Rsa1_5,
    /// RSAES OAEP using default parameters (SHA-1, MGF1 with SHA-1).
    RsaOaep,
    /// RSAES OAEP using SHA-256 and MGF1 with SHA-256.
    RsaOaep256,
}

/// Content encryption algorithms for JWE.
///
/// Only the AES-CBC with HMAC-SHA2 family of RFC 7518 section 5.2 is implemented.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum JweEnc {
    /// AES_128_CBC_HMAC_SHA_256, the default content encryption.
    A128CbcHs256,
    /// AES_192_CBC_HMAC_SHA_384.
    A192CbcHs384,
    /// AES_256_CBC_HMAC_SHA_512.
    A256CbcHs512,
}

/// The intended use of a key, the `use` member of a JWK.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum KeyUsage {
    /// `sig`
    Signature,
    /// `enc`
    Encryption,
}

/// The algorithm a key is registered for. Determines its usage.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// A signing or MAC key.
    Sign(JwsAlg),
    /// A key wrapping key.
    Encrypt(JweAlg),
}

impl JwsAlg {
    /// All supported signature algorithms.
    pub const ALL: [JwsAlg; 7] = [
        JwsAlg::None,
        JwsAlg::HS256,
        JwsAlg::HS384,
        JwsAlg::HS512,
        JwsAlg::RS256,
        JwsAlg::RS384,
        JwsAlg::RS512,
    ];

    /// The registered `alg` header value.
    pub fn as_str(self) -> &'static str {
        match self {
            JwsAlg::None => "none",
            JwsAlg::HS256 => "HS256",
            JwsAlg::HS384 => "HS384",
            JwsAlg::HS512 => "HS512",
            JwsAlg::RS256 => "RS256",
            JwsAlg::RS384 => "RS384",
            JwsAlg::RS512 => "RS512",
        }
    }

    /// Look up an algorithm by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(JwsAlg::None),
            "HS256" => Some(JwsAlg::HS256),
            "HS384" => Some(JwsAlg::HS384),
            "HS512" => Some(JwsAlg::HS512),
            "RS256" => Some(JwsAlg::RS256),
            "RS384" => Some(JwsAlg::RS384),
            "RS512" => Some(JwsAlg::RS512),
            _ => None,
        }
    }

    /// Bit size of the SHA-2 digest underlying the algorithm.
    ///
    /// This selects the hash for `at_hash` and `c_hash`. Unsecured tokens use SHA-256.
    pub fn digest_bits(self) -> usize {
        match self {
            JwsAlg::None | JwsAlg::HS256 | JwsAlg::RS256 => 256,
            JwsAlg::HS384 | JwsAlg::RS384 => 384,
            JwsAlg::HS512 | JwsAlg::RS512 => 512,
        }
    }

    /// If the algorithm is keyed with a shared secret.
    pub fn is_symmetric(self) -> bool {
        matches!(self, JwsAlg::HS256 | JwsAlg::HS384 | JwsAlg::HS512)
    }
}

impl JweAlg {
    /// All supported key management algorithms.
    pub const ALL: [JweAlg; 3] = [JweAlg::Rsa1_5, JweAlg::RsaOaep, JweAlg::RsaOaep256];

    /// The registered `alg` header value.
    pub fn as_str(self) -> &'static str {
        match self {
            JweAlg::Rsa1_5 => "RSA1_5",
            JweAlg::RsaOaep => "RSA-OAEP",
            JweAlg::RsaOaep256 => "RSA-OAEP-256",
        }
    }

    /// Look up an algorithm by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RSA1_5" => Some(JweAlg::Rsa1_5),
            "RSA-OAEP" => Some(JweAlg::RsaOaep),
            "RSA-OAEP-256" => Some(JweAlg::RsaOaep256),
            _ => None,
        }
    }
}

impl JweEnc {
    /// All supported content encryption algorithms.
    pub const ALL: [JweEnc; 3] = [JweEnc::A128CbcHs256, JweEnc::A192CbcHs384, JweEnc::A256CbcHs512];

    /// The registered `enc` header value.
    pub fn as_str(self) -> &'static str {
        match self {
            JweEnc::A128CbcHs256 => "A128CBC-HS256",
            JweEnc::A192CbcHs384 => "A192CBC-HS384",
            JweEnc::A256CbcHs512 => "A256CBC-HS512",
        }
    }

    /// Look up an algorithm by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "A128CBC-HS256" => Some(JweEnc::A128CbcHs256),
            "A192CBC-HS384" => Some(JweEnc::A192CbcHs384),
            "A256CBC-HS512" => Some(JweEnc::A256CbcHs512),
            _ => None,
        }
    }

    /// Length of the content encryption key in bits.
    ///
    /// The first half keys the MAC, the second half keys the block cipher.
    pub fn key_bits(self) -> usize {
        match self {
            JweEnc::A128CbcHs256 => 256,
            JweEnc::A192CbcHs384 => 384,
            JweEnc::A256CbcHs512 => 512,
        }
    }

    /// Length of the content encryption key in bytes.
    pub fn key_len(self) -> usize {
        self.key_bits() / 8
    }
}

impl Default for JweEnc {
    fn default() -> Self {
        JweEnc::A128CbcHs256
    }
}

impl KeyUsage {
    /// The registered `use` value.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyUsage::Signature => "sig",
            KeyUsage::Encryption => "enc",
        }
    }

    /// Look up a usage by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sig" => Some(KeyUsage::Signature),
            "enc" => Some(KeyUsage::Encryption),
            _ => None,
        }
    }
}

impl KeyAlgorithm {
    /// The usage implied by the algorithm.
    pub fn usage(self) -> KeyUsage {
        match self {
            KeyAlgorithm::Sign(_) => KeyUsage::Signature,
            KeyAlgorithm::Encrypt(_) => KeyUsage::Encryption,
        }
    }

    /// The registered name of the underlying algorithm.
    pub fn as_str(self) -> &'static str {
        match self {
            KeyAlgorithm::Sign(alg) => alg.as_str(),
            KeyAlgorithm::Encrypt(alg) => alg.as_str(),
        }
    }
}

wire_names!(JwsAlg, JweAlg, JweEnc, KeyUsage);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_bijective() {
        for alg in JwsAlg::ALL.iter() {
            assert_eq!(JwsAlg::from_name(alg.as_str()), Some(*alg));
        }
        for alg in JweAlg::ALL.iter() {
            assert_eq!(JweAlg::from_name(alg.as_str()), Some(*alg));
        }
        for enc in JweEnc::ALL.iter() {
            assert_eq!(JweEnc::from_name(enc.as_str()), Some(*enc));
        }
    }

    #[test]
    fn unknown_names() {
        assert!("ES256".parse::<JwsAlg>().is_err());
        assert!("rs256".parse::<JwsAlg>().is_err());
        assert!("A128GCM".parse::<JweEnc>().is_err());
        assert!("dir".parse::<JweAlg>().is_err());
        assert_eq!(KeyUsage::from_name("verify"), None);
    }

    #[test]
    fn content_key_sizes() {
        assert_eq!(JweEnc::default(), JweEnc::A128CbcHs256);
        assert_eq!(JweEnc::A128CbcHs256.key_len(), 32);
        assert_eq!(JweEnc::A192CbcHs384.key_len(), 48);
        assert_eq!(JweEnc::A256CbcHs512.key_len(), 64);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&JweAlg::RsaOaep).unwrap();
        assert_eq!(json, "\"RSA-OAEP\"");
        let alg: JwsAlg = serde_json::from_str("\"RS384\"").unwrap();
        assert_eq!(alg, JwsAlg::RS384);
        assert_eq!(KeyAlgorithm::Encrypt(JweAlg::Rsa1_5).usage(), KeyUsage::Encryption);
    }
}
