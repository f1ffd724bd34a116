//! Server wide settings of the engine.
//!
//! ```
//! # use oxide_openid::settings::Settings;
//! let settings: Settings = serde_json::from_str(r#"{
//!     "issuer_name": "https://auth.example",
//!     "authorization_code_validity": "5m"
//! }"#).unwrap();
//! assert_eq!(settings.token_validity.as_secs(), 3600);
//! assert!(settings.validate().is_ok());
//! ```
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::code_grant::mapping::ClaimsMapping;
use crate::jose::{JweEnc, JwsAlg};

/// Configuration shared by all flows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The issuer identifier, placed in `iss` and expected in the audience of client assertions.
    pub issuer_name: String,

    /// How long an authorization code can be redeemed.
    #[serde(with = "humantime_serde")]
    pub authorization_code_validity: Duration,

    /// Lifetime of access tokens.
    #[serde(with = "humantime_serde")]
    pub token_validity: Duration,

    /// Lifetime of id tokens.
    #[serde(with = "humantime_serde")]
    pub id_token_validity: Duration,

    /// Random bytes in an authorization code.
    pub code_length: usize,

    /// Random bytes in access and refresh tokens.
    pub token_length: usize,

    /// Signature of id tokens for clients without a registered preference.
    pub default_id_token_signing_alg: JwsAlg,

    /// Content encryption of id tokens when a client names only the key management algorithm.
    pub default_content_encryption: JweEnc,

    /// Translation of resource owner claims into id token claims.
    pub claims_mapping: ClaimsMapping,
}

/// A setting is out of its allowed range.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The value can not be used.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            issuer_name: "https://localhost".to_string(),
            authorization_code_validity: Duration::from_secs(600), // 10 minutes
            token_validity: Duration::from_secs(3600),             // 1 hour
            id_token_validity: Duration::from_secs(3600),          // 1 hour
            code_length: 32,
            token_length: 32,
            default_id_token_signing_alg: JwsAlg::RS256,
            default_content_encryption: JweEnc::default(),
            claims_mapping: ClaimsMapping::default(),
        }
    }
}

impl Settings {
    /// Check the settings before the engine is started.
    ///
    /// An unsigned default id token is refused, `none` must be registered per client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.issuer_name).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "issuer name {:?} is not an absolute url",
                self.issuer_name
            )));
        }

        if self.code_length < 16 || self.token_length < 16 {
            return Err(ConfigError::InvalidValue(
                "codes and tokens need at least 16 random bytes".into(),
            ));
        }

        let validities = [
            self.authorization_code_validity,
            self.token_validity,
            self.id_token_validity,
        ];
        if validities.iter().any(Duration::is_zero) {
            return Err(ConfigError::InvalidValue("validities must not be zero".into()));
        }

        if self.default_id_token_signing_alg == JwsAlg::None {
            return Err(ConfigError::InvalidValue(
                "the default id token signing algorithm must not be none".into(),
            ));
        }

        Ok(())
    }
}
