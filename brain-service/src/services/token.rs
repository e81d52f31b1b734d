//! Signed tokens carrying enveloped claims.
//!
//! The token body is the claims envelope itself; expiry lives inside the
//! claims, so the JWT registered claims (`exp`, `iat`) are not used.

use crate::config::TokenConfig;
use crate::envelope::{Envelope, EnvelopeError};
use crate::models::Claims;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::fs;
use thiserror::Error;

const ALGORITHM: Algorithm = Algorithm::PS512;

/// Internal cause of a rejected token. Callers only ever see a generic
/// rejection; the cause is for logs.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("bad signature")]
    Signature,

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<EnvelopeError> for TokenError {
    fn from(err: EnvelopeError) -> Self {
        TokenError::Decode(err.to_string())
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service by loading RSA keys from files
    pub fn new(config: &TokenConfig) -> Result<Self, anyhow::Error> {
        let public_key_pem = fs::read_to_string(&config.public_key_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read public key from {}: {}",
                config.public_key_path,
                e
            )
        })?;

        let private_key_pem = match &config.private_key_path {
            Some(path) => Some(fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Failed to read private key from {}: {}", path, e)
            })?),
            None => None,
        };

        let service = Self::from_pem(private_key_pem.as_deref(), &public_key_pem)?;
        tracing::info!(
            can_issue = service.encoding_key.is_some(),
            "Token service initialized with PS512 keys"
        );
        Ok(service)
    }

    /// Build from PEM text. Without a private key the service can only
    /// validate tokens issued elsewhere.
    pub fn from_pem(
        private_key_pem: Option<&str>,
        public_key_pem: &str,
    ) -> Result<Self, anyhow::Error> {
        let encoding_key = private_key_pem
            .map(|pem| {
                EncodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| anyhow::anyhow!("Failed to parse private key: {}", e))
            })
            .transpose()?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to parse public key: {}", e))?;

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
        })
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        let key = self
            .encoding_key
            .as_ref()
            .ok_or_else(|| TokenError::Signing("no private key loaded".to_string()))?;
        let envelope = Envelope::wrap(claims).map_err(|e| TokenError::Signing(e.to_string()))?;

        encode(&Header::new(ALGORITHM), &envelope, key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Signature first, then envelope decode, then expiry.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Envelope>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::Signature,
                other => TokenError::Decode(format!("{:?}", other)),
            },
        )?;

        let claims: Claims = data.claims.unwrap_as()?;
        if claims.is_expired() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
