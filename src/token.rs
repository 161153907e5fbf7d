// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Purpose-keyed signed token codec.
//!
//! Access and refresh tokens are compact HS256 JWTs carrying
//! `{sub, role, iat, exp}`. Each purpose signs under its own secret, so a
//! token minted for one purpose can never validate as the other. The
//! verifier pins HS256: a token presenting any other algorithm is rejected
//! outright.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::config::SigningConfig;

/// Which secret a token is signed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Short-lived credential proving identity for a single request window.
    Access,
    /// Long-lived credential used solely to mint a fresh pair.
    Refresh,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::Refresh => "refresh",
        }
    }
}

/// Identity established by a successful verification.
///
/// Immutable once resolved; the role is an opaque string supplied by the
/// identity source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: i64,
    pub role: String,
}

impl Identity {
    pub fn new(subject_id: i64, role: impl Into<String>) -> Self {
        Self {
            subject_id,
            role: role.into(),
        }
    }
}

/// Wire claim set. `sub` is a decimal string per JWT convention; timestamps
/// are whole unix seconds.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Structure and signature are valid but the token is past its TTL.
    /// Distinguished from `Invalid` because an expired access token is still
    /// eligible for the refresh fallback.
    #[error("token expired")]
    Expired,

    /// Malformed encoding, signature mismatch, algorithm substitution, or
    /// corrupt timestamps.
    #[error("token invalid")]
    Invalid,

    /// The signing secret or encoder failed while issuing a token.
    #[error("token signing failed")]
    SigningFailed,
}

// =============================================================================
// Codec
// =============================================================================

/// Issues and verifies purpose-keyed signed tokens.
pub struct TokenCodec {
    signing: SigningConfig,
}

impl TokenCodec {
    pub fn new(signing: SigningConfig) -> Self {
        Self { signing }
    }

    fn secret(&self, purpose: TokenPurpose) -> &[u8] {
        match purpose {
            TokenPurpose::Access => &self.signing.access_secret,
            TokenPurpose::Refresh => &self.signing.refresh_secret,
        }
    }

    /// Issue a token for `identity` valid for `ttl` from now.
    pub fn issue(
        &self,
        identity: &Identity,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.subject_id.to_string(),
            role: identity.role.clone(),
            iat,
            exp: iat + ttl.as_secs() as i64,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret(purpose)),
        )
        .map_err(|err| {
            tracing::error!(error = %err, purpose = purpose.as_str(), "token signing failed");
            TokenError::SigningFailed
        })
    }

    /// Verify a token against the secret for `purpose` and return the
    /// embedded identity.
    ///
    /// Expiry is checked here with zero leeway rather than delegated to the
    /// decoder so that corrupt timestamps (negative `iat`, `exp <= iat`)
    /// report `Invalid` instead of `Expired`.
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(purpose)),
            &validation,
        )
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        let claims = data.claims;
        if claims.iat < 0 || claims.exp <= claims.iat {
            return Err(TokenError::Invalid);
        }
        if Utc::now().timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        let subject_id = claims.sub.parse::<i64>().map_err(|_| TokenError::Invalid)?;
        Ok(Identity {
            subject_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(SigningConfig::new(
            b"access-secret-for-tests".to_vec(),
            b"refresh-secret-for-tests".to_vec(),
        ))
    }

    fn encode_claims(claims: &Claims, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn issue_then_verify_round_trips_identity() {
        let codec = codec();
        let identity = Identity::new(42, "user");

        let token = codec
            .issue(&identity, TokenPurpose::Access, Duration::from_secs(600))
            .unwrap();
        let verified = codec.verify(&token, TokenPurpose::Access).unwrap();

        assert_eq!(verified, identity);
    }

    #[test]
    fn purposes_are_not_interchangeable() {
        let codec = codec();
        let identity = Identity::new(42, "user");

        let access = codec
            .issue(&identity, TokenPurpose::Access, Duration::from_secs(600))
            .unwrap();
        let refresh = codec
            .issue(&identity, TokenPurpose::Refresh, Duration::from_secs(600))
            .unwrap();

        assert_eq!(
            codec.verify(&access, TokenPurpose::Refresh),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            codec.verify(&refresh, TokenPurpose::Access),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn expired_token_is_distinguished_from_invalid() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let token = encode_claims(
            &Claims {
                sub: "42".to_string(),
                role: "user".to_string(),
                iat: now - 120,
                exp: now - 60,
            },
            b"access-secret-for-tests",
        );

        assert_eq!(
            codec.verify(&token, TokenPurpose::Access),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let codec = codec();
        let identity = Identity::new(42, "user");
        let token = codec
            .issue(&identity, TokenPurpose::Access, Duration::from_secs(600))
            .unwrap();

        // Flip the last character of the signature segment.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(
            codec.verify(&tampered, TokenPurpose::Access),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn algorithm_substitution_is_rejected() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "42".to_string(),
            role: "user".to_string(),
            iat: now,
            exp: now + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"access-secret-for-tests"),
        )
        .unwrap();

        assert_eq!(
            codec.verify(&token, TokenPurpose::Access),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn corrupt_timestamps_are_invalid_not_expired() {
        let codec = codec();
        let now = Utc::now().timestamp();

        // Negative issue time.
        let negative_iat = encode_claims(
            &Claims {
                sub: "42".to_string(),
                role: "user".to_string(),
                iat: -1,
                exp: now + 600,
            },
            b"access-secret-for-tests",
        );
        assert_eq!(
            codec.verify(&negative_iat, TokenPurpose::Access),
            Err(TokenError::Invalid)
        );

        // Expiry not after issue time, even though both are in the future.
        let inverted = encode_claims(
            &Claims {
                sub: "42".to_string(),
                role: "user".to_string(),
                iat: now + 600,
                exp: now + 600,
            },
            b"access-secret-for-tests",
        );
        assert_eq!(
            codec.verify(&inverted, TokenPurpose::Access),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn non_numeric_subject_is_invalid() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let token = encode_claims(
            &Claims {
                sub: "not-a-number".to_string(),
                role: "user".to_string(),
                iat: now,
                exp: now + 600,
            },
            b"access-secret-for-tests",
        );

        assert_eq!(
            codec.verify(&token, TokenPurpose::Access),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn garbage_input_is_invalid() {
        let codec = codec();
        assert_eq!(
            codec.verify("not.a.token", TokenPurpose::Access),
            Err(TokenError::Invalid)
        );
        assert_eq!(codec.verify("", TokenPurpose::Access), Err(TokenError::Invalid));
    }
}
