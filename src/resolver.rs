// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential resolver.
//!
//! One verification entry point for the three credential shapes the platform
//! accepts, tried in a fixed priority order so behavior is deterministic:
//!
//! 1. Bearer access token. A non-expired success authenticates with no
//!    rotation.
//! 2. Refresh token from the `refresh_token` cookie. Success mints a
//!    replacement pair and authenticates with rotated credentials attached.
//! 3. Telegram init data (first-party scheme). The embedded Telegram user is
//!    resolved through [`UserLookup`], then a fresh pair is minted.
//!
//! Anything else is a single generic unauthenticated outcome; the concrete
//! rejection reason is kept for logs only. Each verification is a pure,
//! stateless computation apart from the lookup call, so the resolver can be
//! shared across request tasks freely.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AuthConfig;
use crate::lookup::{LookupError, UserLookup};
use crate::rotation::{RotationPolicy, TokenPair};
use crate::telegram::{InitDataError, TelegramVerifier};
use crate::token::{Identity, TokenCodec, TokenError, TokenPurpose};

/// Credential material extracted from one inbound request.
///
/// Any subset may be present; the resolver applies its fixed ordering to
/// whatever is there.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub telegram_init_data: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.telegram_init_data.is_none()
    }
}

/// Successful verification outcome.
#[derive(Debug, Clone)]
pub struct Verified {
    pub identity: Identity,
    /// Present when the request was authenticated through the refresh or
    /// Telegram path; the boundary layer must emit these credentials.
    pub rotated: Option<TokenPair>,
}

/// Why a request was rejected. Log-only detail: the boundary response never
/// carries more than a generic unauthenticated status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingCredentials,
    ExpiredAccessToken,
    InvalidAccessToken,
    ExpiredRefreshToken,
    InvalidRefreshToken,
    MalformedInitData,
    ExpiredInitData,
    InvalidInitDataSignature,
    MissingTelegramUser,
    UnknownTelegramUser,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RejectReason::MissingCredentials => "missing credentials",
            RejectReason::ExpiredAccessToken => "access token expired",
            RejectReason::InvalidAccessToken => "invalid access token",
            RejectReason::ExpiredRefreshToken => "refresh token expired",
            RejectReason::InvalidRefreshToken => "invalid refresh token",
            RejectReason::MalformedInitData => "malformed init data",
            RejectReason::ExpiredInitData => "init data expired",
            RejectReason::InvalidInitDataSignature => "invalid init data signature",
            RejectReason::MissingTelegramUser => "init data carries no user",
            RejectReason::UnknownTelegramUser => "unknown telegram user",
        };
        f.write_str(text)
    }
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// All presented credential sources were rejected (or none were
    /// presented). Maps to a generic 401 at the boundary.
    #[error("unauthenticated: {0}")]
    Unauthenticated(RejectReason),

    /// Token signing or the lookup collaborator failed; not a statement
    /// about the presented credentials.
    #[error("internal auth failure: {0}")]
    Internal(String),
}

// =============================================================================
// Resolver
// =============================================================================

/// Orders and tries credential sources, triggers rotation, and decides the
/// terminal identity or failure.
pub struct CredentialResolver<U> {
    codec: Arc<TokenCodec>,
    rotation: RotationPolicy,
    telegram: TelegramVerifier,
    init_data_expiry: Duration,
    lookup: U,
}

impl<U: UserLookup> CredentialResolver<U> {
    pub fn new(config: &AuthConfig, lookup: U) -> Self {
        let codec = Arc::new(TokenCodec::new(config.signing.clone()));
        Self {
            rotation: RotationPolicy::new(Arc::clone(&codec), config.ttls),
            telegram: TelegramVerifier::new(&config.telegram),
            init_data_expiry: config.telegram.init_data_expiry,
            codec,
            lookup,
        }
    }

    /// Verify one request's credentials.
    ///
    /// A forged (non-expired-invalid) access token never yields an identity
    /// and is logged as a security event, but does not short-circuit the
    /// remaining sources: a client can legitimately present a stale header
    /// alongside a fresh refresh cookie.
    pub async fn verify(&self, credentials: &Credentials) -> Result<Verified, VerifyError> {
        let mut reason = RejectReason::MissingCredentials;

        if let Some(access) = credentials.access_token.as_deref() {
            match self.codec.verify(access, TokenPurpose::Access) {
                Ok(identity) => {
                    return Ok(Verified {
                        identity,
                        rotated: None,
                    });
                }
                Err(TokenError::Expired) => {
                    tracing::debug!("access token expired, falling back to refresh token");
                    reason = RejectReason::ExpiredAccessToken;
                }
                Err(_) => {
                    tracing::warn!("rejected access token with invalid signature");
                    reason = RejectReason::InvalidAccessToken;
                }
            }
        }

        if let Some(refresh) = credentials.refresh_token.as_deref() {
            match self.codec.verify(refresh, TokenPurpose::Refresh) {
                Ok(identity) => {
                    let rotated = self.rotate(&identity)?;
                    return Ok(Verified {
                        identity,
                        rotated: Some(rotated),
                    });
                }
                Err(TokenError::Expired) => {
                    tracing::debug!("refresh token expired");
                    reason = RejectReason::ExpiredRefreshToken;
                }
                Err(_) => {
                    tracing::warn!("rejected refresh token with invalid signature");
                    reason = RejectReason::InvalidRefreshToken;
                }
            }
        }

        if let Some(init_data) = credentials.telegram_init_data.as_deref() {
            return self.verify_telegram(init_data).await;
        }

        Err(VerifyError::Unauthenticated(reason))
    }

    async fn verify_telegram(&self, init_data: &str) -> Result<Verified, VerifyError> {
        let payload = self
            .telegram
            .validate(init_data, self.init_data_expiry)
            .map_err(|err| {
                let reason = match err {
                    InitDataError::Malformed(detail) => {
                        tracing::debug!(detail, "malformed init data");
                        RejectReason::MalformedInitData
                    }
                    InitDataError::Expired => RejectReason::ExpiredInitData,
                    InitDataError::InvalidSignature => RejectReason::InvalidInitDataSignature,
                };
                VerifyError::Unauthenticated(reason)
            })?;

        let Some(user) = payload.user else {
            return Err(VerifyError::Unauthenticated(
                RejectReason::MissingTelegramUser,
            ));
        };

        let identity = match self.lookup.by_external_id(user.id).await {
            Ok(identity) => identity,
            Err(LookupError::NotFound) => {
                tracing::debug!(telegram_id = user.id, "telegram user has no account");
                return Err(VerifyError::Unauthenticated(
                    RejectReason::UnknownTelegramUser,
                ));
            }
            Err(LookupError::Unavailable(message)) => {
                return Err(VerifyError::Internal(message));
            }
        };

        let rotated = self.rotate(&identity)?;
        Ok(Verified {
            identity,
            rotated: Some(rotated),
        })
    }

    fn rotate(&self, identity: &Identity) -> Result<TokenPair, VerifyError> {
        self.rotation
            .rotate(identity)
            .map_err(|err| VerifyError::Internal(err.to_string()))
    }
}
