// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Signing secrets, token lifetimes, and Telegram verification material are
//! injected at construction; nothing in this crate reads a hard-coded key.
//! `AuthConfig::from_env` loads the full set from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ACCESS_TOKEN_SECRET_KEY` | HMAC secret for access tokens | Required |
//! | `REFRESH_TOKEN_SECRET_KEY` | HMAC secret for refresh tokens | Required |
//! | `ACCESS_TOKEN_EXPIRATION` | Access token TTL, whole seconds | `600` |
//! | `REFRESH_TOKEN_EXPIRATION` | Refresh token TTL, whole seconds | `216000` |
//! | `TELEGRAM_BOT_TOKEN` | Bot token for first-party init-data validation | Required |
//! | `TELEGRAM_INIT_DATA_EXPIRY` | Init-data freshness window, seconds (`0` disables) | `86400` |
//! | `TELEGRAM_PROD_PUBLIC_KEY` | Hex override for Telegram's production Ed25519 key | built-in |
//! | `TELEGRAM_TEST_PUBLIC_KEY` | Hex override for Telegram's test Ed25519 key | built-in |

use std::env;
use std::time::Duration;

/// Environment variable name for the access-token signing secret.
pub const ACCESS_TOKEN_SECRET_ENV: &str = "ACCESS_TOKEN_SECRET_KEY";

/// Environment variable name for the refresh-token signing secret.
pub const REFRESH_TOKEN_SECRET_ENV: &str = "REFRESH_TOKEN_SECRET_KEY";

/// Environment variable name for the access-token TTL (seconds).
pub const ACCESS_TOKEN_EXPIRATION_ENV: &str = "ACCESS_TOKEN_EXPIRATION";

/// Environment variable name for the refresh-token TTL (seconds).
pub const REFRESH_TOKEN_EXPIRATION_ENV: &str = "REFRESH_TOKEN_EXPIRATION";

/// Environment variable name for the Telegram bot token.
pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable name for the init-data freshness window (seconds).
pub const TELEGRAM_INIT_DATA_EXPIRY_ENV: &str = "TELEGRAM_INIT_DATA_EXPIRY";

/// Environment variable name for the production Ed25519 key override (hex).
pub const TELEGRAM_PROD_PUBLIC_KEY_ENV: &str = "TELEGRAM_PROD_PUBLIC_KEY";

/// Environment variable name for the test Ed25519 key override (hex).
pub const TELEGRAM_TEST_PUBLIC_KEY_ENV: &str = "TELEGRAM_TEST_PUBLIC_KEY";

/// Default access token lifetime (10 minutes).
const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(600);

/// Default refresh token lifetime (60 hours).
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(216_000);

/// Default init-data freshness window (24 hours).
const DEFAULT_INIT_DATA_EXPIRY: Duration = Duration::from_secs(86_400);

/// Telegram's published production Ed25519 public key
/// (`e7bf03a2fa4602af4580703d88dda5bb59f32ed8b02a56c187fe7d34caed242d`).
pub const TELEGRAM_PROD_PUBLIC_KEY: [u8; 32] = [
    0xe7, 0xbf, 0x03, 0xa2, 0xfa, 0x46, 0x02, 0xaf, 0x45, 0x80, 0x70, 0x3d, 0x88, 0xdd, 0xa5,
    0xbb, 0x59, 0xf3, 0x2e, 0xd8, 0xb0, 0x2a, 0x56, 0xc1, 0x87, 0xfe, 0x7d, 0x34, 0xca, 0xed,
    0x24, 0x2d,
];

/// Telegram's published test-environment Ed25519 public key
/// (`40055058a4ee38156a06562e52eece92a771bcd8346a8c4615cb7376eddf72ec`).
pub const TELEGRAM_TEST_PUBLIC_KEY: [u8; 32] = [
    0x40, 0x05, 0x50, 0x58, 0xa4, 0xee, 0x38, 0x15, 0x6a, 0x06, 0x56, 0x2e, 0x52, 0xee, 0xce,
    0x92, 0xa7, 0x71, 0xbc, 0xd8, 0x34, 0x6a, 0x8c, 0x46, 0x15, 0xcb, 0x73, 0x76, 0xed, 0xdf,
    0x72, 0xec,
];

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{0} is invalid")]
    Invalid(&'static str),
}

// =============================================================================
// Configuration Sections
// =============================================================================

/// Purpose-keyed signing secrets for the token codec.
///
/// The access and refresh secrets are configured independently and are never
/// interchangeable: a token minted under one must not validate under the
/// other.
#[derive(Clone)]
pub struct SigningConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

impl SigningConfig {
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
        }
    }
}

/// Token lifetimes used by the rotation policy.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    /// Access token lifetime (short, proves identity for one request window).
    pub access: Duration,
    /// Refresh token lifetime (long, replaced on every rotation).
    pub refresh: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: DEFAULT_ACCESS_TTL,
            refresh: DEFAULT_REFRESH_TTL,
        }
    }
}

/// Telegram init-data verification material.
///
/// The Ed25519 keys default to Telegram's published production and test keys
/// and are kept as raw bytes so a misconfigured override surfaces as a
/// signature failure rather than a panic.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token; the first-party shared secret is derived from it.
    pub bot_token: String,
    /// Ed25519 public key for third-party validation (production).
    pub prod_public_key: Vec<u8>,
    /// Ed25519 public key for third-party validation (test environment).
    pub test_public_key: Vec<u8>,
    /// Freshness window applied to `auth_date`; zero disables the check.
    pub init_data_expiry: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            prod_public_key: TELEGRAM_PROD_PUBLIC_KEY.to_vec(),
            test_public_key: TELEGRAM_TEST_PUBLIC_KEY.to_vec(),
            init_data_expiry: DEFAULT_INIT_DATA_EXPIRY,
        }
    }
}

/// Full configuration for the credential resolver.
#[derive(Clone)]
pub struct AuthConfig {
    pub signing: SigningConfig,
    pub ttls: TokenTtls,
    pub telegram: TelegramConfig,
}

impl AuthConfig {
    /// Load the configuration from the environment.
    ///
    /// Secrets and the bot token are required; lifetimes fall back to the
    /// defaults documented in the module table.
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_secret = require(ACCESS_TOKEN_SECRET_ENV)?;
        let refresh_secret = require(REFRESH_TOKEN_SECRET_ENV)?;
        let bot_token = require(TELEGRAM_BOT_TOKEN_ENV)?;

        let ttls = TokenTtls {
            access: seconds_or(ACCESS_TOKEN_EXPIRATION_ENV, DEFAULT_ACCESS_TTL, false)?,
            refresh: seconds_or(REFRESH_TOKEN_EXPIRATION_ENV, DEFAULT_REFRESH_TTL, false)?,
        };

        let mut telegram = TelegramConfig::new(bot_token);
        telegram.init_data_expiry =
            seconds_or(TELEGRAM_INIT_DATA_EXPIRY_ENV, DEFAULT_INIT_DATA_EXPIRY, true)?;
        if let Some(key) = hex_key(TELEGRAM_PROD_PUBLIC_KEY_ENV)? {
            telegram.prod_public_key = key;
        }
        if let Some(key) = hex_key(TELEGRAM_TEST_PUBLIC_KEY_ENV)? {
            telegram.test_public_key = key;
        }

        Ok(Self {
            signing: SigningConfig::new(access_secret, refresh_secret),
            ttls,
            telegram,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn seconds_or(
    name: &'static str,
    default: Duration,
    allow_zero: bool,
) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(value) => {
            let seconds: u64 = value.parse().map_err(|_| ConfigError::Invalid(name))?;
            if seconds == 0 && !allow_zero {
                return Err(ConfigError::Invalid(name));
            }
            Ok(Duration::from_secs(seconds))
        }
        Err(_) => Ok(default),
    }
}

fn hex_key(name: &'static str) -> Result<Option<Vec<u8>>, ConfigError> {
    match env::var(name) {
        Ok(value) => hex::decode(value.trim())
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}
