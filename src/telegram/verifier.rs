// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! First-party (HMAC) and third-party (Ed25519) init-data verification.

use std::collections::HashMap;
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use ring::signature;
use sha2::Sha256;

use super::init_data::{data_check_string, parse_fields, unescape};
use super::{InitData, InitDataError};
use crate::config::TelegramConfig;

type HmacSha256 = Hmac<Sha256>;

/// Fixed HMAC key used to derive the first-party secret from the bot token,
/// per the Telegram Mini-App specification.
const SECRET_DERIVATION_KEY: &[u8] = b"WebAppData";

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Derive the first-party shared secret:
/// `HMAC-SHA256(key = "WebAppData", message = bot_token)`.
pub(crate) fn secret_key(bot_token: &str) -> [u8; 32] {
    hmac_sha256(SECRET_DERIVATION_KEY, bot_token.as_bytes())
}

// =============================================================================
// Verifier
// =============================================================================

/// Validates Telegram Mini-App init data.
///
/// Holds the derived first-party secret and the Ed25519 public keys; each
/// validation is a pure computation over the input plus this static material.
pub struct TelegramVerifier {
    secret: [u8; 32],
    prod_public_key: Vec<u8>,
    test_public_key: Vec<u8>,
}

impl TelegramVerifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            secret: secret_key(&config.bot_token),
            prod_public_key: config.prod_public_key.clone(),
            test_public_key: config.test_public_key.clone(),
        }
    }

    /// First-party validation via the `hash` field (HMAC-SHA256).
    ///
    /// A zero `expiry_window` disables the freshness check; `auth_date` must
    /// be present and parseable either way.
    pub fn validate(&self, raw: &str, expiry_window: Duration) -> Result<InitData, InitDataError> {
        self.validate_at(raw, expiry_window, Utc::now().timestamp())
    }

    fn validate_at(
        &self,
        raw: &str,
        expiry_window: Duration,
        now: i64,
    ) -> Result<InitData, InitDataError> {
        if raw.trim().is_empty() {
            return Err(InitDataError::Malformed("init data cannot be empty"));
        }

        let decoded = unescape(raw)?;
        let fields = parse_fields(&decoded)?;

        let hash = fields
            .get("hash")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(InitDataError::Malformed("init data does not contain hash"))?;
        let want = hex::decode(hash).map_err(|_| InitDataError::InvalidSignature)?;

        let dcs = data_check_string(&fields, &["hash"]);
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(dcs.as_bytes());
        mac.verify_slice(&want).map_err(|_| {
            tracing::warn!("init data hash mismatch");
            InitDataError::InvalidSignature
        })?;

        check_freshness(&fields, expiry_window, now)?;

        InitData::from_fields(fields)
    }

    /// Third-party validation via the `signature` field (Ed25519).
    ///
    /// The signed message is `"{bot_id}:WebAppData\n{data_check_string}"`,
    /// with both `hash` and `signature` excluded from the data-check string.
    pub fn validate_third_party(
        &self,
        raw: &str,
        bot_id: i64,
        expiry_window: Duration,
        use_test_key: bool,
    ) -> Result<InitData, InitDataError> {
        self.validate_third_party_at(raw, bot_id, expiry_window, use_test_key, Utc::now().timestamp())
    }

    fn validate_third_party_at(
        &self,
        raw: &str,
        bot_id: i64,
        expiry_window: Duration,
        use_test_key: bool,
        now: i64,
    ) -> Result<InitData, InitDataError> {
        if raw.trim().is_empty() {
            return Err(InitDataError::Malformed("init data cannot be empty"));
        }

        let decoded = unescape(raw)?;
        let fields = parse_fields(&decoded)?;

        let signature_b64 = fields
            .get("signature")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(InitDataError::Malformed(
                "init data does not contain signature",
            ))?;
        let signature_bytes = decode_signature(signature_b64)?;

        let dcs = data_check_string(&fields, &["hash", "signature"]);
        let message = format!("{bot_id}:WebAppData\n{dcs}");

        let public_key = if use_test_key {
            &self.test_public_key
        } else {
            &self.prod_public_key
        };
        if public_key.len() != 32 {
            tracing::warn!(len = public_key.len(), "ed25519 public key has invalid length");
            return Err(InitDataError::InvalidSignature);
        }

        signature::UnparsedPublicKey::new(&signature::ED25519, public_key)
            .verify(message.as_bytes(), &signature_bytes)
            .map_err(|_| {
                tracing::warn!("init data ed25519 signature mismatch");
                InitDataError::InvalidSignature
            })?;

        check_freshness(&fields, expiry_window, now)?;

        InitData::from_fields(fields)
    }
}

/// Require a parseable `auth_date` and, when a window is configured, check
/// it against `now`. A payload exactly `expiry_window` old is still fresh.
fn check_freshness(
    fields: &HashMap<String, String>,
    expiry_window: Duration,
    now: i64,
) -> Result<(), InitDataError> {
    let auth_date = fields
        .get("auth_date")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(InitDataError::Malformed(
            "init data does not contain auth_date",
        ))?;

    // The field is a decimal unix timestamp; tolerate a fractional part but
    // reject anything non-finite.
    let parsed: f64 = auth_date
        .parse()
        .map_err(|_| InitDataError::Malformed("invalid auth_date"))?;
    if !parsed.is_finite() {
        return Err(InitDataError::Malformed("invalid auth_date"));
    }
    let auth_ts = parsed as i64;

    let window = expiry_window.as_secs() as i64;
    if window > 0 && now - auth_ts > window {
        return Err(InitDataError::Expired);
    }
    Ok(())
}

/// Decode a base64url signature, tolerating both padded and unpadded input.
fn decode_signature(value: &str) -> Result<Vec<u8>, InitDataError> {
    Base64UrlUnpadded::decode_vec(value.trim_end_matches('='))
        .map_err(|_| InitDataError::Malformed("signature base64 decode failed"))
}
