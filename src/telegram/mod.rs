// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Telegram Mini-App Init-Data Validation
//!
//! A Mini App hands its launch payload ("init data") to the backend as a
//! URL-encoded query string carrying identity claims plus an authenticity
//! proof. Two proof schemes exist:
//!
//! - **First-party** (`hash` field): HMAC-SHA256 keyed by a secret derived
//!   from the bot token. Used when the backend owns the bot.
//! - **Third-party** (`signature` field): Ed25519 over a bot-scoped message,
//!   verified against Telegram's published public key. Used when validating
//!   init data issued for someone else's bot.
//!
//! Both schemes authenticate the canonical *data-check string*: the parsed
//! fields minus the proof field(s), sorted by key and joined as `key=value`
//! lines.

mod init_data;
mod verifier;

pub use init_data::{InitData, WebAppChat, WebAppUser};
pub use verifier::TelegramVerifier;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitDataError {
    /// Structurally invalid input; terminal for this credential source.
    #[error("init data malformed: {0}")]
    Malformed(&'static str),

    /// `auth_date` is older than the configured freshness window.
    #[error("init data expired")]
    Expired,

    /// The proof did not verify, or the verification key is misconfigured.
    #[error("init data signature invalid")]
    InvalidSignature,
}
