// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User lookup collaborator.
//!
//! The Telegram path is the only place the resolver leaves pure computation:
//! a validated init-data payload carries an external Telegram user id, and
//! the platform's user service maps it to an internal identity. The call is
//! a single suspendable external call; cancellation and transport failures
//! surface as `Unavailable`, which the resolver reports as an infrastructure
//! failure rather than a credential rejection.

use std::future::Future;

use crate::token::Identity;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The Telegram user has no matching platform account.
    #[error("user not found")]
    NotFound,

    /// The lookup service could not be reached (timeout, cancellation,
    /// transport failure).
    #[error("user lookup unavailable: {0}")]
    Unavailable(String),
}

/// Resolves an external Telegram user id to a platform identity.
pub trait UserLookup {
    fn by_external_id(
        &self,
        telegram_id: i64,
    ) -> impl Future<Output = Result<Identity, LookupError>> + Send;
}
