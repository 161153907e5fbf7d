// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relloc Auth - Credential Verification & Token Rotation
//!
//! This crate implements the unified authentication protocol used by every
//! service on the Relloc events platform. A request may prove its identity
//! with a bearer access token, a refresh-token cookie, or Telegram Mini-App
//! init data; the resolver tries them in that fixed order and, where the
//! protocol calls for it, atomically rotates a fresh access/refresh pair for
//! the caller to emit.
//!
//! ## Modules
//!
//! - `config` - Injected secrets, lifetimes, and Telegram key material
//! - `token` - Purpose-keyed signed token codec (HS256)
//! - `telegram` - Mini-App init-data validation (HMAC and Ed25519 schemes)
//! - `resolver` - Credential resolution state machine
//! - `rotation` - Access/refresh pair rotation policy
//! - `lookup` - User lookup collaborator interface
//! - `middleware` - Axum boundary layer (extraction + side-effect delivery)
//! - `error` - Boundary-facing error mapping

pub mod config;
pub mod error;
pub mod lookup;
pub mod middleware;
pub mod resolver;
pub mod rotation;
pub mod telegram;
pub mod token;

pub use config::{AuthConfig, SigningConfig, TelegramConfig, TokenTtls};
pub use error::AuthError;
pub use lookup::{LookupError, UserLookup};
pub use middleware::{require_auth, AuthLayerState, CurrentUser};
pub use resolver::{CredentialResolver, Credentials, RejectReason, Verified, VerifyError};
pub use rotation::{RotationPolicy, TokenPair};
pub use telegram::{InitData, InitDataError, TelegramVerifier, WebAppChat, WebAppUser};
pub use token::{Identity, TokenCodec, TokenError, TokenPurpose};
