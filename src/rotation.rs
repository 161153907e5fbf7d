// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token rotation policy.
//!
//! Rotation always mints a complete new pair for one identity: a short-lived
//! access token plus a long-lived refresh token. The presented refresh token
//! is invalidated by replacement, never reused or extended. The resulting
//! pair is returned as two transport side-effect instructions; this module
//! performs no I/O.

use std::sync::Arc;

use crate::config::TokenTtls;
use crate::token::{Identity, TokenCodec, TokenError, TokenPurpose};

/// Cookie used to carry the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Freshly minted access/refresh pair.
///
/// Both members carry the same identity. Ephemeral output data: handed to
/// the boundary layer for delivery and never read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    /// `Set-Cookie` value delivering the refresh token: HTTP-only, secure,
    /// and cross-site-capable so the Mini-App frontend can present it.
    pub fn refresh_cookie(&self) -> String {
        format!(
            "{REFRESH_COOKIE_NAME}={}; Path=/; HttpOnly; Secure; SameSite=None",
            self.refresh
        )
    }

    /// `Authorization` response-header value delivering the access token.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access)
    }
}

/// Issues replacement token pairs.
pub struct RotationPolicy {
    codec: Arc<TokenCodec>,
    ttls: TokenTtls,
}

impl RotationPolicy {
    pub fn new(codec: Arc<TokenCodec>, ttls: TokenTtls) -> Self {
        Self { codec, ttls }
    }

    /// Mint a fresh access+refresh pair for `identity`.
    pub fn rotate(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let access = self
            .codec
            .issue(identity, TokenPurpose::Access, self.ttls.access)?;
        let refresh = self
            .codec
            .issue(identity, TokenPurpose::Refresh, self.ttls.refresh)?;
        Ok(TokenPair { access, refresh })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::SigningConfig;

    fn policy() -> (Arc<TokenCodec>, RotationPolicy) {
        let codec = Arc::new(TokenCodec::new(SigningConfig::new(
            b"rotation-access-secret".to_vec(),
            b"rotation-refresh-secret".to_vec(),
        )));
        let policy = RotationPolicy::new(Arc::clone(&codec), TokenTtls::default());
        (codec, policy)
    }

    #[test]
    fn rotate_issues_pair_sharing_the_identity() {
        let (codec, policy) = policy();
        let identity = Identity::new(7, "user");

        let pair = policy.rotate(&identity).unwrap();

        assert_eq!(
            codec.verify(&pair.access, TokenPurpose::Access).unwrap(),
            identity
        );
        assert_eq!(
            codec.verify(&pair.refresh, TokenPurpose::Refresh).unwrap(),
            identity
        );
    }

    #[test]
    fn pair_members_are_purpose_bound() {
        let (codec, policy) = policy();
        let pair = policy.rotate(&Identity::new(7, "user")).unwrap();

        assert!(codec.verify(&pair.access, TokenPurpose::Refresh).is_err());
        assert!(codec.verify(&pair.refresh, TokenPurpose::Access).is_err());
    }

    #[test]
    fn refresh_cookie_carries_required_attributes() {
        let pair = TokenPair {
            access: "aaa".to_string(),
            refresh: "rrr".to_string(),
        };
        assert_eq!(
            pair.refresh_cookie(),
            "refresh_token=rrr; Path=/; HttpOnly; Secure; SameSite=None"
        );
        assert_eq!(pair.bearer_header(), "Bearer aaa");
    }
}
