// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! The boundary layer owns all transport concerns the core stays out of:
//! pulling credential material from request headers, and delivering rotated
//! credentials back to the client as a `Set-Cookie` plus a response
//! `Authorization` header.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let state = AuthLayerState::new(CredentialResolver::new(&config, lookup));
//!
//! let app = Router::new()
//!     .route("/events", get(list_events))
//!     .layer(axum::middleware::from_fn_with_state(state, require_auth));
//! ```
//!
//! Handlers behind the layer take the [`CurrentUser`] extractor to receive
//! the verified identity.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::lookup::UserLookup;
use crate::resolver::{CredentialResolver, Credentials};
use crate::rotation::REFRESH_COOKIE_NAME;
use crate::token::Identity;

/// Header carrying Telegram Mini-App init data.
pub const TELEGRAM_INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Shared state for [`require_auth`].
pub struct AuthLayerState<U> {
    pub resolver: Arc<CredentialResolver<U>>,
}

impl<U> AuthLayerState<U> {
    pub fn new(resolver: CredentialResolver<U>) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

impl<U> Clone for AuthLayerState<U> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
        }
    }
}

/// Authentication middleware function.
///
/// Verifies whatever credentials the request carries, stores the identity in
/// request extensions, and emits rotated credentials on the response when the
/// resolver minted a fresh pair.
pub async fn require_auth<U>(
    State(state): State<AuthLayerState<U>>,
    mut request: Request,
    next: Next,
) -> Response
where
    U: UserLookup + Send + Sync + 'static,
{
    let credentials = extract_credentials(request.headers());

    match state.resolver.verify(&credentials).await {
        Ok(verified) => {
            request.extensions_mut().insert(verified.identity);
            let mut response = next.run(request).await;

            if let Some(pair) = verified.rotated {
                if let Ok(value) = HeaderValue::from_str(&pair.refresh_cookie()) {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                if let Ok(value) = HeaderValue::from_str(&pair.bearer_header()) {
                    response.headers_mut().insert(AUTHORIZATION, value);
                }
            }
            response
        }
        Err(err) => AuthError::from(err).into_response(),
    }
}

/// Pull the three credential transport fields out of the request headers.
pub fn extract_credentials(headers: &HeaderMap) -> Credentials {
    Credentials {
        access_token: bearer_token(headers),
        refresh_token: refresh_cookie(headers),
        telegram_init_data: headers
            .get(TELEGRAM_INIT_DATA_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
    }
}

/// Bearer token from the `Authorization` header; the scheme match is
/// case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Refresh token from the `refresh_token` cookie, wherever it appears across
/// the request's `Cookie` headers.
fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else { continue };
        for cookie in value.split(';') {
            if let Some((name, token)) = cookie.split_once('=') {
                if name.trim() == REFRESH_COOKIE_NAME && !token.trim().is_empty() {
                    return Some(token.trim().to_string());
                }
            }
        }
    }
    None
}

/// Extractor for the identity established by [`require_auth`].
///
/// ```rust,ignore
/// async fn list_events(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
///     // identity.subject_id, identity.role
/// }
/// ```
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_case_insensitive_on_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("BEARER abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn non_bearer_scheme_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn refresh_cookie_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; refresh_token=tok123; lang=en"),
        );
        assert_eq!(refresh_cookie(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn refresh_cookie_spans_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("refresh_token=tok456"));
        assert_eq!(refresh_cookie(&headers).as_deref(), Some("tok456"));
    }

    #[test]
    fn missing_cookie_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(refresh_cookie(&headers), None);
    }

    #[test]
    fn extract_credentials_collects_all_three_sources() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer acc"));
        headers.insert(COOKIE, HeaderValue::from_static("refresh_token=ref"));
        headers.insert(
            TELEGRAM_INIT_DATA_HEADER,
            HeaderValue::from_static("auth_date=1&hash=ff"),
        );

        let credentials = extract_credentials(&headers);
        assert_eq!(credentials.access_token.as_deref(), Some("acc"));
        assert_eq!(credentials.refresh_token.as_deref(), Some("ref"));
        assert_eq!(
            credentials.telegram_init_data.as_deref(),
            Some("auth_date=1&hash=ff")
        );
        assert!(!credentials.is_empty());
    }

    #[test]
    fn empty_headers_yield_empty_credentials() {
        let credentials = extract_credentials(&HeaderMap::new());
        assert!(credentials.is_empty());
    }

    #[tokio::test]
    async fn current_user_rejects_when_extension_missing() {
        let mut parts = axum::http::Request::builder()
            .uri("/events")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn current_user_reads_identity_from_extensions() {
        let mut parts = axum::http::Request::builder()
            .uri("/events")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        parts.extensions.insert(Identity::new(42, "user"));

        let CurrentUser(identity) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(identity.subject_id, 42);
        assert_eq!(identity.role, "user");
    }
}
