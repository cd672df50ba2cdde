//! Authentication gate for incoming requests.
//!
//! Every request whose path is not matched by the skip pattern must carry a
//! session token (cookie or bearer). Token validation is delegated to an
//! external verification service; an unauthenticated request is not an error,
//! it is redirected to the login page on the same scheme and host.

use crate::atingi;
use anyhow::Result;
use axum::{
    extract::{Extension, Request},
    http::{
        header::{AUTHORIZATION, COOKIE, HOST},
        HeaderMap, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use ulid::Ulid;
use url::Url;

pub const SESSION_COOKIE_NAME: &str = "atingi_session";

pub const LOGIN_PATH: &str = "/login";

/// Paths exempt from the guard: the API namespace, build-time static assets,
/// image-optimization assets, the favicon, login, signup, and the bare root.
pub const DEFAULT_SKIP_PATTERN: &str =
    r"^(/|/api(/.*)?|/_next/static/.*|/_next/image.*|/favicon\.ico|/login|/signup)$";

/// Where session tokens get verified.
#[derive(Debug, Clone)]
enum TokenBackend {
    /// POST the token to `<url>/verify`; 202 means valid.
    Remote { url: Url, client: Client },
    /// Fixed verdict, for tests and local development.
    Static(bool),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    skip: Regex,
    backend: TokenBackend,
}

impl RouteGuard {
    /// Guard with a remote token verification service.
    pub fn new(skip_pattern: &str, token_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(atingi::APP_USER_AGENT)
            .build()?;

        Ok(Self {
            skip: Regex::new(skip_pattern)?,
            backend: TokenBackend::Remote {
                url: Url::parse(token_url)?,
                client,
            },
        })
    }

    /// Guard that always returns `verdict` instead of calling out.
    pub fn with_static_verdict(skip_pattern: &str, verdict: bool) -> Result<Self> {
        Ok(Self {
            skip: Regex::new(skip_pattern)?,
            backend: TokenBackend::Static(verdict),
        })
    }

    /// Whether `path` is exempt from authentication.
    #[must_use]
    pub fn skips(&self, path: &str) -> bool {
        self.skip.is_match(path)
    }

    /// Check a session token against the backend. Verification errors are
    /// indistinguishable from an invalid token on purpose; the guard has a
    /// single unauthenticated outcome.
    #[instrument(skip(self, token))]
    pub async fn verify(&self, token: &str) -> bool {
        match &self.backend {
            TokenBackend::Static(verdict) => *verdict,
            TokenBackend::Remote { url, client } => {
                // Session tokens are ulids; reject malformed ones locally.
                if Ulid::from_string(token).is_err() {
                    return false;
                }

                let Ok(endpoint) = url.join("verify") else {
                    error!("Invalid token verification URL: {url}");
                    return false;
                };

                match client
                    .post(endpoint)
                    .json(&json!({ "token": token }))
                    .send()
                    .await
                {
                    Ok(response) if response.status() == StatusCode::ACCEPTED => true,
                    Ok(response) => {
                        debug!("Token rejected: {}", response.status());
                        false
                    }
                    Err(err) => {
                        error!("Error verifying token: {err}");
                        false
                    }
                }
            }
        }
    }
}

/// Middleware: pass skip-listed paths through, pass authenticated requests
/// through unmodified, redirect everything else to the login page.
pub async fn authorize(
    Extension(guard): Extension<Arc<RouteGuard>>,
    request: Request,
    next: Next,
) -> Response {
    if guard.skips(request.uri().path()) {
        return next.run(request).await;
    }

    if let Some(token) = session_token(request.headers()) {
        if guard.verify(&token).await {
            return next.run(request).await;
        }
    }

    let target = login_target(request.uri(), request.headers());
    Redirect::temporary(&target).into_response()
}

/// Login URL on the same scheme and host as the request, query stripped.
/// Falls back to a relative redirect when the request carries no authority
/// and no Host header.
fn login_target(uri: &Uri, headers: &HeaderMap) -> String {
    let authority = uri
        .authority()
        .map(ToString::to_string)
        .or_else(|| {
            headers
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string)
        });

    match authority {
        Some(authority) => {
            let scheme = uri.scheme_str().unwrap_or("http");
            format!("{scheme}://{authority}{LOGIN_PATH}")
        }
        None => LOGIN_PATH.to_string(),
    }
}

/// Session token from the bearer header or the session cookie.
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }

    let value = headers.get(COOKIE)?.to_str().ok()?;
    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME && !val.is_empty() {
            return Some(val.to_string());
        }
    }

    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
