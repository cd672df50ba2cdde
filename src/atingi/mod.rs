pub mod checkin;
pub mod guard;
pub mod handlers;
pub mod model;
pub mod openapi;
pub mod suggest;

use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::mpsc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use url::Url;

use crate::atingi::{
    checkin::CheckInEvent, guard::RouteGuard, handlers::AppState, suggest::SuggestClient,
};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Build the application router: check-in routes, health, OpenAPI document,
/// and the layer stack (request id, tracing, CORS, route guard).
#[must_use]
pub fn app(state: AppState, route_guard: Arc<RouteGuard>, frontend_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    Router::new()
        .route(
            "/",
            get(|| async { concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")) }),
        )
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(openapi::openapi_json))
        .route("/v1/checkins", post(handlers::open))
        .route(
            "/v1/checkins/:id",
            patch(handlers::update).delete(handlers::close),
        )
        .route("/v1/checkins/:id/submit", post(handlers::submit))
        .route("/v1/checkins/:id/suggestions", post(handlers::suggestions))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| {
                        HeaderValue::from_str(Ulid::new().to_string().as_str()).ok()
                    },
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(route_guard))
                .layer(Extension(state))
                // The guard runs after the extensions above are in place and
                // covers every route, matched or not.
                .layer(middleware::from_fn(guard::authorize)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    route_guard: RouteGuard,
    suggest: SuggestClient,
    frontend_url: &str,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    // The hosting layer's subscription to check-in events; the form
    // controller only emits, presentation is decided here.
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                CheckInEvent::SuggestionsFailed {
                    objective_id,
                    reason,
                } => {
                    warn!("Suggestions for objective {objective_id} unavailable: {reason}");
                }
            }
        }
    });

    let state = AppState::new(suggest, tx);
    let origin = frontend_origin(frontend_url)?;
    let app = app(state, Arc::new(route_guard), origin);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

/// Exact CORS origin for the frontend that hosts the check-in dialog.
fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_origin_strips_path_and_default_port() {
        let origin = frontend_origin("http://localhost:3000/app/").unwrap();
        assert_eq!(origin, HeaderValue::from_static("http://localhost:3000"));

        let origin = frontend_origin("https://app.atingi.dev/").unwrap();
        assert_eq!(origin, HeaderValue::from_static("https://app.atingi.dev"));
    }

    #[test]
    fn frontend_origin_rejects_garbage() {
        assert!(frontend_origin("not a url").is_err());
    }
}
