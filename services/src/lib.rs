use crate::admin::AppState;
use crate::config::Config;
use crate::database::RelationalStore;
use crate::provider::RowProvider;
use crate::registry::Registry;
use axum::{
    Router,
    extract::{Extension, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{any, get},
};
use opentelemetry::{global, propagation::Extractor};
use panel_utils::version_info::{RuntimeEnv, format_version_for_runtime_env};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub mod admin;
pub mod config;
pub mod database;
pub mod error;
pub mod forms;
pub mod pages;
pub mod provider;
pub mod registry;
pub mod server;
pub mod table;
pub mod tables;
pub mod telemetry;

struct HeaderExtractor<'a>(&'a axum::http::HeaderMap);

impl<'a> Extractor for HeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Builds the application router.
///
/// The admin panel is nested under the configured URL prefix; `/is-health`
/// stays at the root.
pub fn routes<S: RelationalStore>(store: S, registry: Registry, config: Config) -> Router {
    let provider = RowProvider::new(store, config.data_source_timeout());
    let state = AppState::new(registry, provider);
    let prefix = format!("/{}", config.url_prefix());

    Router::new()
        .route("/is-health", get(health_check::<S>))
        .nest(&prefix, admin::routes::<S>())
        .fallback(any(catch_all))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let parent_context = global::get_text_map_propagator(|propagator| {
                    propagator.extract(&HeaderExtractor(request.headers()))
                });

                let span = tracing::info_span!(
                    "http_request",
                    http_request.method = ?request.method(),
                    http_request.uri = ?request.uri(),
                    http_request.version = ?request.version(),
                    http_request.user_agent = ?request.headers().get(axum::http::header::USER_AGENT),
                );

                span.set_parent(parent_context);
                span
            }),
        )
        .layer(Extension(config))
        .with_state(state)
}

async fn health_check<S: RelationalStore>(
    State(state): State<AppState<S>>,
    Extension(config): Extension<Config>,
) -> impl IntoResponse {
    let mut response = if state.provider.store().is_connected().await {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::BAD_GATEWAY, "502").into_response()
    };

    if let Ok(env_value) = HeaderValue::from_str(&config.environment().to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-service-env"), env_value);
    }

    let runtime_env: RuntimeEnv = config.environment().into();
    if let Ok(version_value) = HeaderValue::from_str(&format_version_for_runtime_env(runtime_env)) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-service-version"), version_value);
    }

    response
}

async fn catch_all() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}
