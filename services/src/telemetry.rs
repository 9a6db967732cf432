use crate::config::Config;
use anyhow::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::env;
use tracing_stackdriver::CloudTraceConfiguration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Request spans, data source fallbacks and form writes all log under `panel_services`.
const DEFAULT_FILTER: &str = "info,panel_services=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber for the panel.
///
/// Local and test runs print human-readable lines. Production emits Cloud Logging JSON,
/// and the `http_request` span of every admin request joins the caller's trace.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    if config.is_local() {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer())
            .try_init()?;
    } else {
        let project_id = env::var("GOOGLE_CLOUD_PROJECT")
            .context("GOOGLE_CLOUD_PROJECT must be set to ship panel logs in prod")?;

        // `traceparent` headers on admin requests are read back in `routes`.
        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

        let cloud_logging = tracing_stackdriver::layer()
            .with_cloud_trace(CloudTraceConfiguration { project_id });

        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_opentelemetry::layer())
            .with(cloud_logging)
            .try_init()?;
    }

    tracing::debug!(env = %config.environment(), "Tracing initialized");

    Ok(())
}
