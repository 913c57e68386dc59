use crate::config::Config;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "traidenis=debug,tower_http=debug";

// Counter names exported to Prometheus
pub const TEMPLATE_SAVES_TOTAL: &str = "template_saves_total";
pub const TEMPLATE_SAVE_CONFLICTS_TOTAL: &str = "template_save_conflicts_total";
pub const TEMPLATE_VERSIONS_PRUNED_TOTAL: &str = "template_versions_pruned_total";
pub const TEMPLATE_REVERTS_TOTAL: &str = "template_reverts_total";
pub const TEMPLATE_RENDERS_TOTAL: &str = "template_renders_total";

/// Every counter the template service emits, with its help text
pub const TEMPLATE_COUNTERS: [(&str, &str); 5] = [
    (TEMPLATE_SAVES_TOTAL, "Template saves committed to the store"),
    (
        TEMPLATE_SAVE_CONFLICTS_TOTAL,
        "Template saves that lost the version check and were retried",
    ),
    (
        TEMPLATE_VERSIONS_PRUNED_TOTAL,
        "Template history snapshots deleted by pruning",
    ),
    (TEMPLATE_REVERTS_TOTAL, "Reverts to a historical template version"),
    (TEMPLATE_RENDERS_TOTAL, "Template renders, labelled by mode"),
];

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Failed to install OTLP trace pipeline: {0}")]
    Otlp(#[from] opentelemetry::trace::TraceError),

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("Failed to start Prometheus exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Flushes pending spans when dropped
pub struct ObservabilityGuard;

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        shutdown();
    }
}

pub fn init(config: &Config) -> Result<ObservabilityGuard, ObservabilityError> {
    init_tracing(config)?;
    init_metrics(config)?;
    Ok(ObservabilityGuard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing(config: &Config) -> Result<(), ObservabilityError> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    match &config.otel_exporter_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint);

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(exporter)
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", config.service_name.clone()),
                ])))
                .install_batch(runtime::Tokio)?;

            Registry::default()
                .with(env_filter())
                .with(fmt_layer)
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()?;
            tracing::info!("Exporting traces to {}", endpoint);
        }
        None => {
            Registry::default()
                .with(env_filter())
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

fn init_metrics(config: &Config) -> Result<(), ObservabilityError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()?;
    describe_template_metrics();

    tracing::info!(
        "Metrics exporter (Prometheus) started on port {}",
        config.metrics_port
    );
    Ok(())
}

fn describe_template_metrics() {
    for (name, help) in TEMPLATE_COUNTERS {
        metrics::describe_counter!(name, help);
    }
}

pub fn shutdown() {
    global::shutdown_tracer_provider();
}
