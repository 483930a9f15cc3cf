//! Logging for the cloudlib binary
//!
//! Compact console output filtered by `RUST_LOG`, falling back to `debug` or
//! `info` depending on `--debug`. Builds with the `telemetry` feature can
//! also ship spans over OTLP/gRPC when `--otel` is given; the collector is
//! read from `OTEL_EXPORTER_OTLP_ENDPOINT` and the reported service name from
//! `OTEL_SERVICE_NAME`.

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type ExportLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConfig {
    pub debug: bool,
    pub otel: bool,
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(config: &TracingConfig) -> Result<()> {
    let export = if config.otel { span_export()? } else { None };
    let exporting = export.is_some();

    let level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(export)
        .with(filter)
        .with(fmt::layer().with_target(config.debug).compact())
        .try_init()
        .map_err(|err| anyhow!(err))?;

    if config.otel && !exporting {
        tracing::warn!("--otel ignored: built without the `telemetry` feature");
    }
    Ok(())
}

#[cfg(feature = "telemetry")]
fn span_export() -> Result<Option<ExportLayer>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};

    let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.into());
    let endpoint = var("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317");
    let service = var("OTEL_SERVICE_NAME", "cloudlib");

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|err| anyhow!("OTLP exporter: {err}"))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new([KeyValue::new("service.name", service)]))
        .build();
    let tracer = provider.tracer("cloudlib");
    // The global handle keeps the batch exporter running until `shutdown`
    let _ = opentelemetry::global::set_tracer_provider(provider);

    Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer).boxed()))
}

#[cfg(not(feature = "telemetry"))]
fn span_export() -> Result<Option<ExportLayer>> {
    Ok(None)
}

/// Flush spans still queued for export
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
