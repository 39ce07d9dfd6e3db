//! Logging for the roster binary
//!
//! One registry with a compact console layer, plus an OTLP span exporter
//! when built with the `telemetry` feature and started with `--otel`.
//!
//! Usage:
//!   roster --debug serve              # roster crates and request spans at debug
//!   roster --otel serve               # also export spans over OTLP
//!   RUST_LOG=roster_store=trace roster serve
//!
//! Environment variables:
//!   RUST_LOG                          # Overrides the built-in filter
//!   OTEL_EXPORTER_OTLP_ENDPOINT       # OTLP endpoint (default: http://localhost:4317)
//!   OTEL_SERVICE_NAME                 # Service name (default: roster)

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter when neither `--debug` nor `RUST_LOG` is given
const DEFAULT_DIRECTIVES: &str = "info";

/// `--debug`: our crates and per-request spans verbose, HTTP internals quiet
const DEBUG_DIRECTIVES: &str =
    "info,roster=debug,roster_server=debug,roster_store=debug,tower_http=debug";

/// Logging options taken from the global CLI flags
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    pub debug: bool,
    /// Export spans over OTLP (needs the `telemetry` feature)
    pub otel: bool,
}

impl TracingConfig {
    fn directives(&self) -> &'static str {
        if self.debug {
            DEBUG_DIRECTIVES
        } else {
            DEFAULT_DIRECTIVES
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }
}

/// Keeps span export alive; flushes pending spans when dropped
#[must_use = "dropping the guard stops span export"]
pub struct TracingGuard {
    exporting: bool,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        if self.exporting {
            #[cfg(feature = "telemetry")]
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

/// Install the global subscriber
pub fn init(config: &TracingConfig) -> Result<TracingGuard> {
    let registry = tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt::layer().with_target(config.debug).compact());

    #[cfg(feature = "telemetry")]
    let registry = registry.with(if config.otel {
        Some(otel::layer()?)
    } else {
        None
    });

    registry.try_init().map_err(|err| anyhow!(err))?;

    let exporting = cfg!(feature = "telemetry") && config.otel;
    if exporting {
        #[cfg(feature = "telemetry")]
        otel::announce();
    } else if config.otel {
        tracing::warn!("--otel ignored: roster was built without the telemetry feature");
    }

    Ok(TracingGuard { exporting })
}

#[cfg(feature = "telemetry")]
mod otel {
    use anyhow::{anyhow, Result};
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Tracer, TracerProvider};
    use tracing::Subscriber;
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::registry::LookupSpan;

    fn endpoint() -> String {
        std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4317".to_string())
    }

    fn service_name() -> String {
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "roster".to_string())
    }

    /// Span layer backed by a batch OTLP exporter registered globally
    pub fn layer<S>() -> Result<OpenTelemetryLayer<S, Tracer>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint())
            .build()
            .map_err(|e| anyhow!("Failed to create OTLP exporter: {}", e))?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(opentelemetry_sdk::Resource::new(vec![KeyValue::new(
                "service.name",
                service_name(),
            )]))
            .build();

        let tracer = provider.tracer("roster");
        // Held globally until TracingGuard shuts it down
        let _ = opentelemetry::global::set_tracer_provider(provider);

        Ok(tracing_opentelemetry::layer().with_tracer(tracer))
    }

    pub fn announce() {
        tracing::info!(
            endpoint = %endpoint(),
            service = %service_name(),
            "OpenTelemetry tracing initialized"
        );
    }
}
