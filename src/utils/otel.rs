//! Observability
//!
//! Console logging through `tracing-subscriber`, with spans optionally
//! exported to an OTLP collector.

use anyhow::Result;
use opentelemetry::trace::TracerProvider; // Import trait for .tracer()
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::{propagation::TraceContextPropagator, runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "number_analyzer=info,tower_http=info";

/// Flushes the OTLP exporter on drop.
pub struct OtelGuard {
    otlp_enabled: bool,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if self.otlp_enabled {
            global::shutdown_tracer_provider();
        }
    }
}

pub fn init_telemetry(service_name: &str, otlp_enabled: bool) -> Result<OtelGuard> {
    let telemetry = if otlp_enabled {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .build_span_exporter()?;

        let trace_config = sdktrace::Config::default().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ]));

        let provider = sdktrace::TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_config(trace_config)
            .build();

        global::set_tracer_provider(provider.clone());

        // provider.tracer() yields an sdktrace::Tracer, which the layer needs
        let tracer = provider.tracer(service_name.to_string());
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    Registry::default()
        .with(filter)
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()?;

    Ok(OtelGuard { otlp_enabled })
}
