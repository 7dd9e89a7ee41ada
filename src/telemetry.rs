use crate::config::OpenTelemetryOptions;
use opentelemetry::logs::LogError;
use opentelemetry::metrics::MetricsError;
use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{ExportConfig, WithExportConfig};
use opentelemetry_sdk::logs::LoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{RandomIdGenerator, Tracer};
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize OTLP trace exporter: {0}")]
    Trace(#[from] TraceError),
    #[error("failed to initialize OTLP metrics exporter: {0}")]
    Metrics(#[from] MetricsError),
    #[error("failed to initialize OTLP log exporter: {0}")]
    Logs(#[from] LogError),
}

fn resource(options: &OpenTelemetryOptions) -> Resource {
    Resource::new(vec![
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            options.service_name.clone(),
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            options.service_version.clone(),
        ),
    ])
}

fn init_tracer(options: &OpenTelemetryOptions) -> Result<Tracer, TraceError> {
    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_resource(resource(options))
                .with_id_generator(RandomIdGenerator::default()),
        )
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(options.otlp_endpoint.clone())
                .with_timeout(std::time::Duration::from_secs(5)),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;
    Ok(provider.tracer(options.service_name.clone()))
}

fn init_logs(options: &OpenTelemetryOptions) -> Result<LoggerProvider, LogError> {
    opentelemetry_otlp::new_pipeline()
        .logging()
        .with_resource(resource(options))
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(options.otlp_endpoint.clone())
                .with_timeout(std::time::Duration::from_secs(2)),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

pub fn build_metrics_provider(
    options: &OpenTelemetryOptions,
) -> Result<SdkMeterProvider, TelemetryError> {
    let export_config = ExportConfig {
        endpoint: options.otlp_endpoint.clone(),
        ..ExportConfig::default()
    };
    let provider = opentelemetry_otlp::new_pipeline()
        .metrics(opentelemetry_sdk::runtime::Tokio)
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_timeout(std::time::Duration::from_secs(2))
                .with_export_config(export_config),
        )
        .with_resource(resource(options))
        .build()?;
    Ok(provider)
}

/// Installs the tracing subscriber: compact console output plus OTLP batch
/// exporters for spans and log records, both pointed at the validated
/// endpoint. Exporters batch asynchronously; the request path never waits on
/// delivery.
pub fn init_subscriber(options: &OpenTelemetryOptions) -> Result<(), TelemetryError> {
    let tracer = init_tracer(options)?;
    let trace_layer = tracing_opentelemetry::layer().with_tracer(tracer);
    let logger = init_logs(options)?;
    let logger_layer = OpenTelemetryTracingBridge::new(&logger);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::Layer::new()
                .with_target(true)
                .with_span_events(FmtSpan::ACTIVE)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .with(trace_layer)
        .with(logger_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::api::route;
    use crate::middleware::tracing::record_trace;
    use actix_web::middleware::from_fn;
    use actix_web::{test, App};
    use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
    use opentelemetry_sdk::logs::LoggerProvider;
    use opentelemetry_sdk::testing::logs::InMemoryLogsExporter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    #[tokio::test]
    async fn handler_events_reach_the_log_bridge() {
        let exporter = InMemoryLogsExporter::default();
        let logger_provider = LoggerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let logger_layer = OpenTelemetryTracingBridge::new(&logger_provider);
        let _guard = tracing_subscriber::registry()
            .with(logger_layer)
            .set_default();

        let app = test::init_service(App::new().wrap(from_fn(record_trace)).configure(route)).await;
        let req = test::TestRequest::get().uri("/hello").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        logger_provider.force_flush();
        let emitted_logs = exporter.get_emitted_logs().unwrap();
        assert!(!emitted_logs.is_empty());
    }
}
