use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use mars_rover_api::api::route;
use mars_rover_api::config::AppConfig;
use mars_rover_api::middleware::headers::security_headers;
use mars_rover_api::middleware::metrics::HttpMetrics;
use mars_rover_api::middleware::tracing::record_trace;
use mars_rover_api::openapi::swagger_ui;
use mars_rover_api::telemetry::{build_metrics_provider, init_subscriber};
use mars_rover_api::AppContext;
use opentelemetry::global;
use opentelemetry::global::shutdown_tracer_provider;
use std::path::Path;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Configuration problems are fatal before the socket is bound.
    let otel_options = match AppConfig::load(Path::new("app.toml")) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("fatal: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = init_subscriber(&otel_options) {
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
    let meter_provider = match build_metrics_provider(&otel_options) {
        Ok(provider) => provider,
        Err(err) => {
            tracing::error!("fatal: {err}");
            std::process::exit(1);
        }
    };
    global::set_meter_provider(meter_provider.clone());
    let meter = Arc::new(global::meter(otel_options.service_name.clone().leak()));

    tracing::info!(
        service = %otel_options.service_name,
        version = %otel_options.service_version,
        "starting http server"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(AppContext::new(meter.clone())))
            .wrap(Logger::default())
            .wrap(from_fn(security_headers))
            .wrap(from_fn(record_trace))
            .wrap(HttpMetrics::new(meter.clone()))
            .configure(route)
            .service(swagger_ui())
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await?;

    tokio::task::spawn_blocking(shutdown_tracer_provider);
    tokio::task::spawn_blocking(move || meter_provider.shutdown());

    Ok(())
}
