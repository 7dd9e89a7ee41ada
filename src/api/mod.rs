use crate::openapi;
use crate::AppContext;
use actix_web::{web, HttpResponse, Responder, Route};
use chrono::{Days, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const FORECAST_DAYS: usize = 5;

pub const SUMMARIES: [&str; 10] = [
    "Freezing",
    "Bracing",
    "Chilly",
    "Cool",
    "Mild",
    "Warm",
    "Balmy",
    "Hot",
    "Sweltering",
    "Scorching",
];

/// One forecast entry. Fahrenheit is derived from Celsius at construction and
/// never set independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    temperature_f: i32,
    pub summary: String,
}

impl WeatherForecast {
    pub fn new(date: NaiveDate, temperature_c: i32, summary: String) -> Self {
        Self {
            date,
            temperature_c,
            temperature_f: fahrenheit(temperature_c),
            summary,
        }
    }

    pub fn temperature_f(&self) -> i32 {
        self.temperature_f
    }
}

fn fahrenheit(celsius: i32) -> i32 {
    32 + (celsius as f64 / 0.5556) as i32
}

/// Samples a forecast starting the day after `start`. The generator is passed
/// in explicitly so tests can seed it.
pub fn sample_forecast<R: Rng>(rng: &mut R, start: NaiveDate) -> Vec<WeatherForecast> {
    (1..=FORECAST_DAYS as u64)
        .map(|day| {
            WeatherForecast::new(
                start + Days::new(day),
                rng.gen_range(-20..55),
                SUMMARIES[rng.gen_range(0..SUMMARIES.len())].to_string(),
            )
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/hello",
    tag = "Greeting",
    responses(
        (status = 200, description = "Static greeting", body = String, content_type = "text/plain")
    )
)]
pub async fn hello() -> impl Responder {
    tracing::info!("greeting requested");
    "Hello World!"
}

#[utoipa::path(
    get,
    path = "/weatherforecast",
    tag = "Weather",
    responses(
        (status = 200, description = "Five-day weather forecast for Mars operation", body = [WeatherForecast])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn weather_forecast(context: web::Data<AppContext>) -> impl Responder {
    let counter = context.meter.u64_counter("weather.forecast.requests").init();
    counter.add(1, &[]);
    let forecast = sample_forecast(&mut rand::thread_rng(), Utc::now().date_naive());
    HttpResponse::Ok().json(forecast)
}

/// A registered route as seen by the test harness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub method: &'static str,
}

struct RegisteredRoute {
    path: &'static str,
    method: &'static str,
    factory: fn() -> Route,
}

/// Single source of truth for the HTTP surface: `route` registers each entry
/// and `registered_endpoints` enumerates them for the contract tests.
static ROUTES: &[RegisteredRoute] = &[
    RegisteredRoute {
        path: "/hello",
        method: "GET",
        factory: || web::get().to(hello),
    },
    RegisteredRoute {
        path: "/weatherforecast",
        method: "GET",
        factory: || web::get().to(weather_forecast),
    },
    RegisteredRoute {
        path: openapi::OPENAPI_JSON_PATH,
        method: "GET",
        factory: || web::get().to(openapi::openapi_json),
    },
];

pub fn route(cfg: &mut web::ServiceConfig) {
    for entry in ROUTES {
        cfg.route(entry.path, (entry.factory)());
    }
}

pub fn registered_endpoints() -> Vec<EndpointInfo> {
    ROUTES
        .iter()
        .filter(|entry| !entry.path.is_empty())
        .map(|entry| EndpointInfo {
            path: entry.path,
            method: entry.method,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppContext;
    use actix_web::{test, App};
    use opentelemetry::global;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
    }

    #[::core::prelude::v1::test]
    fn forecast_has_five_entries_with_consecutive_dates() {
        let mut rng = StdRng::seed_from_u64(7);
        let forecast = sample_forecast(&mut rng, start_date());
        assert_eq!(forecast.len(), FORECAST_DAYS);
        for (index, entry) in forecast.iter().enumerate() {
            let expected = start_date() + Days::new(index as u64 + 1);
            assert_eq!(entry.date, expected);
        }
    }

    #[::core::prelude::v1::test]
    fn forecast_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            for entry in sample_forecast(&mut rng, start_date()) {
                assert!((-20..55).contains(&entry.temperature_c));
                assert!(SUMMARIES.contains(&entry.summary.as_str()));
            }
        }
    }

    #[::core::prelude::v1::test]
    fn fahrenheit_is_derived_from_celsius() {
        let mut rng = StdRng::seed_from_u64(3);
        for entry in sample_forecast(&mut rng, start_date()) {
            let expected = 32 + (entry.temperature_c as f64 / 0.5556) as i32;
            assert_eq!(entry.temperature_f(), expected);
        }
        assert_eq!(
            WeatherForecast::new(start_date(), 0, "Mild".into()).temperature_f(),
            32
        );
        assert_eq!(
            WeatherForecast::new(start_date(), -20, "Freezing".into()).temperature_f(),
            -3
        );
    }

    #[::core::prelude::v1::test]
    fn seeded_sampling_is_reproducible() {
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);
        assert_eq!(
            sample_forecast(&mut first, start_date()),
            sample_forecast(&mut second, start_date())
        );
    }

    #[::core::prelude::v1::test]
    fn forecast_serializes_with_camel_case_fields() {
        let entry = WeatherForecast::new(start_date(), 10, "Cool".into());
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("temperatureC").is_some());
        assert!(value.get("temperatureF").is_some());
        assert!(value.get("date").is_some());
        assert!(value.get("summary").is_some());
    }

    #[actix_web::test]
    async fn hello_returns_plain_text_greeting() {
        let app = test::init_service(App::new().configure(route)).await;
        let req = test::TestRequest::get().uri("/hello").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let content_type = resp.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/plain"));
        let body = test::read_body(resp).await;
        assert_eq!(body, "Hello World!");
    }

    #[actix_web::test]
    async fn weather_forecast_returns_five_json_entries() {
        let meter = Arc::new(global::meter("mars-rover-api-test"));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppContext::new(meter)))
                .configure(route),
        )
        .await;
        let req = test::TestRequest::get().uri("/weatherforecast").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let forecast: Vec<WeatherForecast> = test::read_body_json(resp).await;
        assert_eq!(forecast.len(), FORECAST_DAYS);
    }

    #[::core::prelude::v1::test]
    fn registry_exposes_every_route_once() {
        let endpoints = registered_endpoints();
        assert_eq!(endpoints.len(), 3);
        assert!(endpoints.iter().all(|e| e.method == "GET"));
        assert!(endpoints.iter().any(|e| e.path == "/hello"));
        assert!(endpoints.iter().any(|e| e.path == "/weatherforecast"));
        assert!(endpoints
            .iter()
            .any(|e| e.path == "/swagger/v1/swagger.json"));
    }
}
