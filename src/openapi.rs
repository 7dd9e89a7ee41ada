use crate::api;
use actix_web::{HttpResponse, Responder};
use utoipa::OpenApi;
use utoipa_swagger_ui::{Config, SwaggerUi};

/// Where the service publishes its OpenAPI document. The explorer UI at
/// `/swagger/` loads the document from this route.
pub const OPENAPI_JSON_PATH: &str = "/swagger/v1/swagger.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mars Rover API",
        version = "v1",
        description = "API for Mars Rover"
    ),
    paths(api::hello, api::weather_forecast),
    components(schemas(api::WeatherForecast)),
    tags(
        (name = "Greeting", description = "Static greeting"),
        (name = "Weather", description = "Mars weather sampling")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger/{_:.*}").config(Config::new([OPENAPI_JSON_PATH]))
}
