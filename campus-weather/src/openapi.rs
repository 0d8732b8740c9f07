use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use common::models::{
    CampusInfo, CompactWeather, CurrentConditions, IconResponse, Location, OverviewResponse,
    ResponseSummary, ViewStatus, WeatherCard, WeatherSnapshot,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_campuses,
        handlers::get_weather,
        handlers::get_compact_weather,
        handlers::overview,
        handlers::get_icon,
    ),
    components(schemas(
        CampusInfo,
        WeatherCard,
        CompactWeather,
        ViewStatus,
        OverviewResponse,
        ResponseSummary,
        IconResponse,
        WeatherSnapshot,
        Location,
        CurrentConditions,
    )),
    tags(
        (name = "weather", description = "Campus weather endpoints"),
        (name = "icons", description = "Weather icon lookup"),
    ),
)]
struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
