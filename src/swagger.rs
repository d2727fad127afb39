use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::middlewares::admin_key::ADMIN_KEY_HEADER;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ADMIN_KEY_HEADER))),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::draw::draw,
        handlers::prize::get_prizes,
        handlers::prize::update_prizes,
        handlers::admin::seed,
    ),
    components(
        schemas(
            DrawRequest,
            DrawResponse,
            WonPrize,
            PrizeTier,
            PrizeListResponse,
            PrizePatch,
            UpdatePrizesRequest,
            SeedRequest,
            SeedResponse,
            ApiError,
            DrawApiResponse,
            PrizeListApiResponse,
            SeedApiResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "draw", description = "Scratch card draw API"),
        (name = "prizes", description = "Prize inventory API"),
        (name = "admin", description = "Inventory administration API"),
    ),
    info(
        title = "Scratch Rewards API",
        version = "1.0.0",
        description = "Scratch card prize draw REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
