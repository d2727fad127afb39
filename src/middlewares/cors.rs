use super::admin_key::ADMIN_KEY_HEADER;
use actix_cors::Cors;
use actix_web::http::header;

/// 刮刮卡页面嵌在第三方站点中, 允许任意来源
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header(ADMIN_KEY_HEADER)
        .max_age(3600)
}
