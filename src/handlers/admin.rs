use crate::models::*;
use crate::services::PrizeService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/admin/seed",
    tag = "admin",
    request_body(content = SeedRequest, description = "可选, 不传则写入默认奖品"),
    security(
        ("admin_key" = [])
    ),
    responses(
        (status = 200, description = "初始化完成", body = SeedResponse),
        (status = 401, description = "管理密钥错误"),
        (status = 500, description = "初始化失败")
    )
)]
/// 初始化奖品库存 (幂等, 已有数据时不覆盖)
pub async fn seed(
    service: web::Data<PrizeService>,
    body: Option<web::Json<SeedRequest>>,
) -> Result<HttpResponse> {
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    match service.seed(request).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result,
            "message": if result.seeded { "库存已初始化" } else { "库存已存在, 未覆盖" }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/admin").route("/seed", web::post().to(seed)));
}
