use crate::models::*;
use crate::services::PrizeService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/prizes",
    tag = "prizes",
    responses(
        (status = 200, description = "获取奖品库存成功", body = PrizeListResponse),
        (status = 500, description = "库存读取失败")
    )
)]
/// 获取当前奖品库存
pub async fn get_prizes(service: web::Data<PrizeService>) -> Result<HttpResponse> {
    match service.list_prizes().await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/prizes",
    tag = "prizes",
    request_body = UpdatePrizesRequest,
    security(
        ("admin_key" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = PrizeListResponse),
        (status = 400, description = "参数错误"),
        (status = 401, description = "管理密钥错误")
    )
)]
/// 管理端批量更新奖品 (按 id 合并, remaining < 0 视为无限)
pub async fn update_prizes(
    service: web::Data<PrizeService>,
    body: web::Json<UpdatePrizesRequest>,
) -> Result<HttpResponse> {
    match service.update_prizes(body.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": data,
            "message": "奖品已更新"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn prize_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/prizes")
            .route(web::get().to(get_prizes))
            .route(web::post().to(update_prizes)),
    );
}
