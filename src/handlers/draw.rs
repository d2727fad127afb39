use crate::models::*;
use crate::services::DrawService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/draw",
    tag = "draw",
    request_body(content = DrawRequest, description = "参与者信息 (均可选)"),
    responses(
        (status = 200, description = "抽奖成功", body = DrawResponse),
        (status = 503, description = "所有奖品已抽完 (SOLD_OUT)"),
        (status = 500, description = "库存暂不可用 (DRAW_UNAVAILABLE)")
    )
)]
/// 刮刮卡抽奖: 按库存权重抽取一个奖品
/// 请求体可省略或为空对象
pub async fn draw(
    service: web::Data<DrawService>,
    body: Option<web::Json<DrawRequest>>,
) -> Result<HttpResponse> {
    let request = body.map(web::Json::into_inner).unwrap_or_default();
    match service.draw(request).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": DrawResponse::from(outcome)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/draw", web::post().to(draw));
}
