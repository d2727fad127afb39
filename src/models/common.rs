use super::{DrawResponse, PrizeListResponse, SeedResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 统一响应包装: `{"success", "data"?, "message"?, "error"?}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    DrawApiResponse = ApiResponse<DrawResponse>,
    PrizeListApiResponse = ApiResponse<PrizeListResponse>,
    SeedApiResponse = ApiResponse<SeedResponse>
)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// SOLD_OUT / DRAW_UNAVAILABLE / VALIDATION_ERROR / AUTH_ERROR ...
    #[schema(example = "SOLD_OUT")]
    pub code: String,
    pub message: String,
}

impl ApiResponse<()> {
    pub fn error(code: &str, message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(ApiError {
                code: code.to_string(),
                message,
            }),
        }
    }
}
