use axum::http::StatusCode;
use serde::Serialize;

use super::ApiSuccess;

pub async fn hello() -> ApiSuccess<HelloResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        HelloResponseData {
            message: "user-api is up. Your request executed successfully!".to_string(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelloResponseData {
    pub message: String,
}
