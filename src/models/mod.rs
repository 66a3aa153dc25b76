pub mod cricket_match;
pub mod innings;
pub mod player;
pub mod views;

use serde::Serialize;

// Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}
