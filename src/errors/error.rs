use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use diesel::result::Error as DieselError;
use ethers_core::abi::Error as AbiError;
use ethers_providers::ProviderError;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum AppError {
    // SQL 执行、ORM 映射错误
    #[error("Database query error: {0}")]
    DatabaseQuery(#[from] DieselError),

    // 从 bb8 连接池获取连接失败
    #[error("Database connection pool error: {0}")]
    ConnectionPool(String),

    #[error("Join error: {0}")]
    JoinError(#[from] JoinError),

    /// 请求参数校验失败
    #[error("{0}")]
    Validation(String),

    /// 服务端签名账户不支持的流程（ERC-20 游戏）
    #[error("{0}")]
    Unsupported(String),

    /// 资源未找到
    #[error("{0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    /// 类型转换错误（U256→i64、时间转换等）
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// 内部不可预期错误（兜底）
    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    ProviderError(String),

    #[error("Parser error: {0}")]
    ParserError(String),

    /// 链上执行失败（revert、掉包）
    #[error("{0}")]
    BlockchainError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl AppError {
    pub fn new(message: &str) -> Self {
        AppError::Internal(message.to_string())
    }

    /// 400 参数错误 / 不支持的流程，404 游戏不存在，其余全部 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Unsupported(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::ProviderError(err.to_string())
    }
}

impl From<AbiError> for AppError {
    fn from(err: AbiError) -> Self {
        AppError::ParserError(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParserError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_follows_error_taxonomy() {
        assert_eq!(
            AppError::Validation("Invalid gameId".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unsupported("ERC20".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("Game does not exist".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ProviderError("execution reverted".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::DatabaseQuery(DieselError::NotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_message_is_passed_through() {
        let err = AppError::ProviderError("insufficient funds for gas * price + value".into());
        assert_eq!(err.to_string(), "insufficient funds for gas * price + value");
    }

    #[tokio::test]
    async fn into_response_renders_error_envelope() {
        let response = AppError::NotFound("Game does not exist".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Game does not exist");
    }
}
