//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 会话达到提问上限时展示给用户的提示
pub const SESSION_LIMIT_MESSAGE: &str =
    "You have reached the session limit. Clear Chat to start a new session.";

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置错误（关键词表与建议模板不一致等）
    #[error("配置错误: {0}")]
    Config(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 会话提问次数已用尽
    #[error("{}", SESSION_LIMIT_MESSAGE)]
    SessionLimit,

    /// 超时错误
    #[error("操作超时: {0}")]
    Timeout(String),

    /// 连接错误
    #[error("连接错误: {0}")]
    Connection(String),

    /// 知识查询错误
    #[error("知识查询失败: {0}")]
    KnowledgeLookup(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else if e.is_connect() {
            AppError::Connection(e.to_string())
        } else if e.is_decode() {
            AppError::Serialization(e.to_string())
        } else {
            AppError::KnowledgeLookup(e.to_string())
        }
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code): (u16, String) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.user_message()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

impl AppError {
    /// 面向最终用户的消息
    ///
    /// 外部协作方与内部故障只返回固定的提示语，不暴露原始错误。
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(message) | AppError::NotFound(message) => message.clone(),
            AppError::SessionLimit => SESSION_LIMIT_MESSAGE.to_string(),
            _ => "Something went wrong on our side. Please try again in a moment.".to_string(),
        }
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    pub details: Option<String>,
    /// 请求 ID
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::SessionLimit => (429, "SESSION_LIMIT".to_string()),
            AppError::Timeout(_) => (408, "TIMEOUT".to_string()),
            AppError::Connection(_) => (503, "SERVICE_UNAVAILABLE".to_string()),
            AppError::KnowledgeLookup(_) => (502, "KNOWLEDGE_UNAVAILABLE".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, code): (u16, String) = (&AppError::SessionLimit).into();
        assert_eq!(status, 429);
        assert_eq!(code, "SESSION_LIMIT");

        let (status, _): (u16, String) = (&AppError::NotFound("x".into())).into();
        assert_eq!(status, 404);

        let (status, _): (u16, String) = (&AppError::Config("x".into())).into();
        assert_eq!(status, 500);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Internal("stack trace at line 42".into());
        assert!(!err.user_message().contains("line 42"));

        let err = AppError::Validation("Message content must not be empty".into());
        assert!(err.user_message().contains("must not be empty"));
    }

    #[test]
    fn test_user_message_drops_log_prefix() {
        let err = AppError::Validation("Message content must not be empty".into());
        assert_eq!(err.user_message(), "Message content must not be empty");
        assert!(err.to_string().starts_with("参数验证失败"));

        let err = AppError::NotFound("Session not found: abc".into());
        assert_eq!(err.user_message(), "Session not found: abc");

        assert_eq!(AppError::SessionLimit.user_message(), SESSION_LIMIT_MESSAGE);
    }

    #[test]
    fn test_error_response_details() {
        let response = ErrorResponse::new("BAD_REQUEST", "bad").with_details("field: content");
        assert_eq!(response.details.as_deref(), Some("field: content"));
        assert!(response.request_id.is_none());
    }
}
