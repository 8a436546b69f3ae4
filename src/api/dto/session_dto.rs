//! 会话 DTO
//!
//! 定义会话、收藏和导出相关的请求和响应数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChatSession, ConversationTurn, Favorite};
use crate::services::transcript::TranscriptFormat;

/// 创建会话请求
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CreateSessionRequest {
    /// 知识查询语言代码（en / es / fr）
    pub language: Option<String>,
}

/// 更新会话请求
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    /// 知识查询语言代码
    pub language: String,
}

/// 会话响应
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub query_count: u32,
    pub queries_remaining: u32,
    pub last_topic: Option<String>,
    pub turns: Vec<ConversationTurn>,
    pub favorites_count: usize,
}

impl SessionResponse {
    pub fn from_session(session: ChatSession, max_queries: u32) -> Self {
        Self {
            queries_remaining: max_queries.saturating_sub(session.query_count),
            id: session.id,
            created_at: session.created_at,
            language: session.language.code().to_string(),
            query_count: session.query_count,
            last_topic: session.last_topic,
            favorites_count: session.favorites.len(),
            turns: session.turns,
        }
    }
}

/// 收藏列表响应
#[derive(Debug, Serialize)]
pub struct FavoriteListResponse {
    pub favorites: Vec<Favorite>,
    pub total: usize,
}

/// 导出参数
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TranscriptParams {
    pub format: TranscriptFormat,
}
