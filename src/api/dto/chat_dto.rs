//! 对话 DTO

use serde::{Deserialize, Serialize};

use crate::models::{ClassifierResponse, Outcome};

/// 发送消息请求
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// 用户输入
    pub content: String,
}

/// 无状态分类请求
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

/// 无状态分类响应
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub outcome: Outcome,
    pub is_emergency: bool,
    pub matched_any_category: bool,
    pub matched_categories: Vec<String>,
    /// 紧急提示或建议文本；未命中时为空
    pub body: String,
}

impl From<ClassifierResponse> for ClassifyResponse {
    fn from(response: ClassifierResponse) -> Self {
        Self {
            outcome: response.outcome(),
            is_emergency: response.is_emergency,
            matched_any_category: response.matched_any_category,
            matched_categories: response.matched_categories,
            body: response.body,
        }
    }
}

/// 资源链接
#[derive(Debug, Serialize)]
pub struct ResourceLink {
    pub name: String,
    pub url: String,
}

/// 快捷问题和可信资源
#[derive(Debug, Serialize)]
pub struct FaqResponse {
    pub questions: Vec<String>,
    pub resources: Vec<ResourceLink>,
}
