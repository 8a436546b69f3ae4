use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 消息角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 用户消息
    User,
    /// 助手消息
    Assistant,
}

impl Role {
    /// 导出记录中的说话人名称
    pub fn speaker(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "InMind",
        }
    }
}

/// 回复来源
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// 会话开场白
    Greeting,
    /// 用户输入
    #[default]
    User,
    /// 紧急情况提示
    Emergency,
    /// 关键词匹配后的建议
    Advice,
    /// 外部知识查询结果
    Knowledge,
    /// 查询失败后的兜底回复
    Fallback,
}

/// 轮次元数据
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TurnMeta {
    /// 回复来源
    pub kind: TurnKind,
    /// 引用文章标题
    pub title: Option<String>,
    /// 引用文章地址
    pub url: Option<String>,
}

/// 对话轮次
///
/// 由会话层持有；分类器只接收文本，不读写轮次。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// 轮次唯一标识
    pub id: String,
    /// 消息角色
    pub role: Role,
    /// 消息内容（Markdown）
    pub content: String,
    /// 创建时间
    pub timestamp: DateTime<Utc>,
    /// 元数据
    pub meta: TurnMeta,
}

impl ConversationTurn {
    /// 创建用户轮次
    pub fn user(content: &str) -> Self {
        Self::new(Role::User, content, TurnMeta::default())
    }

    /// 创建助手轮次
    pub fn assistant(content: &str, meta: TurnMeta) -> Self {
        Self::new(Role::Assistant, content, meta)
    }

    fn new(role: Role, content: &str, meta: TurnMeta) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            meta,
        }
    }
}

impl TurnMeta {
    /// 指定来源的元数据
    pub fn of_kind(kind: TurnKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// 带引用的元数据
    pub fn with_source(kind: TurnKind, title: &str, url: Option<String>) -> Self {
        Self {
            kind,
            title: Some(title.to_string()),
            url,
        }
    }
}
