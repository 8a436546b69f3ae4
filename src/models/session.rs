use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::turn::{ConversationTurn, Role, TurnKind, TurnMeta};

/// 新会话和清空会话后的开场白
pub const GREETING: &str =
    "Hi — I'm InMind. I specialize in brain health and general information. Ask me anything!";

/// 收藏标题截取长度
const FAVORITE_TITLE_CHARS: usize = 40;

/// 知识查询语言
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
}

impl Language {
    /// 语言代码
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
        }
    }

    /// 从语言代码解析
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "es" | "spanish" => Some(Language::Es),
            "fr" | "french" => Some(Language::Fr),
            _ => None,
        }
    }
}

/// 收藏的回答
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    /// 收藏唯一标识
    pub id: String,
    /// 标题
    pub title: String,
    /// 回答内容
    pub content: String,
    /// 引用地址
    pub url: Option<String>,
    /// 收藏时间
    pub saved_at: DateTime<Utc>,
}

/// 聊天会话
///
/// 单个交互会话的全部状态，只存在于内存中。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// 会话唯一标识
    pub id: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 对话轮次（按时间顺序）
    pub turns: Vec<ConversationTurn>,
    /// 已用提问次数
    pub query_count: u32,
    /// 上一次知识查询命中的文章标题
    pub last_topic: Option<String>,
    /// 知识查询语言
    pub language: Language,
    /// 收藏列表
    pub favorites: Vec<Favorite>,
    /// 最近一次活动时间，空闲回收依据
    pub last_active: DateTime<Utc>,
}

impl ChatSession {
    /// 创建新会话
    pub fn new(language: Language) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            turns: vec![greeting_turn()],
            query_count: 0,
            last_topic: None,
            language,
            favorites: Vec::new(),
            last_active: now,
        }
    }

    /// 记录一次活动
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// 在 `now` 时刻是否已空闲超过 `idle_ttl`
    pub fn is_idle(&self, now: DateTime<Utc>, idle_ttl: chrono::Duration) -> bool {
        now - self.last_active >= idle_ttl
    }

    /// 清空对话，只保留开场白
    ///
    /// 收藏和语言设置不受影响。
    pub fn clear(&mut self) {
        self.turns = vec![greeting_turn()];
        self.query_count = 0;
        self.last_topic = None;
    }

    /// 追加轮次
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// 最近一条助手回复
    pub fn last_assistant(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }

    /// 收藏最近一条助手回复
    pub fn save_last_answer(&mut self) -> Option<Favorite> {
        let turn = self.last_assistant()?;
        let title = turn
            .meta
            .title
            .clone()
            .unwrap_or_else(|| preview_title(&turn.content));
        let favorite = Favorite {
            id: Uuid::new_v4().to_string(),
            title,
            content: turn.content.clone(),
            url: turn.meta.url.clone(),
            saved_at: Utc::now(),
        };
        self.favorites.push(favorite.clone());
        Some(favorite)
    }

    /// 删除收藏
    pub fn remove_favorite(&mut self, favorite_id: &str) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|f| f.id != favorite_id);
        self.favorites.len() != before
    }

    /// 收藏列表（最新在前）
    pub fn favorites_newest_first(&self) -> Vec<Favorite> {
        self.favorites.iter().rev().cloned().collect()
    }
}

fn greeting_turn() -> ConversationTurn {
    ConversationTurn::assistant(GREETING, TurnMeta::of_kind(TurnKind::Greeting))
}

fn preview_title(content: &str) -> String {
    let head: String = content.chars().take(FAVORITE_TITLE_CHARS).collect();
    format!("{}...", head)
}
