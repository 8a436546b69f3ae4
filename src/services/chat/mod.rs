//! 对话服务
//!
//! 串联会话、分类器和知识查询：先做紧急检查和关键词分类，
//! 都未命中时才去外部查询，查询失败则给出固定的兜底回复。

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::error::{AppError, Result};
use crate::knowledge::{KnowledgeArticle, KnowledgeProvider};
use crate::models::{ConversationTurn, Outcome, TurnKind, TurnMeta};
use crate::observability::AppMetrics;
use crate::services::session::{SessionService, TopicUpdate, TurnContext};

/// 外部查询也没有结果时的回复
pub const FALLBACK_MESSAGE: &str = "I couldn't reach the knowledge service or find a clear article. \
If this is a health concern, consider contacting a clinician. \
Quick resources: Mayo Clinic, NIH, MedlinePlus.";

/// 快捷问题
pub const FAQ_QUESTIONS: &[&str] = &[
    "What is Alzheimer's disease?",
    "What causes dementia?",
    "How to support someone with memory problems?",
    "What are common stroke warning signs?",
    "How to improve sleep hygiene?",
];

/// 可信资源 (名称, 地址)
pub const TRUSTED_RESOURCES: &[(&str, &str)] = &[
    ("Mayo Clinic", "https://www.mayoclinic.org/"),
    ("NIH", "https://www.nih.gov/"),
    ("MedlinePlus", "https://medlineplus.gov/"),
    ("WHO", "https://www.who.int/"),
];

/// 最多几个词的输入视为追问
const FOLLOW_UP_MAX_WORDS: usize = 4;

static PRONOUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(it|they|them|he|she|that|those|this|these)\b").expect("valid pronoun regex")
});

static CONTINUATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(and|also|what about|how about|then|more)\b").expect("valid continuation regex")
});

/// 判断输入是否像是对上一个话题的追问
pub fn is_follow_up(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    text.split_whitespace().count() <= FOLLOW_UP_MAX_WORDS
        || PRONOUN_RE.is_match(&text)
        || CONTINUATION_RE.is_match(&text)
}

/// 针对文章标题的推荐追问
pub fn suggested_questions(title: &str) -> Vec<String> {
    vec![
        format!("What are the causes of {}?", title),
        format!("What are common symptoms of {}?", title),
        format!("What are treatment options for {}?", title),
        format!("How can {} be prevented?", title),
        format!("What is the prognosis for {}?", title),
    ]
}

/// 回复类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOutcome {
    Emergency,
    Advice,
    Knowledge,
    Fallback,
}

/// 一次提问的完整回复
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub outcome: ReplyOutcome,
    /// 追加到会话中的助手轮次
    pub reply: ConversationTurn,
    pub matched_categories: Vec<String>,
    pub suggestions: Vec<String>,
    pub queries_used: u32,
    pub queries_remaining: u32,
}

/// 生成的回复（写入会话前）
struct Drafted {
    outcome: ReplyOutcome,
    content: String,
    meta: TurnMeta,
    suggestions: Vec<String>,
    topic: TopicUpdate,
}

/// 对话服务 trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// 处理一条用户消息
    async fn send_message(&self, session_id: &str, text: &str) -> Result<ChatReply>;
}

/// 对话服务实现
pub struct ChatServiceImpl {
    sessions: Arc<dyn SessionService>,
    classifier: Arc<Classifier>,
    knowledge: Arc<dyn KnowledgeProvider>,
    metrics: Arc<AppMetrics>,
}

impl ChatServiceImpl {
    pub fn new(
        sessions: Arc<dyn SessionService>,
        classifier: Arc<Classifier>,
        knowledge: Arc<dyn KnowledgeProvider>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            sessions,
            classifier,
            knowledge,
            metrics,
        }
    }

    async fn lookup(&self, query: &str, context: &TurnContext) -> Option<KnowledgeArticle> {
        self.metrics.record_knowledge_lookup();
        let article = self.knowledge.lookup(query, context.language).await;
        match &article {
            Some(found) => {
                self.metrics.record_knowledge_hit();
                debug!(title = %found.title, "Knowledge lookup hit");
            }
            None => self.metrics.record_knowledge_miss(),
        }
        article
    }

    /// 从上一篇文章中摘取与追问相关的内容
    async fn topic_context(
        &self,
        topic: &str,
        text: &str,
        context: &TurnContext,
    ) -> Option<KnowledgeArticle> {
        self.metrics.record_knowledge_lookup();
        let article = self
            .knowledge
            .article_context(topic, text, context.language)
            .await;
        match &article {
            Some(_) => self.metrics.record_knowledge_hit(),
            None => self.metrics.record_knowledge_miss(),
        }
        article
    }

    async fn answer_from_knowledge(&self, text: &str, context: &TurnContext) -> Drafted {
        if let Some(topic) = context.last_topic.as_deref().filter(|_| is_follow_up(text)) {
            if let Some(article) = self.topic_context(topic, text, context).await {
                let mut content = format!(
                    "I used context from **{}**:\n\n{}",
                    article.title, article.summary
                );
                if let Some(url) = &article.url {
                    content.push_str(&format!("\n\n(Full article: {})", url));
                }
                return Drafted {
                    outcome: ReplyOutcome::Knowledge,
                    content,
                    meta: TurnMeta::with_source(TurnKind::Knowledge, &article.title, article.url),
                    suggestions: Vec::new(),
                    topic: TopicUpdate::Set(article.title),
                };
            }
        }

        match self.lookup(text, context).await {
            Some(article) => {
                let mut content = format!(
                    "I found **{}** on {}:\n\n{}",
                    article.title, article.source, article.summary
                );
                if let Some(url) = &article.url {
                    content.push_str(&format!("\n\nRead more: {}", url));
                }
                Drafted {
                    outcome: ReplyOutcome::Knowledge,
                    content,
                    meta: TurnMeta::with_source(TurnKind::Knowledge, &article.title, article.url.clone()),
                    suggestions: suggested_questions(&article.title),
                    topic: TopicUpdate::Set(article.title),
                }
            }
            None => Drafted {
                outcome: ReplyOutcome::Fallback,
                content: FALLBACK_MESSAGE.to_string(),
                meta: TurnMeta::of_kind(TurnKind::Fallback),
                suggestions: Vec::new(),
                topic: TopicUpdate::Keep,
            },
        }
    }
}

#[async_trait]
impl ChatService for ChatServiceImpl {
    async fn send_message(&self, session_id: &str, text: &str) -> Result<ChatReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "Message content must not be empty".to_string(),
            ));
        }

        let context = self.sessions.record_user_turn(session_id, text).await?;
        self.metrics.record_message();

        let response = self.classifier.respond(text);
        let matched_categories = response.matched_categories.clone();

        let drafted = match response.outcome() {
            Outcome::Emergency => {
                self.metrics.record_emergency();
                info!(session_id = %session_id, "Emergency message returned");
                Drafted {
                    outcome: ReplyOutcome::Emergency,
                    content: response.body,
                    meta: TurnMeta::of_kind(TurnKind::Emergency),
                    suggestions: Vec::new(),
                    topic: TopicUpdate::Clear,
                }
            }
            Outcome::Matched => {
                self.metrics.record_advice();
                Drafted {
                    outcome: ReplyOutcome::Advice,
                    content: response.body,
                    meta: TurnMeta::of_kind(TurnKind::Advice),
                    suggestions: Vec::new(),
                    topic: TopicUpdate::Clear,
                }
            }
            Outcome::Unmatched => self.answer_from_knowledge(text, &context).await,
        };

        let reply = ConversationTurn::assistant(&drafted.content, drafted.meta);
        self.sessions
            .record_assistant_turn(session_id, reply.clone(), drafted.topic)
            .await?;

        Ok(ChatReply {
            session_id: session_id.to_string(),
            outcome: drafted.outcome,
            reply,
            matched_categories,
            suggestions: drafted.suggestions,
            queries_used: context.query_count,
            queries_remaining: context.queries_remaining(),
        })
    }
}

/// 创建对话服务
pub fn create_chat_service(
    sessions: Arc<dyn SessionService>,
    classifier: Arc<Classifier>,
    knowledge: Arc<dyn KnowledgeProvider>,
    metrics: Arc<AppMetrics>,
) -> Box<dyn ChatService> {
    Box::new(ChatServiceImpl::new(sessions, classifier, knowledge, metrics))
}
