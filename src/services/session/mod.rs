//! 会话服务
//!
//! 提供会话的创建、查询、清空和收藏管理。会话只保存在内存中，
//! 每个会话互相独立。

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::{DashMap, mapref::one::RefMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SessionSettings;
use crate::error::{AppError, Result};
use crate::models::{ChatSession, ConversationTurn, Favorite, Language};

/// 默认空闲回收时间（秒）
pub const DEFAULT_IDLE_TTL_SECS: i64 = 3600;

/// 默认会话数量上限
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// 一次提问开始时的会话快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnContext {
    /// 本次提问后的已用次数
    pub query_count: u32,
    /// 提问上限
    pub max_queries: u32,
    /// 上一次知识查询的文章标题
    pub last_topic: Option<String>,
    /// 知识查询语言
    pub language: Language,
}

impl TurnContext {
    pub fn queries_remaining(&self) -> u32 {
        self.max_queries.saturating_sub(self.query_count)
    }
}

/// 回复后如何更新会话主题
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicUpdate {
    /// 保持不变
    Keep,
    /// 清除
    Clear,
    /// 设置为新的文章标题
    Set(String),
}

/// 会话服务 trait
#[async_trait]
pub trait SessionService: Send + Sync {
    /// 创建会话
    async fn create(&self, language: Option<Language>) -> Result<ChatSession>;

    /// 根据 ID 获取会话
    async fn get_by_id(&self, id: &str) -> Result<ChatSession>;

    /// 删除会话
    async fn delete(&self, id: &str) -> Result<()>;

    /// 清空对话，只保留开场白
    async fn clear(&self, id: &str) -> Result<ChatSession>;

    /// 修改知识查询语言
    async fn set_language(&self, id: &str, language: Language) -> Result<ChatSession>;

    /// 记录用户提问（检查并消耗提问次数）
    async fn record_user_turn(&self, id: &str, content: &str) -> Result<TurnContext>;

    /// 记录助手回复
    async fn record_assistant_turn(
        &self,
        id: &str,
        turn: ConversationTurn,
        topic: TopicUpdate,
    ) -> Result<()>;

    /// 收藏最近一条助手回复
    async fn save_favorite(&self, id: &str) -> Result<Favorite>;

    /// 收藏列表（最新在前）
    async fn list_favorites(&self, id: &str) -> Result<Vec<Favorite>>;

    /// 删除收藏
    async fn remove_favorite(&self, id: &str, favorite_id: &str) -> Result<()>;

    /// 当前会话数量
    async fn count(&self) -> usize;

    /// 回收空闲超时的会话，返回回收数量
    async fn purge_idle(&self) -> usize;

    /// 每个会话允许的提问次数
    fn max_queries(&self) -> u32;
}

/// 内存会话服务实现
///
/// 空闲超过 `idle_ttl` 的会话在创建新会话时（以及后台定时任务中）回收；
/// 会话数达到 `max_sessions` 时淘汰最久未活动的一个。
pub struct SessionServiceImpl {
    sessions: DashMap<String, ChatSession>,
    max_queries: u32,
    default_language: Language,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl SessionServiceImpl {
    /// 创建新的服务实例，使用默认的回收设置
    pub fn new(max_queries: u32, default_language: Language) -> Self {
        Self {
            sessions: DashMap::new(),
            max_queries,
            default_language,
            idle_ttl: Duration::seconds(DEFAULT_IDLE_TTL_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// 设置空闲回收时间和会话数量上限
    pub fn with_retention(mut self, idle_ttl: Duration, max_sessions: usize) -> Self {
        self.idle_ttl = idle_ttl;
        self.max_sessions = max_sessions.max(1);
        self
    }

    fn not_found(id: &str) -> AppError {
        AppError::NotFound(format!("Session not found: {}", id))
    }

    /// 取出会话的可变引用并记录活动时间
    fn active_entry(&self, id: &str) -> Result<RefMut<'_, String, ChatSession>> {
        let mut entry = self.sessions.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        entry.touch();
        Ok(entry)
    }

    fn sweep_idle(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_idle(now, self.idle_ttl));
        before.saturating_sub(self.sessions.len())
    }

    fn evict_least_recent(&self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.last_active)
            .map(|entry| entry.key().clone());
        if let Some(id) = oldest {
            self.sessions.remove(&id);
            info!(session_id = %id, "Session evicted (store full)");
        }
    }
}

#[async_trait]
impl SessionService for SessionServiceImpl {
    async fn create(&self, language: Option<Language>) -> Result<ChatSession> {
        let purged = self.sweep_idle();
        if purged > 0 {
            debug!(purged, "Idle sessions purged");
        }
        while self.sessions.len() >= self.max_sessions {
            self.evict_least_recent();
        }

        let session = ChatSession::new(language.unwrap_or(self.default_language));
        self.sessions.insert(session.id.clone(), session.clone());
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }

    async fn get_by_id(&self, id: &str) -> Result<ChatSession> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))?;
        info!(session_id = %id, "Session deleted");
        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<ChatSession> {
        let mut entry = self.active_entry(id)?;
        entry.clear();
        debug!(session_id = %id, "Session cleared");
        Ok(entry.value().clone())
    }

    async fn set_language(&self, id: &str, language: Language) -> Result<ChatSession> {
        let mut entry = self.active_entry(id)?;
        entry.language = language;
        Ok(entry.value().clone())
    }

    async fn record_user_turn(&self, id: &str, content: &str) -> Result<TurnContext> {
        let mut entry = self.active_entry(id)?;

        if entry.query_count >= self.max_queries {
            return Err(AppError::SessionLimit);
        }

        entry.query_count += 1;
        entry.push(ConversationTurn::user(content));

        Ok(TurnContext {
            query_count: entry.query_count,
            max_queries: self.max_queries,
            last_topic: entry.last_topic.clone(),
            language: entry.language,
        })
    }

    async fn record_assistant_turn(
        &self,
        id: &str,
        turn: ConversationTurn,
        topic: TopicUpdate,
    ) -> Result<()> {
        let mut entry = self.active_entry(id)?;
        entry.push(turn);
        match topic {
            TopicUpdate::Keep => {}
            TopicUpdate::Clear => entry.last_topic = None,
            TopicUpdate::Set(title) => entry.last_topic = Some(title),
        }
        Ok(())
    }

    async fn save_favorite(&self, id: &str) -> Result<Favorite> {
        let mut entry = self.active_entry(id)?;
        entry
            .save_last_answer()
            .ok_or_else(|| AppError::Validation("There is no answer to save yet".to_string()))
    }

    async fn list_favorites(&self, id: &str) -> Result<Vec<Favorite>> {
        Ok(self.get_by_id(id).await?.favorites_newest_first())
    }

    async fn remove_favorite(&self, id: &str, favorite_id: &str) -> Result<()> {
        let mut entry = self.active_entry(id)?;
        if entry.remove_favorite(favorite_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Favorite not found: {}",
                favorite_id
            )))
        }
    }

    async fn count(&self) -> usize {
        self.sessions.len()
    }

    async fn purge_idle(&self) -> usize {
        let purged = self.sweep_idle();
        if purged > 0 {
            info!(purged, "Idle sessions purged");
        }
        purged
    }

    fn max_queries(&self) -> u32 {
        self.max_queries
    }
}

/// 根据配置创建会话服务
pub fn create_session_service(settings: &SessionSettings) -> Box<dyn SessionService> {
    let default_language = Language::from_code(&settings.default_language).unwrap_or_default();
    let idle_ttl = Duration::seconds(i64::try_from(settings.idle_ttl_secs).unwrap_or(i64::MAX));
    Box::new(
        SessionServiceImpl::new(settings.max_queries, default_language)
            .with_retention(idle_ttl, settings.max_sessions),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, TurnKind, TurnMeta};

    fn service() -> SessionServiceImpl {
        SessionServiceImpl::new(2, Language::En)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service();
        let session = service.create(Some(Language::Es)).await.unwrap();
        let fetched = service.get_by_id(&session.id).await.unwrap();
        assert_eq!(fetched.language, Language::Es);
        assert_eq!(service.count().await, 1);
    }

    #[tokio::test]
    async fn test_default_language() {
        let session = service().create(None).await.unwrap();
        assert_eq!(session.language, Language::En);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let service = service();
        assert!(matches!(
            service.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.record_user_turn("missing", "hi").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(service.delete("missing").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_query_limit() {
        let service = service();
        let session = service.create(None).await.unwrap();

        let first = service.record_user_turn(&session.id, "one").await.unwrap();
        assert_eq!(first.query_count, 1);
        assert_eq!(first.queries_remaining(), 1);
        service.record_user_turn(&session.id, "two").await.unwrap();

        assert!(matches!(
            service.record_user_turn(&session.id, "three").await,
            Err(AppError::SessionLimit)
        ));

        let session = service.get_by_id(&session.id).await.unwrap();
        assert_eq!(session.turns.len(), 3);
    }

    #[tokio::test]
    async fn test_clear_restores_query_budget() {
        let service = service();
        let session = service.create(None).await.unwrap();
        service.record_user_turn(&session.id, "one").await.unwrap();
        service.record_user_turn(&session.id, "two").await.unwrap();

        let cleared = service.clear(&session.id).await.unwrap();
        assert_eq!(cleared.turns.len(), 1);
        assert!(service.record_user_turn(&session.id, "three").await.is_ok());
    }

    #[tokio::test]
    async fn test_topic_updates() {
        let service = service();
        let session = service.create(None).await.unwrap();
        let reply = || ConversationTurn::assistant("text", TurnMeta::of_kind(TurnKind::Knowledge));

        service
            .record_assistant_turn(&session.id, reply(), TopicUpdate::Set("Stroke".into()))
            .await
            .unwrap();
        let context = service.record_user_turn(&session.id, "and that?").await.unwrap();
        assert_eq!(context.last_topic.as_deref(), Some("Stroke"));

        service
            .record_assistant_turn(&session.id, reply(), TopicUpdate::Keep)
            .await
            .unwrap();
        assert_eq!(
            service.get_by_id(&session.id).await.unwrap().last_topic.as_deref(),
            Some("Stroke")
        );

        service
            .record_assistant_turn(&session.id, reply(), TopicUpdate::Clear)
            .await
            .unwrap();
        assert!(service.get_by_id(&session.id).await.unwrap().last_topic.is_none());
    }

    #[tokio::test]
    async fn test_favorites_roundtrip() {
        let service = service();
        let session = service.create(None).await.unwrap();

        let favorite = service.save_favorite(&session.id).await.unwrap();
        assert_eq!(service.list_favorites(&session.id).await.unwrap().len(), 1);

        service.remove_favorite(&session.id, &favorite.id).await.unwrap();
        assert!(matches!(
            service.remove_favorite(&session.id, &favorite.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    fn backdate(service: &SessionServiceImpl, id: &str, minutes: i64) {
        service.sessions.get_mut(id).unwrap().last_active =
            Utc::now() - Duration::minutes(minutes);
    }

    #[tokio::test]
    async fn test_idle_session_evicted_on_create() {
        let service = service().with_retention(Duration::minutes(30), 100);
        let idle = service.create(None).await.unwrap();
        let active = service.create(None).await.unwrap();
        backdate(&service, &idle.id, 45);
        backdate(&service, &active.id, 10);

        service.create(None).await.unwrap();

        assert!(matches!(
            service.get_by_id(&idle.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.get_by_id(&active.id).await.is_ok());
        assert_eq!(service.count().await, 2);
    }

    #[tokio::test]
    async fn test_purge_idle() {
        let service = service().with_retention(Duration::minutes(30), 100);
        let session = service.create(None).await.unwrap();
        assert_eq!(service.purge_idle().await, 0);

        backdate(&service, &session.id, 31);
        assert_eq!(service.purge_idle().await, 1);
        assert_eq!(service.count().await, 0);
    }

    #[tokio::test]
    async fn test_activity_keeps_session_alive() {
        let service = service().with_retention(Duration::minutes(30), 100);
        let session = service.create(None).await.unwrap();
        backdate(&service, &session.id, 45);

        service.record_user_turn(&session.id, "still here").await.unwrap();

        assert_eq!(service.purge_idle().await, 0);
    }

    #[tokio::test]
    async fn test_full_store_evicts_least_recent() {
        let service = service().with_retention(Duration::minutes(30), 2);
        let oldest = service.create(None).await.unwrap();
        let newer = service.create(None).await.unwrap();
        backdate(&service, &oldest.id, 20);
        backdate(&service, &newer.id, 5);

        let newest = service.create(None).await.unwrap();

        assert_eq!(service.count().await, 2);
        assert!(service.get_by_id(&oldest.id).await.is_err());
        assert!(service.get_by_id(&newer.id).await.is_ok());
        assert!(service.get_by_id(&newest.id).await.is_ok());
    }

    #[test]
    fn test_factory_reads_settings() {
        let settings = SessionSettings {
            max_queries: 5,
            default_language: "fr".into(),
            idle_ttl_secs: 60,
            max_sessions: 3,
        };
        let service = create_session_service(&settings);
        assert_eq!(service.max_queries(), 5);
    }

    #[tokio::test]
    async fn test_turn_order_preserved() {
        let service = service();
        let session = service.create(None).await.unwrap();
        service.record_user_turn(&session.id, "question").await.unwrap();
        service
            .record_assistant_turn(
                &session.id,
                ConversationTurn::assistant("answer", TurnMeta::of_kind(TurnKind::Fallback)),
                TopicUpdate::Keep,
            )
            .await
            .unwrap();

        let roles: Vec<Role> = service
            .get_by_id(&session.id)
            .await
            .unwrap()
            .turns
            .iter()
            .map(|t| t.role)
            .collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }
}
