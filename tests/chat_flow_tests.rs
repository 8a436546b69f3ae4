//! 对话流程集成测试
//!
//! 使用真实的分类器和会话服务，知识查询替换为记录查询内容的桩实现。

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use inmind::classifier::{Classifier, EMERGENCY_MESSAGE, HEURISTIC_DISCLAIMER, tables};
use inmind::knowledge::{KnowledgeArticle, KnowledgeProvider};
use inmind::models::{Language, Outcome};
use inmind::observability::AppMetrics;
use inmind::services::chat::{ChatService, FALLBACK_MESSAGE, ReplyOutcome, create_chat_service};
use inmind::services::session::{SessionService, SessionServiceImpl};
use inmind::services::transcript::{self, TranscriptFormat};

fn stub_article(title: &str, summary: String) -> KnowledgeArticle {
    KnowledgeArticle {
        title: title.to_string(),
        url: Some(format!("https://en.wikipedia.org/wiki/{}", title)),
        summary,
        source: "Wikipedia".to_string(),
    }
}

/// 按完整查询（小写、去掉结尾问号）返回文章；按标题摘取上下文的页面单独登记
#[derive(Default)]
struct StubProvider {
    articles: HashMap<String, KnowledgeArticle>,
    pages: HashMap<String, String>,
    queries: Mutex<Vec<String>>,
    contexts: Mutex<Vec<(String, String)>>,
}

impl StubProvider {
    fn with_article(mut self, query: &str, title: &str) -> Self {
        self.articles
            .insert(query.to_string(), stub_article(title, format!("{} summary.", title)));
        self
    }

    /// 登记一篇只覆盖 `keyword` 的文章
    fn with_page(mut self, title: &str, keyword: &str) -> Self {
        self.pages.insert(title.to_string(), keyword.to_string());
        self
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn contexts(&self) -> Vec<(String, String)> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeProvider for StubProvider {
    async fn lookup(&self, query: &str, _language: Language) -> Option<KnowledgeArticle> {
        self.queries.lock().unwrap().push(query.to_string());
        let key = query.trim().trim_end_matches('?').to_lowercase();
        self.articles.get(&key).cloned()
    }

    async fn article_context(
        &self,
        title: &str,
        query: &str,
        _language: Language,
    ) -> Option<KnowledgeArticle> {
        self.contexts
            .lock()
            .unwrap()
            .push((title.to_string(), query.to_string()));
        self.pages
            .get(title)
            .filter(|keyword| query.to_lowercase().contains(keyword.as_str()))
            .map(|_| stub_article(title, format!("{} context for: {}", title, query)))
    }
}

struct Harness {
    sessions: Arc<SessionServiceImpl>,
    chat: Box<dyn ChatService>,
    provider: Arc<StubProvider>,
    metrics: Arc<AppMetrics>,
}

fn harness(classifier: Classifier, provider: StubProvider) -> Harness {
    let sessions = Arc::new(SessionServiceImpl::new(10, Language::En));
    let provider = Arc::new(provider);
    let metrics = Arc::new(AppMetrics::default());
    let chat = create_chat_service(
        sessions.clone(),
        Arc::new(classifier),
        provider.clone(),
        metrics.clone(),
    );
    Harness {
        sessions,
        chat,
        provider,
        metrics,
    }
}

fn default_provider() -> StubProvider {
    StubProvider::default()
        .with_article("what is hydrocephalus", "Hydrocephalus")
        .with_article("meningitis", "Meningitis")
        .with_article("is it inherited", "Pronoun")
        .with_page("Hydrocephalus", "cause")
}

#[tokio::test]
async fn test_follow_up_uses_previous_topic() {
    let h = harness(Classifier::builtin().unwrap(), default_provider());
    let session = h.sessions.create(None).await.unwrap();

    let first = h.chat.send_message(&session.id, "What is hydrocephalus?").await.unwrap();
    assert_eq!(first.outcome, ReplyOutcome::Knowledge);
    assert!(first.reply.content.starts_with("I found **Hydrocephalus** on Wikipedia:"));

    let second = h.chat.send_message(&session.id, "what causes it?").await.unwrap();
    assert_eq!(second.outcome, ReplyOutcome::Knowledge);
    assert!(second.reply.content.starts_with("I used context from **Hydrocephalus**:"));
    assert!(second.reply.content.contains("Hydrocephalus context for: what causes it?"));
    assert!(second.suggestions.is_empty());

    assert_eq!(h.provider.queries(), vec!["What is hydrocephalus?"]);
    assert_eq!(
        h.provider.contexts(),
        vec![("Hydrocephalus".to_string(), "what causes it?".to_string())]
    );
}

#[tokio::test]
async fn test_follow_up_never_credits_topic_for_another_article() {
    let provider = StubProvider::default()
        .with_article("what is hydrocephalus", "Hydrocephalus")
        .with_article("is it inherited", "Pronoun");
    let h = harness(Classifier::builtin().unwrap(), provider);
    let session = h.sessions.create(None).await.unwrap();

    h.chat.send_message(&session.id, "What is hydrocephalus?").await.unwrap();
    let reply = h.chat.send_message(&session.id, "is it inherited").await.unwrap();

    assert_eq!(reply.outcome, ReplyOutcome::Knowledge);
    assert!(!reply.reply.content.contains("context from"));
    assert!(!reply.reply.content.contains("Hydrocephalus"));
    assert!(reply.reply.content.starts_with("I found **Pronoun** on Wikipedia:"));
    assert_eq!(reply.reply.meta.title.as_deref(), Some("Pronoun"));
    assert_eq!(
        reply.reply.meta.url.as_deref(),
        Some("https://en.wikipedia.org/wiki/Pronoun")
    );
}

#[tokio::test]
async fn test_follow_up_miss_retries_plain_query() {
    let h = harness(Classifier::builtin().unwrap(), default_provider());
    let session = h.sessions.create(None).await.unwrap();

    h.chat.send_message(&session.id, "What is hydrocephalus?").await.unwrap();
    let reply = h.chat.send_message(&session.id, "meningitis").await.unwrap();

    assert_eq!(reply.outcome, ReplyOutcome::Knowledge);
    assert_eq!(reply.reply.meta.title.as_deref(), Some("Meningitis"));
    assert!(reply.reply.content.starts_with("I found **Meningitis**"));
    assert_eq!(h.provider.queries()[1..].to_vec(), vec!["meningitis"]);
    assert_eq!(h.provider.contexts().len(), 1);

    let session = h.sessions.get_by_id(&session.id).await.unwrap();
    assert_eq!(session.last_topic.as_deref(), Some("Meningitis"));
}

#[tokio::test]
async fn test_emergency_clears_topic_and_skips_lookup() {
    let h = harness(Classifier::builtin().unwrap(), default_provider());
    let session = h.sessions.create(None).await.unwrap();

    h.chat.send_message(&session.id, "What is hydrocephalus?").await.unwrap();
    let emergency = h.chat.send_message(&session.id, "Please call 911").await.unwrap();
    assert_eq!(emergency.outcome, ReplyOutcome::Emergency);
    assert_eq!(emergency.reply.content, EMERGENCY_MESSAGE);
    assert_eq!(h.provider.queries().len(), 1);

    let reply = h.chat.send_message(&session.id, "what causes it?").await.unwrap();
    assert_eq!(reply.outcome, ReplyOutcome::Fallback);
    assert_eq!(reply.reply.content, FALLBACK_MESSAGE);
    assert_eq!(h.provider.queries().last().map(String::as_str), Some("what causes it?"));
}

#[tokio::test]
async fn test_advice_does_not_call_knowledge() {
    let h = harness(Classifier::builtin().unwrap(), default_provider());
    let session = h.sessions.create(None).await.unwrap();

    let reply = h
        .chat
        .send_message(&session.id, "I've had a migraine and my hand feels numb")
        .await
        .unwrap();

    assert_eq!(reply.outcome, ReplyOutcome::Advice);
    assert_eq!(reply.matched_categories, vec!["headache", "numbness"]);
    assert!(reply.reply.content.ends_with(HEURISTIC_DISCLAIMER));
    assert!(h.provider.queries().is_empty());
    assert!(h.metrics.gather().contains("chat_advice_total 1"));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let h = harness(Classifier::builtin().unwrap(), default_provider());
    let a = h.sessions.create(None).await.unwrap();
    let b = h.sessions.create(None).await.unwrap();

    h.chat.send_message(&a.id, "What is hydrocephalus?").await.unwrap();
    let reply = h.chat.send_message(&b.id, "what causes it?").await.unwrap();

    assert_eq!(reply.outcome, ReplyOutcome::Fallback);
    assert_eq!(reply.queries_used, 1);
    assert!(h.sessions.get_by_id(&b.id).await.unwrap().last_topic.is_none());
}

#[tokio::test]
async fn test_custom_tables_drive_chat() {
    let classifier = tables::load_from_str(
        r#"
emergency_triggers = ["passed out"]

[[categories]]
name = "balance"
triggers = ["dizzy", "vertigo"]

[categories.advice]
area = "Possible area: Vestibular disorder."
watch = "Watch: spinning sensation, nausea."
next_steps = "ENT or neurology review."
meanwhile = "Meanwhile: sit down when dizzy."
"#,
    )
    .unwrap()
    .build()
    .unwrap();

    assert_eq!(classifier.respond("Vertigo again").outcome(), Outcome::Matched);
    assert_eq!(classifier.respond("I keep forgetting").outcome(), Outcome::Unmatched);

    let h = harness(classifier, StubProvider::default());
    let session = h.sessions.create(None).await.unwrap();
    let reply = h.chat.send_message(&session.id, "I get dizzy").await.unwrap();
    assert_eq!(reply.matched_categories, vec!["balance"]);
    assert!(reply.reply.content.contains("**Next steps:** ENT or neurology review."));

    let reply = h.chat.send_message(&session.id, "she passed out").await.unwrap();
    assert_eq!(reply.outcome, ReplyOutcome::Emergency);
}

#[tokio::test]
async fn test_transcript_contains_whole_conversation() {
    let h = harness(Classifier::builtin().unwrap(), default_provider());
    let session = h.sessions.create(None).await.unwrap();
    h.chat.send_message(&session.id, "What is hydrocephalus?").await.unwrap();

    let session = h.sessions.get_by_id(&session.id).await.unwrap();
    let text = transcript::export(&session, TranscriptFormat::Text);

    assert_eq!(text.file_name, "inmind_chat.txt");
    assert!(text.body.contains("You: What is hydrocephalus?"));
    assert!(text.body.contains("(source: https://en.wikipedia.org/wiki/Hydrocephalus)"));
}
