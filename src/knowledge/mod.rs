//! 知识查询模块
//!
//! 分类器未命中时，由这里的提供方回答用户的问题：按问题查询文章，
//! 或在追问时从上一篇文章中摘取相关句子。任何网络错误、超时或无法解析的
//! 响应都转换为 `None`，不会以错误的形式传到用户面前。

pub mod ollama;
pub mod wikipedia;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::KnowledgeConfig;
use crate::error::{AppError, Result};
use crate::models::Language;

pub use ollama::OllamaProvider;
pub use wikipedia::WikipediaProvider;

/// 查询结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeArticle {
    /// 文章标题
    pub title: String,
    /// 摘要
    pub summary: String,
    /// 原文地址
    pub url: Option<String>,
    /// 来源名称（展示给用户）
    pub source: String,
}

/// 知识查询提供方
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeProvider: Send + Sync {
    /// 查询；失败、超时与无结果都返回 `None`
    async fn lookup(&self, query: &str, language: Language) -> Option<KnowledgeArticle>;

    /// 从标题为 `title` 的文章中摘取与 `query` 相关的句子
    ///
    /// 返回的文章必须就是 `title` 这一篇；不支持按文章摘取的提供方返回 `None`。
    async fn article_context(
        &self,
        title: &str,
        query: &str,
        language: Language,
    ) -> Option<KnowledgeArticle>;
}

/// 关闭外部查询时使用
pub struct DisabledProvider;

#[async_trait]
impl KnowledgeProvider for DisabledProvider {
    async fn lookup(&self, _query: &str, _language: Language) -> Option<KnowledgeArticle> {
        None
    }

    async fn article_context(
        &self,
        _title: &str,
        _query: &str,
        _language: Language,
    ) -> Option<KnowledgeArticle> {
        None
    }
}

/// 句末标点后的空白
static SENTENCE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence break regex"));

/// 不参与句子匹配的常见词
const STOP_WORDS: &[&str] = &[
    "about", "does", "from", "have", "more", "tell", "that", "them", "there", "they", "this",
    "what", "when", "where", "which", "will", "with", "would", "could", "should",
];

/// 按句末标点切分句子
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for found in SENTENCE_BREAK_RE.find_iter(text) {
        let sentence = text[start..found.start() + 1].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = found.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| word.chars().count() >= 4 && !STOP_WORDS.contains(&word.as_str()))
        .collect()
}

/// 摘取文章中包含问题关键词的句子（最多 `max_sentences` 句）
///
/// 问题里没有关键词（如 "tell me more"）时返回开头的 `max_sentences` 句；
/// 有关键词但文章没有一句提到时返回 `None`。
pub fn relevant_sentences(text: &str, query: &str, max_sentences: usize) -> Option<String> {
    let sentences = split_sentences(text);
    let terms = query_terms(query);
    if terms.is_empty() {
        return Some(sentences.into_iter().take(max_sentences).collect::<Vec<_>>().join(" "));
    }

    let matched: Vec<&str> = sentences
        .iter()
        .copied()
        .filter(|sentence| {
            let lowered = sentence.to_lowercase();
            terms.iter().any(|term| lowered.contains(term.as_str()))
        })
        .take(max_sentences)
        .collect();

    if matched.is_empty() {
        None
    } else {
        Some(matched.join(" "))
    }
}

/// 截断摘要
///
/// 超过上限时在上限处截断，再退回到最后一个句号，并追加省略号。
pub fn truncate_summary(summary: &str, max_chars: usize) -> String {
    if summary.chars().count() <= max_chars {
        return summary.to_string();
    }

    let cut: String = summary.chars().take(max_chars).collect();
    let head = match cut.rfind('.') {
        Some(idx) => &cut[..idx],
        None => cut.as_str(),
    };
    format!("{}...", head)
}

/// 创建知识查询提供方
pub fn create_knowledge_provider(config: &KnowledgeConfig) -> Result<Arc<dyn KnowledgeProvider>> {
    let provider: Arc<dyn KnowledgeProvider> = match config.provider.as_str() {
        "wikipedia" => Arc::new(WikipediaProvider::new(config)?),
        "ollama" => Arc::new(OllamaProvider::new(config)?),
        "none" => Arc::new(DisabledProvider),
        other => {
            return Err(AppError::Config(format!(
                "unknown knowledge provider: {}",
                other
            )));
        }
    };

    info!(
        "Knowledge provider initialized: {} (timeout: {}s)",
        config.provider, config.timeout_secs
    );
    Ok(provider)
}
