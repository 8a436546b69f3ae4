//! Ollama 知识查询
//!
//! 直接向本地语言模型提问，适合无法访问 Wikipedia 的部署环境。

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use super::{KnowledgeArticle, KnowledgeProvider, truncate_summary};
use crate::config::KnowledgeConfig;
use crate::error::{AppError, Result};
use crate::models::Language;

const TITLE_CHARS: usize = 60;

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama 客户端
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
    max_summary_chars: usize,
}

impl OllamaProvider {
    pub fn new(config: &KnowledgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model_name: config.ollama_model.clone(),
            max_summary_chars: config.max_summary_chars,
        })
    }

    fn prompt(query: &str, language: Language) -> String {
        let language_name = match language {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
        };
        format!(
            "You are InMind, an educational assistant about brain health. \
             Answer in {} with at most three short, factual sentences for a general audience. \
             Do not give a diagnosis.\n\nQuestion: {}",
            language_name, query
        )
    }

    async fn generate(&self, query: &str, language: Language) -> Result<Option<KnowledgeArticle>> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&serde_json::json!({
                "model": self.model_name,
                "prompt": Self::prompt(query, language),
                "stream": false
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::KnowledgeLookup(format!(
                "Ollama returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await?;
        let answer = body.response.trim();
        if answer.is_empty() {
            return Ok(None);
        }

        Ok(Some(KnowledgeArticle {
            title: query.trim().chars().take(TITLE_CHARS).collect(),
            summary: truncate_summary(answer, self.max_summary_chars),
            url: None,
            source: format!("Ollama ({})", self.model_name),
        }))
    }
}

#[async_trait]
impl KnowledgeProvider for OllamaProvider {
    async fn lookup(&self, query: &str, language: Language) -> Option<KnowledgeArticle> {
        match self.generate(query, language).await {
            Ok(article) => article,
            Err(e) => {
                warn!("Ollama lookup failed: {}", e);
                None
            }
        }
    }

    /// 模型回答没有对应的原文，追问时改走普通查询
    async fn article_context(
        &self,
        _title: &str,
        _query: &str,
        _language: Language,
    ) -> Option<KnowledgeArticle> {
        None
    }
}
