//! Wikipedia 知识查询
//!
//! 使用 MediaWiki API：先搜索标题，再取首个结果的导语摘要。
//! 追问时直接读取上一篇文章的全文，摘取与问题相关的句子。

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{KnowledgeArticle, KnowledgeProvider, relevant_sentences, truncate_summary};
use crate::config::KnowledgeConfig;
use crate::error::{AppError, Result};
use crate::models::Language;

const SEARCH_RESULTS: &str = "3";
const USER_AGENT: &str = concat!("inmind/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// Wikipedia 查询客户端
pub struct WikipediaProvider {
    client: reqwest::Client,
    base_url_override: Option<String>,
    summary_sentences: u32,
    max_summary_chars: usize,
}

impl WikipediaProvider {
    pub fn new(config: &KnowledgeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url_override: config
                .wikipedia_base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            summary_sentences: config.summary_sentences.max(1),
            max_summary_chars: config.max_summary_chars,
        })
    }

    fn base_url(&self, language: Language) -> String {
        match &self.base_url_override {
            Some(url) => url.clone(),
            None => format!("https://{}.wikipedia.org", language.code()),
        }
    }

    async fn search(&self, base: &str, query: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/w/api.php", base))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", SEARCH_RESULTS),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(body
            .query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title))
    }

    /// 读取文章正文；`intro_only` 时只取导语的前几句
    async fn extract(
        &self,
        base: &str,
        title: &str,
        intro_only: bool,
    ) -> Result<Option<ExtractPage>> {
        let sentences = self.summary_sentences.to_string();
        let mut params = vec![
            ("action", "query"),
            ("prop", "extracts|info"),
            ("explaintext", "1"),
            ("inprop", "url"),
            ("redirects", "1"),
            ("titles", title),
            ("format", "json"),
            ("formatversion", "2"),
        ];
        if intro_only {
            params.push(("exintro", "1"));
            params.push(("exsentences", sentences.as_str()));
        }

        let response = self
            .client
            .get(format!("{}/w/api.php", base))
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        let body: ExtractResponse = response.json().await?;
        Ok(body
            .query
            .and_then(|q| q.pages.into_iter().find(|page| !page.missing)))
    }

    /// 转换为文章；正文为空视为查询失败
    fn into_article(
        &self,
        base: &str,
        page: ExtractPage,
        summarize: impl FnOnce(&str) -> String,
    ) -> Result<KnowledgeArticle> {
        let extract = page.extract.as_deref().unwrap_or_default().trim();
        if extract.is_empty() {
            return Err(AppError::KnowledgeLookup(format!(
                "empty extract for '{}'",
                page.title
            )));
        }

        let summary = truncate_summary(&summarize(extract), self.max_summary_chars);
        let url = page
            .fullurl
            .unwrap_or_else(|| format!("{}/wiki/{}", base, urlencoding::encode(&page.title)));

        Ok(KnowledgeArticle {
            title: page.title,
            summary,
            url: Some(url),
            source: "Wikipedia".to_string(),
        })
    }

    async fn fetch(&self, query: &str, language: Language) -> Result<Option<KnowledgeArticle>> {
        let base = self.base_url(language);

        let Some(title) = self.search(&base, query).await? else {
            debug!("No Wikipedia results for query");
            return Ok(None);
        };

        let Some(page) = self.extract(&base, &title, true).await? else {
            return Ok(None);
        };

        self.into_article(&base, page, str::to_string).map(Some)
    }

    async fn fetch_context(
        &self,
        title: &str,
        query: &str,
        language: Language,
    ) -> Result<Option<KnowledgeArticle>> {
        let base = self.base_url(language);

        let Some(page) = self.extract(&base, title, false).await? else {
            debug!(title = %title, "Topic article no longer available");
            return Ok(None);
        };

        let extract = page.extract.as_deref().unwrap_or_default();
        let Some(passage) = relevant_sentences(extract, query, self.summary_sentences as usize)
        else {
            debug!(title = %title, "Topic article does not cover the question");
            return Ok(None);
        };

        self.into_article(&base, page, |_| passage).map(Some)
    }
}

#[async_trait]
impl KnowledgeProvider for WikipediaProvider {
    async fn lookup(&self, query: &str, language: Language) -> Option<KnowledgeArticle> {
        match self.fetch(query, language).await {
            Ok(article) => article,
            Err(e) => {
                warn!("Wikipedia lookup failed: {}", e);
                None
            }
        }
    }

    async fn article_context(
        &self,
        title: &str,
        query: &str,
        language: Language,
    ) -> Option<KnowledgeArticle> {
        match self.fetch_context(title, query, language).await {
            Ok(article) => article,
            Err(e) => {
                warn!("Wikipedia article context failed: {}", e);
                None
            }
        }
    }
}
