//! 症状分类模块
//!
//! 将用户输入按关键词表归类，并生成对应的建议文本。
//!
//! 匹配规则只有子串包含：输入统一转为小写后，与同样小写的触发短语比较，
//! 不做分词，也不检查词边界。类别按注册顺序逐一检查，一个输入可以命中
//! 多个类别，每个类别最多出现一次。紧急触发词优先于所有类别。
//!
//! [`Classifier`] 构建后不可变，可在多个会话间通过 `Arc` 共享。

pub mod tables;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ClassifierConfig;
use crate::error::{AppError, Result};
use crate::models::{
    AdviceTemplate, ClassificationResult, ClassifierResponse, EmergencyTriggerSet, KeywordCategory,
};

/// 附加在建议之后的免责声明
pub const HEURISTIC_DISCLAIMER: &str = "*This is a heuristic suggestion, not a diagnosis.*";

/// 多个建议块之间的分隔
pub const ADVICE_SEPARATOR: &str = "\n\n---\n\n";

/// 默认紧急提示
pub const EMERGENCY_MESSAGE: &str = "If this is an emergency (sudden weakness, face droop, loss of speech, unresponsiveness), call emergency services immediately. This tool is not for emergencies.";

/// 症状分类器
#[derive(Debug, Clone)]
pub struct Classifier {
    categories: Vec<KeywordCategory>,
    advice: HashMap<String, AdviceTemplate>,
    emergency: EmergencyTriggerSet,
    emergency_message: String,
}

impl Classifier {
    /// 创建构建器
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::default()
    }

    /// 使用内置关键词表构建
    pub fn builtin() -> Result<Self> {
        tables::builtin().build()
    }

    /// 是否为紧急情况
    pub fn detect_emergency(&self, text: &str) -> bool {
        self.emergency.matches(&text.to_lowercase())
    }

    /// 返回命中的类别名称（按注册顺序，无重复）
    pub fn classify(&self, text: &str) -> Vec<String> {
        self.classify_lowered(&text.to_lowercase())
    }

    fn classify_lowered(&self, lowered: &str) -> Vec<String> {
        self.categories
            .iter()
            .filter(|category| category.matches(lowered))
            .map(|category| category.name.clone())
            .collect()
    }

    /// 按给定顺序拼接建议块，并附加免责声明
    ///
    /// 输入为空时返回空字符串，由调用方决定兜底文本。
    pub fn render_advice<S: AsRef<str>>(&self, categories: &[S]) -> String {
        let blocks: Vec<&str> = categories
            .iter()
            .filter_map(|name| self.advice.get(name.as_ref()))
            .map(|template| template.body.as_str())
            .collect();

        if blocks.is_empty() {
            return String::new();
        }

        format!("{}\n\n{}", blocks.join(ADVICE_SEPARATOR), HEURISTIC_DISCLAIMER)
    }

    /// 对单条输入做出决策：紧急 / 命中 / 未命中
    pub fn respond(&self, text: &str) -> ClassifierResponse {
        let lowered = text.to_lowercase();

        if self.emergency.matches(&lowered) {
            debug!("Emergency trigger detected");
            return ClassifierResponse {
                is_emergency: true,
                body: self.emergency_message.clone(),
                matched_any_category: false,
                matched_categories: Vec::new(),
            };
        }

        let categories = self.classify_lowered(&lowered);
        if categories.is_empty() {
            return ClassifierResponse {
                is_emergency: false,
                body: String::new(),
                matched_any_category: false,
                matched_categories: categories,
            };
        }

        debug!(categories = ?categories, "Matched health categories");
        ClassifierResponse {
            is_emergency: false,
            body: self.render_advice(&categories),
            matched_any_category: true,
            matched_categories: categories,
        }
    }

    /// 以数据模型记录的形式返回分类结果
    pub fn classification(&self, text: &str) -> ClassificationResult {
        self.respond(text).into()
    }

    /// 类别名称（注册顺序）
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn emergency_message(&self) -> &str {
        &self.emergency_message
    }
}

/// 分类器构建器
///
/// 所有一致性检查都在 [`ClassifierBuilder::build`] 中完成。
#[derive(Debug, Clone, Default)]
pub struct ClassifierBuilder {
    categories: Vec<KeywordCategory>,
    advice: Vec<AdviceTemplate>,
    emergency_phrases: Vec<String>,
    emergency_message: Option<String>,
}

impl ClassifierBuilder {
    /// 注册类别
    pub fn category(mut self, category: KeywordCategory) -> Self {
        self.categories.push(category);
        self
    }

    /// 注册建议模板
    pub fn advice(mut self, template: AdviceTemplate) -> Self {
        self.advice.push(template);
        self
    }

    /// 注册紧急触发词
    pub fn emergency_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.emergency_phrases
            .extend(phrases.into_iter().map(|p| p.as_ref().to_string()));
        self
    }

    /// 覆盖紧急提示
    pub fn emergency_message(mut self, message: &str) -> Self {
        self.emergency_message = Some(message.to_string());
        self
    }

    /// 校验并冻结关键词表
    pub fn build(self) -> Result<Classifier> {
        let mut names = HashSet::new();
        for category in &self.categories {
            if !names.insert(category.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate category: {}",
                    category.name
                )));
            }
            if category.trigger_phrases.is_empty() {
                return Err(AppError::Config(format!(
                    "category '{}' has no trigger phrases",
                    category.name
                )));
            }
            if category.trigger_phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(AppError::Config(format!(
                    "category '{}' has an empty trigger phrase",
                    category.name
                )));
            }
        }

        if self.emergency_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(AppError::Config(
                "emergency trigger phrases must not be empty".to_string(),
            ));
        }

        let mut advice = HashMap::with_capacity(self.advice.len());
        for template in self.advice {
            if !names.contains(template.category.as_str()) {
                return Err(AppError::Config(format!(
                    "advice template for unknown category: {}",
                    template.category
                )));
            }
            if advice.contains_key(&template.category) {
                return Err(AppError::Config(format!(
                    "duplicate advice template: {}",
                    template.category
                )));
            }
            advice.insert(template.category.clone(), template);
        }

        if let Some(missing) = self
            .categories
            .iter()
            .find(|c| !advice.contains_key(&c.name))
        {
            return Err(AppError::Config(format!(
                "category '{}' has no advice template",
                missing.name
            )));
        }

        let emergency_message = match self.emergency_message {
            Some(message) if !message.trim().is_empty() => message,
            _ => EMERGENCY_MESSAGE.to_string(),
        };

        Ok(Classifier {
            categories: self.categories,
            advice,
            emergency: EmergencyTriggerSet::new(self.emergency_phrases),
            emergency_message,
        })
    }
}

/// 创建分类器
///
/// 配置了 `tables_path` 时从文件加载，否则使用内置表。
pub fn create_classifier(config: &ClassifierConfig) -> Result<Arc<Classifier>> {
    let classifier = match &config.tables_path {
        Some(path) => {
            info!("Loading classifier tables from {}", path.display());
            tables::load_from_file(path)?.build()?
        }
        None => Classifier::builtin()?,
    };

    info!(
        categories = classifier.categories.len(),
        emergency_triggers = classifier.emergency.phrases().len(),
        "Classifier tables validated"
    );

    Ok(Arc::new(classifier))
}
