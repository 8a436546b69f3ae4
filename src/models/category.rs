//! 分类表数据结构
//!
//! 关键词类别、建议模板与紧急触发词。全部在启动时构建，之后只读。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 关键词类别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordCategory {
    /// 类别名称，也是建议模板的关联键
    pub name: String,
    /// 触发短语（已转为小写，保持注册顺序）
    pub trigger_phrases: Vec<String>,
}

impl KeywordCategory {
    pub fn new<I, S>(name: &str, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.to_string(),
            trigger_phrases: normalize_phrases(phrases),
        }
    }

    /// 输入（已小写）是否包含任一触发短语
    ///
    /// 命中第一个短语即返回。
    pub fn matches(&self, lowered: &str) -> bool {
        self.trigger_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }
}

/// 建议模板
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdviceTemplate {
    /// 对应的类别名称
    pub category: String,
    /// 渲染好的建议正文
    pub body: String,
}

impl AdviceTemplate {
    /// 直接使用给定正文
    pub fn new(category: &str, body: &str) -> Self {
        Self {
            category: category.to_string(),
            body: body.to_string(),
        }
    }

    /// 由四段内容组装正文
    pub fn from_parts(category: &str, parts: &AdviceParts) -> Self {
        let body = format!(
            "**{}**\n\n{}\n\n**Next steps:** {}\n\n{}",
            parts.area, parts.watch, parts.next_steps, parts.meanwhile
        );
        Self {
            category: category.to_string(),
            body,
        }
    }
}

/// 建议的四个组成部分
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdviceParts {
    /// 可能涉及的领域
    pub area: String,
    /// 需要关注的表现
    pub watch: String,
    /// 下一步
    pub next_steps: String,
    /// 在此期间
    pub meanwhile: String,
}

/// 紧急触发词集合
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmergencyTriggerSet {
    phrases: Vec<String>,
}

impl EmergencyTriggerSet {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut normalized = normalize_phrases(phrases);
        normalized.retain(|p| seen.insert(p.clone()));
        Self { phrases: normalized }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// 输入（已小写）是否包含任一紧急短语
    pub fn matches(&self, lowered: &str) -> bool {
        self.phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }
}

fn normalize_phrases<I, S>(phrases: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    phrases
        .into_iter()
        .map(|p| p.as_ref().to_lowercase())
        .collect()
}
