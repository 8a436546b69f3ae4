use serde::{Deserialize, Serialize};

/// 分类决策的三种终态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// 命中紧急触发词
    Emergency,
    /// 命中至少一个类别
    Matched,
    /// 未命中，需要调用方转向外部知识查询
    Unmatched,
}

/// 单次分类的完整结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationResult {
    pub is_emergency: bool,
    /// 命中的类别（按类别表顺序，无重复）
    pub matched_categories: Vec<String>,
    pub advice_text: String,
}

/// 对外的应答结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifierResponse {
    pub is_emergency: bool,
    pub body: String,
    pub matched_any_category: bool,
    pub matched_categories: Vec<String>,
}

impl ClassifierResponse {
    pub fn outcome(&self) -> Outcome {
        if self.is_emergency {
            Outcome::Emergency
        } else if self.matched_any_category {
            Outcome::Matched
        } else {
            Outcome::Unmatched
        }
    }
}

impl From<ClassifierResponse> for ClassificationResult {
    fn from(response: ClassifierResponse) -> Self {
        Self {
            is_emergency: response.is_emergency,
            matched_categories: response.matched_categories,
            advice_text: response.body,
        }
    }
}
