//! 核心数据模型模块
//!
//! 定义 InMind 的核心数据结构：分类表、分类结果、会话与对话轮次。

pub mod category;
pub mod classification;
pub mod session;
pub mod turn;

pub use category::{AdviceParts, AdviceTemplate, EmergencyTriggerSet, KeywordCategory};
pub use classification::{ClassificationResult, ClassifierResponse, Outcome};
pub use session::{ChatSession, Favorite, Language};
pub use turn::{ConversationTurn, Role, TurnKind, TurnMeta};
