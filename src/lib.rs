//! InMind - 脑健康对话助手服务
//!
//! 对用户的健康描述做关键词分类：紧急情况优先提示就医，命中症状类别时
//! 给出对应建议，都未命中时查询外部知识源。会话只保存在内存中。

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod observability;
pub mod services;
