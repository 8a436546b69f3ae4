//! Handlers 模块
//!
//! 处理 API 请求。

pub mod chat_handler;
pub mod screening_handler;
pub mod session_handler;
