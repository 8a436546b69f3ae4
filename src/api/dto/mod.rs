//! DTO 模块
//!
//! 定义 API 请求和响应的数据结构。

pub mod chat_dto;
pub mod session_dto;
