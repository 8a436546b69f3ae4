//! Chat Routes

use crate::api::handlers::chat_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建对话路由器
pub fn create_chat_router() -> Router<AppState> {
    Router::new()
        .route("/sessions/:id/messages", post(send_message))
        .route("/classify", post(classify))
        .route("/faqs", get(faqs))
}
