//! Session Routes
//!
//! 定义会话、收藏和导出相关的 API 路由。

use crate::api::handlers::session_handler::*;
use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::api::app_state::AppState;

/// 创建会话路由器
pub fn create_session_router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route(
            "/sessions/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route("/sessions/:id/clear", post(clear_session))
        .route("/sessions/:id/transcript", get(download_transcript))
        .route(
            "/sessions/:id/favorites",
            get(list_favorites).post(save_favorite),
        )
        .route(
            "/sessions/:id/favorites/:favorite_id",
            delete(remove_favorite),
        )
}
