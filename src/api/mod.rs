//! API 模块
//!
//! 提供 REST API 支持。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use crate::api::app_state::AppState;
use crate::observability::metrics_middleware;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// 创建 API 路由，所有接口挂在 `/api/v1` 下
pub fn create_router(app_state: AppState, cors_permissive: bool) -> Router {
    let api = Router::new()
        .merge(routes::session_routes::create_session_router())
        .merge(routes::chat_routes::create_chat_router())
        .merge(routes::screening_routes::create_screening_router());

    let router = Router::new()
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn_with_state(
            app_state.metrics.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
