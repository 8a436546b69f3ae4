use crate::api::handlers::screening_handler::run_screening;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建自查路由器
pub fn create_screening_router() -> Router<AppState> {
    Router::new().route("/screening", post(run_screening))
}
