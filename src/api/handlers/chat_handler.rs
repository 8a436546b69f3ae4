use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::chat_dto::*},
    error::AppError,
    services::chat::{FAQ_QUESTIONS, TRUSTED_RESOURCES},
};

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Message received for session: {}", id);

    let reply = state.chat_service.send_message(&id, &request.content).await?;
    Ok(Json(reply))
}

/// 无状态分类，不消耗会话提问次数，也不调用外部知识服务
pub async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.classifier.respond(&request.text);
    Ok(Json(ClassifyResponse::from(response)))
}

pub async fn faqs() -> impl IntoResponse {
    Json(FaqResponse {
        questions: FAQ_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        resources: TRUSTED_RESOURCES
            .iter()
            .map(|(name, url)| ResourceLink {
                name: name.to_string(),
                url: url.to_string(),
            })
            .collect(),
    })
}
