use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::session_dto::*},
    error::AppError,
    models::Language,
    services::transcript,
};

fn parse_language(code: &str) -> Result<Language, AppError> {
    Language::from_code(code)
        .ok_or_else(|| AppError::Validation(format!("Unsupported language: {}", code)))
}

pub async fn create_session(
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let language = request.language.as_deref().map(parse_language).transpose()?;

    let session = state.session_service.create(language).await?;
    state.metrics.record_session_created();

    let response = SessionResponse::from_session(session, state.session_service.max_queries());
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting session: {}", id);

    let session = state.session_service.get_by_id(&id).await?;
    Ok(Json(SessionResponse::from_session(
        session,
        state.session_service.max_queries(),
    )))
}

pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let language = parse_language(&request.language)?;
    debug!("Updating session {} language to {}", id, language.code());

    let session = state.session_service.set_language(&id, language).await?;
    Ok(Json(SessionResponse::from_session(
        session,
        state.session_service.max_queries(),
    )))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.session_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.session_service.clear(&id).await?;
    Ok(Json(SessionResponse::from_session(
        session,
        state.session_service.max_queries(),
    )))
}

/// 以附件形式下载对话记录
pub async fn download_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TranscriptParams>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.session_service.get_by_id(&id).await?;
    let transcript = transcript::export(&session, params.format);

    let disposition = format!("attachment; filename=\"{}\"", transcript.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, transcript.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        transcript.body,
    ))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let favorites = state.session_service.list_favorites(&id).await?;
    let total = favorites.len();
    Ok(Json(FavoriteListResponse { favorites, total }))
}

pub async fn save_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let favorite = state.session_service.save_favorite(&id).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path((id, favorite_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .session_service
        .remove_favorite(&id, &favorite_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
