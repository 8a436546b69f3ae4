use axum::{Json, response::IntoResponse};
use tracing::debug;

use crate::{
    error::AppError,
    services::screening::{self, ScreeningInput},
};

pub async fn run_screening(
    Json(input): Json<ScreeningInput>,
) -> Result<impl IntoResponse, AppError> {
    debug!(age = input.age, symptoms = input.symptoms.len(), "Running early check");

    let result = screening::evaluate(&input)?;
    Ok(Json(result))
}
