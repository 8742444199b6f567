//! Birthday letter generation endpoint.

use axum::{extract::State, Json};
use domain::models::letter::GenerateLetterResponse;
use domain::models::GenerateLetterRequest;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Generate a personalized birthday letter.
///
/// POST /api/v1/letters
pub async fn generate_letter(
    State(state): State<AppState>,
    Json(request): Json<GenerateLetterRequest>,
) -> Result<Json<GenerateLetterResponse>, ApiError> {
    request.validate()?;

    let letter = state.letters.generate(&request).await?;

    Ok(Json(GenerateLetterResponse {
        success: true,
        letter,
    }))
}
