// src/handlers/captcha.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{common::error::AppError, config::AppState, models::workflow::CaptchaRequest};

/// Sends a one-time code for step 1 of a flow. Delivery happens in the
/// background, so a 202 only means the code was issued.
#[utoipa::path(
    post,
    path = "/api/captcha",
    tag = "Captcha",
    request_body = CaptchaRequest,
    responses(
        (status = 202, description = "Code issued"),
        (status = 400, description = "Invalid mobile or email"),
        (status = 404, description = "No account to reset"),
        (status = 409, description = "Mobile already bound")
    )
)]
pub async fn request_captcha(
    State(app_state): State<AppState>,
    Json(payload): Json<CaptchaRequest>,
) -> Result<impl IntoResponse, AppError> {
    app_state.captcha_service.request(&payload).await?;
    Ok(StatusCode::ACCEPTED)
}
