// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, LoginPayload, Principal},
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed in with username, mobile or email", body = AuthResponse),
        (status = 401, description = "Wrong username or password")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = app_state
        .auth_service
        .login_user(&payload.username, &payload.password)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/vendors/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed in with mobile or email", body = AuthResponse),
        (status = 401, description = "Wrong username or password")
    )
)]
pub async fn vendor_login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = app_state
        .auth_service
        .login_vendor(&payload.username, &payload.password)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/distributors/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Wrong username or password"),
        (status = 403, description = "The distributor has been revoked")
    )
)]
pub async fn distributor_login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = app_state
        .auth_service
        .login_distributor(&payload.username, &payload.password)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/admin/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Signed in to the back office", body = AuthResponse),
        (status = 401, description = "Wrong username or password")
    )
)]
pub async fn admin_login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = app_state
        .auth_service
        .login_admin(&payload.username, &payload.password)
        .await?;
    Ok(Json(response))
}

// Any role; used by clients to check a stored token.
#[utoipa::path(
    get,
    path = "/api/auth/whoami",
    tag = "Auth",
    responses(
        (status = 200, description = "The token's subject and role"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("api_jwt" = []))
)]
pub async fn whoami(AuthenticatedUser(principal): AuthenticatedUser) -> impl IntoResponse {
    let Principal { id, role } = principal;
    Json(serde_json::json!({ "id": id, "role": role }))
}
