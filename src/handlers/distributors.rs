// src/handlers/distributors.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{DistributorRole, RequireRole},
    },
    models::distributor::DistributorProfile,
};

#[utoipa::path(
    get,
    path = "/api/distributors/me",
    tag = "Distributors",
    responses((status = 200, description = "The distributor with its formatted address", body = DistributorProfile)),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<DistributorRole>,
) -> Result<impl IntoResponse, AppError> {
    let profile = app_state.distributor_service.profile(principal.id).await?;
    Ok(Json(profile))
}
