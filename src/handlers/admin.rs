// src/handlers/admin.rs
//
// Back office. Every route here sits behind `auth_guard` and requires an
// admin token.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{AdminRole, RequireRole},
    models::{
        admin::{DataTable, Statistics, TableQuery},
        distributor::{DistributorProfile, DistributorRevocation},
        item::ItemSummary,
        vendor::{RejectVendorPayload, VendorProfile},
    },
};

#[utoipa::path(
    get,
    path = "/api/admin/statistics",
    tag = "Admin",
    responses((status = 200, description = "Dashboard counters", body = Statistics)),
    security(("api_jwt" = []))
)]
pub async fn get_statistics(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
) -> Result<impl IntoResponse, AppError> {
    let statistics = app_state.dashboard_service.statistics().await?;
    Ok(Json(statistics))
}

#[utoipa::path(
    get,
    path = "/api/admin/vendors",
    tag = "Admin",
    params(TableQuery),
    responses((status = 200, description = "All vendors", body = DataTable<VendorProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_vendors(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Query(query): Query<TableQuery>,
) -> Result<impl IntoResponse, AppError> {
    let table = app_state.dashboard_service.vendors(&query).await?;
    Ok(Json(table))
}

#[utoipa::path(
    get,
    path = "/api/admin/vendors/pending",
    tag = "Admin",
    responses((status = 200, description = "Vendors awaiting review", body = Vec<VendorProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_pending_vendors(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
) -> Result<impl IntoResponse, AppError> {
    let vendors = app_state.vendor_service.pending().await?;
    Ok(Json(vendors))
}

#[utoipa::path(
    post,
    path = "/api/admin/vendors/{id}/confirm",
    tag = "Admin",
    params(("id" = i32, Path, description = "Vendor id")),
    responses(
        (status = 204, description = "Vendor confirmed"),
        (status = 404, description = "No pending vendor with this id")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm_vendor(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.vendor_service.confirm(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/vendors/{id}/reject",
    tag = "Admin",
    params(("id" = i32, Path, description = "Vendor id")),
    request_body = RejectVendorPayload,
    responses(
        (status = 204, description = "Vendor rejected"),
        (status = 404, description = "No pending vendor with this id")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_vendor(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i32>,
    Json(payload): Json<RejectVendorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    app_state.vendor_service.reject(id, &payload.message).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/distributors",
    tag = "Admin",
    params(TableQuery),
    responses((status = 200, description = "All distributors", body = DataTable<DistributorProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_distributors(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Query(query): Query<TableQuery>,
) -> Result<impl IntoResponse, AppError> {
    let table = app_state.dashboard_service.distributors(&query).await?;
    Ok(Json(table))
}

#[utoipa::path(
    get,
    path = "/api/admin/revocations",
    tag = "Admin",
    responses((status = 200, description = "Pending revocation requests", body = Vec<DistributorRevocation>)),
    security(("api_jwt" = []))
)]
pub async fn list_revocations(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
) -> Result<impl IntoResponse, AppError> {
    let revocations = app_state.distributor_service.pending_revocations().await?;
    Ok(Json(revocations))
}

#[utoipa::path(
    post,
    path = "/api/admin/revocations/{id}/approve",
    tag = "Admin",
    params(("id" = i32, Path, description = "Revocation request id")),
    responses(
        (status = 204, description = "Distributor revoked and its city recounted"),
        (status = 404, description = "No pending request with this id")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_revocation(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.distributor_service.approve_revocation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/items",
    tag = "Admin",
    params(TableQuery),
    responses((status = 200, description = "All listed items", body = DataTable<ItemSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminRole>,
    Query(query): Query<TableQuery>,
) -> Result<impl IntoResponse, AppError> {
    let table = app_state.dashboard_service.items(&query).await?;
    Ok(Json(table))
}
