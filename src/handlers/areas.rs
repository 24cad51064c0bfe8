// src/handlers/areas.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{area::Area, distributor::CityDistributors},
};

#[utoipa::path(
    get,
    path = "/api/areas",
    tag = "Areas",
    responses((status = 200, description = "Every province, ordered by pinyin", body = Vec<Area>))
)]
pub async fn list_provinces(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let provinces = app_state.area_service.provinces().await?;
    Ok(Json(provinces))
}

#[utoipa::path(
    get,
    path = "/api/areas/{cn_id}",
    tag = "Areas",
    params(("cn_id" = i32, Path, description = "Administrative division code")),
    responses(
        (status = 200, description = "The area", body = Area),
        (status = 404, description = "No area with this code")
    )
)]
pub async fn get_area(
    State(app_state): State<AppState>,
    Path(cn_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let area = app_state.area_service.by_code(cn_id).await?;
    Ok(Json(area))
}

#[utoipa::path(
    get,
    path = "/api/areas/{cn_id}/children",
    tag = "Areas",
    params(("cn_id" = i32, Path, description = "Administrative division code")),
    responses(
        (status = 200, description = "Direct children; empty for districts", body = Vec<Area>),
        (status = 404, description = "No area with this code")
    )
)]
pub async fn list_children(
    State(app_state): State<AppState>,
    Path(cn_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let children = app_state.area_service.children(cn_id).await?;
    Ok(Json(children))
}

#[utoipa::path(
    get,
    path = "/api/areas/{cn_id}/chain",
    tag = "Areas",
    params(("cn_id" = i32, Path, description = "Administrative division code")),
    responses(
        (status = 200, description = "Root-first ancestor chain ending at the area", body = Vec<Area>),
        (status = 404, description = "No area with this code")
    )
)]
pub async fn get_chain(
    State(app_state): State<AppState>,
    Path(cn_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let chain = app_state.area_service.chain(cn_id).await?;
    Ok(Json(chain))
}

#[utoipa::path(
    get,
    path = "/api/areas/{cn_id}/distributors",
    tag = "Areas",
    params(("cn_id" = i32, Path, description = "Code of a city or one of its districts")),
    responses(
        (status = 200, description = "Active distributors of the enclosing city", body = CityDistributors),
        (status = 400, description = "The code names a province"),
        (status = 404, description = "No area with this code")
    )
)]
pub async fn city_distributors(
    State(app_state): State<AppState>,
    Path(cn_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let city = app_state.area_service.city_distributors(cn_id).await?;
    Ok(Json(city))
}
