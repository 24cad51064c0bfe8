// src/handlers/items.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageQuery},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, VendorRole},
    },
    models::item::{Item, ItemAttribute, ItemDetail, ItemPayload, ItemSummary, LookupRow},
};

// --- Public catalog ---

#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Items",
    params(PageQuery),
    responses((status = 200, description = "Listed items, newest first", body = Page<ItemSummary>))
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.item_service.list(None, &query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "Items",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item with resolved attributes and components", body = ItemDetail),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.item_service.detail(id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/api/items/choices/{attribute}",
    tag = "Items",
    params(("attribute" = String, Path, description = "Attribute name, e.g. `material` or `carveStyles`")),
    responses(
        (status = 200, description = "Every option of the attribute", body = Vec<LookupRow>),
        (status = 404, description = "Unknown attribute")
    )
)]
pub async fn list_choices(
    State(app_state): State<AppState>,
    Path(attribute): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let attribute = ItemAttribute::from_name(&attribute).ok_or(AppError::NotFound("attribute"))?;
    let choices = app_state.item_service.choices(attribute).await?;
    Ok(Json(choices))
}

// --- Vendor catalog management ---

#[utoipa::path(
    get,
    path = "/api/vendors/me/items",
    tag = "Items",
    params(PageQuery),
    responses((status = 200, description = "The vendor's own items", body = Page<ItemSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_own_items(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.item_service.list(Some(principal.id), &query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/vendors/me/items",
    tag = "Items",
    request_body = ItemPayload,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid fields or unknown options"),
        (status = 403, description = "The vendor is not confirmed yet")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.item_service.create(principal.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    post,
    path = "/api/vendors/me/items/{id}/components",
    tag = "Items",
    params(("id" = i32, Path, description = "Suite id")),
    request_body = ItemPayload,
    responses(
        (status = 201, description = "Component added", body = Item),
        (status = 404, description = "No such suite"),
        (status = 409, description = "The item is not a suite")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_component(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
    Path(id): Path<i32>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    let component = app_state
        .item_service
        .add_component(principal.id, id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(component)))
}

#[utoipa::path(
    delete,
    path = "/api/vendors/me/items/{id}",
    tag = "Items",
    params(("id" = i32, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item and its components removed from the catalog"),
        (status = 404, description = "Item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.item_service.delete(principal.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
