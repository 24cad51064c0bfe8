// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageQuery},
    },
    config::AppState,
    handlers::steps,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, UserRole},
        session::SessionToken,
    },
    models::{
        address::{AddressPayload, FormattedAddress},
        auth::{AuthResponse, ContactStepPayload, ResetPasswordPayload, User, UserDetailsPayload},
        collection::CollectionPayload,
        item::ItemSummary,
        workflow::{StepAccepted, StepQuery, StepRedirect, StepStatus, WorkflowKind, WorkflowState},
    },
};

#[utoipa::path(
    get,
    path = "/api/users/register",
    tag = "Users",
    params(StepQuery, ("x-session-token" = Option<String>, Header, description = "Step session")),
    responses(
        (status = 200, description = "Current step", body = StepStatus),
        (status = 303, description = "Requested step is not the current one", body = StepRedirect)
    )
)]
pub async fn register_status(
    State(app_state): State<AppState>,
    session: SessionToken,
    Query(query): Query<StepQuery>,
) -> Response {
    let response = match steps::enter(&app_state, WorkflowKind::UserRegister, &session, query.step) {
        Ok(state) => steps::status(&state),
        Err(redirect) => redirect,
    };
    steps::with_session(&session, Ok(response))
}

/// Step 1 takes a [`ContactStepPayload`], step 2 a [`UserDetailsPayload`].
#[utoipa::path(
    post,
    path = "/api/users/register",
    tag = "Users",
    params(StepQuery, ("x-session-token" = Option<String>, Header, description = "Step session")),
    request_body(content = ContactStepPayload, description = "Step 1 body; step 2 takes UserDetailsPayload"),
    responses(
        (status = 200, description = "Mobile verified, continue with step 2", body = StepAccepted),
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 303, description = "Requested step is not the current one", body = StepRedirect),
        (status = 400, description = "Invalid fields, the step is unchanged")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    session: SessionToken,
    Query(query): Query<StepQuery>,
    Json(body): Json<Value>,
) -> Response {
    let kind = WorkflowKind::UserRegister;
    let state = match steps::enter(&app_state, kind, &session, query.step) {
        Ok(state) => state,
        Err(redirect) => return steps::with_session(&session, Ok(redirect)),
    };

    let result = async {
        match state {
            WorkflowState::AwaitingContact => steps::verify_contact(&app_state, kind, &session, body),
            WorkflowState::AwaitingDetails { contact } => {
                let payload: UserDetailsPayload = steps::parse(body)?;
                payload.validate()?;
                let auth = app_state
                    .workflow_service
                    .finish(kind, &session.0, || {
                        app_state.auth_service.register_user(&contact, &payload)
                    })
                    .await?;
                Ok((StatusCode::CREATED, Json(auth)).into_response())
            }
        }
    }
    .await;

    steps::with_session(&session, result)
}

#[utoipa::path(
    get,
    path = "/api/users/reset-password",
    tag = "Users",
    params(StepQuery, ("x-session-token" = Option<String>, Header, description = "Step session")),
    responses(
        (status = 200, description = "Current step", body = StepStatus),
        (status = 303, description = "Requested step is not the current one", body = StepRedirect)
    )
)]
pub async fn reset_password_status(
    State(app_state): State<AppState>,
    session: SessionToken,
    Query(query): Query<StepQuery>,
) -> Response {
    let response = match steps::enter(&app_state, WorkflowKind::UserResetPassword, &session, query.step) {
        Ok(state) => steps::status(&state),
        Err(redirect) => redirect,
    };
    steps::with_session(&session, Ok(response))
}

/// Step 1 takes a [`ContactStepPayload`] (mobile or email), step 2 a
/// [`ResetPasswordPayload`].
#[utoipa::path(
    post,
    path = "/api/users/reset-password",
    tag = "Users",
    params(StepQuery, ("x-session-token" = Option<String>, Header, description = "Step session")),
    request_body(content = ContactStepPayload, description = "Step 1 body; step 2 takes ResetPasswordPayload"),
    responses(
        (status = 200, description = "Contact verified, continue with step 2", body = StepAccepted),
        (status = 204, description = "Password changed"),
        (status = 303, description = "Requested step is not the current one", body = StepRedirect),
        (status = 400, description = "Invalid fields, the step is unchanged")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    session: SessionToken,
    Query(query): Query<StepQuery>,
    Json(body): Json<Value>,
) -> Response {
    let kind = WorkflowKind::UserResetPassword;
    let state = match steps::enter(&app_state, kind, &session, query.step) {
        Ok(state) => state,
        Err(redirect) => return steps::with_session(&session, Ok(redirect)),
    };

    let result = async {
        match state {
            WorkflowState::AwaitingContact => steps::verify_contact(&app_state, kind, &session, body),
            WorkflowState::AwaitingDetails { contact } => {
                let payload: ResetPasswordPayload = steps::parse(body)?;
                payload.validate()?;
                app_state
                    .workflow_service
                    .finish(kind, &session.0, || {
                        app_state.auth_service.reset_password(&contact, &payload)
                    })
                    .await?;
                Ok(StatusCode::NO_CONTENT.into_response())
            }
        }
    }
    .await;

    steps::with_session(&session, result)
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "The signed-in user", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<UserRole>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state.auth_service.me(principal.id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/users/me/address",
    tag = "Users",
    responses(
        (status = 200, description = "Formatted address", body = FormattedAddress),
        (status = 404, description = "No address saved yet")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_address(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<UserRole>,
) -> Result<impl IntoResponse, AppError> {
    let address = app_state.user_service.address(principal.id).await?;
    Ok(Json(address))
}

#[utoipa::path(
    put,
    path = "/api/users/me/address",
    tag = "Users",
    request_body = AddressPayload,
    responses(
        (status = 200, description = "Address saved", body = FormattedAddress),
        (status = 400, description = "Invalid fields or area code")
    ),
    security(("api_jwt" = []))
)]
pub async fn put_address(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<UserRole>,
    Json(payload): Json<AddressPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let address = app_state.user_service.save_address(principal.id, &payload).await?;
    Ok(Json(address))
}

#[utoipa::path(
    get,
    path = "/api/users/me/collections",
    tag = "Users",
    params(PageQuery),
    responses((status = 200, description = "Collected items", body = Page<ItemSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_collections(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<UserRole>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.user_service.collections(principal.id, &query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/users/me/collections",
    tag = "Users",
    request_body = CollectionPayload,
    responses(
        (status = 204, description = "Item collected (repeat calls are no-ops)"),
        (status = 404, description = "No such listed item")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_collection(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<UserRole>,
    Json(payload): Json<CollectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state.user_service.collect(principal.id, payload.item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/users/me/collections/{item_id}",
    tag = "Users",
    params(("item_id" = i32, Path, description = "Item id")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not in the collection")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_collection(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<UserRole>,
    Path(item_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.user_service.uncollect(principal.id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
