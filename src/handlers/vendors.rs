// src/handlers/vendors.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::steps,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, VendorRole},
        session::SessionToken,
    },
    models::{
        address::AddressPayload,
        auth::{AuthResponse, ContactStepPayload},
        distributor::{
            CreateDistributorPayload, DistributorProfile, DistributorRevocation, RevocationPayload,
        },
        vendor::{VendorDetailsPayload, VendorProfile},
        workflow::{StepAccepted, StepQuery, StepRedirect, StepStatus, WorkflowKind, WorkflowState},
    },
};

#[utoipa::path(
    get,
    path = "/api/vendors/register",
    tag = "Vendors",
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
    let response = match steps::enter(&app_state, WorkflowKind::VendorRegister, &session, query.step) {
        Ok(state) => steps::status(&state),
        Err(redirect) => redirect,
    };
    steps::with_session(&session, Ok(response))
}

/// Step 1 verifies the mobile number, step 2 takes the company details
/// and opens the account pending review.
#[utoipa::path(
    post,
    path = "/api/vendors/register",
    tag = "Vendors",
    params(StepQuery, ("x-session-token" = Option<String>, Header, description = "Step session")),
    request_body(content = ContactStepPayload, description = "Step 1 body; step 2 takes VendorDetailsPayload"),
    responses(
        (status = 200, description = "Mobile verified, continue with step 2", body = StepAccepted),
        (status = 201, description = "Vendor created, awaiting review", body = AuthResponse),
        (status = 303, description = "Requested step is not the current one", body = StepRedirect),
        (status = 400, description = "Invalid fields, the step is unchanged"),
        (status = 409, description = "Mobile or brand already registered")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    session: SessionToken,
    Query(query): Query<StepQuery>,
    Json(body): Json<Value>,
) -> Response {
    let kind = WorkflowKind::VendorRegister;
    let state = match steps::enter(&app_state, kind, &session, query.step) {
        Ok(state) => state,
        Err(redirect) => return steps::with_session(&session, Ok(redirect)),
    };

    let result = async {
        match state {
            WorkflowState::AwaitingContact => steps::verify_contact(&app_state, kind, &session, body),
            WorkflowState::AwaitingDetails { contact } => {
                let payload: VendorDetailsPayload = steps::parse(body)?;
                payload.validate()?;
                let auth = app_state
                    .workflow_service
                    .finish(kind, &session.0, || {
                        app_state.vendor_service.register(&contact, &payload)
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
    path = "/api/vendors/me",
    tag = "Vendors",
    responses((status = 200, description = "The vendor with its formatted address", body = VendorProfile)),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
) -> Result<impl IntoResponse, AppError> {
    let profile = app_state.vendor_service.profile(principal.id).await?;
    Ok(Json(profile))
}

// --- Distributors ---

#[utoipa::path(
    get,
    path = "/api/vendors/me/distributors",
    tag = "Vendors",
    responses((status = 200, description = "The vendor's distributors", body = Vec<DistributorProfile>)),
    security(("api_jwt" = []))
)]
pub async fn list_distributors(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
) -> Result<impl IntoResponse, AppError> {
    let distributors = app_state.distributor_service.list_for_vendor(principal.id).await?;
    Ok(Json(distributors))
}

#[utoipa::path(
    post,
    path = "/api/vendors/me/distributors",
    tag = "Vendors",
    request_body = CreateDistributorPayload,
    responses(
        (status = 201, description = "Distributor created", body = DistributorProfile),
        (status = 400, description = "Invalid fields or area code"),
        (status = 403, description = "The vendor is not confirmed yet"),
        (status = 409, description = "Username taken")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_distributor(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
    Json(payload): Json<CreateDistributorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let profile = app_state.distributor_service.create(principal.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    put,
    path = "/api/vendors/me/distributors/{id}/address",
    tag = "Vendors",
    params(("id" = i32, Path, description = "Distributor id")),
    request_body = AddressPayload,
    responses(
        (status = 200, description = "Address moved; both cities recounted", body = DistributorProfile),
        (status = 404, description = "Not one of the vendor's distributors")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_distributor_address(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
    Path(id): Path<i32>,
    Json(payload): Json<AddressPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let profile = app_state
        .distributor_service
        .update_address(principal.id, id, &payload)
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/vendors/me/distributors/{id}/revocations",
    tag = "Vendors",
    params(("id" = i32, Path, description = "Distributor id")),
    request_body = RevocationPayload,
    responses(
        (status = 201, description = "Revocation requested, awaiting approval", body = DistributorRevocation),
        (status = 404, description = "Not one of the vendor's distributors"),
        (status = 409, description = "Already revoked or already pending")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_revocation(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireRole<VendorRole>,
    Path(id): Path<i32>,
    Json(payload): Json<RevocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let revocation = app_state
        .distributor_service
        .request_revocation(principal.id, id, &payload.contract)
        .await?;
    Ok((StatusCode::CREATED, Json(revocation)))
}
