// src/handlers/steps.rs
//
// Plumbing shared by the two-step endpoints (user registration, password
// reset, vendor registration).

use axum::{
    Json,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::session::SessionToken,
    models::{
        auth::ContactStepPayload,
        workflow::{Step, StepAccepted, StepGate, StepRedirect, StepStatus, WorkflowKind, WorkflowState},
    },
};

/// Runs the gate. `Ok` carries the state to act on, `Err` the redirect to send.
pub fn enter(
    app_state: &AppState,
    kind: WorkflowKind,
    session: &SessionToken,
    requested: Option<i64>,
) -> Result<WorkflowState, Response> {
    match app_state.workflow_service.enter(kind, &session.0, requested) {
        StepGate::Proceed(state) => Ok(state),
        other => {
            let location = other.location(kind).unwrap_or_else(|| "/".to_owned());
            Err((
                StatusCode::SEE_OTHER,
                [(LOCATION, location.clone())],
                Json(StepRedirect { location }),
            )
                .into_response())
        }
    }
}

/// The body's shape depends on the step, so it is decoded late.
pub fn parse<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| {
        tracing::debug!(error = %e, "malformed step body");
        AppError::invalid_field("body", "malformed", "The request body does not match this step.")
    })
}

/// Step 1: validate, check the captcha, remember the contact.
pub fn verify_contact(
    app_state: &AppState,
    kind: WorkflowKind,
    session: &SessionToken,
    body: Value,
) -> Result<Response, AppError> {
    let payload: ContactStepPayload = parse(body)?;
    payload.validate()?;

    let contact = payload.contact().ok_or_else(|| {
        AppError::invalid_field("mobile", "contact", "Give either a mobile number or an email.")
    })?;
    if kind != WorkflowKind::UserResetPassword && contact.mobile().is_none() {
        return Err(AppError::invalid_field(
            "mobile",
            "required",
            "Registration needs a mobile number.",
        ));
    }

    app_state
        .captcha_service
        .verify(kind.captcha_action(), &contact, &payload.captcha)?;
    app_state.workflow_service.advance(kind, &session.0, contact);

    Ok(Json(StepAccepted {
        next_step: Some(Step::Two.number()),
    })
    .into_response())
}

pub fn status(state: &WorkflowState) -> Response {
    Json(StepStatus {
        step: state.step().number(),
    })
    .into_response()
}

/// Attaches the session header to success and error responses alike.
pub fn with_session(session: &SessionToken, result: Result<Response, AppError>) -> Response {
    let mut response = result.unwrap_or_else(IntoResponse::into_response);
    let [(name, value)] = session.header();
    response.headers_mut().insert(name, value);
    response
}
