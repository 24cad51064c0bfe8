// src/models/workflow.rs
//
// State of the two-step flows (mobile verification, then details), kept
// server-side under a session token.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowKind {
    UserRegister,
    UserResetPassword,
    VendorRegister,
}

impl WorkflowKind {
    /// Captcha action a step-1 code must have been issued for.
    pub fn captcha_action(self) -> CaptchaAction {
        match self {
            WorkflowKind::UserRegister | WorkflowKind::VendorRegister => CaptchaAction::Register,
            WorkflowKind::UserResetPassword => CaptchaAction::ResetPassword,
        }
    }

    /// Path of the flow's endpoint, used in redirects.
    pub fn path(self) -> &'static str {
        match self {
            WorkflowKind::UserRegister => "/api/users/register",
            WorkflowKind::UserResetPassword => "/api/users/reset-password",
            WorkflowKind::VendorRegister => "/api/vendors/register",
        }
    }

    pub fn key_prefix(self) -> &'static str {
        match self {
            WorkflowKind::UserRegister => "USER_REGISTER_STEP",
            WorkflowKind::UserResetPassword => "USER_RESET_PASSWORD_STEP",
            WorkflowKind::VendorRegister => "VENDOR_REGISTER_STEP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptchaAction {
    Register,
    ResetPassword,
}

impl CaptchaAction {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptchaAction::Register => "REGISTER",
            CaptchaAction::ResetPassword => "RESET_PASSWORD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    One = 1,
    Two = 2,
}

impl Step {
    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Step::One),
            2 => Some(Step::Two),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }
}

/// The mobile or email proven in step 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerifiedContact {
    Mobile(String),
    Email(String),
}

impl VerifiedContact {
    pub fn mobile(&self) -> Option<&str> {
        match self {
            VerifiedContact::Mobile(m) => Some(m),
            VerifiedContact::Email(_) => None,
        }
    }

    /// Key under which a captcha for this contact is stored.
    pub fn target(&self) -> &str {
        match self {
            VerifiedContact::Mobile(m) | VerifiedContact::Email(m) => m,
        }
    }
}

/// A live flow. No entry in the store means no flow is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    AwaitingContact,
    AwaitingDetails { contact: VerifiedContact },
}

impl WorkflowState {
    pub fn step(&self) -> Step {
        match self {
            WorkflowState::AwaitingContact => Step::One,
            WorkflowState::AwaitingDetails { .. } => Step::Two,
        }
    }
}

/// Outcome of checking a request's `?step=` against the stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepGate {
    Proceed(WorkflowState),
    RedirectTo(Step),
    Landing,
}

impl StepGate {
    /// Target of a redirect, `None` when the request may proceed.
    pub fn location(&self, kind: WorkflowKind) -> Option<String> {
        match self {
            StepGate::Proceed(_) => None,
            StepGate::RedirectTo(step) => Some(format!("{}?step={}", kind.path(), step.number())),
            StepGate::Landing => Some("/".to_owned()),
        }
    }
}

/// Pure transition table for entering a flow.
pub fn gate(current: Option<&WorkflowState>, requested: Option<i64>) -> (StepGate, Option<WorkflowState>) {
    // A missing `step` means step 1.
    let requested = requested.unwrap_or(1);
    match current {
        None => match Step::from_number(requested) {
            None => (StepGate::Landing, None),
            Some(Step::One) => (
                StepGate::Proceed(WorkflowState::AwaitingContact),
                Some(WorkflowState::AwaitingContact),
            ),
            // The flow starts at step 1 no matter what was asked for.
            Some(Step::Two) => (StepGate::RedirectTo(Step::One), Some(WorkflowState::AwaitingContact)),
        },
        Some(state) if Step::from_number(requested) == Some(state.step()) => {
            (StepGate::Proceed(state.clone()), None)
        }
        Some(state) => (StepGate::RedirectTo(state.step()), None),
    }
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StepQuery {
    /// 1 or 2; defaults to 1.
    pub step: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepAccepted {
    pub next_step: Option<u8>,
}

/// Where a live flow currently stands.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub step: u8,
}

/// Body of a 303 sent when the requested step is not the current one.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepRedirect {
    pub location: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaRequest {
    pub action: CaptchaAction,
    pub mobile: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> WorkflowState {
        WorkflowState::AwaitingDetails {
            contact: VerifiedContact::Mobile("13800138000".into()),
        }
    }

    #[test]
    fn no_session_and_unknown_step_goes_to_landing() {
        assert_eq!(gate(None, Some(3)), (StepGate::Landing, None));
    }

    #[test]
    fn no_session_starts_at_step_one() {
        let (outcome, write) = gate(None, None);
        assert_eq!(outcome, StepGate::Proceed(WorkflowState::AwaitingContact));
        assert_eq!(write, Some(WorkflowState::AwaitingContact));
    }

    #[test]
    fn skipping_ahead_without_a_session_redirects_to_step_one() {
        let (outcome, write) = gate(None, Some(2));
        assert_eq!(outcome, StepGate::RedirectTo(Step::One));
        assert_eq!(write, Some(WorkflowState::AwaitingContact));
    }

    #[test]
    fn mismatched_step_redirects_to_the_recorded_one() {
        let (outcome, write) = gate(Some(&WorkflowState::AwaitingContact), Some(2));
        assert_eq!(outcome, StepGate::RedirectTo(Step::One));
        assert_eq!(write, None);

        let (outcome, _) = gate(Some(&details()), Some(1));
        assert_eq!(outcome, StepGate::RedirectTo(Step::Two));
    }

    #[test]
    fn redirects_point_at_the_flow_endpoint() {
        let kind = WorkflowKind::VendorRegister;
        assert_eq!(
            StepGate::RedirectTo(Step::One).location(kind).as_deref(),
            Some("/api/vendors/register?step=1")
        );
        assert_eq!(StepGate::Landing.location(kind).as_deref(), Some("/"));
        assert_eq!(StepGate::Proceed(WorkflowState::AwaitingContact).location(kind), None);
    }

    #[test]
    fn matching_step_proceeds_with_the_stored_state() {
        let (outcome, write) = gate(Some(&details()), Some(2));
        assert_eq!(outcome, StepGate::Proceed(details()));
        assert_eq!(write, None);
    }
}
