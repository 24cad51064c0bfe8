// src/services/workflow_service.rs
//
// Drives the two-step flows over `WorkflowStore`. The transition table lives
// in `models::workflow::gate`; this only reads and writes the stored state.

use std::future::Future;

use crate::{
    common::error::AppError,
    db::WorkflowStore,
    models::workflow::{StepGate, VerifiedContact, WorkflowKind, WorkflowState, gate},
};

#[derive(Clone)]
pub struct WorkflowService {
    store: WorkflowStore,
}

impl WorkflowService {
    pub fn new(store: WorkflowStore) -> Self {
        Self { store }
    }

    pub fn current(&self, kind: WorkflowKind, token: &str) -> Option<WorkflowState> {
        self.store.get(kind, token)
    }

    /// Checks a requested step against the session and starts the flow when
    /// there is none.
    pub fn enter(&self, kind: WorkflowKind, token: &str, requested: Option<i64>) -> StepGate {
        let current = self.current(kind, token);
        let (outcome, write) = gate(current.as_ref(), requested);
        if let Some(state) = write {
            self.store.put(kind, token, state);
        }
        outcome
    }

    /// Step 1 done: remember the verified contact and wait for details.
    pub fn advance(&self, kind: WorkflowKind, token: &str, contact: VerifiedContact) {
        tracing::debug!(?kind, "workflow advanced to step 2");
        self.store.put(kind, token, WorkflowState::AwaitingDetails { contact });
    }

    /// Step 2: runs `create` and ends the flow only if it succeeded. A failed
    /// create leaves the session at step 2.
    pub async fn finish<T, F, Fut>(&self, kind: WorkflowKind, token: &str, create: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let created = create().await?;
        self.store.clear(kind, token);
        tracing::debug!(?kind, "workflow finished");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::Step;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const KIND: WorkflowKind = WorkflowKind::UserRegister;

    fn service() -> WorkflowService {
        WorkflowService::new(WorkflowStore::new(Duration::from_secs(60)))
    }

    fn contact() -> VerifiedContact {
        VerifiedContact::Mobile("13800138000".into())
    }

    #[tokio::test]
    async fn step_two_before_step_one_is_redirected() {
        let workflow = service();

        assert_eq!(workflow.enter(KIND, "t", Some(1)), StepGate::Proceed(WorkflowState::AwaitingContact));
        assert_eq!(workflow.enter(KIND, "t", Some(2)), StepGate::RedirectTo(Step::One));
        assert_eq!(workflow.current(KIND, "t"), Some(WorkflowState::AwaitingContact));
    }

    #[tokio::test]
    async fn full_flow_creates_one_entity_and_clears_the_session() {
        let workflow = service();
        let created = AtomicUsize::new(0);

        workflow.enter(KIND, "t", None);
        workflow.advance(KIND, "t", contact());

        let StepGate::Proceed(WorkflowState::AwaitingDetails { contact: verified }) =
            workflow.enter(KIND, "t", Some(2))
        else {
            panic!("expected step 2");
        };
        assert_eq!(verified, contact());

        let id = workflow
            .finish(KIND, "t", || async {
                created.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .await
            .unwrap();

        assert_eq!(id, 42);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(workflow.current(KIND, "t"), None);
    }

    #[tokio::test]
    async fn failed_details_keep_the_session_at_step_two() {
        let workflow = service();
        workflow.enter(KIND, "t", Some(1));
        workflow.advance(KIND, "t", contact());

        let result: Result<(), AppError> = workflow
            .finish(KIND, "t", || async {
                Err(AppError::invalid_field("username", "username", "Invalid username."))
            })
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(
            workflow.current(KIND, "t"),
            Some(WorkflowState::AwaitingDetails { contact: contact() })
        );
    }

    #[test]
    fn unknown_step_without_a_session_goes_to_landing() {
        let workflow = service();
        assert_eq!(workflow.enter(KIND, "t", Some(7)), StepGate::Landing);
        assert_eq!(workflow.current(KIND, "t"), None);
    }
}
