// src/services/captcha_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;

use crate::{
    common::error::AppError,
    db::{CaptchaStore, UserRepository},
    models::workflow::{CaptchaAction, CaptchaRequest, VerifiedContact},
};

/// Outbound SMS/email gateway.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &VerifiedContact, message: &str) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of delivering them.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, to: &VerifiedContact, message: &str) -> anyhow::Result<()> {
        tracing::info!(to = to.target(), message, "notification dispatched");
        Ok(())
    }
}

#[derive(Clone)]
pub struct CaptchaService {
    store: CaptchaStore,
    user_repo: UserRepository,
    notifier: Arc<dyn Notifier>,
}

impl CaptchaService {
    pub fn new(store: CaptchaStore, user_repo: UserRepository, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            user_repo,
            notifier,
        }
    }

    /// Checks the request against the account table, then sends a fresh code.
    pub async fn request(&self, request: &CaptchaRequest) -> Result<(), AppError> {
        let contact = match (&request.mobile, &request.email) {
            (Some(mobile), None) => {
                crate::models::auth::validate_mobile(mobile).map_err(|_| {
                    AppError::invalid_field("mobile", "mobile", "Invalid mobile number.")
                })?;
                VerifiedContact::Mobile(mobile.clone())
            }
            // Email is only accepted for recovering an existing account.
            (None, Some(email)) if request.action == CaptchaAction::ResetPassword => {
                VerifiedContact::Email(email.clone())
            }
            _ => {
                return Err(AppError::invalid_field(
                    "mobile",
                    "contact",
                    "Give a mobile number (or an email to reset a password).",
                ));
            }
        };

        match request.action {
            CaptchaAction::Register => {
                if self.user_repo.mobile_taken(contact.target()).await? {
                    return Err(AppError::MobileAlreadyExists);
                }
            }
            CaptchaAction::ResetPassword => {
                let account = match &contact {
                    VerifiedContact::Mobile(mobile) => self.user_repo.find_by_mobile(mobile).await?,
                    VerifiedContact::Email(email) => self.user_repo.find_by_email(email).await?,
                };
                if account.is_none() {
                    return Err(AppError::NotFound("account"));
                }
            }
        }

        self.issue(request.action, contact);
        Ok(())
    }

    /// Stores a new code and hands delivery off without waiting for it.
    pub fn issue(&self, action: CaptchaAction, contact: VerifiedContact) {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.store.issue(action, contact.target(), code.clone());

        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let message = format!("Your verification code is {code}.");
            if let Err(e) = notifier.send(&contact, &message).await {
                tracing::warn!(error = %e, "failed to deliver captcha");
            }
        });
    }

    /// Consumes the code on success.
    pub fn verify(&self, action: CaptchaAction, contact: &VerifiedContact, code: &str) -> Result<(), AppError> {
        if self.store.consume(action, contact.target(), code) {
            Ok(())
        } else {
            Err(AppError::invalid_field("captcha", "captcha", "Wrong or expired captcha."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use sqlx::postgres::PgPoolOptions;
    use tokio::sync::mpsc;

    struct Outbox(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl Notifier for Outbox {
        async fn send(&self, _to: &VerifiedContact, message: &str) -> anyhow::Result<()> {
            self.0.send(message.to_owned())?;
            Ok(())
        }
    }

    fn service() -> (CaptchaService, mpsc::UnboundedReceiver<String>) {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let service = CaptchaService::new(
            CaptchaStore::new(Duration::from_secs(60)),
            UserRepository::new(pool),
            Arc::new(Outbox(tx)),
        );
        (service, rx)
    }

    fn code_in(message: &str) -> String {
        message.chars().filter(char::is_ascii_digit).collect()
    }

    #[tokio::test]
    async fn issued_codes_verify_once() {
        let (captcha, mut outbox) = service();
        let contact = VerifiedContact::Mobile("13800138000".into());

        captcha.issue(CaptchaAction::Register, contact.clone());
        let code = code_in(&outbox.recv().await.unwrap());
        assert_eq!(code.len(), 6);

        assert!(captcha.verify(CaptchaAction::ResetPassword, &contact, &code).is_err());
        assert!(captcha.verify(CaptchaAction::Register, &contact, &code).is_ok());
        assert!(matches!(
            captcha.verify(CaptchaAction::Register, &contact, &code),
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn registration_codes_need_a_mobile() {
        let (captcha, _outbox) = service();
        let request = CaptchaRequest {
            action: CaptchaAction::Register,
            mobile: None,
            email: Some("carpenter@example.com".into()),
        };
        assert!(matches!(
            captcha.request(&request).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
