use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Malformed reference data. These abort the operation and are never shown
/// to the caller as something worth retrying.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("area {area_id} points at missing parent {father_id}")]
    OrphanArea { area_id: i32, father_id: i32 },

    #[error("area {area_id} (level {level}) has parent {father_id} at level {father_level}")]
    LevelMismatch {
        area_id: i32,
        level: i16,
        father_id: i32,
        father_level: i16,
    },

    #[error("area hierarchy loops back through area {area_id}")]
    HierarchyCycle { area_id: i32 },

    #[error("no area with code {cn_id}")]
    UnknownAreaCode { cn_id: i32 },

    #[error("area {cn_id} is a province and has no city")]
    NotCityScoped { cn_id: i32 },

    #[error("attribute '{attribute}' references missing row {id}")]
    MissingReference { attribute: &'static str, id: i32 },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("username already exists")]
    UsernameAlreadyExists,

    #[error("mobile already bound")]
    MobileAlreadyExists,

    #[error("brand already registered")]
    BrandAlreadyExists,

    #[error("unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("data integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("internal server error")]
    InternalServerError(#[from] anyhow::Error),

    #[error("bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("jwt error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Single-field validation failure, shaped like the ones `validator` produces.
    pub fn invalid_field(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut error = validator::ValidationError::new(code);
        error.message = Some(message.into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, error);
        AppError::ValidationError(errors)
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, AppError::Integrity(_))
    }
}

/// JSON error body returned to clients. Extractors reject with it directly.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let (status, message) = match err {
            // Every failing field is reported at once.
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                collect_field_errors("", &errors, &mut details);
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: "One or more fields are invalid.".to_owned(),
                    details: Some(Value::Object(details)),
                };
            }
            AppError::UsernameAlreadyExists => (StatusCode::CONFLICT, "This username is taken."),
            AppError::MobileAlreadyExists => (StatusCode::CONFLICT, "This mobile number is already bound."),
            AppError::BrandAlreadyExists => (StatusCode::CONFLICT, "This brand is already registered."),
            AppError::UniqueConstraintViolation(ref what) => {
                return ApiError::new(StatusCode::CONFLICT, format!("Duplicate value: {what}"));
            }
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Wrong username or password."),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Missing or invalid authentication token."),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "You are not allowed to do this."),
            AppError::NotFound(what) => {
                return ApiError::new(StatusCode::NOT_FOUND, format!("{what} not found."));
            }
            AppError::Conflict(message) => return ApiError::new(StatusCode::CONFLICT, message),
            AppError::Integrity(ref e) => {
                tracing::error!(error = %e, "data integrity violation");
                (StatusCode::INTERNAL_SERVER_ERROR, "Stored data is inconsistent.")
            }
            ref e => {
                tracing::error!("internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.")
            }
        };
        ApiError::new(status, message)
    }
}

// Nested payloads (an address inside a registration) report as `address.cnId`.
fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    details: &mut serde_json::Map<String, Value>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .map(Value::String)
                    .collect();
                details.insert(key, Value::Array(messages));
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&key, inner, details),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{key}[{index}]"), inner, details);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_grouped_per_field() {
        let api = ApiError::from(AppError::invalid_field("mobile", "mobile", "bad number"));
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["mobile"][0], "bad number");
    }

    #[test]
    fn nested_errors_are_reported_with_a_path() {
        use validator::Validate;

        #[derive(Validate)]
        struct Inner {
            #[validate(range(min = 1))]
            cn_id: i32,
        }

        #[derive(Validate)]
        struct Outer {
            #[validate(nested)]
            address: Inner,
        }

        let errors = Outer { address: Inner { cn_id: 0 } }.validate().unwrap_err();
        let api = ApiError::from(AppError::ValidationError(errors));
        let details = api.details.expect("details");
        assert_eq!(details["address.cn_id"][0], "range");
    }

    #[test]
    fn integrity_errors_are_not_client_errors() {
        let err = AppError::from(IntegrityError::HierarchyCycle { area_id: 7 });
        assert!(err.is_integrity());
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.details.is_none());
    }
}
