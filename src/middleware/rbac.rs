// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};

use crate::{
    common::error::ApiError,
    models::auth::{Principal, Role},
};

/// A role a route can require.
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> Role;
}

/// Guard extractor: the authenticated caller must hold role `R`.
pub struct RequireRole<R>(pub PhantomData<R>);

impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleDef,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Not authenticated."))?;

        let required = R::role();
        if principal.role != required {
            return Err(ApiError::new(
                StatusCode::FORBIDDEN,
                format!("This action requires a {required:?} account."),
            ));
        }

        Ok(RequireRole(PhantomData))
    }
}

pub struct UserRole;
impl RoleDef for UserRole {
    fn role() -> Role {
        Role::User
    }
}

pub struct VendorRole;
impl RoleDef for VendorRole {
    fn role() -> Role {
        Role::Vendor
    }
}

pub struct DistributorRole;
impl RoleDef for DistributorRole {
    fn role() -> Role {
        Role::Distributor
    }
}

pub struct AdminRole;
impl RoleDef for AdminRole {
    fn role() -> Role {
        Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn guard<R: RoleDef>(principal: Option<Principal>) -> Result<(), StatusCode> {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(principal) = principal {
            parts.extensions.insert(principal);
        }
        RequireRole::<R>::from_request_parts(&mut parts, &())
            .await
            .map(|_| ())
            .map_err(|e| e.status)
    }

    #[tokio::test]
    async fn matching_role_passes() {
        let admin = Principal { id: 1, role: Role::Admin };
        assert_eq!(guard::<AdminRole>(Some(admin)).await, Ok(()));
    }

    #[tokio::test]
    async fn other_roles_are_forbidden() {
        let vendor = Principal { id: 1, role: Role::Vendor };
        assert_eq!(guard::<AdminRole>(Some(vendor)).await, Err(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn anonymous_callers_are_unauthorized() {
        assert_eq!(guard::<UserRole>(None).await, Err(StatusCode::UNAUTHORIZED));
    }
}
