//! Authenticated doctor identity for protected handlers
//!
//! [`super::require_bearer_auth`] resolves the bearer token once per request
//! and stores an [`AuthDoctor`] in the request extensions; handlers take it
//! as an extractor argument.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use uuid::Uuid;

use crate::error::ApiError;

/// The doctor behind the request's bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthDoctor {
    pub doctor_uuid: Uuid,
}

impl AuthDoctor {
    pub fn new(doctor_uuid: Uuid) -> Self {
        Self { doctor_uuid }
    }
}

/// Token from `Authorization: Bearer <token>`; the scheme is case-insensitive
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthDoctor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthDoctor>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("unauthorized"))
    }
}
