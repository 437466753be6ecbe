//! Caller identity taken from trusted upstream headers.
//!
//! An authenticating proxy in front of the server sets `X-User-Id` and
//! `X-User-Role`; the server does no session handling of its own.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::AppError;
use crate::models::{Actor, UserId, UserRole};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", name)))?
        .to_str()
        .map_err(|_| AppError::Unauthorized(format!("unreadable {} header", name)))
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id: UserId = header(parts, USER_ID_HEADER)?
            .parse()
            .map_err(|_| AppError::Unauthorized("X-User-Id must be an integer".to_string()))?;
        let role: UserRole = header(parts, USER_ROLE_HEADER)?.parse().map_err(|_| {
            AppError::Unauthorized("X-User-Role must be organizer or participant".to_string())
        })?;

        Ok(Caller(Actor::new(user_id, role)))
    }
}
