//! Request context extractors.
//!
//! Identity is established by the upstream auth layer, which forwards the
//! verified tenant and actor as headers. These extractors only parse them.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use boxoffice_core::error::CoreError;
use boxoffice_core::idempotency::{parse_idempotency_key, IDEMPOTENCY_KEY_HEADER};
use boxoffice_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const ACTOR_HEADER: &str = "x-actor-id";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_id(raw: &str, name: &str) -> Result<DbId, AppError> {
    raw.trim()
        .parse::<DbId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("{name} must be a positive integer")))
}

/// The tenant on whose behalf the request acts (`X-Tenant-Id`, required).
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub tenant_id: DbId,
}

impl FromRequestParts<AppState> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = header(parts, TENANT_HEADER).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing X-Tenant-Id header".into()))
        })?;
        Ok(TenantContext {
            tenant_id: parse_id(raw, "X-Tenant-Id")?,
        })
    }
}

/// The staff member or system acting (`X-Actor-Id`, optional).
#[derive(Debug, Clone, Copy)]
pub struct ActorContext {
    pub actor_id: Option<DbId>,
}

impl FromRequestParts<AppState> for ActorContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor_id = header(parts, ACTOR_HEADER)
            .map(|raw| parse_id(raw, "X-Actor-Id"))
            .transpose()?;
        Ok(ActorContext { actor_id })
    }
}

/// Canonical `Idempotency-Key` header value. Missing or malformed keys are
/// rejected with 400.
#[derive(Debug, Clone)]
pub struct IdempotencyKey(pub String);

impl FromRequestParts<AppState> for IdempotencyKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parse_idempotency_key(header(parts, IDEMPOTENCY_KEY_HEADER))?;
        Ok(IdempotencyKey(key))
    }
}
