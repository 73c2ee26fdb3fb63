use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use boxoffice_core::types::DbId;

use crate::checkout::refunds::{self, RefundRequest};
use crate::context::{ActorContext, TenantContext};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/orders/{id}/refund
///
/// Full refund of a paid order within the caller's tenant.
pub async fn refund_order(
    tenant: TenantContext,
    actor: ActorContext,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
    Json(input): Json<RefundRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome =
        refunds::refund(&state, tenant.tenant_id, actor.actor_id, order_id, &input).await?;
    Ok(DataResponse::json(outcome))
}
