//! Venue entry: each ticket admits exactly once.

use boxoffice_core::audit::{actions, resources};
use boxoffice_core::error::CoreError;
use boxoffice_core::status::TicketStatus;
use boxoffice_core::tickets::normalize_ticket_code;
use boxoffice_core::types::DbId;
use boxoffice_db::models::audit::CreateAuditLog;
use boxoffice_db::models::ticket::Ticket;
use boxoffice_db::repositories::{AuditRepo, TicketRepo};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::state::AppState;

/// Request body for `POST /check-in`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub qr_code: String,
}

/// Admit the holder of `raw_code`, flipping the ticket VALID -> USED.
pub async fn check_in(
    state: &AppState,
    raw_code: &str,
    actor_id: Option<DbId>,
) -> AppResult<Ticket> {
    let code = normalize_ticket_code(raw_code)
        .ok_or_else(|| CoreError::validation("qr_code must not be empty"))?;

    let ticket = TicketRepo::find_by_qr_code(&state.pool, code)
        .await?
        .ok_or_else(|| CoreError::not_found("Ticket", code))?;

    ensure_admissible(ticket.status)?;

    let Some(ticket) = TicketRepo::mark_used(&state.pool, ticket.id, Utc::now()).await? else {
        tracing::warn!(ticket_id = ticket.id, "Lost race checking in ticket");
        // A concurrent refund may have cancelled it rather than a second scan.
        let current = TicketRepo::find_by_qr_code(&state.pool, code)
            .await?
            .map_or(ticket.status, |t| t.status);
        ensure_admissible(current)?;
        return Err(CoreError::conflict("ticket already used").into());
    };

    if let Err(err) = AuditRepo::log(
        &state.pool,
        &CreateAuditLog::new(actions::TICKET_CHECKED_IN, resources::TICKET, ticket.id)
            .actor(actor_id)
            .metadata(json!({ "order_id": ticket.order_id, "seat_id": ticket.seat_id })),
    )
    .await
    {
        tracing::warn!(ticket_id = ticket.id, error = %err, "Failed to audit check-in");
    }

    tracing::info!(ticket_id = ticket.id, order_id = ticket.order_id, "Ticket checked in");
    Ok(ticket)
}

fn ensure_admissible(status: TicketStatus) -> Result<(), CoreError> {
    match status {
        TicketStatus::Valid => Ok(()),
        TicketStatus::Used => Err(CoreError::conflict("ticket already used")),
        TicketStatus::Cancelled => Err(CoreError::gone("ticket was cancelled")),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn only_valid_tickets_are_admissible() {
        assert!(ensure_admissible(TicketStatus::Valid).is_ok());
        assert_matches!(ensure_admissible(TicketStatus::Used), Err(CoreError::Conflict(_)));
        assert_matches!(ensure_admissible(TicketStatus::Cancelled), Err(CoreError::Gone(_)));
    }
}
