//! Ticket issuance on payment approval.

use boxoffice_core::error::CoreError;
use boxoffice_core::notification::{ConfirmedTicket, OrderConfirmation};
use boxoffice_core::status::SeatStatus;
use boxoffice_core::tickets::generate_ticket_code;
use boxoffice_core::types::{DbId, Timestamp};
use boxoffice_db::models::order::{Order, OrderItem};
use boxoffice_db::models::ticket::{NewTicket, Ticket};
use boxoffice_db::repositories::{OrderRepo, SeatRepo, TicketRepo};
use sqlx::PgConnection;

use crate::error::AppResult;

/// Mint one ticket per order item and move the order's seats HELD -> SOLD.
///
/// Must run in the transaction that marks the order PAID.
pub async fn issue_tickets(
    conn: &mut PgConnection,
    order: &Order,
) -> AppResult<(Vec<OrderItem>, Vec<Ticket>)> {
    let items = OrderRepo::list_items(&mut *conn, order.id).await?;

    let new_tickets: Vec<NewTicket> = items
        .iter()
        .map(|item| NewTicket {
            order_item_id: item.id,
            seat_id: item.seat_id,
            qr_code: generate_ticket_code(),
        })
        .collect();
    let tickets = TicketRepo::create_many(&mut *conn, order.id, &new_tickets).await?;

    let seat_ids: Vec<DbId> = items.iter().map(|i| i.seat_id).collect();
    let sold =
        SeatRepo::transition(&mut *conn, &seat_ids, SeatStatus::Held, SeatStatus::Sold).await?;
    if sold != seat_ids.len() as u64 {
        tracing::warn!(
            order_id = order.id,
            expected = seat_ids.len(),
            sold,
            "Seats drifted from HELD while issuing tickets"
        );
        return Err(CoreError::conflict("order seats are no longer held").into());
    }

    tracing::info!(order_id = order.id, tickets = tickets.len(), "Tickets issued");
    Ok((items, tickets))
}

/// Snapshot handed to the notification sender once the order is paid.
pub fn confirmation(
    order: &Order,
    items: &[OrderItem],
    tickets: &[Ticket],
    paid_at: Timestamp,
) -> OrderConfirmation {
    let tickets = tickets
        .iter()
        .filter_map(|ticket| {
            let item = items.iter().find(|i| i.id == ticket.order_item_id)?;
            Some(ConfirmedTicket {
                qr_code: ticket.qr_code.clone(),
                sector_code: item.sector_code.clone(),
                row_label: item.row_label.clone(),
                seat_number: item.seat_number,
            })
        })
        .collect();

    OrderConfirmation {
        order_id: order.id,
        tenant_id: order.tenant_id,
        session_id: order.session_id,
        buyer_name: order.buyer_name.clone(),
        buyer_email: order.buyer_email.clone(),
        total_amount_cents: order.total_amount_cents,
        currency_code: order.currency_code.clone(),
        paid_at,
        tickets,
    }
}
