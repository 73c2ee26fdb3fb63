//! Full reversal of a paid order.

use boxoffice_core::audit::{actions, resources};
use boxoffice_core::error::CoreError;
use boxoffice_core::status::{OrderStatus, PaymentStatus, SeatStatus};
use boxoffice_core::types::DbId;
use boxoffice_db::models::audit::CreateAuditLog;
use boxoffice_db::models::order::Order;
use boxoffice_db::models::payment::{NewRefund, Payment, Refund};
use boxoffice_db::repositories::refund_repo::UQ_REFUNDS_ORDER_ID;
use boxoffice_db::repositories::{
    AuditRepo, OrderRepo, PaymentRepo, RefundRepo, SeatRepo, TicketRepo,
};
use boxoffice_db::tx;
use boxoffice_events::bus::ORDER_REFUNDED;
use boxoffice_events::CheckoutEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /orders/{id}/refund`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefundRequest {
    #[validate(length(min = 1, max = 64))]
    pub reason_code: String,
}

/// Everything the refund touched.
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub refund: Refund,
    pub payment: Payment,
    pub order: Order,
    pub cancelled_tickets: u64,
    pub released_seats: u64,
}

/// Refund a PAID order in full: payment REFUNDED, order CANCELLED, tickets
/// CANCELLED and seats back on sale, all in one transaction.
pub async fn refund(
    state: &AppState,
    tenant_id: DbId,
    actor_id: Option<DbId>,
    order_id: DbId,
    input: &RefundRequest,
) -> AppResult<RefundOutcome> {
    input.validate()?;
    let reason_code = input.reason_code.trim();

    let mut tx = tx::begin(&state.pool).await?;

    // Orders of other tenants are indistinguishable from missing ones.
    let order = OrderRepo::find_by_id(&mut *tx, order_id)
        .await?
        .filter(|o| o.tenant_id == tenant_id)
        .ok_or_else(|| CoreError::not_found("Order", order_id))?;
    if order.status != OrderStatus::Paid {
        return Err(CoreError::conflict(format!(
            "only paid orders can be refunded (order is {})",
            order.status
        ))
        .into());
    }

    let payment = PaymentRepo::find_approved_for_order(&mut *tx, order.id)
        .await?
        .ok_or_else(|| CoreError::conflict("no approved payment to refund"))?;

    let refund = RefundRepo::create(
        &mut *tx,
        &NewRefund {
            order_id: order.id,
            payment_id: payment.id,
            amount_cents: payment.amount_cents,
            reason_code: reason_code.to_string(),
            actor_id,
        },
    )
    .await
    .map_err(|err| {
        if tx::is_unique_violation_on(&err, UQ_REFUNDS_ORDER_ID) {
            AppError::from(CoreError::conflict("order was already refunded"))
        } else {
            AppError::from(err)
        }
    })?;

    let payment = PaymentRepo::transition(
        &mut *tx,
        payment.id,
        PaymentStatus::Approved,
        PaymentStatus::Refunded,
        Utc::now(),
    )
    .await?
    .ok_or_else(|| CoreError::conflict("payment changed while refunding"))?;

    if !OrderRepo::transition(&mut *tx, order.id, OrderStatus::Paid, OrderStatus::Cancelled)
        .await?
    {
        tracing::warn!(order_id = order.id, "Lost race cancelling refunded order");
        return Err(CoreError::conflict("order changed while refunding").into());
    }

    let cancelled_tickets = TicketRepo::cancel_for_order(&mut *tx, order.id).await?;
    let released_seats = SeatRepo::transition_for_order(
        &mut *tx,
        order.id,
        SeatStatus::Sold,
        SeatStatus::Available,
    )
    .await?;

    AuditRepo::log(
        &mut *tx,
        &CreateAuditLog::new(actions::ORDER_REFUNDED, resources::ORDER, order.id)
            .tenant(order.tenant_id)
            .actor(actor_id)
            .metadata(json!({
                "refund_id": refund.id,
                "payment_id": payment.id,
                "amount_cents": refund.amount_cents,
                "reason_code": reason_code,
                "cancelled_tickets": cancelled_tickets,
                "released_seats": released_seats,
            })),
    )
    .await?;

    let order = OrderRepo::find_by_id(&mut *tx, order.id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id))?;

    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        refund_id = refund.id,
        cancelled_tickets,
        released_seats,
        "Order refunded"
    );

    state.event_bus.publish(
        CheckoutEvent::new(ORDER_REFUNDED)
            .with_tenant(order.tenant_id)
            .with_resource(resources::ORDER, order.id)
            .with_actor(actor_id)
            .with_payload(json!({ "refund_id": refund.id, "amount_cents": refund.amount_cents })),
    );

    Ok(RefundOutcome {
        refund,
        payment,
        order,
        cancelled_tickets,
        released_seats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_reason_is_rejected() {
        let req = RefundRequest {
            reason_code: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn reason_code_is_accepted() {
        let req = RefundRequest {
            reason_code: "CUSTOMER_REQUEST".into(),
        };
        assert!(req.validate().is_ok());
    }
}
