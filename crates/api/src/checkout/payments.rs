//! Charging orders and settling payments.
//!
//! The gateway is always called outside any transaction. Before the call a
//! PENDING payment row claims the idempotency key, so a retried request
//! finds the attempt instead of charging twice. Settlement (APPROVED or
//! DENIED) is applied afterwards in a short transaction, shared by the
//! synchronous charge path and the gateway webhook.

use boxoffice_core::audit::{actions, resources};
use boxoffice_core::error::CoreError;
use boxoffice_core::idempotency::{check_replay, request_hash, Replay};
use boxoffice_core::notification::OrderConfirmation;
use boxoffice_core::payment::{ChargeRequest, GatewayStatus, PaymentMethod};
use boxoffice_core::status::{OrderStatus, PaymentStatus};
use boxoffice_core::types::DbId;
use boxoffice_core::webhook::{verify_signature, PaymentWebhook};
use boxoffice_db::models::audit::CreateAuditLog;
use boxoffice_db::models::order::Order;
use boxoffice_db::models::payment::{NewPayment, Payment};
use boxoffice_db::models::ticket::Ticket;
use boxoffice_db::repositories::payment_repo::UQ_PAYMENTS_IDEMPOTENCY_KEY;
use boxoffice_db::repositories::{AuditRepo, OrderRepo, PaymentRepo, TicketRepo};
use boxoffice_db::tx;
use boxoffice_events::CheckoutEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgConnection;

use super::orders::{find_order, load_live_order, order_expired};
use super::{tickets, Created};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /orders/{id}/payments`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeOrderRequest {
    pub method: PaymentMethod,
    pub card_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChargeFingerprint<'a> {
    order_id: DbId,
    method: PaymentMethod,
    card_token: Option<&'a str>,
}

/// A payment attempt and the order state it left behind.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeOutcome {
    pub payment: Payment,
    pub order: Order,
    pub tickets: Vec<Ticket>,
}

/// Response of the webhook endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookOutcome {
    pub processed: bool,
    pub payment_id: DbId,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// What applying a gateway verdict did.
enum Settlement {
    Approved {
        payment: Payment,
        order: Order,
        tickets: Vec<Ticket>,
        confirmation: OrderConfirmation,
    },
    Denied {
        payment: Payment,
    },
    Skipped {
        reason: &'static str,
    },
}

fn stored_hash(payment: &Payment) -> &str {
    &payment.request_hash
}

/// Charge an order's total through the configured gateway.
pub async fn charge(
    state: &AppState,
    order_id: DbId,
    idempotency_key: &str,
    input: &ChargeOrderRequest,
) -> AppResult<Created<ChargeOutcome>> {
    let card_token = input.card_token.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let hash = request_hash(&ChargeFingerprint {
        order_id,
        method: input.method,
        card_token,
    })?;

    if let Some(replayed) = resolve_existing(state, idempotency_key, &hash).await? {
        return Ok(Created::replayed(replayed));
    }

    let order = load_live_order(state, order_id).await?;
    match order.status {
        OrderStatus::PendingPayment => {}
        OrderStatus::Paid => return Err(CoreError::conflict("order is already paid").into()),
        OrderStatus::Cancelled => return Err(CoreError::conflict("order is cancelled").into()),
        OrderStatus::Expired => return Err(order_expired()),
    }

    let max_attempts = state.config.checkout.max_payment_attempts;
    if PaymentRepo::count_by_order(&state.pool, order.id).await? >= max_attempts {
        return Err(CoreError::conflict(format!(
            "payment attempt limit of {max_attempts} reached for this order"
        ))
        .into());
    }

    let request = ChargeRequest {
        method: input.method,
        card_token: card_token.map(str::to_string),
        amount_cents: order.total_amount_cents,
        currency_code: order.currency_code.clone(),
        order_id: order.id,
    };
    request.validate()?;

    let claimed = PaymentRepo::insert_pending(
        &state.pool,
        &NewPayment {
            order_id: order.id,
            idempotency_key: idempotency_key.to_string(),
            request_hash: hash.clone(),
            method: input.method.as_str().to_string(),
            amount_cents: order.total_amount_cents,
        },
    )
    .await;
    let payment = match claimed {
        Ok(payment) => payment,
        Err(err) if tx::is_unique_violation_on(&err, UQ_PAYMENTS_IDEMPOTENCY_KEY) => {
            return match resolve_existing(state, idempotency_key, &hash).await? {
                Some(replayed) => Ok(Created::replayed(replayed)),
                None => Err(CoreError::conflict("concurrency conflict").into()),
            };
        }
        Err(err) => return Err(err.into()),
    };

    let verdict = match state.gateway.charge(&request).await {
        Ok(verdict) => verdict,
        Err(err) => {
            tracing::warn!(
                order_id = order.id,
                payment_id = payment.id,
                error = %err,
                "Gateway charge failed"
            );
            record_gateway_failure(state, &order, &payment, &err.to_string()).await?;
            return Err(CoreError::from(err).into());
        }
    };

    let now = Utc::now();
    let mut tx = tx::begin(&state.pool).await?;
    let payment = PaymentRepo::record_provider_reference(
        &mut *tx,
        payment.id,
        &verdict.provider,
        &verdict.provider_payment_id,
        &verdict.payload,
    )
    .await?
    .ok_or_else(|| CoreError::conflict("payment was settled concurrently"))?;

    let settlement = match verdict.status {
        GatewayStatus::Pending => None,
        GatewayStatus::Approved => {
            Some(settle(&mut tx, &payment, PaymentStatus::Approved, now).await?)
        }
        GatewayStatus::Denied => {
            Some(settle(&mut tx, &payment, PaymentStatus::Denied, now).await?)
        }
    };
    tx.commit().await?;

    let outcome = match settlement {
        None => {
            tracing::info!(
                order_id = order.id,
                payment_id = payment.id,
                "Payment awaiting settlement"
            );
            ChargeOutcome {
                payment,
                order,
                tickets: Vec::new(),
            }
        }
        Some(Settlement::Approved {
            payment,
            order,
            tickets,
            confirmation,
        }) => {
            state.event_bus.publish(CheckoutEvent::order_paid(&confirmation));
            ChargeOutcome {
                payment,
                order,
                tickets,
            }
        }
        Some(Settlement::Denied { payment }) => ChargeOutcome {
            payment,
            order,
            tickets: Vec::new(),
        },
        Some(Settlement::Skipped { reason }) => {
            return Err(CoreError::conflict(reason).into());
        }
    };
    Ok(Created::fresh(outcome))
}

async fn resolve_existing(
    state: &AppState,
    idempotency_key: &str,
    hash: &str,
) -> AppResult<Option<ChargeOutcome>> {
    let existing = PaymentRepo::find_by_idempotency_key(&state.pool, idempotency_key).await?;
    match check_replay(existing, hash, stored_hash)? {
        Replay::Fresh => Ok(None),
        Replay::Existing(payment) => {
            let order = find_order(state, payment.order_id).await?;
            let tickets = if payment.status == PaymentStatus::Approved {
                TicketRepo::list_by_order(&state.pool, order.id).await?
            } else {
                Vec::new()
            };
            Ok(Some(ChargeOutcome {
                payment,
                order,
                tickets,
            }))
        }
    }
}

/// The gateway could not decide. The attempt is closed as DENIED so the
/// buyer can retry under a new key.
async fn record_gateway_failure(
    state: &AppState,
    order: &Order,
    payment: &Payment,
    error: &str,
) -> AppResult<()> {
    let mut tx = tx::begin(&state.pool).await?;
    PaymentRepo::transition(
        &mut *tx,
        payment.id,
        PaymentStatus::Pending,
        PaymentStatus::Denied,
        Utc::now(),
    )
    .await?;
    AuditRepo::log(
        &mut *tx,
        &CreateAuditLog::new(actions::PAYMENT_DENIED, resources::PAYMENT, payment.id)
            .tenant(order.tenant_id)
            .metadata(json!({ "order_id": order.id, "gateway_error": error })),
    )
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Apply a gateway verdict to a payment, guarded by the status it was read in.
///
/// Approval settles PENDING and DENIED payments (a gateway may reverse a
/// decline), marks the order PAID and issues its tickets in the caller's
/// transaction. If the order is no longer awaiting payment the payment is
/// left untouched for manual reconciliation. Denial only settles PENDING
/// payments; an approved charge is reversed through a refund.
async fn settle(
    conn: &mut PgConnection,
    payment: &Payment,
    verdict: PaymentStatus,
    now: chrono::DateTime<Utc>,
) -> AppResult<Settlement> {
    match verdict {
        PaymentStatus::Denied => {
            if payment.status != PaymentStatus::Pending {
                return Ok(Settlement::Skipped {
                    reason: "only pending payments can be denied",
                });
            }
            let Some(payment) = PaymentRepo::transition(
                &mut *conn,
                payment.id,
                PaymentStatus::Pending,
                PaymentStatus::Denied,
                now,
            )
            .await?
            else {
                return Ok(Settlement::Skipped {
                    reason: "payment is no longer pending",
                });
            };
            AuditRepo::log(
                &mut *conn,
                &CreateAuditLog::new(actions::PAYMENT_DENIED, resources::PAYMENT, payment.id)
                    .metadata(json!({ "order_id": payment.order_id })),
            )
            .await?;
            tracing::info!(order_id = payment.order_id, payment_id = payment.id, "Payment denied");
            Ok(Settlement::Denied { payment })
        }
        PaymentStatus::Approved => {
            if !matches!(payment.status, PaymentStatus::Pending | PaymentStatus::Denied) {
                return Ok(Settlement::Skipped {
                    reason: "payment can no longer be approved",
                });
            }
            let Some(order) = OrderRepo::mark_paid(&mut *conn, payment.order_id, now).await? else {
                tracing::warn!(
                    order_id = payment.order_id,
                    payment_id = payment.id,
                    "Approved payment for an order not awaiting payment; needs reconciliation"
                );
                return Ok(Settlement::Skipped {
                    reason: "order is no longer awaiting payment",
                });
            };
            let Some(payment) = PaymentRepo::transition(
                &mut *conn,
                payment.id,
                payment.status,
                PaymentStatus::Approved,
                now,
            )
            .await?
            else {
                return Err(CoreError::conflict("payment was settled concurrently").into());
            };

            let (items, tickets) = tickets::issue_tickets(&mut *conn, &order).await?;

            AuditRepo::log(
                &mut *conn,
                &CreateAuditLog::new(actions::PAYMENT_APPROVED, resources::PAYMENT, payment.id)
                    .tenant(order.tenant_id)
                    .metadata(json!({
                        "order_id": order.id,
                        "amount_cents": payment.amount_cents,
                        "tickets": tickets.len(),
                    })),
            )
            .await?;

            tracing::info!(order_id = order.id, payment_id = payment.id, "Order paid");
            let confirmation = tickets::confirmation(&order, &items, &tickets, now);
            Ok(Settlement::Approved {
                payment,
                order,
                tickets,
                confirmation,
            })
        }
        other => Err(CoreError::Internal(format!("cannot settle a payment as {other}")).into()),
    }
}

/// Apply an asynchronous gateway notification.
///
/// Deliveries are at-least-once: a notification that matches the current
/// status, or targets a refunded payment, is acknowledged with
/// `processed = false`.
pub async fn process_webhook(
    state: &AppState,
    body: &[u8],
    signature: Option<&str>,
) -> AppResult<WebhookOutcome> {
    if let Some(secret) = state.config.checkout.webhook_secret.as_deref() {
        verify_signature(secret, body, signature)?;
    }

    let event: PaymentWebhook = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid webhook body: {e}")))?;
    event.validate()?;

    let mut tx = tx::begin(&state.pool).await?;
    let payment =
        PaymentRepo::find_by_provider_payment_id_for_update(&mut *tx, &event.provider_payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", &event.provider_payment_id))?;

    let skip_reason = if payment.status == event.status {
        Some("payment already in this status")
    } else if payment.status.is_terminal() {
        Some("payment is in a terminal state")
    } else {
        None
    };
    if let Some(reason) = skip_reason {
        tracing::debug!(
            payment_id = payment.id,
            status = %payment.status,
            reason,
            "Webhook ignored"
        );
        return Ok(WebhookOutcome {
            processed: false,
            payment_id: payment.id,
            status: payment.status,
            reason: Some(reason),
        });
    }

    let settlement = settle(&mut tx, &payment, event.status, Utc::now()).await?;
    tx.commit().await?;

    let outcome = match settlement {
        Settlement::Approved {
            payment,
            confirmation,
            ..
        } => {
            state.event_bus.publish(CheckoutEvent::order_paid(&confirmation));
            WebhookOutcome {
                processed: true,
                payment_id: payment.id,
                status: payment.status,
                reason: None,
            }
        }
        Settlement::Denied { payment } => WebhookOutcome {
            processed: true,
            payment_id: payment.id,
            status: payment.status,
            reason: None,
        },
        Settlement::Skipped { reason } => WebhookOutcome {
            processed: false,
            payment_id: payment.id,
            status: payment.status,
            reason: Some(reason),
        },
    };
    Ok(outcome)
}

/// Every payment attempt recorded against an order.
pub async fn list_payments(state: &AppState, order_id: DbId) -> AppResult<Vec<Payment>> {
    let order = find_order(state, order_id).await?;
    Ok(PaymentRepo::list_by_order(&state.pool, order.id).await?)
}
