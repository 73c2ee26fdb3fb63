//! Order creation from a hold, idempotent under the caller's key.

use boxoffice_core::audit::{actions, resources};
use boxoffice_core::error::CoreError;
use boxoffice_core::holds::{hold_is_lapsed, order_is_lapsed};
use boxoffice_core::idempotency::{check_replay, request_hash, Replay};
use boxoffice_core::pricing::{compute_totals, FeePolicy};
use boxoffice_core::status::{HoldStatus, OrderStatus, SeatStatus};
use boxoffice_core::types::{Cents, DbId};
use boxoffice_db::models::audit::CreateAuditLog;
use boxoffice_db::models::hold::Hold;
use boxoffice_db::models::order::{NewOrder, NewOrderItem, Order, OrderItem};
use boxoffice_db::repositories::order_repo::{UQ_ORDERS_HOLD_ID, UQ_ORDERS_IDEMPOTENCY_KEY};
use boxoffice_db::repositories::{
    AuditRepo, CommercialPolicyRepo, HoldRepo, OrderRepo, SessionRepo,
};
use boxoffice_db::tx;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::holds::hold_expired;
use super::{expiry, Created};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Buyer identity captured on the order.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BuyerInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub document: Option<String>,
}

/// Request body for `POST /orders`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub hold_id: DbId,
    #[validate(nested)]
    pub buyer: BuyerInput,
}

/// The normalised payload an idempotency key is bound to.
#[derive(Debug, Serialize)]
struct OrderFingerprint<'a> {
    hold_id: DbId,
    buyer_name: &'a str,
    buyer_email: String,
    buyer_document: Option<&'a str>,
}

impl CreateOrderRequest {
    fn fingerprint(&self) -> OrderFingerprint<'_> {
        OrderFingerprint {
            hold_id: self.hold_id,
            buyer_name: self.buyer.name.trim(),
            buyer_email: self.buyer.email.trim().to_lowercase(),
            buyer_document: self
                .buyer
                .document
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty()),
        }
    }
}

/// An order with its priced items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

enum Attempt {
    Created(OrderView),
    HoldLapsed(Hold),
    HoldTaken,
}

fn stored_hash(order: &Order) -> &str {
    &order.request_hash
}

/// Materialise an order from a hold.
///
/// The first request under `idempotency_key` creates the order; repeating
/// it with the same payload returns the same order without touching any
/// seat, and repeating it with a different payload is a conflict.
pub async fn create_order(
    state: &AppState,
    idempotency_key: &str,
    input: &CreateOrderRequest,
) -> AppResult<Created<OrderView>> {
    input.validate()?;
    let fingerprint = input.fingerprint();
    let hash = request_hash(&fingerprint)?;

    if let Some(replayed) = resolve_existing(state, idempotency_key, &hash).await? {
        return Ok(Created::replayed(replayed));
    }

    // The fee schedule is resolved up front; `ensure_default` writes on
    // first use and must not join the serializable snapshot.
    let hold = HoldRepo::find_by_id(&state.pool, input.hold_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Hold", input.hold_id))?;
    let sale = SessionRepo::find_sale_context(&state.pool, hold.session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", hold.session_id))?;
    let policy = CommercialPolicyRepo::ensure_default(&state.pool, sale.tenant_id)
        .await?
        .fee_policy();

    let max_retries = state.config.checkout.order_create_max_retries;
    let mut attempt = 0;
    loop {
        match try_create(state, idempotency_key, &hash, input, &fingerprint, &policy).await {
            Ok(Attempt::Created(view)) => return Ok(Created::fresh(view)),
            Ok(Attempt::HoldLapsed(hold)) => {
                expiry::lapse_hold(&state.pool, &hold).await?;
                return Err(hold_expired());
            }
            Ok(Attempt::HoldTaken) => {
                return replay_or_hold_taken(state, idempotency_key, &hash).await;
            }
            Err(AppError::Database(err)) if tx::is_serialization_failure(&err) => {
                if attempt >= max_retries {
                    tracing::warn!(
                        hold_id = input.hold_id,
                        attempt,
                        "Order creation kept conflicting"
                    );
                    return Err(CoreError::conflict("concurrency conflict").into());
                }
                attempt += 1;
                tracing::debug!(hold_id = input.hold_id, attempt, "Retrying order creation");
                // A concurrent request may have committed this very key.
                if let Some(replayed) = resolve_existing(state, idempotency_key, &hash).await? {
                    return Ok(Created::replayed(replayed));
                }
            }
            Err(AppError::Database(err))
                if tx::is_unique_violation_on(&err, UQ_ORDERS_IDEMPOTENCY_KEY) =>
            {
                return match resolve_existing(state, idempotency_key, &hash).await? {
                    Some(replayed) => Ok(Created::replayed(replayed)),
                    None => Err(CoreError::conflict("concurrency conflict").into()),
                };
            }
            Err(AppError::Database(err)) if tx::is_unique_violation_on(&err, UQ_ORDERS_HOLD_ID) => {
                return replay_or_hold_taken(state, idempotency_key, &hash).await;
            }
            Err(other) => return Err(other),
        }
    }
}

async fn resolve_existing(
    state: &AppState,
    idempotency_key: &str,
    hash: &str,
) -> AppResult<Option<OrderView>> {
    let existing = OrderRepo::find_by_idempotency_key(&state.pool, idempotency_key).await?;
    match check_replay(existing, hash, stored_hash)? {
        Replay::Fresh => Ok(None),
        Replay::Existing(order) => {
            let items = OrderRepo::list_items(&state.pool, order.id).await?;
            Ok(Some(OrderView { order, items }))
        }
    }
}

/// Another order already references the hold. A concurrent duplicate of
/// this very request committed it; anything else is a conflict.
async fn replay_or_hold_taken(
    state: &AppState,
    idempotency_key: &str,
    hash: &str,
) -> AppResult<Created<OrderView>> {
    match resolve_existing(state, idempotency_key, hash).await? {
        Some(replayed) => Ok(Created::replayed(replayed)),
        None => Err(CoreError::conflict("hold already has an order").into()),
    }
}

async fn try_create(
    state: &AppState,
    idempotency_key: &str,
    hash: &str,
    input: &CreateOrderRequest,
    fingerprint: &OrderFingerprint<'_>,
    policy: &FeePolicy,
) -> AppResult<Attempt> {
    let now = Utc::now();
    let mut tx = tx::begin_serializable(&state.pool).await?;

    let hold = HoldRepo::find_by_id(&mut *tx, input.hold_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Hold", input.hold_id))?;
    let sale = SessionRepo::find_sale_context(&mut *tx, hold.session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", hold.session_id))?;
    if !sale.is_on_sale() {
        return Err(CoreError::conflict("session is not open for sale").into());
    }
    if OrderRepo::find_by_hold_id(&mut *tx, hold.id).await?.is_some() {
        return Ok(Attempt::HoldTaken);
    }
    if hold_is_lapsed(hold.status, hold.expires_at, now) {
        return Ok(Attempt::HoldLapsed(hold));
    }
    match hold.status {
        HoldStatus::Active => {}
        HoldStatus::Expired => return Err(hold_expired()),
        HoldStatus::Consumed => return Err(CoreError::conflict("hold already consumed").into()),
    }

    let seats = HoldRepo::list_seats(&mut *tx, hold.id).await?;
    if seats.is_empty() || seats.iter().any(|s| s.status != SeatStatus::Held) {
        return Err(CoreError::conflict("held seats changed; select seats again").into());
    }

    // Unit price is captured now and never re-derived from the session.
    let unit_prices: Vec<Cents> = seats.iter().map(|_| sale.price_cents).collect();
    let totals = compute_totals(&unit_prices, policy)?;

    let new_order = NewOrder {
        tenant_id: sale.tenant_id,
        session_id: sale.session_id,
        hold_id: hold.id,
        idempotency_key: idempotency_key.to_string(),
        request_hash: hash.to_string(),
        buyer_name: fingerprint.buyer_name.to_string(),
        buyer_email: fingerprint.buyer_email.clone(),
        buyer_document: fingerprint.buyer_document.map(str::to_string),
        ticket_subtotal_cents: totals.ticket_subtotal_cents,
        service_fee_cents: totals.service_fee_cents,
        total_amount_cents: totals.total_amount_cents,
        currency_code: sale.currency_code.clone(),
        hold_expires_at: hold.expires_at,
        commercial_policy_version: policy.version.clone(),
    };
    let new_items: Vec<NewOrderItem> = seats
        .iter()
        .zip(&unit_prices)
        .map(|(seat, price)| NewOrderItem {
            seat_id: seat.id,
            sector_code: seat.sector_code.clone(),
            row_label: seat.row_label.clone(),
            seat_number: seat.seat_number,
            unit_price_cents: *price,
        })
        .collect();

    let (order, items) = OrderRepo::create_with_items(&mut tx, &new_order, &new_items).await?;

    if !HoldRepo::transition(&mut *tx, hold.id, HoldStatus::Active, HoldStatus::Consumed).await? {
        return Err(CoreError::conflict("hold already consumed").into());
    }

    AuditRepo::log(
        &mut *tx,
        &CreateAuditLog::new(actions::ORDER_CREATED, resources::ORDER, order.id)
            .tenant(order.tenant_id)
            .metadata(json!({
                "hold_id": hold.id,
                "items": items.len(),
                "total_amount_cents": order.total_amount_cents,
                "commercial_policy_version": order.commercial_policy_version,
            })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        hold_id = hold.id,
        total_amount_cents = order.total_amount_cents,
        "Order created"
    );
    Ok(Attempt::Created(OrderView { order, items }))
}

/// Load an order, expiring it first if it was never paid within its window.
pub async fn get_order(state: &AppState, order_id: DbId) -> AppResult<OrderView> {
    let order = load_live_order(state, order_id).await?;
    let items = OrderRepo::list_items(&state.pool, order.id).await?;
    Ok(OrderView { order, items })
}

/// Fetch an order and apply lazy expiry. Expired orders are Gone.
pub(crate) async fn load_live_order(state: &AppState, order_id: DbId) -> AppResult<Order> {
    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id))?;

    if order_is_lapsed(order.status, order.hold_expires_at, Utc::now()) {
        expiry::lapse_order(&state.pool, &order).await?;
        return Err(order_expired());
    }
    if order.status == OrderStatus::Expired {
        return Err(order_expired());
    }
    Ok(order)
}

/// Fetch an order without expiry side effects.
pub(crate) async fn find_order(state: &AppState, order_id: DbId) -> AppResult<Order> {
    OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id).into())
}

pub(crate) fn order_expired() -> AppError {
    CoreError::gone("order expired before payment; select seats again").into()
}
