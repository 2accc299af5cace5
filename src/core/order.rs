//! Order business logic - Checkout, cancellation with restock, and status changes.
//!
//! Order creation and deletion are the only places where orders and stock change
//! together, and each runs inside one database transaction:
//!
//! * creation re-reads the product, inserts the order with a frozen price snapshot
//!   and takes the units with a conditional `UPDATE` that cannot drive stock below
//!   zero; the owner notification runs only after commit and never fails the order
//! * deletion returns the order's units to stock and removes the row, all or nothing
//!
//! Status changes only touch the `status` column and follow the transition table in
//! [`crate::core::status`].

use crate::{
    core::{
        outcome::{Done, OrderCreated, Outcome, StatusChanged},
        product::{get_product_by_id, return_stock, take_stock_if_available},
        status::check_transition,
    },
    entities::{Order, OrderStatus, order},
    errors::{Error, Result},
    integrations::{
        best_effort,
        notify::{Notifier, OrderSummary},
    },
};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Compare-and-set rounds before a contended status change gives up.
const STATUS_UPDATE_ATTEMPTS: usize = 3;

/// Country recorded when the form leaves it blank.
pub const DEFAULT_COUNTRY: &str = "Colombia";

/// The checkout form as submitted by the landing page.
///
/// `product_id` and `quantity` accept numbers or numeric strings, since HTML
/// forms post everything as text. Every field may be absent or `null`; required
/// ones are enforced by validation so the shopper gets a field-specific message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutForm {
    /// Catalog id, number or numeric string
    pub product_id: Option<Value>,
    /// Requested units; coerced by [`coerce_quantity`]
    pub quantity: Option<Value>,
    /// Required
    pub full_name: Option<String>,
    /// Required
    pub phone: Option<String>,
    /// Optional contact address
    pub email: Option<String>,
    /// National id number
    pub document_id: Option<String>,
    /// Defaults to [`DEFAULT_COUNTRY`]
    pub country: Option<String>,
    /// Required
    pub city: Option<String>,
    /// Required
    pub address: Option<String>,
    /// Optional neighborhood (barrio)
    pub neighborhood: Option<String>,
    /// Delivery notes
    pub notes: Option<String>,
    /// Ad click id, when the landing page forwards it in the body
    pub fbclid: Option<String>,
}

/// Attribution data captured from the HTTP request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Forwarded client address or the socket peer
    pub client_ip: Option<String>,
    /// `User-Agent` header
    pub user_agent: Option<String>,
    /// `fbclid` query parameter
    pub fbclid: Option<String>,
    /// `_fbc` cookie
    pub fbc: Option<String>,
    /// `_fbp` cookie
    pub fbp: Option<String>,
}

/// A checkout that passed field validation.
#[derive(Debug)]
struct ValidCheckout {
    product_id: i64,
    quantity: i32,
    full_name: String,
    phone: String,
    email: Option<String>,
    document_id: Option<String>,
    country: String,
    city: String,
    address: String,
    neighborhood: Option<String>,
    notes: Option<String>,
    fbclid: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, message: &str) -> Result<String> {
    trimmed(value).ok_or_else(|| Error::validation(message))
}

/// Reads a positive integer id from a number or numeric string.
#[must_use]
pub fn parse_product_id(raw: Option<&Value>) -> Option<i64> {
    let id = match raw? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

/// Coerces the submitted quantity to an integer of at least 1.
///
/// Fractions are truncated; missing, non-numeric, zero and negative values become 1.
#[must_use]
pub fn coerce_quantity(raw: Option<&Value>) -> i32 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(q) if q.is_finite() && q >= 1.0 => {
            #[allow(clippy::cast_possible_truncation)]
            let whole = q.trunc().min(f64::from(i32::MAX)) as i32;
            whole
        }
        _ => 1,
    }
}

/// `unit_price * quantity`, rounded to 2 decimal places.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    (unit_price * Decimal::from(quantity))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn validate_checkout(form: CheckoutForm) -> Result<ValidCheckout> {
    let product_id = parse_product_id(form.product_id.as_ref())
        .ok_or_else(|| Error::validation("Producto inválido."))?;
    let full_name = required(form.full_name, "Nombre requerido.")?;
    let phone = required(form.phone, "Teléfono requerido.")?;
    let city = required(form.city, "Ciudad requerida.")?;
    let address = required(form.address, "Dirección requerida.")?;

    Ok(ValidCheckout {
        product_id,
        quantity: coerce_quantity(form.quantity.as_ref()),
        full_name,
        phone,
        email: trimmed(form.email),
        document_id: trimmed(form.document_id),
        country: trimmed(form.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        city,
        address,
        neighborhood: trimmed(form.neighborhood),
        notes: trimmed(form.notes),
        fbclid: trimmed(form.fbclid),
    })
}

/// Creates an order from a checkout submission and takes its units out of stock.
///
/// Field validation runs before any database access. The product is then re-read
/// inside the transaction; its stored price is the only price used. The order
/// insert and the stock decrement commit together. The owner notification runs
/// after commit and its failure is only logged.
///
/// # Errors
/// * [`Error::Validation`] for a missing product id or blank required field
/// * [`Error::ProductNotFound`] / [`Error::ProductInactive`]
/// * [`Error::InsufficientStock`] when the quantity exceeds stock
/// * [`Error::Database`] on store failures
#[instrument(skip_all)]
pub async fn create_order<N>(
    db: &DatabaseConnection,
    notifier: &N,
    form: CheckoutForm,
    metadata: RequestMetadata,
) -> Result<order::Model>
where
    N: Notifier,
{
    let checkout = validate_checkout(form)?;
    debug!(
        product_id = checkout.product_id,
        quantity = checkout.quantity,
        "Checkout passed field validation"
    );

    let txn = db.begin().await?;

    let product = get_product_by_id(&txn, checkout.product_id)
        .await?
        .ok_or(Error::ProductNotFound {
            id: checkout.product_id,
        })?;
    if !product.active {
        return Err(Error::ProductInactive { id: product.id });
    }
    if checkout.quantity > product.stock {
        return Err(Error::InsufficientStock {
            available: product.stock,
            requested: checkout.quantity,
        });
    }

    let total = line_total(product.price, checkout.quantity);
    let now = chrono::Utc::now();

    let order = order::ActiveModel {
        product_id: Set(product.id),
        product_name: Set(product.name.clone()),
        quantity: Set(checkout.quantity),
        unit_price: Set(product.price),
        total: Set(total),
        customer_name: Set(checkout.full_name),
        phone: Set(checkout.phone),
        email: Set(checkout.email),
        document_id: Set(checkout.document_id),
        country: Set(checkout.country),
        city: Set(checkout.city),
        address: Set(checkout.address),
        neighborhood: Set(checkout.neighborhood),
        notes: Set(checkout.notes),
        fbclid: Set(checkout.fbclid.or(metadata.fbclid)),
        fbc: Set(metadata.fbc),
        fbp: Set(metadata.fbp),
        user_agent: Set(metadata.user_agent),
        client_ip: Set(metadata.client_ip),
        status: Set(OrderStatus::New),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if !take_stock_if_available(&txn, product.id, checkout.quantity).await? {
        // Another checkout took the units between our read and the update.
        txn.rollback().await?;
        return Err(Error::InsufficientStock {
            available: product.stock,
            requested: checkout.quantity,
        });
    }

    txn.commit().await?;
    info!(
        order_id = order.id,
        product_id = order.product_id,
        quantity = order.quantity,
        total = %order.total,
        "Order created"
    );

    let summary = OrderSummary {
        order_id: order.id,
        product_id: order.product_id,
        product_name: order.product_name.clone(),
        quantity: order.quantity,
        unit_price: order.unit_price,
        total: order.total,
        customer_name: order.customer_name.clone(),
        phone: order.phone.clone(),
        email: order.email.clone(),
        city: order.city.clone(),
        address: order.address.clone(),
        neighborhood: order.neighborhood.clone(),
        notes: order.notes.clone(),
    };
    best_effort("order_notification", notifier.notify_order(&summary)).await;

    Ok(order)
}

/// Deletes an order and returns its units to stock, atomically.
///
/// If the product row no longer exists the order is still removed and no stock
/// is credited.
///
/// # Errors
/// Returns [`Error::OrderNotFound`] without writing anything when the id is unknown.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let order = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    if !return_stock(&txn, order.product_id, order.quantity).await? {
        warn!(
            order_id,
            product_id = order.product_id,
            "Product no longer exists; deleting order without restock"
        );
    }

    Order::delete_by_id(order_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        order_id,
        product_id = order.product_id,
        restored = order.quantity,
        "Order deleted and stock restored"
    );
    Ok(())
}

/// Moves an order to `raw_status`, validated against the transition table.
///
/// Requesting the current status succeeds without writing. The write only lands
/// while the stored status is still the one the transition was checked against;
/// a concurrent change makes the check run again on the fresh value.
///
/// # Errors
/// * [`Error::InvalidStatus`] for values outside the status set (checked first)
/// * [`Error::OrderNotFound`]
/// * [`Error::InvalidTransition`] for edges the table does not allow
#[instrument(skip(db))]
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    raw_status: &str,
) -> Result<StatusChanged> {
    let next: OrderStatus = raw_status.parse()?;

    let mut current = OrderStatus::New;
    for _ in 0..STATUS_UPDATE_ATTEMPTS {
        current = Order::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or(Error::OrderNotFound { id: order_id })?
            .status;

        check_transition(current, next)?;
        if current == next {
            debug!(order_id, status = %next, "Status unchanged");
            return Ok(StatusChanged {
                id: order_id,
                status: next,
            });
        }

        if set_status_if_current(db, order_id, current, next).await? {
            info!(order_id, from = %current, to = %next, "Order status changed");
            return Ok(StatusChanged {
                id: order_id,
                status: next,
            });
        }
        debug!(order_id, expected = %current, "Status changed concurrently; re-reading");
    }

    Err(Error::InvalidTransition {
        from: current.to_string(),
        to: next.to_string(),
    })
}

/// Writes `next` only while the stored status is still `expected`.
///
/// Returns `false` when another change got there first.
async fn set_status_if_current(
    db: &DatabaseConnection,
    order_id: i64,
    expected: OrderStatus,
    next: OrderStatus,
) -> Result<bool> {
    let result = Order::update_many()
        .col_expr(order::Column::Status, Expr::value(next))
        .col_expr(order::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.eq(expected))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Lists orders newest first, optionally restricted to one status.
///
/// # Errors
/// Returns [`Error::Database`] on store failures.
pub async fn list_orders(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Fetches one order by id.
///
/// # Errors
/// Returns [`Error::Database`] on store failures.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id).one(db).await.map_err(Into::into)
}

/// Checkout entry point: `{ok: true, orderId}` or `{ok: false, message}`.
pub async fn submit_order<N>(
    db: &DatabaseConnection,
    notifier: &N,
    form: CheckoutForm,
    metadata: RequestMetadata,
) -> Outcome<OrderCreated>
where
    N: Notifier,
{
    let result = create_order(db, notifier, form, metadata)
        .await
        .map(|order| OrderCreated { order_id: order.id });
    Outcome::from_result("create_order", result)
}

/// Admin cancellation with restock: `{ok: true}` or `{ok: false, message}`.
pub async fn cancel_and_restock(db: &DatabaseConnection, order_id: i64) -> Outcome<Done> {
    Outcome::from_result("delete_order", delete_order(db, order_id).await.map(|()| Done {}))
}

/// Admin status change: `{ok: true, id, status}` or `{ok: false, message}`.
pub async fn change_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    raw_status: &str,
) -> Outcome<StatusChanged> {
    Outcome::from_result(
        "update_order_status",
        update_order_status(db, order_id, raw_status).await,
    )
}
