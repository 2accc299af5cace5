//! Admin API. Every handler except login/logout requires an [`AdminSession`].
//!
//! Reads answer with a status code (404 for unknown ids); writes always answer
//! `200` with an `{ok, ...}` body so the dashboard can show the message inline.

use crate::{
    core::{
        order,
        outcome::{Done, Outcome, StatusChanged},
        product::{self, ProductInput},
    },
    entities::{OrderModel, OrderStatus, ProductModel},
    errors::{Error, Result},
    web::{
        AppState, JsonBody, json_body,
        session::{self, AdminSession, LOGIN_PATH},
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Body of `POST /admin/login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Submitted admin password
    #[serde(default)]
    pub password: String,
}

/// `POST /admin/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: JsonBody<LoginForm>,
) -> (CookieJar, Json<Outcome<Done>>) {
    let form = match json_body(body) {
        Ok(form) => form,
        Err(e) => return (jar, Json(Outcome::from_result("admin_login", Err(e)))),
    };
    if !state.session.password_matches(&form.password) {
        warn!("Failed admin login attempt");
        let outcome =
            Outcome::from_result("admin_login", Err(Error::validation("Contraseña incorrecta.")));
        return (jar, Json(outcome));
    }

    match session::issue_token(&state.session) {
        Ok(token) => {
            info!("Admin session started");
            (
                jar.add(session::session_cookie(token)),
                Json(Outcome::from_result("admin_login", Ok(Done {}))),
            )
        }
        Err(e) => (jar, Json(Outcome::from_result("admin_login", Err(e)))),
    }
}

/// `POST /admin/logout`
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (
        jar.remove(session::expired_session_cookie()),
        Redirect::to(LOGIN_PATH),
    )
}

/// Query string of the order list.
#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    /// Only orders in this status; blank means all
    pub status: Option<String>,
}

/// `GET /admin/api/orders[?status=]`
///
/// # Errors
/// An unknown `status` filter answers `400`.
pub async fn list_orders(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<OrderModel>>> {
    let status = filter
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    Ok(Json(order::list_orders(&state.db, status).await?))
}

/// `GET /admin/api/orders/{id}`
///
/// # Errors
/// Unknown ids answer `404`.
pub async fn get_order(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<OrderModel>> {
    order::get_order(&state.db, id)
        .await?
        .map(Json)
        .ok_or(Error::OrderNotFound { id })
}

/// Body of the status change request.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    /// Target status slug
    #[serde(default)]
    pub status: String,
}

/// `PATCH /admin/api/orders/{id}/status`
pub async fn update_order_status(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<StatusForm>,
) -> Json<Outcome<StatusChanged>> {
    match json_body(body) {
        Ok(form) => Json(order::change_order_status(&state.db, id, &form.status).await),
        Err(e) => Json(Outcome::from_result("update_order_status", Err(e))),
    }
}

/// `DELETE /admin/api/orders/{id}` - cancellation with restock.
pub async fn delete_order(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<Outcome<Done>> {
    Json(order::cancel_and_restock(&state.db, id).await)
}

/// Payload of a successful product write.
#[derive(Debug, Serialize)]
pub struct ProductSaved {
    /// The product as stored
    pub product: ProductModel,
}

/// `GET /admin/api/products` - active and inactive.
///
/// # Errors
/// A store failure answers `500`.
pub async fn list_products(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductModel>>> {
    Ok(Json(product::list_all_products(&state.db).await?))
}

/// `POST /admin/api/products`
pub async fn create_product(
    _session: AdminSession,
    State(state): State<AppState>,
    body: JsonBody<ProductInput>,
) -> Json<Outcome<ProductSaved>> {
    let result = match json_body(body) {
        Ok(input) => product::create_product(&state.db, input).await,
        Err(e) => Err(e),
    }
    .map(|product| ProductSaved { product });
    Json(Outcome::from_result("create_product", result))
}

/// `PUT /admin/api/products/{id}`
pub async fn update_product(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<ProductInput>,
) -> Json<Outcome<ProductSaved>> {
    let result = match json_body(body) {
        Ok(input) => product::update_product(&state.db, id, input).await,
        Err(e) => Err(e),
    }
    .map(|product| ProductSaved { product });
    Json(Outcome::from_result("update_product", result))
}

/// Body of the stock override request.
#[derive(Debug, Deserialize)]
pub struct StockForm {
    /// New units on hand, must not be negative
    pub stock: i32,
}

/// `PATCH /admin/api/products/{id}/stock`
pub async fn set_product_stock(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: JsonBody<StockForm>,
) -> Json<Outcome<ProductSaved>> {
    let result = match json_body(body) {
        Ok(form) => product::set_product_stock(&state.db, id, form.stock).await,
        Err(e) => Err(e),
    }
    .map(|product| ProductSaved { product });
    Json(Outcome::from_result("set_product_stock", result))
}

/// `DELETE /admin/api/products/{id}`
pub async fn delete_product(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<Outcome<Done>> {
    let result = product::delete_product(&state.db, id).await.map(|()| Done {});
    Json(Outcome::from_result("delete_product", result))
}
