use crate::{
    core::product,
    entities::ProductModel,
    errors::{Error, Result},
    web::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};

/// `GET /api/products` - the active catalog.
///
/// # Errors
/// A store failure answers `500`.
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductModel>>> {
    Ok(Json(product::list_active_products(&state.db).await?))
}

/// `GET /api/products/{id}` - inactive products are indistinguishable from missing ones.
///
/// # Errors
/// Unknown or inactive ids answer `404`.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductModel>> {
    product::get_active_product(&state.db, id)
        .await?
        .map(Json)
        .ok_or(Error::ProductNotFound { id })
}
