use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extractors::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{CreateSaleRequest, ListSalesQuery, UpdateSaleRequest};
use super::repo::{Sale, SaleDetails};

pub fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", post(create_sale).get(list_sales))
        .route(
            "/sales/:id",
            get(get_sale).patch(update_sale).delete(delete_sale),
        )
}

#[instrument(skip(state, payload, _auth))]
pub async fn create_sale(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleDetails>), ApiError> {
    let (user_id, product_ids) = payload.validate()?;
    let sale = Sale::create(&state.db, user_id, &product_ids).await?;

    info!(sale_id = %sale.id, user_id = %user_id, "sale created");
    Ok((StatusCode::CREATED, Json(sale)))
}

#[instrument(skip(state, _auth))]
pub async fn list_sales(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<ListSalesQuery>,
) -> Result<Json<Vec<SaleDetails>>, ApiError> {
    let sales = Sale::find_all(&state.db, filter.user).await?;
    Ok(Json(sales))
}

#[instrument(skip(state, _auth))]
pub async fn get_sale(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SaleDetails>, ApiError> {
    let sale = Sale::find_by_id(&state.db, id).await?;
    Ok(Json(sale))
}

#[instrument(skip(state, payload, _auth))]
pub async fn update_sale(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSaleRequest>,
) -> Result<Json<SaleDetails>, ApiError> {
    let changes = payload.validate()?;
    let sale = Sale::update(&state.db, id, changes).await?;

    info!(sale_id = %sale.id, "sale updated");
    Ok(Json(sale))
}

#[instrument(skip(state, _auth))]
pub async fn delete_sale(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SaleDetails>, ApiError> {
    let sale = Sale::remove(&state.db, id).await?;
    info!(sale_id = %sale.id, "sale deleted");
    Ok(Json(sale))
}
