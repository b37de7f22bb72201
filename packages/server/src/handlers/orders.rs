//! Order submission handler: `POST /orders`.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use storefront_api::{OrderCreated, OrderRequest};

use crate::{
    error::AppError,
    json::{Payload, PrettyJson},
};

use super::AppState;

/// Collection new orders are written to.
pub const ORDER_COLLECTION: &str = "orders";

/// `POST /orders`: store the submitted order verbatim.
///
/// Returns 201 with the generated order id. There is no idempotency key:
/// submitting the same body twice creates two orders.
pub async fn create(
    State(state): State<AppState>,
    Payload(order): Payload<OrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    order.validate()?;

    let order_id = state
        .storage
        .insert_one(ORDER_COLLECTION, order.into_document())
        .await
        .map_err(|e| {
            tracing::error!("error saving order: {e}");
            AppError::Internal("An error occurred while saving the order".into())
        })?;

    tracing::info!(order_id = %order_id, "order placed");
    Ok((
        StatusCode::CREATED,
        PrettyJson(OrderCreated {
            message: "Order placed successfully".into(),
            order_id,
        }),
    ))
}
