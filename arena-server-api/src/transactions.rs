use axum::{Json, extract::State};
use arena_domain::{player::PlayerId, transaction::TransactionId};

use crate::{ApiError, ApiState, schemas::TransactionCreate};

#[derive(serde::Serialize)]
pub struct JsonTransactionResponse {
    transaction_id: TransactionId,
    player_id: PlayerId,
    item: String,
    amount: f64,
    status: String,
}

pub async fn create_transaction(
    State(state): State<ApiState>,
    Json(body): Json<TransactionCreate>,
) -> Result<Json<JsonTransactionResponse>, ApiError> {
    let created = state
        .app
        .transaction_service
        .create_transaction(body.player_id, body.item_type, body.item_name, body.amount)
        .await
        .map_err(ApiError::bad_request_except_not_found)?;
    Ok(Json(JsonTransactionResponse {
        transaction_id: created.id,
        player_id: created.player_id,
        item: created.item_name,
        amount: created.amount,
        status: created.status.as_str().to_string(),
    }))
}
