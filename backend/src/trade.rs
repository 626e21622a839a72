use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use log::info;
use uuid::Uuid;

use crate::auth::AuthWallet;
use crate::error::{ensure_amount, AppError};
use crate::models::{CreateTradeRequest, Trade};
use crate::state::AppState;

/// Records a sale by the caller and moves the NFT's price to the sale price.
///
/// The trade insert and the price write are separate statements; a failure
/// between them leaves the trade without its price update.
pub async fn create_trade(
    State(state): State<AppState>,
    Extension(AuthWallet(buyer)): Extension<AuthWallet>,
    Json(req): Json<CreateTradeRequest>,
) -> Result<(StatusCode, Json<Trade>), AppError> {
    ensure_amount("price", req.price)?;

    let trade = Trade::new(&buyer, req);
    let trade = state
        .db(move |store| {
            if store.find_nft(trade.nft_id)?.is_none() {
                return Ok(None);
            }
            let trade = store.create_trade(trade)?;
            store.set_nft_price(trade.nft_id, trade.price)?;
            Ok(Some(trade))
        })
        .await?
        .ok_or(AppError::NotFound("NFT"))?;

    info!(
        "Recorded trade {} for NFT {} at {} ({} -> {})",
        trade.id, trade.nft_id, trade.price, trade.seller_id, trade.buyer_id
    );
    Ok((StatusCode::CREATED, Json(trade)))
}

pub async fn list_nft_trades(
    State(state): State<AppState>,
    Path(nft_id): Path<Uuid>,
) -> Result<Json<Vec<Trade>>, AppError> {
    let trades = state
        .db(move |store| {
            if store.find_nft(nft_id)?.is_none() {
                return Ok(None);
            }
            store.list_trades(nft_id).map(Some)
        })
        .await?
        .ok_or(AppError::NotFound("NFT"))?;
    Ok(Json(trades))
}
