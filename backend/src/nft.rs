use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use base64::{engine::general_purpose, Engine};
use log::info;
use uuid::Uuid;

use crate::auth::AuthWallet;
use crate::error::{ensure_amount, AppError};
use crate::models::{
    CreateNftRequest, Engagement, EngagementKind, MetadataUploadRequest, MetadataUploadResponse,
    Nft, PriceUpdate,
};
use crate::pricing;
use crate::state::AppState;

/// Lists an NFT for the caller's creator profile at its starting price.
pub async fn create_nft(
    State(state): State<AppState>,
    Extension(AuthWallet(wallet)): Extension<AuthWallet>,
    Json(req): Json<CreateNftRequest>,
) -> Result<(StatusCode, Json<Nft>), AppError> {
    ensure_amount("price", req.price)?;
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("NFT title is required".into()));
    }

    let creator = state
        .db(move |store| store.find_creator_by_wallet(&wallet))
        .await?
        .ok_or_else(|| AppError::Forbidden("Only creators can list NFTs".into()))?;

    let nft = Nft::new(creator.id, req);
    let nft = state.db(move |store| store.create_nft(nft)).await?;
    info!("Creator {} listed NFT {} at {}", creator.id, nft.id, nft.current_price);
    Ok((StatusCode::CREATED, Json(nft)))
}

pub async fn list_nfts(State(state): State<AppState>) -> Result<Json<Vec<Nft>>, AppError> {
    let nfts = state.db(|store| store.list_nfts()).await?;
    info!("Fetched {} NFTs", nfts.len());
    Ok(Json(nfts))
}

pub async fn get_nft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Nft>, AppError> {
    state
        .db(move |store| store.find_nft(id))
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("NFT"))
}

async fn record(state: &AppState, id: Uuid, kind: EngagementKind) -> Result<Engagement, AppError> {
    state
        .db(move |store| {
            if store.find_nft(id)?.is_none() {
                return Ok(None);
            }
            store.record_engagement(id, kind).map(Some)
        })
        .await?
        .ok_or(AppError::NotFound("NFT"))
}

pub async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Engagement>, AppError> {
    Ok(Json(record(&state, id, EngagementKind::View).await?))
}

pub async fn record_like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Engagement>, AppError> {
    let engagement = record(&state, id, EngagementKind::Like).await?;
    info!("NFT {} now has {} likes", id, engagement.likes);
    Ok(Json(engagement))
}

pub async fn get_engagement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Engagement>, AppError> {
    let engagement = state
        .db(move |store| {
            if store.find_nft(id)?.is_none() {
                return Ok(None);
            }
            Ok(Some(
                store
                    .find_engagement(id)?
                    .unwrap_or_else(|| Engagement::empty(id)),
            ))
        })
        .await?
        .ok_or(AppError::NotFound("NFT"))?;
    Ok(Json(engagement))
}

/// Runs the full-catalog price recalculation.
pub async fn recalculate_prices(
    State(state): State<AppState>,
    Extension(AuthWallet(wallet)): Extension<AuthWallet>,
) -> Result<Json<Vec<PriceUpdate>>, AppError> {
    info!("Price recalculation requested by {}", wallet);
    let updates = state
        .db(|store| Ok(pricing::recalculate_all(store)))
        .await??;
    Ok(Json(updates))
}

/// Pins an NFT image and its metadata document, returning both URIs.
pub async fn upload_metadata(
    State(state): State<AppState>,
    Json(req): Json<MetadataUploadRequest>,
) -> Result<Json<MetadataUploadResponse>, AppError> {
    let ipfs = state
        .ipfs
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("IPFS uploads are not configured".into()))?;

    let image = general_purpose::STANDARD
        .decode(req.image_base64.as_bytes())
        .map_err(|_| AppError::BadRequest("Invalid base64 image".into()))?;
    if image.is_empty() {
        return Err(AppError::BadRequest("Image is empty".into()));
    }

    let (image_uri, metadata_uri) = ipfs
        .upload_nft_metadata(&req.name, &req.description, &req.file_name, image)
        .await?;
    Ok(Json(MetadataUploadResponse {
        image_uri,
        metadata_uri,
    }))
}
