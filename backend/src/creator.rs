use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use log::info;
use uuid::Uuid;

use crate::auth::AuthWallet;
use crate::error::AppError;
use crate::models::{CreateCreatorRequest, Creator, CreatorChanges};
use crate::state::AppState;

/// Registers the caller's wallet as a creator. One profile per wallet.
pub async fn create_creator(
    State(state): State<AppState>,
    Extension(AuthWallet(wallet)): Extension<AuthWallet>,
    Json(req): Json<CreateCreatorRequest>,
) -> Result<(StatusCode, Json<Creator>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Creator name is required".into()));
    }
    let creator = Creator::new(&wallet, req);
    let creator = state.db(move |store| store.create_creator(creator)).await?;
    info!("Created creator {} for wallet {}", creator.id, wallet);
    Ok((StatusCode::CREATED, Json(creator)))
}

pub async fn list_creators(State(state): State<AppState>) -> Result<Json<Vec<Creator>>, AppError> {
    let creators = state.db(|store| store.list_creators()).await?;
    info!("Fetched {} creators", creators.len());
    Ok(Json(creators))
}

pub async fn get_creator(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Creator>, AppError> {
    state
        .db(move |store| store.find_creator(id))
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Creator"))
}

pub async fn find_creator_by_wallet(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<Creator>, AppError> {
    state
        .db(move |store| store.find_creator_by_wallet(&wallet))
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Creator"))
}

pub async fn update_creator(
    State(state): State<AppState>,
    Extension(AuthWallet(wallet)): Extension<AuthWallet>,
    Path(id): Path<Uuid>,
    Json(changes): Json<CreatorChanges>,
) -> Result<Json<Creator>, AppError> {
    let existing = state
        .db(move |store| store.find_creator(id))
        .await?
        .ok_or(AppError::NotFound("Creator"))?;

    if existing.user_wallet_address != wallet {
        return Err(AppError::Forbidden(
            "You don't have permission to update this creator".into(),
        ));
    }

    let creator = state
        .db(move |store| store.update_creator(id, changes))
        .await?
        .ok_or(AppError::NotFound("Creator"))?;
    info!("Updated creator {}", id);
    Ok(Json(creator))
}
