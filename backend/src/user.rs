use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use log::info;

use crate::auth::{self, AuthWallet};
use crate::error::AppError;
use crate::models::{CreateUserRequest, LoginRequest, LoginResponse, User, UserChanges};
use crate::state::AppState;

/// Verifies a signed login message and issues a session token, registering
/// the wallet on first login.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    auth::verify_wallet_signature(&req.wallet_address, &req.signature, &req.message)?;

    let wallet = req.wallet_address.clone();
    let user = state
        .db(move |store| match store.find_user_by_wallet(&wallet)? {
            Some(user) => Ok(user),
            None => store.create_user(User::new(&wallet, None, None)),
        })
        .await?;

    let token = auth::create_token(&user.wallet_address, &state.config.jwt_secret)?;
    info!("Wallet {} logged in", user.wallet_address);
    Ok(Json(LoginResponse { token, user }))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if !auth::is_valid_wallet(&req.wallet_address) {
        return Err(AppError::BadRequest("Invalid wallet address".into()));
    }
    let user = User::new(&req.wallet_address, req.username, req.email);
    let user = state.db(move |store| store.create_user(user)).await?;
    info!("Created user for wallet {}", user.wallet_address);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn find_user(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<User>, AppError> {
    state
        .db(move |store| store.find_user_by_wallet(&wallet))
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("User"))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(AuthWallet(wallet)): Extension<AuthWallet>,
    Json(changes): Json<UserChanges>,
) -> Result<Json<User>, AppError> {
    let user = state
        .db(move |store| store.update_user(&wallet, changes))
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!("Updated profile for wallet {}", user.wallet_address);
    Ok(Json(user))
}
