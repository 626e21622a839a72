use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::AppError;
use crate::state::AppState;

const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // Wallet address
    exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format")]
    InvalidHeader,
    #[error("Invalid or expired token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid wallet address")]
    InvalidWallet,
    #[error("Signature is not a base58 ed25519 signature")]
    MalformedSignature,
    #[error("Signature does not match wallet and message")]
    BadSignature,
    #[error("System clock error")]
    Clock,
}

/// Wallet address of the authenticated caller, set by [`authenticate`].
#[derive(Debug, Clone)]
pub struct AuthWallet(pub String);

pub fn create_token(wallet_address: &str, jwt_secret: &str) -> Result<String, AuthError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AuthError::Clock)?
        .as_secs()
        + TOKEN_TTL_SECS;
    let claims = Claims {
        sub: wallet_address.to_string(),
        exp: expiration as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?)
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<String, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims.sub)
}

pub fn is_valid_wallet(wallet_address: &str) -> bool {
    Pubkey::from_str(wallet_address).is_ok()
}

/// Checks a base58 ed25519 signature of `message` by `wallet_address`.
pub fn verify_wallet_signature(
    wallet_address: &str,
    signature: &str,
    message: &str,
) -> Result<(), AuthError> {
    let wallet = Pubkey::from_str(wallet_address).map_err(|_| AuthError::InvalidWallet)?;
    let raw: [u8; 64] = bs58::decode(signature)
        .into_vec()
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(AuthError::MalformedSignature)?;

    if Signature::from(raw).verify(wallet.as_ref(), message.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::BadSignature)
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;
    auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidHeader)
}

/// Wallet of the caller if a valid bearer token is present, for routes that
/// also serve anonymous viewers.
pub fn optional_wallet(headers: &HeaderMap, jwt_secret: &str) -> Option<String> {
    let token = bearer_token(headers).ok()?;
    validate_token(token, jwt_secret).ok()
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let wallet = validate_token(token, &state.config.jwt_secret)?;
    log::debug!("Authenticated wallet: {}", wallet);
    request.extensions_mut().insert(AuthWallet(wallet));
    Ok(next.run(request).await)
}
