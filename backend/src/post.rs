use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use log::{info, warn};
use uuid::Uuid;

use crate::access;
use crate::auth::{self, AuthWallet};
use crate::error::{ensure_amount, AppError};
use crate::models::{
    CreatePostRequest, Creator, Post, PostChanges, PostUnlock, PostView, UnlockRequest,
    UpdatePostRequest,
};
use crate::solana::{ExpectedPayment, PaymentStatus};
use crate::state::AppState;
use crate::store::{Store, StoreResult};

fn post_with_owner(store: &dyn Store, id: Uuid) -> StoreResult<Option<(Post, Creator)>> {
    let Some(post) = store.find_post(id)? else {
        return Ok(None);
    };
    Ok(store.find_creator(post.creator_id)?.map(|creator| (post, creator)))
}

/// Publishes a post for the caller's creator profile.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(AuthWallet(wallet)): Extension<AuthWallet>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostView>), AppError> {
    if let Some(price) = req.price {
        ensure_amount("price", price)?;
    }

    let owner = wallet.clone();
    let creator = state
        .db(move |store| store.find_creator_by_wallet(&owner))
        .await?
        .ok_or_else(|| AppError::Forbidden("Only creators can publish posts".into()))?;

    if req.is_gated && !creator.gating_enabled {
        return Err(AppError::BadRequest(
            "Gating is not enabled for this creator".into(),
        ));
    }

    let post = Post::new(creator.id, req);
    let post = state.db(move |store| store.create_post(post)).await?;
    info!("Creator {} published post {} (gated: {})", creator.id, post.id, post.is_gated);
    Ok((
        StatusCode::CREATED,
        Json(access::view_for(&post, &wallet, Some(wallet.as_str()))),
    ))
}

pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<PostView>, AppError> {
    let viewer = auth::optional_wallet(&headers, &state.config.jwt_secret);
    let (post, creator) = state
        .db(move |store| post_with_owner(store, id))
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    Ok(Json(access::view_for(
        &post,
        &creator.user_wallet_address,
        viewer.as_deref(),
    )))
}

/// A creator's feed, newest first, with locked posts redacted for this viewer.
pub async fn list_creator_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(creator_id): Path<Uuid>,
) -> Result<Json<Vec<PostView>>, AppError> {
    let viewer = auth::optional_wallet(&headers, &state.config.jwt_secret);
    let (creator, posts) = state
        .db(move |store| {
            let Some(creator) = store.find_creator(creator_id)? else {
                return Ok(None);
            };
            let posts = store.list_posts_by_creator(creator_id)?;
            Ok(Some((creator, posts)))
        })
        .await?
        .ok_or(AppError::NotFound("Creator"))?;

    let views = posts
        .iter()
        .map(|post| access::view_for(post, &creator.user_wallet_address, viewer.as_deref()))
        .collect();
    Ok(Json(views))
}

pub async fn update_post(
    State(state): State<AppState>,
    Extension(AuthWallet(wallet)): Extension<AuthWallet>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostView>, AppError> {
    if let Some(price) = req.price {
        ensure_amount("price", price)?;
    }

    let (post, creator) = state
        .db(move |store| post_with_owner(store, id))
        .await?
        .ok_or(AppError::NotFound("Post"))?;

    if creator.user_wallet_address != wallet {
        return Err(AppError::Forbidden(
            "You don't have permission to update this post".into(),
        ));
    }
    if req.is_gated == Some(true) && !post.is_gated && !creator.gating_enabled {
        return Err(AppError::BadRequest(
            "Gating is not enabled for this creator".into(),
        ));
    }

    let changes = PostChanges::merge(&post, req);
    let post = state
        .db(move |store| store.update_post(id, changes))
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    info!("Updated post {}", id);
    Ok(Json(access::view_for(&post, &wallet, Some(wallet.as_str()))))
}

/// Grants the caller access to a gated post after an out-of-band payment.
///
/// Without payment verification the caller's word is taken for it. With
/// verification on, the supplied transaction must be confirmed, must transfer
/// at least the post price from the caller to the owner, and can be spent on
/// one unlock only.
pub async fn unlock_post(
    State(state): State<AppState>,
    Extension(AuthWallet(wallet)): Extension<AuthWallet>,
    Path(id): Path<Uuid>,
    body: Option<Json<UnlockRequest>>,
) -> Result<Json<PostView>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let (post, creator) = state
        .db(move |store| post_with_owner(store, id))
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    let owner = creator.user_wallet_address;

    if !access::needs_payment(&post, &owner, &wallet) {
        return Ok(Json(access::view_for(&post, &owner, Some(wallet.as_str()))));
    }

    let payment = match &state.solana {
        Some(solana) => {
            let signature = req.tx_signature.ok_or_else(|| {
                AppError::PaymentRequired("tx_signature is required to unlock this post".into())
            })?;
            let expected = ExpectedPayment::new(&wallet, &owner, post.price)?;
            match solana.verify_payment(&signature, &expected).await? {
                PaymentStatus::Verified => {}
                PaymentStatus::Unconfirmed => {
                    warn!("Unconfirmed payment {} for post {} by {}", signature, id, wallet);
                    return Err(AppError::PaymentRequired(
                        "Payment transaction is not confirmed".into(),
                    ));
                }
                PaymentStatus::Insufficient { paid } => {
                    warn!(
                        "Payment {} for post {} moved {} of {} lamports",
                        signature, id, paid, expected.lamports
                    );
                    return Err(AppError::PaymentRequired(
                        "Payment transaction does not cover this post".into(),
                    ));
                }
            }
            Some(PostUnlock::new(&signature, id, &wallet))
        }
        None => None,
    };

    let grantee = wallet.clone();
    let post = state
        .db(move |store| {
            if let Some(unlock) = payment {
                store.record_unlock(unlock)?;
            }
            store.grant_post_access(id, &grantee)
        })
        .await
        .map_err(|err| match err {
            AppError::Conflict(_) => {
                AppError::Conflict("Payment transaction has already been used".into())
            }
            other => other,
        })?
        .ok_or(AppError::NotFound("Post"))?;
    info!("Unlocked post {} for wallet {}", id, wallet);
    Ok(Json(access::view_for(&post, &owner, Some(wallet.as_str()))))
}
