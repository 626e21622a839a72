use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::round2;
use crate::schema::{creators, engagements, nfts, post_unlocks, posts, trades, users};

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub wallet_address: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn new(wallet_address: &str, username: Option<String>, email: Option<String>) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.to_string(),
            username,
            email,
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = creators)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Creator {
    pub id: Uuid,
    pub user_wallet_address: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub gating_enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Creator {
    pub fn new(wallet_address: &str, req: CreateCreatorRequest) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            user_wallet_address: wallet_address.to_string(),
            name: req.name,
            description: req.description.unwrap_or_default(),
            image_url: req.image_url.unwrap_or_default(),
            gating_enabled: req.gating_enabled.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = creators)]
pub struct CreatorChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub gating_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub status_text: String,
    pub image_url: Option<String>,
    pub is_gated: bool,
    pub price: f64,
    pub accessible_by: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Post {
    pub fn new(creator_id: Uuid, req: CreatePostRequest) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            creator_id,
            status_text: req.status_text,
            image_url: req.image_url,
            is_gated: req.is_gated,
            price: effective_post_price(req.is_gated, req.price.unwrap_or(0.0)),
            accessible_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Ungated posts are always free.
pub fn effective_post_price(is_gated: bool, price: f64) -> f64 {
    if is_gated {
        price
    } else {
        0.0
    }
}

/// Full replacement of a post's editable fields.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = posts)]
#[diesel(treat_none_as_null = true)]
pub struct PostChanges {
    pub status_text: String,
    pub image_url: Option<String>,
    pub is_gated: bool,
    pub price: f64,
}

impl PostChanges {
    /// Merges an update request over the stored post, re-applying the price rule.
    pub fn merge(post: &Post, req: UpdatePostRequest) -> Self {
        let is_gated = req.is_gated.unwrap_or(post.is_gated);
        let price = req.price.unwrap_or(post.price);
        Self {
            status_text: req.status_text.unwrap_or_else(|| post.status_text.clone()),
            image_url: req.image_url.or_else(|| post.image_url.clone()),
            is_gated,
            price: effective_post_price(is_gated, price),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = nfts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Nft {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub image_url: String,
    pub metadata_uri: Option<String>,
    pub mint_address: Option<String>,
    pub current_price: f64,
    pub price_history: Vec<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Nft {
    /// The listing price is kept in whole cents.
    pub fn new(creator_id: Uuid, req: CreateNftRequest) -> Self {
        let now = now();
        let price = round2(req.price);
        Self {
            id: Uuid::new_v4(),
            creator_id,
            title: req.title,
            image_url: req.image_url,
            metadata_uri: req.metadata_uri,
            mint_address: req.mint_address,
            current_price: price,
            price_history: vec![price],
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = engagements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Engagement {
    pub nft_id: Uuid,
    pub views: i64,
    pub likes: i64,
    pub updated_at: NaiveDateTime,
}

impl Engagement {
    pub fn empty(nft_id: Uuid) -> Self {
        Self {
            nft_id,
            views: 0,
            likes: 0,
            updated_at: now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementKind {
    View,
    Like,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = trades)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Trade {
    pub id: Uuid,
    pub nft_id: Uuid,
    pub buyer_id: String,
    pub seller_id: String,
    pub price: f64,
    pub tx_signature: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl Trade {
    pub fn new(buyer_id: &str, req: CreateTradeRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            nft_id: req.nft_id,
            buyer_id: buyer_id.to_string(),
            seller_id: req.seller_id,
            price: round2(req.price),
            tx_signature: req.tx_signature,
            timestamp: now(),
        }
    }
}

/// A payment transaction that has been spent on unlocking a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = post_unlocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostUnlock {
    pub tx_signature: String,
    pub post_id: Uuid,
    pub wallet_address: String,
    pub created_at: NaiveDateTime,
}

impl PostUnlock {
    pub fn new(tx_signature: &str, post_id: Uuid, wallet_address: &str) -> Self {
        Self {
            tx_signature: tx_signature.to_string(),
            post_id,
            wallet_address: wallet_address.to_string(),
            created_at: now(),
        }
    }
}

// Request bodies

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub wallet_address: String,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub wallet_address: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCreatorRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub gating_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub status_text: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_gated: bool,
    pub price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub status_text: Option<String>,
    pub image_url: Option<String>,
    pub is_gated: Option<bool>,
    pub price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnlockRequest {
    /// Payment transaction signature, checked only when payment verification is on.
    pub tx_signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNftRequest {
    pub title: String,
    pub image_url: String,
    pub metadata_uri: Option<String>,
    pub mint_address: Option<String>,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateTradeRequest {
    pub nft_id: Uuid,
    pub seller_id: String,
    pub price: f64,
    pub tx_signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataUploadRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub file_name: String,
    pub image_base64: String,
}

// Responses

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// A post as seen by one viewer. Locked posts carry no content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub status_text: Option<String>,
    pub image_url: Option<String>,
    pub is_gated: bool,
    pub price: f64,
    pub locked: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub nft_id: Uuid,
    pub previous_price: f64,
    pub new_price: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataUploadResponse {
    pub image_uri: String,
    pub metadata_uri: String,
}
