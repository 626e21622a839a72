//! Persistent record store.
//!
//! Handlers only see the [`Store`] trait. [`PgStore`] backs it with Postgres,
//! [`MemoryStore`] keeps everything in process for local runs and tests.

use uuid::Uuid;

use crate::models::{
    Creator, CreatorChanges, Engagement, EngagementKind, Nft, Post, PostChanges, PostUnlock,
    Trade, User, UserChanges,
};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Find/create/update operations over every record kind.
///
/// Update methods return `None` when the target row does not exist.
pub trait Store: Send + Sync {
    fn create_user(&self, user: User) -> StoreResult<User>;
    fn find_user_by_wallet(&self, wallet: &str) -> StoreResult<Option<User>>;
    fn update_user(&self, wallet: &str, changes: UserChanges) -> StoreResult<Option<User>>;

    fn create_creator(&self, creator: Creator) -> StoreResult<Creator>;
    fn find_creator(&self, id: Uuid) -> StoreResult<Option<Creator>>;
    fn find_creator_by_wallet(&self, wallet: &str) -> StoreResult<Option<Creator>>;
    fn list_creators(&self) -> StoreResult<Vec<Creator>>;
    fn update_creator(&self, id: Uuid, changes: CreatorChanges) -> StoreResult<Option<Creator>>;

    fn create_post(&self, post: Post) -> StoreResult<Post>;
    fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>>;
    /// Newest first.
    fn list_posts_by_creator(&self, creator_id: Uuid) -> StoreResult<Vec<Post>>;
    fn update_post(&self, id: Uuid, changes: PostChanges) -> StoreResult<Option<Post>>;
    /// Adds `wallet` to the post's access list unless already present.
    fn grant_post_access(&self, id: Uuid, wallet: &str) -> StoreResult<Option<Post>>;
    /// Claims a payment signature for an unlock. A signature already claimed is a conflict.
    fn record_unlock(&self, unlock: PostUnlock) -> StoreResult<PostUnlock>;

    fn create_nft(&self, nft: Nft) -> StoreResult<Nft>;
    fn find_nft(&self, id: Uuid) -> StoreResult<Option<Nft>>;
    fn list_nfts(&self) -> StoreResult<Vec<Nft>>;
    /// Overwrites the current price and appends it to the history.
    fn set_nft_price(&self, id: Uuid, price: f64) -> StoreResult<Option<Nft>>;

    fn find_engagement(&self, nft_id: Uuid) -> StoreResult<Option<Engagement>>;
    /// Increments one counter, creating the row on first use.
    fn record_engagement(&self, nft_id: Uuid, kind: EngagementKind) -> StoreResult<Engagement>;

    fn create_trade(&self, trade: Trade) -> StoreResult<Trade>;
    fn list_trades(&self, nft_id: Uuid) -> StoreResult<Vec<Trade>>;
    fn count_trades(&self, nft_id: Uuid) -> StoreResult<i64>;
}
