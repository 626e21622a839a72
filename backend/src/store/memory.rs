use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Creator, CreatorChanges, Engagement, EngagementKind, Nft, Post, PostChanges, PostUnlock,
    Trade, User, UserChanges,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    creators: Vec<Creator>,
    posts: Vec<Post>,
    nfts: Vec<Nft>,
    engagements: HashMap<Uuid, Engagement>,
    trades: Vec<Trade>,
    unlocks: HashMap<String, PostUnlock>,
}

/// Process-local store. Every operation runs under one lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn create_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables()?;
        if tables
            .users
            .iter()
            .any(|u| u.wallet_address == user.wallet_address)
        {
            return Err(StoreError::Conflict("User".into()));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    fn find_user_by_wallet(&self, wallet: &str) -> StoreResult<Option<User>> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .find(|u| u.wallet_address == wallet)
            .cloned())
    }

    fn update_user(&self, wallet: &str, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut tables = self.tables()?;
        let Some(user) = tables.users.iter_mut().find(|u| u.wallet_address == wallet) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = Some(username);
        }
        if let Some(email) = changes.email {
            user.email = Some(email);
        }
        if let Some(image) = changes.profile_image_url {
            user.profile_image_url = Some(image);
        }
        user.updated_at = Utc::now().naive_utc();
        Ok(Some(user.clone()))
    }

    fn create_creator(&self, creator: Creator) -> StoreResult<Creator> {
        let mut tables = self.tables()?;
        if tables
            .creators
            .iter()
            .any(|c| c.user_wallet_address == creator.user_wallet_address)
        {
            return Err(StoreError::Conflict("Creator".into()));
        }
        tables.creators.push(creator.clone());
        Ok(creator)
    }

    fn find_creator(&self, id: Uuid) -> StoreResult<Option<Creator>> {
        let tables = self.tables()?;
        Ok(tables.creators.iter().find(|c| c.id == id).cloned())
    }

    fn find_creator_by_wallet(&self, wallet: &str) -> StoreResult<Option<Creator>> {
        let tables = self.tables()?;
        Ok(tables
            .creators
            .iter()
            .find(|c| c.user_wallet_address == wallet)
            .cloned())
    }

    fn list_creators(&self) -> StoreResult<Vec<Creator>> {
        Ok(self.tables()?.creators.clone())
    }

    fn update_creator(&self, id: Uuid, changes: CreatorChanges) -> StoreResult<Option<Creator>> {
        let mut tables = self.tables()?;
        let Some(creator) = tables.creators.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            creator.name = name;
        }
        if let Some(description) = changes.description {
            creator.description = description;
        }
        if let Some(image_url) = changes.image_url {
            creator.image_url = image_url;
        }
        if let Some(gating_enabled) = changes.gating_enabled {
            creator.gating_enabled = gating_enabled;
        }
        creator.updated_at = Utc::now().naive_utc();
        Ok(Some(creator.clone()))
    }

    fn create_post(&self, post: Post) -> StoreResult<Post> {
        self.tables()?.posts.push(post.clone());
        Ok(post)
    }

    fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let tables = self.tables()?;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    fn list_posts_by_creator(&self, creator_id: Uuid) -> StoreResult<Vec<Post>> {
        let tables = self.tables()?;
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| p.creator_id == creator_id)
            .cloned()
            .collect();
        // Newest first, later inserts win timestamp ties.
        posts.reverse();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    fn update_post(&self, id: Uuid, changes: PostChanges) -> StoreResult<Option<Post>> {
        let mut tables = self.tables()?;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.status_text = changes.status_text;
        post.image_url = changes.image_url;
        post.is_gated = changes.is_gated;
        post.price = changes.price;
        post.updated_at = Utc::now().naive_utc();
        Ok(Some(post.clone()))
    }

    fn grant_post_access(&self, id: Uuid, wallet: &str) -> StoreResult<Option<Post>> {
        let mut tables = self.tables()?;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if !post.accessible_by.iter().any(|w| w == wallet) {
            post.accessible_by.push(wallet.to_string());
            post.updated_at = Utc::now().naive_utc();
        }
        Ok(Some(post.clone()))
    }

    fn record_unlock(&self, unlock: PostUnlock) -> StoreResult<PostUnlock> {
        let mut tables = self.tables()?;
        if tables.unlocks.contains_key(&unlock.tx_signature) {
            return Err(StoreError::Conflict("Payment transaction".into()));
        }
        tables
            .unlocks
            .insert(unlock.tx_signature.clone(), unlock.clone());
        Ok(unlock)
    }

    fn create_nft(&self, nft: Nft) -> StoreResult<Nft> {
        self.tables()?.nfts.push(nft.clone());
        Ok(nft)
    }

    fn find_nft(&self, id: Uuid) -> StoreResult<Option<Nft>> {
        let tables = self.tables()?;
        Ok(tables.nfts.iter().find(|n| n.id == id).cloned())
    }

    fn list_nfts(&self) -> StoreResult<Vec<Nft>> {
        Ok(self.tables()?.nfts.clone())
    }

    fn set_nft_price(&self, id: Uuid, price: f64) -> StoreResult<Option<Nft>> {
        let mut tables = self.tables()?;
        let Some(nft) = tables.nfts.iter_mut().find(|n| n.id == id) else {
            return Ok(None);
        };
        nft.current_price = price;
        nft.price_history.push(price);
        nft.updated_at = Utc::now().naive_utc();
        Ok(Some(nft.clone()))
    }

    fn find_engagement(&self, nft_id: Uuid) -> StoreResult<Option<Engagement>> {
        Ok(self.tables()?.engagements.get(&nft_id).cloned())
    }

    fn record_engagement(&self, nft_id: Uuid, kind: EngagementKind) -> StoreResult<Engagement> {
        let mut tables = self.tables()?;
        let engagement = tables
            .engagements
            .entry(nft_id)
            .or_insert_with(|| Engagement::empty(nft_id));
        match kind {
            EngagementKind::View => engagement.views += 1,
            EngagementKind::Like => engagement.likes += 1,
        }
        engagement.updated_at = Utc::now().naive_utc();
        Ok(engagement.clone())
    }

    fn create_trade(&self, trade: Trade) -> StoreResult<Trade> {
        self.tables()?.trades.push(trade.clone());
        Ok(trade)
    }

    fn list_trades(&self, nft_id: Uuid) -> StoreResult<Vec<Trade>> {
        let tables = self.tables()?;
        Ok(tables
            .trades
            .iter()
            .filter(|t| t.nft_id == nft_id)
            .cloned()
            .collect())
    }

    fn count_trades(&self, nft_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables()?;
        Ok(tables.trades.iter().filter(|t| t.nft_id == nft_id).count() as i64)
    }
}
