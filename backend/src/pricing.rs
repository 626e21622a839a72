//! Engagement-driven NFT pricing.

use log::{info, warn};
use uuid::Uuid;

use crate::models::PriceUpdate;
use crate::store::{Store, StoreError};

const LIKE_WEIGHT: f64 = 0.05;
const VIEW_WEIGHT: f64 = 0.01;
const TRADE_WEIGHT: f64 = 0.1;

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Price of NFT {nft_id} is no longer a finite number")]
    NonFinite { nft_id: Uuid },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub views: u64,
    pub likes: u64,
    /// Every trade recorded for the item, not only recent ones.
    pub trades: u64,
}

impl Metrics {
    /// Store counters are signed; negative values never occur and read as zero.
    pub fn from_counts(views: i64, likes: i64, trades: i64) -> Self {
        Self {
            views: u64::try_from(views).unwrap_or(0),
            likes: u64::try_from(likes).unwrap_or(0),
            trades: u64::try_from(trades).unwrap_or(0),
        }
    }
}

/// Rounds to whole cents. Values too large to carry cents come back unchanged.
pub fn round2(value: f64) -> f64 {
    let cents = (value * 100.0).round();
    if cents.is_finite() {
        cents / 100.0
    } else {
        value
    }
}

/// `round2(price × (1 + 0.05·likes) × (1 + 0.01·views) × (1 + 0.1·trades))`.
///
/// Prices have no upper bound and grow on every run while engagement stays
/// non-zero. A result can overflow to infinity; callers must not store it.
/// Never below `current_price` when that price is in whole cents.
pub fn calculate_price(current_price: f64, metrics: Metrics) -> f64 {
    round2(
        current_price
            * (1.0 + LIKE_WEIGHT * metrics.likes as f64)
            * (1.0 + VIEW_WEIGHT * metrics.views as f64)
            * (1.0 + TRADE_WEIGHT * metrics.trades as f64),
    )
}

/// Reprices the whole catalog, one item at a time.
///
/// The first error aborts the batch; items already repriced stay written.
/// Items that disappear between the scan and the write are skipped.
pub fn recalculate_all(store: &dyn Store) -> Result<Vec<PriceUpdate>, PricingError> {
    let catalog = store.list_nfts()?;
    let mut updates = Vec::with_capacity(catalog.len());

    for nft in catalog {
        let (views, likes) = store
            .find_engagement(nft.id)?
            .map(|e| (e.views, e.likes))
            .unwrap_or((0, 0));
        let trades = store.count_trades(nft.id)?;
        let new_price = calculate_price(
            nft.current_price,
            Metrics::from_counts(views, likes, trades),
        );
        if !new_price.is_finite() {
            warn!("Price of NFT {} overflowed from {}", nft.id, nft.current_price);
            return Err(PricingError::NonFinite { nft_id: nft.id });
        }

        if store.set_nft_price(nft.id, new_price)?.is_some() {
            updates.push(PriceUpdate {
                nft_id: nft.id,
                previous_price: nft.current_price,
                new_price,
            });
        }
    }

    info!("Recalculated prices for {} NFTs", updates.len());
    Ok(updates)
}
