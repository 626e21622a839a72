//! # FanPit backend
//!
//! Creator subscriptions with gated posts, and an NFT catalog whose prices
//! follow engagement and trading activity.
//!
//! ## Endpoints
//! - `POST /auth/login` - exchange a signed wallet message for a token
//! - `/users`, `/creators`, `/posts`, `/nfts`, `/trades` - records
//! - `POST /posts/:id/unlock` - grant the caller access to a gated post
//! - `POST /nfts/recalculate-prices` - reprice the whole catalog

pub mod access;
pub mod auth;
pub mod config;
mod creator;
pub mod error;
pub mod ipfs;
pub mod models;
mod nft;
mod post;
pub mod pricing;
mod router;
pub mod schema;
pub mod solana;
pub mod state;
pub mod store;
mod trade;
mod user;

pub use config::AppConfig;
pub use error::AppError;
pub use router::create as create_router;
pub use state::AppState;
