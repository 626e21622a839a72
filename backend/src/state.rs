//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::ipfs::IpfsClient;
use crate::solana::SolanaClient;
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    /// Present only when payment verification is enabled.
    pub solana: Option<Arc<SolanaClient>>,
    pub ipfs: Option<IpfsClient>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let solana = config
            .verify_payments
            .then(|| Arc::new(SolanaClient::new(&config.solana_rpc_url)));
        let ipfs = match (&config.ipfs_api_url, &config.ipfs_jwt) {
            (Some(url), Some(jwt)) => Some(IpfsClient::new(url, jwt, &config.ipfs_gateway_url)),
            _ => None,
        };
        Self {
            config,
            store,
            solana,
            ipfs,
        }
    }

    /// Runs a synchronous store call on the blocking pool.
    pub async fn db<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| AppError::Internal(format!("Thread pool error: {e}")))?
            .map_err(AppError::from)
    }
}
