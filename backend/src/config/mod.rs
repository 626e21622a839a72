use dotenv::dotenv;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "defaults::host")]
    pub host: String,
    #[serde(default = "defaults::port")]
    pub port: u16,
    /// Empty selects the in-memory store.
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "defaults::db_pool_size")]
    pub db_pool_size: u32,
    pub jwt_secret: String,
    #[serde(default = "defaults::solana_rpc_url")]
    pub solana_rpc_url: String,
    /// When set, unlocking a gated post requires a confirmed payment signature.
    #[serde(default)]
    pub verify_payments: bool,
    #[serde(default)]
    pub ipfs_api_url: Option<String>,
    #[serde(default)]
    pub ipfs_jwt: Option<String>,
    #[serde(default = "defaults::ipfs_gateway_url")]
    pub ipfs_gateway_url: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv().ok(); // Load .env file if present
        config::Config::builder()
            .add_source(config::File::with_name("fanpit").required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Configuration for in-process use: memory store, no chain or IPFS access.
    pub fn local(jwt_secret: &str) -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            database_url: String::new(),
            db_pool_size: defaults::db_pool_size(),
            jwt_secret: jwt_secret.to_string(),
            solana_rpc_url: defaults::solana_rpc_url(),
            verify_payments: false,
            ipfs_api_url: None,
            ipfs_jwt: None,
            ipfs_gateway_url: defaults::ipfs_gateway_url(),
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.trim().is_empty()
    }
}

mod defaults {
    pub fn host() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        8080
    }

    pub fn db_pool_size() -> u32 {
        10
    }

    pub fn solana_rpc_url() -> String {
        "https://api.devnet.solana.com".into()
    }

    pub fn ipfs_gateway_url() -> String {
        "https://gateway.pinata.cloud/ipfs".into()
    }
}
