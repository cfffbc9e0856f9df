pub mod config;

pub use config::{Config, DatabaseConfig, EthereumConfig, IndexerConfig, ServerConfig};
