use crate::services::tx::gas::gas_strategy::TxPriority;
use config::{ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub ethereum: EthereumConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
}

/// PostgreSQL 连接配置（缓存库 games / game_donations / leaderboard）
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub username: String,
    pub password: String,
    // 连接池参数
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EthereumConfig {
    /// 逗号分隔，多个节点轮询使用
    pub rpc_url: String,
    pub chain_id: u64,
    pub contract_address: String,
    /// 服务端签名私钥，只从环境变量注入
    #[serde(default)]
    pub private_key: String,
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    #[serde(default = "default_tx_timeout_secs")]
    pub tx_timeout_secs: u64,
    /// 百分比，例如 120 表示 +20%
    #[serde(default = "default_gas_limit_buffer")]
    pub gas_limit_buffer: u64,
    #[serde(default)]
    pub priority: TxPriority,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexerConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub reconcile_interval_secs: u64,
    pub active_seed_limit: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 5,
            reconcile_interval_secs: 15,
            active_seed_limit: 200,
        }
    }
}

fn default_confirmations() -> u64 {
    1
}

fn default_tx_timeout_secs() -> u64 {
    300
}

fn default_gas_limit_buffer() -> u64 {
    120
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config: Config = config::Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // SOLVABLE__ETHEREUM__PRIVATE_KEY=0x... 覆盖文件配置
            .add_source(
                Environment::with_prefix("SOLVABLE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// 启动前校验必填项，缺失直接失败
    pub fn validate(&self) -> Result<(), ConfigError> {
        let eth = &self.ethereum;
        if eth.rpc_url.split(',').all(|u| u.trim().is_empty()) {
            return Err(ConfigError::Message("ethereum.rpc_url is required".into()));
        }
        if eth.contract_address.trim().is_empty() {
            return Err(ConfigError::Message(
                "ethereum.contract_address is required".into(),
            ));
        }
        if eth.private_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "ethereum.private_key is required (SOLVABLE__ETHEREUM__PRIVATE_KEY)".into(),
            ));
        }
        if eth.confirmations == 0 {
            return Err(ConfigError::Message(
                "ethereum.confirmations must be at least 1".into(),
            ));
        }
        if self.indexer.poll_interval_secs == 0 || self.indexer.reconcile_interval_secs == 0 {
            return Err(ConfigError::Message(
                "indexer intervals must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database: DatabaseConfig {
                host: "localhost".into(),
                port: 5432,
                database_name: "solvable".into(),
                username: "postgres".into(),
                password: "postgres".into(),
                max_connections: 4,
                min_connections: 1,
                connect_timeout_seconds: 5,
                idle_timeout_seconds: 60,
            },
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 3000,
            },
            ethereum: EthereumConfig {
                rpc_url: "http://127.0.0.1:8545".into(),
                chain_id: 31337,
                contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".into(),
                private_key: "0x01".into(),
                confirmations: 1,
                tx_timeout_secs: 300,
                gas_limit_buffer: 120,
                priority: TxPriority::Normal,
            },
            indexer: IndexerConfig::default(),
        }
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_private_key() {
        let mut config = sample();
        config.ethereum.private_key = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("private_key"));
    }

    #[test]
    fn validate_rejects_blank_rpc_list() {
        let mut config = sample();
        config.ethereum.rpc_url = " , ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_intervals() {
        let mut config = sample();
        config.indexer.reconcile_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
