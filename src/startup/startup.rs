use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use ethers_core::types::Address;

use crate::api::{AppState, router};
use crate::config::{Config, ServerConfig};
use crate::database::diesel::create_async_db_pool;
use crate::errors::error::AppError;
use crate::infrastructure::contract::{ContractClient, SolvableClient};
use crate::infrastructure::provider::{EthereumProvider, ProviderTrait};
use crate::repositories::{CacheStore, PgCacheStore};
use crate::services::facilitator_service::X402Facilitator;
use crate::services::game_service::GameService;
use crate::services::game_sync::GameSync;
use crate::services::indexer_service::IndexerService;
use crate::services::tx::gas::gas_service::GasService;
use crate::services::tx::nonce::nonce_service::NonceService;
use crate::services::tx::signer::{LocalSigner, TxSigner};
use crate::services::tx::simulation::simulation_service::SimulationService;
use crate::services::tx::types::TxOptions;
use crate::services::tx_service::TxService;
use crate::{log_info, log_warn};

/// 应用程序启动与管理结构体（HTTP 服务 + 后台索引器）
pub struct Application {
    server: ServerConfig,
    state: AppState,
    indexer: Option<Arc<IndexerService>>,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl Application {
    /// 构建应用实例：任何依赖不可用都在这里直接失败
    pub async fn build(config: Config) -> Result<Self> {
        // 1. 数据库连接池
        let db_pool = create_async_db_pool(&config.database).await?;
        let store: Arc<dyn CacheStore> = Arc::new(PgCacheStore::new(db_pool));

        // 2. Provider
        let provider: Arc<dyn ProviderTrait> = Arc::new(EthereumProvider::new(&config.ethereum)?);
        let remote_chain_id = provider.get_chain_id().await?;
        if remote_chain_id.as_u64() != config.ethereum.chain_id {
            log_warn!(
                "Configured chain_id {} differs from RPC chain_id {}",
                config.ethereum.chain_id,
                remote_chain_id
            );
        }

        // 3. 交易流水线
        let signer = LocalSigner::from_private_key(
            &config.ethereum.private_key,
            config.ethereum.chain_id,
        )?;
        let signer_address = signer.address();
        let nonce_svc = Arc::new(NonceService::new(&*provider, signer_address).await?);
        let tx_service = Arc::new(TxService::new(
            Arc::new(signer),
            nonce_svc,
            Arc::new(GasService::default()),
            Arc::new(SimulationService::new()),
            provider.clone(),
        ));
        log_info!("Server signer {:#x}", signer_address);

        // 4. 合约客户端
        let contract_address = Address::from_str(config.ethereum.contract_address.trim())
            .map_err(|e| AppError::InvalidAddress(format!("contract_address: {}", e)))?;
        let client: Arc<dyn ContractClient> = Arc::new(SolvableClient::new(
            contract_address,
            provider,
            tx_service,
            TxOptions::from(&config.ethereum),
        )?);
        log_info!("Solvable contract {:#x}", contract_address);

        // 5. 业务服务
        let games = Arc::new(GameService::new(client.clone(), store.clone()));
        let facilitator = Arc::new(X402Facilitator::new(config.ethereum.chain_id));
        let indexer = if config.indexer.enabled {
            let sync = GameSync::new(client.clone(), store);
            Some(Arc::new(IndexerService::new(client, sync, config.indexer.clone())))
        } else {
            log_info!("Indexer disabled by configuration");
            None
        };

        Ok(Self {
            server: config.server,
            state: AppState::new(games, facilitator),
            indexer,
        })
    }

    /// 启动索引器和 HTTP 服务，Ctrl+C 时两者一起退出
    pub async fn run(self) -> anyhow::Result<()> {
        let indexer_handle = self.indexer.map(|indexer| indexer.start());

        let addr = format!("{}:{}", self.server.host, self.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        log_info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        if let Some(handle) = indexer_handle {
            handle.shutdown().await;
        }
        log_info!("Shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log_warn!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    log_info!("Received shutdown signal, exiting...");
}
