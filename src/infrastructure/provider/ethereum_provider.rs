use crate::config::EthereumConfig;
use crate::errors::error::AppError;
use crate::log_info;
use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{
    Address, BlockId, BlockNumber, Bytes, Filter, Log, TransactionReceipt, U64, U256,
};
use ethers_providers::{Http, Middleware, Provider};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// JSON-RPC 基础能力，交易流水线和合约客户端都只依赖这个 trait
#[async_trait]
pub trait ProviderTrait: Send + Sync {
    async fn get_last_block_number(&self) -> Result<U64, AppError>;
    async fn get_chain_id(&self) -> Result<U256, AppError>;
    /// pending 状态下的 nonce
    async fn get_transaction_count(&self, address: Address) -> Result<U256, AppError>;
    async fn estimate_eip1559_fees(&self) -> Result<(U256, U256), AppError>;
    async fn send_raw_transaction(
        &self,
        rlp: Bytes,
        timeout_secs: u64,
        confirmations: usize,
    ) -> Result<TransactionReceipt, AppError>;
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, AppError>;
    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, AppError>;
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, AppError>;
}

pub struct EthereumProvider {
    providers: Vec<Arc<Provider<Http>>>,
    index: AtomicUsize,
}

impl EthereumProvider {
    /// rpc_url 支持逗号分隔多个节点，请求按轮询分发
    pub fn new(config: &EthereumConfig) -> Result<Self, AppError> {
        let providers = config
            .rpc_url
            .split(',')
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(|raw| {
                let url = Url::parse(raw)
                    .map_err(|e| AppError::Config(format!("invalid rpc url {}: {}", raw, e)))?;
                Ok(Arc::new(Provider::new(Http::new(url))))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        if providers.is_empty() {
            return Err(AppError::Config("no rpc url configured".into()));
        }
        log_info!("Initialized {} RPC provider(s)", providers.len());

        Ok(Self {
            providers,
            index: AtomicUsize::new(0),
        })
    }

    pub fn get_provider(&self) -> Arc<Provider<Http>> {
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        self.providers[i % self.providers.len()].clone()
    }
}

#[async_trait]
impl ProviderTrait for EthereumProvider {
    async fn get_last_block_number(&self) -> Result<U64, AppError> {
        self.get_provider()
            .get_block_number()
            .await
            .map_err(AppError::from)
    }

    async fn get_chain_id(&self) -> Result<U256, AppError> {
        self.get_provider()
            .get_chainid()
            .await
            .map_err(AppError::from)
    }

    async fn get_transaction_count(&self, address: Address) -> Result<U256, AppError> {
        self.get_provider()
            .get_transaction_count(address, Some(BlockId::Number(BlockNumber::Pending)))
            .await
            .map_err(AppError::from)
    }

    async fn estimate_eip1559_fees(&self) -> Result<(U256, U256), AppError> {
        self.get_provider()
            .estimate_eip1559_fees(None)
            .await
            .map_err(AppError::from)
    }

    async fn send_raw_transaction(
        &self,
        rlp: Bytes,
        timeout_secs: u64,
        confirmations: usize,
    ) -> Result<TransactionReceipt, AppError> {
        // 持有 provider 的 Arc，保证 await 期间底层 Http client 不被释放
        let provider = self.get_provider();
        let pending_tx = provider
            .send_raw_transaction(rlp)
            .await
            .map_err(AppError::from)?;
        let tx_hash = *pending_tx;

        let receipt = timeout(
            Duration::from_secs(timeout_secs),
            pending_tx.confirmations(confirmations),
        )
        .await
        .map_err(|_| {
            AppError::BlockchainError(format!(
                "Transaction confirmation timeout: {:#x}",
                tx_hash
            ))
        })?
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::BlockchainError(format!("Transaction dropped from mempool: {:#x}", tx_hash))
        })?;

        let receipt = ensure_mined_ok(receipt)?;
        log_info!(
            "Transaction mined: hash={:#x}, block={:?}",
            receipt.transaction_hash,
            receipt.block_number
        );
        Ok(receipt)
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, AppError> {
        self.get_provider()
            .call(tx, None)
            .await
            .map_err(AppError::from)
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, AppError> {
        self.get_provider()
            .estimate_gas(tx, None)
            .await
            .map_err(AppError::from)
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, AppError> {
        self.get_provider()
            .get_logs(filter)
            .await
            .map_err(AppError::from)
    }
}

/// status == 0 表示链上 revert，直接转成错误
pub fn ensure_mined_ok(receipt: TransactionReceipt) -> Result<TransactionReceipt, AppError> {
    if receipt.status.is_some_and(|s| s.is_zero()) {
        return Err(AppError::BlockchainError(format!(
            "Transaction reverted on-chain: {:#x}",
            receipt.transaction_hash
        )));
    }
    Ok(receipt)
}
