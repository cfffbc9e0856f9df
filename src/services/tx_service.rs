// services/tx_service.rs
use crate::errors::error::AppError;
use crate::infrastructure::provider::ProviderTrait;
use crate::services::tx::gas::gas_service::GasService;
use crate::services::tx::nonce::nonce_service::NonceService;
use crate::services::tx::signer::TxSigner;
use crate::services::tx::simulation::simulation_service::SimulationService;
use crate::services::tx::types::{TxContext, TxResult};
use crate::{log_info, log_warn};
use ethers_core::types::{
    Address, Eip1559TransactionRequest, U256, transaction::eip2718::TypedTransaction,
};
use std::sync::Arc;

/// 服务端钱包的交易流水线：模拟 → 定价 → nonce → 估 gas → 签名 → 广播
pub struct TxService {
    pub signer: Arc<dyn TxSigner>,
    pub nonce_svc: Arc<NonceService>,
    pub gas_svc: Arc<GasService>,
    pub simulation: Arc<SimulationService>,
    pub provider: Arc<dyn ProviderTrait>,
}

impl TxService {
    pub fn new(
        signer: Arc<dyn TxSigner>,
        nonce_svc: Arc<NonceService>,
        gas_svc: Arc<GasService>,
        simulation: Arc<SimulationService>,
        provider: Arc<dyn ProviderTrait>,
    ) -> Self {
        Self {
            signer,
            nonce_svc,
            gas_svc,
            simulation,
            provider,
        }
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    /// 失败直接返回给调用方，不做重试
    pub async fn execute(&self, ctx: TxContext) -> Result<TxResult, AppError> {
        let from = self.signer.address();

        // 1. 预执行模拟，revert 在这里就能拿到原因
        self.simulation.run(&ctx, from, &*self.provider).await?;

        // 2. 获取动态费用
        let (max_fee_per_gas, priority_fee_per_gas) = self
            .gas_svc
            .resolve_fees(&*self.provider, ctx.options.priority)
            .await?;

        // 3. 预占 nonce，此后任何广播前失败都要归还
        let nonce = self.nonce_svc.acquire();

        let signed_rlp = match self
            .build_and_sign(&ctx, from, nonce, max_fee_per_gas, priority_fee_per_gas)
            .await
        {
            Ok(rlp) => rlp,
            Err(e) => {
                self.give_back(nonce).await;
                return Err(e);
            }
        };

        log_info!(
            "Broadcasting tx: to={:#x}, value={}, nonce={}",
            ctx.to,
            ctx.value,
            nonce
        );

        // 4. 广播并等待确认
        let receipt = match self
            .provider
            .send_raw_transaction(
                signed_rlp,
                ctx.options.timeout_secs,
                ctx.options.confirmations as usize,
            )
            .await
        {
            Ok(receipt) => {
                if self.nonce_svc.settle() {
                    self.resync_nonce().await;
                }
                receipt
            }
            Err(e) => {
                // 交易可能已进入 mempool，以链上 pending nonce 为准
                self.nonce_svc.settle();
                self.resync_nonce().await;
                return Err(e);
            }
        };

        Ok(TxResult {
            tx_hash: receipt.transaction_hash,
            receipt,
        })
    }

    async fn build_and_sign(
        &self,
        ctx: &TxContext,
        from: Address,
        nonce: u64,
        max_fee_per_gas: U256,
        priority_fee_per_gas: U256,
    ) -> Result<ethers_core::types::Bytes, AppError> {
        let mut tx_req = Eip1559TransactionRequest::new()
            .from(from)
            .to(ctx.to)
            .value(ctx.value)
            .data(ctx.data.clone())
            .max_fee_per_gas(max_fee_per_gas)
            .max_priority_fee_per_gas(priority_fee_per_gas)
            .nonce(nonce);

        if let Some(chain_id) = self.signer.chain_id() {
            tx_req = tx_req.chain_id(chain_id);
        }

        // Gas Limit + Buffer
        let estimated_gas = self
            .provider
            .estimate_gas(&TypedTransaction::Eip1559(tx_req.clone()))
            .await?;
        let gas_limit = apply_gas_buffer(estimated_gas, ctx.options.gas_limit_buffer)?;
        tx_req = tx_req.gas(gas_limit);

        let typed_tx: TypedTransaction = tx_req.into();
        let signature = self.signer.sign_tx(&typed_tx).await?;
        Ok(typed_tx.rlp_signed(&signature))
    }

    async fn give_back(&self, nonce: u64) {
        // 期间已有其他请求预占了后续 nonce，只能对齐链上（必要时推迟到它们结束）
        if !self.nonce_svc.release(nonce) || self.nonce_svc.take_deferred_resync() {
            self.resync_nonce().await;
        }
    }

    async fn resync_nonce(&self) {
        if let Err(e) = self.nonce_svc.resync(&*self.provider).await {
            log_warn!("Nonce resync failed: {}", e);
        }
    }
}

pub fn apply_gas_buffer(estimated: U256, buffer_percent: u64) -> Result<U256, AppError> {
    estimated
        .checked_mul(U256::from(buffer_percent))
        .map(|v| v / U256::from(100))
        .ok_or_else(|| AppError::Internal("Gas limit overflow".to_string()))
}
