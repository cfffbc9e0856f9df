// services/tx/simulation/simulation_service.rs

use crate::errors::error::AppError;
use crate::infrastructure::provider::ProviderTrait;
use crate::services::tx::types::TxContext;
use ethers_core::types::{H160, TransactionRequest};

/// 广播前用 eth_call 预执行，revert 原因直接返回给调用方
#[derive(Debug, Default)]
pub struct SimulationService;

impl SimulationService {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(
        &self,
        ctx: &TxContext,
        from: H160,
        provider: &dyn ProviderTrait,
    ) -> Result<(), AppError> {
        let req = TransactionRequest::new()
            .from(from)
            .to(ctx.to)
            .value(ctx.value)
            .data(ctx.data.clone());

        provider.call(&req.into()).await?;
        Ok(())
    }
}
