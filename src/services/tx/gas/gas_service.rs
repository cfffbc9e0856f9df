// services/tx/gas/gas_service.rs

use crate::errors::error::AppError;
use crate::infrastructure::provider::ProviderTrait;
use crate::services::tx::gas::gas_strategy::TxPriority;
use ethers_core::types::U256;

/// Gas 费用计算服务（纯整数运算，无浮点风险）
#[derive(Clone, Copy, Debug)]
pub struct GasService {
    /// 全局对 tip 的额外调整百分比（100 = 无调整）
    base_tip_percent: u128,
}

impl Default for GasService {
    fn default() -> Self {
        Self::new(100)
    }
}

impl GasService {
    pub fn new(base_tip_percent: u128) -> Self {
        Self { base_tip_percent }
    }

    /// 根据优先级计算 EIP-1559 费用 (max_fee_per_gas, max_priority_fee_per_gas)
    pub async fn resolve_fees(
        &self,
        provider: &dyn ProviderTrait,
        priority: TxPriority,
    ) -> Result<(U256, U256), AppError> {
        let (max_fee_per_gas, base_priority_fee) = provider.estimate_eip1559_fees().await?;
        self.adjust(max_fee_per_gas, base_priority_fee, priority)
    }

    pub fn adjust(
        &self,
        suggested_max_fee: U256,
        suggested_tip: U256,
        priority: TxPriority,
    ) -> Result<(U256, U256), AppError> {
        let tip_percent = self
            .base_tip_percent
            .checked_mul(priority.tip_multiplier_percent())
            .ok_or_else(|| AppError::Internal("Tip multiplier overflow".to_string()))?
            / 100;

        let tip = suggested_tip
            .checked_mul(U256::from(tip_percent))
            .ok_or_else(|| AppError::Internal("Adjusted priority fee overflow".to_string()))?
            / U256::from(100);

        // max_fee 只在建议值上加余量，不能低于 base fee，否则交易无法打包
        let max_fee = suggested_max_fee
            .checked_mul(U256::from(priority.max_fee_headroom_percent()))
            .ok_or_else(|| AppError::Internal("Max fee calculation overflow".to_string()))?
            / U256::from(100);

        // EIP-1559 要求 max_fee >= tip
        Ok((max_fee.max(tip), tip))
    }
}
