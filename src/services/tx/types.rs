// services/tx/types.rs

use crate::config::EthereumConfig;
use crate::services::tx::gas::gas_strategy::TxPriority;
use ethers_core::types::{Bytes, H160, H256, TransactionReceipt, U256};

#[derive(Debug, Clone)]
pub struct TxOptions {
    pub priority: TxPriority,
    pub gas_limit_buffer: u64, // 百分比，例如 120 表示 +20%
    pub confirmations: u64,    // 所需确认数
    pub timeout_secs: u64,     // 等待超时秒数
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            priority: TxPriority::Normal,
            gas_limit_buffer: 120,
            confirmations: 1,
            timeout_secs: 300,
        }
    }
}

impl From<&EthereumConfig> for TxOptions {
    fn from(config: &EthereumConfig) -> Self {
        Self {
            priority: config.priority,
            gas_limit_buffer: config.gas_limit_buffer,
            confirmations: config.confirmations,
            timeout_secs: config.tx_timeout_secs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TxContext {
    pub to: H160,
    pub value: U256,
    pub data: Bytes,
    pub options: TxOptions,
}

#[derive(Debug, Clone)]
pub struct TxResult {
    pub tx_hash: H256,
    pub receipt: TransactionReceipt,
}

