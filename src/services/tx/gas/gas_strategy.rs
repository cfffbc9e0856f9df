// services/tx/gas/gas_strategy.rs

use serde::{Deserialize, Serialize};

/// 交易优先级策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl TxPriority {
    /// tip 调整百分比（100 = 无调整）
    pub fn tip_multiplier_percent(&self) -> u128 {
        match self {
            TxPriority::Low => 80,
            TxPriority::Normal => 100,
            TxPriority::High => 150,
            TxPriority::Urgent => 300,
        }
    }

    /// max_fee_per_gas 相对节点建议值的余量百分比
    pub fn max_fee_headroom_percent(&self) -> u128 {
        match self {
            TxPriority::Low => 100,
            TxPriority::Normal => 110,
            TxPriority::High => 125,
            TxPriority::Urgent => 150,
        }
    }
}
