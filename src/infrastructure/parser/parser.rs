use crate::errors::error::AppError;
use crate::log_warn;
use crate::models::domain::event::{ContractEvent, EventKind, game_id_from_topics};
use ethers_core::types::{Address, Log, TransactionReceipt, U256};

/// 只处理目标合约发出的日志
#[derive(Debug, Clone, Copy)]
pub struct EventParser {
    contract: Address,
}

impl EventParser {
    pub fn new(contract: Address) -> Self {
        Self { contract }
    }

    pub fn is_from_contract(&self, log: &Log) -> bool {
        log.address == self.contract
    }

    pub fn decode(&self, log: &Log) -> Result<ContractEvent, AppError> {
        ContractEvent::decode(log)
    }

    /// PuzzleProposed 的 gameId：优先结构化解码，失败时退回 topics[1]
    pub fn proposed_game_id(&self, log: &Log) -> Option<U256> {
        match self.decode(log) {
            Ok(ContractEvent::PuzzleProposed(event)) => Some(event.game_id),
            Ok(other) => {
                log_warn!("Expected PuzzleProposed, got {:?}", other.kind());
                None
            }
            Err(e) => {
                let is_proposed = log
                    .topics
                    .first()
                    .is_some_and(|t| *t == EventKind::PuzzleProposed.topic());
                if !is_proposed {
                    return None;
                }
                log_warn!("PuzzleProposed decode failed, using raw topic: {}", e);
                game_id_from_topics(log)
            }
        }
    }

    /// propose 交易回执中的新 gameId
    pub fn game_id_from_receipt(&self, receipt: &TransactionReceipt) -> Option<U256> {
        receipt
            .logs
            .iter()
            .filter(|log| self.is_from_contract(log))
            .find_map(|log| self.proposed_game_id(log))
    }
}
