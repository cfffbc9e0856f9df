use crate::errors::error::AppError;
use crate::utils::topic_to_u256;
use ethers_contract::EthEvent;
use ethers_core::abi::RawLog;
use ethers_core::types::{Address, H256, Log, U256};

#[derive(EthEvent, Debug, Clone, PartialEq, Eq)]
#[ethevent(
    name = "PuzzleProposed",
    abi = "PuzzleProposed(uint256,address,string,bytes32,uint256,address,uint256,uint8)"
)]
pub struct PuzzleProposedEvent {
    #[ethevent(indexed)]
    pub game_id: U256,
    #[ethevent(indexed)]
    pub proposer: Address,
    pub puzzle: String,
    pub solution_hash: [u8; 32],
    pub entry_fee: U256,
    pub token: Address,
    pub vote_threshold: U256,
    pub puzzle_type: u8,
}

#[derive(EthEvent, Debug, Clone, PartialEq, Eq)]
#[ethevent(name = "VoteCast", abi = "VoteCast(uint256,address,bool)")]
pub struct VoteCastEvent {
    #[ethevent(indexed)]
    pub game_id: U256,
    #[ethevent(indexed)]
    pub voter: Address,
    pub approve: bool,
}

#[derive(EthEvent, Debug, Clone, PartialEq, Eq)]
#[ethevent(name = "DonationReceived", abi = "DonationReceived(uint256,address,uint256)")]
pub struct DonationReceivedEvent {
    #[ethevent(indexed)]
    pub game_id: U256,
    #[ethevent(indexed)]
    pub donor: Address,
    pub amount: U256,
}

#[derive(EthEvent, Debug, Clone, PartialEq, Eq)]
#[ethevent(
    name = "SolutionSubmitted",
    abi = "SolutionSubmitted(uint256,address,bool,uint256,uint256)"
)]
pub struct SolutionSubmittedEvent {
    #[ethevent(indexed)]
    pub game_id: U256,
    #[ethevent(indexed)]
    pub player: Address,
    pub correct: bool,
    pub pot_size: U256,
    pub house_cut: U256,
}

#[derive(EthEvent, Debug, Clone, PartialEq, Eq)]
#[ethevent(
    name = "OracleVerificationRequested",
    abi = "OracleVerificationRequested(uint256,address,uint256)"
)]
pub struct OracleVerificationRequestedEvent {
    #[ethevent(indexed)]
    pub game_id: U256,
    #[ethevent(indexed)]
    pub submitter: Address,
    pub deadline: U256,
}

/// 合约事件种类，用于构造 eth_getLogs 的 topic0 过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PuzzleProposed,
    VoteCast,
    DonationReceived,
    SolutionSubmitted,
    OracleVerificationRequested,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::PuzzleProposed,
        EventKind::VoteCast,
        EventKind::DonationReceived,
        EventKind::SolutionSubmitted,
        EventKind::OracleVerificationRequested,
    ];

    pub fn topic(&self) -> H256 {
        match self {
            EventKind::PuzzleProposed => PuzzleProposedEvent::signature(),
            EventKind::VoteCast => VoteCastEvent::signature(),
            EventKind::DonationReceived => DonationReceivedEvent::signature(),
            EventKind::SolutionSubmitted => SolutionSubmittedEvent::signature(),
            EventKind::OracleVerificationRequested => OracleVerificationRequestedEvent::signature(),
        }
    }

    pub fn from_topic(topic: &H256) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.topic() == *topic)
    }
}

/// 解码后的合约事件，每个变体持有强类型载荷
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    PuzzleProposed(PuzzleProposedEvent),
    VoteCast(VoteCastEvent),
    DonationReceived(DonationReceivedEvent),
    SolutionSubmitted(SolutionSubmittedEvent),
    OracleVerificationRequested(OracleVerificationRequestedEvent),
}

impl ContractEvent {
    pub fn decode(log: &Log) -> Result<Self, AppError> {
        let topic0 = log
            .topics
            .first()
            .ok_or_else(|| AppError::ParserError("log has no topics".into()))?;
        let kind = EventKind::from_topic(topic0)
            .ok_or_else(|| AppError::ParserError(format!("unknown event topic {:#x}", topic0)))?;
        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };

        let event = match kind {
            EventKind::PuzzleProposed => {
                ContractEvent::PuzzleProposed(PuzzleProposedEvent::decode_log(&raw)?)
            }
            EventKind::VoteCast => ContractEvent::VoteCast(VoteCastEvent::decode_log(&raw)?),
            EventKind::DonationReceived => {
                ContractEvent::DonationReceived(DonationReceivedEvent::decode_log(&raw)?)
            }
            EventKind::SolutionSubmitted => {
                ContractEvent::SolutionSubmitted(SolutionSubmittedEvent::decode_log(&raw)?)
            }
            EventKind::OracleVerificationRequested => ContractEvent::OracleVerificationRequested(
                OracleVerificationRequestedEvent::decode_log(&raw)?,
            ),
        };
        Ok(event)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ContractEvent::PuzzleProposed(_) => EventKind::PuzzleProposed,
            ContractEvent::VoteCast(_) => EventKind::VoteCast,
            ContractEvent::DonationReceived(_) => EventKind::DonationReceived,
            ContractEvent::SolutionSubmitted(_) => EventKind::SolutionSubmitted,
            ContractEvent::OracleVerificationRequested(_) => EventKind::OracleVerificationRequested,
        }
    }

    pub fn game_id(&self) -> U256 {
        match self {
            ContractEvent::PuzzleProposed(e) => e.game_id,
            ContractEvent::VoteCast(e) => e.game_id,
            ContractEvent::DonationReceived(e) => e.game_id,
            ContractEvent::SolutionSubmitted(e) => e.game_id,
            ContractEvent::OracleVerificationRequested(e) => e.game_id,
        }
    }
}

/// 所有事件的 gameId 都是第一个 indexed 参数
pub fn game_id_from_topics(log: &Log) -> Option<U256> {
    log.topics.get(1).map(topic_to_u256)
}
