//! 测试用的内存版合约客户端与缓存库
use crate::errors::error::AppError;
use crate::infrastructure::contract::{ContractCall, ContractClient};
use crate::models::db::donation_db::DonationInsert;
use crate::models::db::game_db::{GameRecord, GameUpsert};
use crate::models::db::leaderboard_db::LeaderboardRow;
use crate::models::domain::event::EventKind;
use crate::models::domain::game::{GameDetails, StatusFilter};
use crate::repositories::traits::CacheStore;
use crate::services::tx::types::TxResult;
use crate::utils::u256_to_topic;
use async_trait::async_trait;
use chrono::Utc;
use ethers_core::abi::{Token, encode};
use ethers_core::types::{Address, Bytes, H256, Log, TransactionReceipt, U64, U256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn contract_address() -> Address {
    Address::repeat_byte(0xcc)
}

pub fn native_game(puzzle: &str) -> GameDetails {
    GameDetails {
        puzzle: puzzle.into(),
        status: 2,
        entry_fee: U256::exp10(18),
        proposer: Address::repeat_byte(0x01),
        vote_threshold: U256::from(3u64),
        challenge_threshold: U256::from(2u64),
        exists: true,
        ..GameDetails::default()
    }
}

/// getGameDetails 的返回值编码，供 eth_call 桩使用
pub fn game_tokens(game: &GameDetails) -> Vec<Token> {
    vec![
        Token::Tuple(vec![
            Token::String(game.puzzle.clone()),
            Token::FixedBytes(game.solution_hash.to_vec()),
            Token::Uint(U256::from(game.status)),
            Token::Uint(game.pot),
            Token::Uint(game.entry_fee),
            Token::Address(game.token),
            Token::Address(game.proposer),
            Token::Address(game.winner),
            Token::Uint(game.vote_threshold),
            Token::Uint(game.challenge_threshold),
            Token::Uint(U256::from(game.puzzle_type)),
            Token::Bool(game.require_submission_fee),
            Token::Bool(game.exists),
            Token::Address(game.first_solver),
            Token::String(game.oracle_params.clone()),
            Token::Uint(game.verification_deadline),
        ]),
        Token::Uint(U256::zero()),
        Token::Uint(U256::zero()),
        Token::Uint(U256::zero()),
    ]
}

pub fn proposed_log(contract: Address, id: U256, block: u64, details: &GameDetails) -> Log {
    let data = encode(&[
        Token::String(details.puzzle.clone()),
        Token::FixedBytes(details.solution_hash.to_vec()),
        Token::Uint(details.entry_fee),
        Token::Address(details.token),
        Token::Uint(details.vote_threshold),
        Token::Uint(U256::from(details.puzzle_type)),
    ]);
    Log {
        address: contract,
        topics: vec![
            EventKind::PuzzleProposed.topic(),
            u256_to_topic(id),
            H256::from(details.proposer),
        ],
        data: Bytes::from(data),
        block_number: Some(U64::from(block)),
        ..Default::default()
    }
}

pub fn donation_log(contract: Address, id: U256, donor: Address, amount: U256, block: u64) -> Log {
    Log {
        address: contract,
        topics: vec![
            EventKind::DonationReceived.topic(),
            u256_to_topic(id),
            H256::from(donor),
        ],
        data: Bytes::from(encode(&[Token::Uint(amount)])),
        block_number: Some(U64::from(block)),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct ChainState {
    pub games: HashMap<U256, GameDetails>,
    pub logs: Vec<Log>,
    pub block: u64,
    pub active: Vec<U256>,
    pub challenge_fee: U256,
    pub sent: Vec<(ContractCall, Option<U256>)>,
    pub next_id: u64,
    pub fail_sends: bool,
}

/// 内存链：记录发出的交易，propose 会真的生成游戏和日志
pub struct FakeChain {
    contract: Address,
    pub state: Mutex<ChainState>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            contract: contract_address(),
            state: Mutex::new(ChainState {
                challenge_fee: U256::exp10(16),
                next_id: 1,
                ..ChainState::default()
            }),
        }
    }

    pub fn insert_game(&self, id: u64, details: GameDetails) {
        self.state
            .lock()
            .unwrap()
            .games
            .insert(U256::from(id), details);
    }

    /// 游戏上链并留下 PuzzleProposed 日志
    pub fn propose_game(&self, id: u64, details: GameDetails) {
        let mut state = self.state.lock().unwrap();
        state.block += 1;
        let log = proposed_log(self.contract, U256::from(id), state.block, &details);
        state.logs.push(log);
        state.games.insert(U256::from(id), details);
        state.next_id = state.next_id.max(id + 1);
    }

    pub fn push_log(&self, log: Log) {
        let mut state = self.state.lock().unwrap();
        state.block = state
            .block
            .max(log.block_number.map(|b| b.as_u64()).unwrap_or_default());
        state.logs.push(log);
    }

    pub fn set_status(&self, id: u64, status: u8) {
        if let Some(game) = self.state.lock().unwrap().games.get_mut(&U256::from(id)) {
            game.status = status;
        }
    }

    pub fn set_active(&self, ids: &[u64]) {
        self.state.lock().unwrap().active = ids.iter().map(|&i| U256::from(i)).collect();
    }

    pub fn sent(&self) -> Vec<(ContractCall, Option<U256>)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn block(&self) -> u64 {
        self.state.lock().unwrap().block
    }
}

#[async_trait]
impl ContractClient for FakeChain {
    fn contract_address(&self) -> Address {
        self.contract
    }

    async fn get_game(&self, id: U256) -> Result<GameDetails, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .games
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_active_games(&self, start: U256, limit: U256) -> Result<Vec<U256>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .active
            .iter()
            .skip(start.as_usize())
            .take(limit.as_usize())
            .copied()
            .collect())
    }

    async fn get_challenge_fee(&self) -> Result<U256, AppError> {
        Ok(self.state.lock().unwrap().challenge_fee)
    }

    async fn send_contract_tx(
        &self,
        call: ContractCall,
        value: Option<U256>,
    ) -> Result<TxResult, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(AppError::ProviderError("insufficient funds".into()));
        }
        state.sent.push((call.clone(), value));
        state.block += 1;
        let block = state.block;

        let mut logs = Vec::new();
        match call {
            ContractCall::ProposePuzzle {
                puzzle,
                solution_hash,
                entry_fee,
                token,
                vote_threshold,
                puzzle_type,
                oracle_params,
            } => {
                let id = U256::from(state.next_id);
                state.next_id += 1;
                let details = GameDetails {
                    puzzle,
                    solution_hash,
                    status: 1,
                    entry_fee,
                    token,
                    proposer: Address::repeat_byte(0xf3),
                    vote_threshold,
                    puzzle_type,
                    exists: true,
                    oracle_params,
                    ..GameDetails::default()
                };
                let log = proposed_log(self.contract, id, block, &details);
                state.logs.push(log.clone());
                logs.push(log);
                state.games.insert(id, details);
            }
            ContractCall::DonateToGame { game_id, amount } => {
                if let Some(game) = state.games.get_mut(&game_id) {
                    game.pot += amount;
                }
            }
            ContractCall::FinalizeGame { game_id } => {
                if let Some(game) = state.games.get_mut(&game_id) {
                    game.status = 5;
                }
            }
            _ => {}
        }

        let tx_hash = H256::from_low_u64_be(block);
        Ok(TxResult {
            tx_hash,
            receipt: TransactionReceipt {
                transaction_hash: tx_hash,
                block_number: Some(U64::from(block)),
                status: Some(U64::from(1)),
                logs,
                ..Default::default()
            },
        })
    }

    async fn get_block_number(&self) -> Result<U64, AppError> {
        Ok(U64::from(self.state.lock().unwrap().block))
    }

    async fn get_logs(
        &self,
        events: &[EventKind],
        from: U64,
        to: U64,
    ) -> Result<Vec<Log>, AppError> {
        let topics: Vec<H256> = events.iter().map(|k| k.topic()).collect();
        let state = self.state.lock().unwrap();
        Ok(state
            .logs
            .iter()
            .filter(|log| log.topics.first().is_some_and(|t| topics.contains(t)))
            .filter(|log| {
                let block = log.block_number.unwrap_or_default();
                block >= from && block <= to
            })
            .cloned()
            .collect())
    }
}

/// 内存缓存库
#[derive(Default)]
pub struct MemoryStore {
    pub games: Mutex<BTreeMap<i64, GameRecord>>,
    pub donations: Mutex<Vec<DonationInsert>>,
    pub leaderboard: Mutex<Vec<LeaderboardRow>>,
    pub failing: AtomicBool,
}

impl MemoryStore {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ConnectionPool("store offline".into()));
        }
        Ok(())
    }

    pub fn row(&self, id: i64) -> Option<GameRecord> {
        self.games.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn upsert_game(&self, row: &GameUpsert) -> Result<(), AppError> {
        self.check()?;
        let mut games = self.games.lock().unwrap();
        let created_at = games
            .get(&row.id)
            .map(|r| r.created_at)
            .unwrap_or_else(Utc::now);
        games.insert(row.id, row.clone().into_record(created_at));
        Ok(())
    }

    async fn list_games(
        &self,
        filter: StatusFilter,
        start: i64,
        limit: i64,
    ) -> Result<Vec<GameRecord>, AppError> {
        self.check()?;
        Ok(self
            .games
            .lock()
            .unwrap()
            .values()
            .filter(|r| filter.matches(&r.status))
            .skip(start.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn insert_donation(&self, row: &DonationInsert) -> Result<(), AppError> {
        self.check()?;
        self.donations.lock().unwrap().push(row.clone());
        Ok(())
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardRow>, AppError> {
        self.check()?;
        let mut rows = self.leaderboard.lock().unwrap().clone();
        rows.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then_with(|| b.total_donated.cmp(&a.total_donated))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}
