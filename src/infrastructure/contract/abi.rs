use crate::errors::error::AppError;
use ethers_core::abi::{Abi, Token};
use ethers_core::types::{Address, Bytes, U256};
use once_cell::sync::OnceCell;

/// Solvable 合约用到的函数（事件由 models::domain::event 的 EthEvent 派生处理）
const SOLVABLE_ABI_JSON: &str = r#"[
  {"type":"function","stateMutability":"nonpayable","name":"proposePuzzle","inputs":[
    {"name":"_puzzle","type":"string"},{"name":"_solutionHash","type":"bytes32"},
    {"name":"_entryFee","type":"uint256"},{"name":"_token","type":"address"},
    {"name":"_voteThreshold","type":"uint256"},{"name":"_puzzleType","type":"uint8"},
    {"name":"_oracleParams","type":"string"}],
   "outputs":[{"name":"gameId","type":"uint256"}]},
  {"type":"function","stateMutability":"nonpayable","name":"voteOnProposal","inputs":[
    {"name":"gameId","type":"uint256"},{"name":"approve","type":"bool"}],"outputs":[]},
  {"type":"function","stateMutability":"payable","name":"submitSolution","inputs":[
    {"name":"gameId","type":"uint256"},{"name":"_solution","type":"string"}],"outputs":[]},
  {"type":"function","stateMutability":"payable","name":"challengeSolution","inputs":[
    {"name":"gameId","type":"uint256"},{"name":"reason","type":"string"}],"outputs":[]},
  {"type":"function","stateMutability":"nonpayable","name":"donateToGame","inputs":[
    {"name":"gameId","type":"uint256"},{"name":"amount","type":"uint256"}],"outputs":[]},
  {"type":"function","stateMutability":"nonpayable","name":"finalizeGame","inputs":[
    {"name":"gameId","type":"uint256"}],"outputs":[]},
  {"type":"function","stateMutability":"nonpayable","name":"invalidateGame","inputs":[
    {"name":"gameId","type":"uint256"}],"outputs":[]},
  {"type":"function","stateMutability":"nonpayable","name":"resetGame","inputs":[
    {"name":"gameId","type":"uint256"}],"outputs":[]},
  {"type":"function","stateMutability":"view","name":"getActiveGames","inputs":[
    {"name":"start","type":"uint256"},{"name":"limit","type":"uint256"}],
   "outputs":[{"name":"","type":"uint256[]"}]},
  {"type":"function","stateMutability":"view","name":"challengeFee","inputs":[],
   "outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","stateMutability":"view","name":"getGameDetails","inputs":[
    {"name":"gameId","type":"uint256"}],
   "outputs":[
    {"name":"","type":"tuple","components":[
      {"name":"puzzle","type":"string"},{"name":"solutionHash","type":"bytes32"},
      {"name":"status","type":"uint8"},{"name":"pot","type":"uint256"},
      {"name":"entryFee","type":"uint256"},{"name":"token","type":"address"},
      {"name":"proposer","type":"address"},{"name":"winner","type":"address"},
      {"name":"voteThreshold","type":"uint256"},{"name":"challengeThreshold","type":"uint256"},
      {"name":"puzzleType","type":"uint8"},{"name":"requireSubmissionFee","type":"bool"},
      {"name":"exists","type":"bool"},{"name":"firstSolver","type":"address"},
      {"name":"oracleParams","type":"string"},{"name":"verificationDeadline","type":"uint256"}]},
    {"name":"","type":"uint256"},{"name":"","type":"uint256"},{"name":"","type":"uint256"}]}
]"#;

static SOLVABLE_ABI: OnceCell<Abi> = OnceCell::new();

/// 首次调用时解析，之后复用
pub fn solvable_abi() -> Result<&'static Abi, AppError> {
    SOLVABLE_ABI.get_or_try_init(|| serde_json::from_str(SOLVABLE_ABI_JSON).map_err(AppError::from))
}

/// 服务端钱包可以发起的合约写调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    ProposePuzzle {
        puzzle: String,
        solution_hash: [u8; 32],
        entry_fee: U256,
        token: Address,
        vote_threshold: U256,
        puzzle_type: u8,
        oracle_params: String,
    },
    VoteOnProposal {
        game_id: U256,
        approve: bool,
    },
    SubmitSolution {
        game_id: U256,
        solution: String,
    },
    ChallengeSolution {
        game_id: U256,
        reason: String,
    },
    DonateToGame {
        game_id: U256,
        amount: U256,
    },
    FinalizeGame {
        game_id: U256,
    },
    InvalidateGame {
        game_id: U256,
    },
    ResetGame {
        game_id: U256,
    },
}

impl ContractCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            ContractCall::ProposePuzzle { .. } => "proposePuzzle",
            ContractCall::VoteOnProposal { .. } => "voteOnProposal",
            ContractCall::SubmitSolution { .. } => "submitSolution",
            ContractCall::ChallengeSolution { .. } => "challengeSolution",
            ContractCall::DonateToGame { .. } => "donateToGame",
            ContractCall::FinalizeGame { .. } => "finalizeGame",
            ContractCall::InvalidateGame { .. } => "invalidateGame",
            ContractCall::ResetGame { .. } => "resetGame",
        }
    }

    pub fn game_id(&self) -> Option<U256> {
        match self {
            ContractCall::ProposePuzzle { .. } => None,
            ContractCall::VoteOnProposal { game_id, .. }
            | ContractCall::SubmitSolution { game_id, .. }
            | ContractCall::ChallengeSolution { game_id, .. }
            | ContractCall::DonateToGame { game_id, .. }
            | ContractCall::FinalizeGame { game_id }
            | ContractCall::InvalidateGame { game_id }
            | ContractCall::ResetGame { game_id } => Some(*game_id),
        }
    }

    pub fn tokens(&self) -> Vec<Token> {
        match self {
            ContractCall::ProposePuzzle {
                puzzle,
                solution_hash,
                entry_fee,
                token,
                vote_threshold,
                puzzle_type,
                oracle_params,
            } => vec![
                Token::String(puzzle.clone()),
                Token::FixedBytes(solution_hash.to_vec()),
                Token::Uint(*entry_fee),
                Token::Address(*token),
                Token::Uint(*vote_threshold),
                Token::Uint(U256::from(*puzzle_type)),
                Token::String(oracle_params.clone()),
            ],
            ContractCall::VoteOnProposal { game_id, approve } => {
                vec![Token::Uint(*game_id), Token::Bool(*approve)]
            }
            ContractCall::SubmitSolution { game_id, solution } => {
                vec![Token::Uint(*game_id), Token::String(solution.clone())]
            }
            ContractCall::ChallengeSolution { game_id, reason } => {
                vec![Token::Uint(*game_id), Token::String(reason.clone())]
            }
            ContractCall::DonateToGame { game_id, amount } => {
                vec![Token::Uint(*game_id), Token::Uint(*amount)]
            }
            ContractCall::FinalizeGame { game_id }
            | ContractCall::InvalidateGame { game_id }
            | ContractCall::ResetGame { game_id } => vec![Token::Uint(*game_id)],
        }
    }

    /// selector + ABI 编码参数
    pub fn encode(&self, abi: &Abi) -> Result<Bytes, AppError> {
        let function = abi.function(self.function_name())?;
        let data = function.encode_input(&self.tokens())?;
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::utils::id;

    #[test]
    fn abi_parses_all_functions() {
        let abi = solvable_abi().unwrap();
        for name in [
            "proposePuzzle",
            "voteOnProposal",
            "submitSolution",
            "challengeSolution",
            "donateToGame",
            "finalizeGame",
            "invalidateGame",
            "resetGame",
            "getActiveGames",
            "challengeFee",
            "getGameDetails",
        ] {
            assert!(abi.function(name).is_ok(), "missing {}", name);
        }
    }

    #[test]
    fn encode_uses_function_selector() {
        let abi = solvable_abi().unwrap();
        let call = ContractCall::SubmitSolution {
            game_id: U256::from(4u64),
            solution: "42".into(),
        };
        let data = call.encode(&abi).unwrap();
        assert_eq!(&data[..4], &id("submitSolution(uint256,string)")[..]);
    }

    #[test]
    fn propose_signature_matches_contract() {
        let abi = solvable_abi().unwrap();
        let call = ContractCall::ProposePuzzle {
            puzzle: "p".into(),
            solution_hash: [0u8; 32],
            entry_fee: U256::exp10(18),
            token: Address::zero(),
            vote_threshold: U256::one(),
            puzzle_type: 1,
            oracle_params: String::new(),
        };
        let data = call.encode(&abi).unwrap();
        assert_eq!(
            &data[..4],
            &id("proposePuzzle(string,bytes32,uint256,address,uint256,uint8,string)")[..]
        );
        assert_eq!(call.game_id(), None);
    }

    #[test]
    fn game_id_exposed_for_game_calls() {
        let call = ContractCall::DonateToGame {
            game_id: U256::from(9u64),
            amount: U256::one(),
        };
        assert_eq!(call.game_id(), Some(U256::from(9u64)));
    }
}
