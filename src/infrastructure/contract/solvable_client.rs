use crate::errors::error::AppError;
use crate::infrastructure::contract::abi::{ContractCall, solvable_abi};
use crate::infrastructure::provider::ProviderTrait;
use crate::log_info;
use crate::models::domain::event::EventKind;
use crate::models::domain::game::GameDetails;
use crate::services::tx::types::{TxContext, TxOptions, TxResult};
use crate::services::tx_service::TxService;
use async_trait::async_trait;
use ethers_core::abi::{Abi, Token};
use ethers_core::types::{
    Address, BlockNumber, Filter, Log, TransactionRequest, U64, U256, ValueOrArray,
};
use std::sync::Arc;

/// 默认入场费 = 挑战费 × 500
pub const DEFAULT_ENTRY_FEE_MULTIPLIER: u64 = 500;

/// 合约读写入口，路由、索引器都只依赖这个 trait
#[async_trait]
pub trait ContractClient: Send + Sync {
    fn contract_address(&self) -> Address;

    async fn get_game(&self, id: U256) -> Result<GameDetails, AppError>;

    /// exists=false 时返回 NotFound
    async fn get_existing_game(&self, id: U256) -> Result<GameDetails, AppError> {
        let game = self.get_game(id).await?;
        if !game.exists {
            return Err(AppError::NotFound("Game does not exist".to_string()));
        }
        Ok(game)
    }

    async fn get_active_games(&self, start: U256, limit: U256) -> Result<Vec<U256>, AppError>;

    async fn get_challenge_fee(&self) -> Result<U256, AppError>;

    async fn get_default_entry_fee(&self) -> Result<U256, AppError> {
        let fee = self.get_challenge_fee().await?;
        fee.checked_mul(U256::from(DEFAULT_ENTRY_FEE_MULTIPLIER))
            .ok_or_else(|| AppError::Conversion(format!("default entry fee overflow: {}", fee)))
    }

    /// 签名、广播并等待回执
    async fn send_contract_tx(
        &self,
        call: ContractCall,
        value: Option<U256>,
    ) -> Result<TxResult, AppError>;

    async fn get_block_number(&self) -> Result<U64, AppError>;

    async fn get_logs(
        &self,
        events: &[EventKind],
        from: U64,
        to: U64,
    ) -> Result<Vec<Log>, AppError>;
}

pub struct SolvableClient {
    address: Address,
    abi: &'static Abi,
    provider: Arc<dyn ProviderTrait>,
    tx_service: Arc<TxService>,
    tx_options: TxOptions,
}

impl SolvableClient {
    pub fn new(
        address: Address,
        provider: Arc<dyn ProviderTrait>,
        tx_service: Arc<TxService>,
        tx_options: TxOptions,
    ) -> Result<Self, AppError> {
        Ok(Self {
            address,
            abi: solvable_abi()?,
            provider,
            tx_service,
            tx_options,
        })
    }

    async fn read(&self, name: &str, args: &[Token]) -> Result<Vec<Token>, AppError> {
        let function = self.abi.function(name)?;
        let data = function.encode_input(args)?;
        let req = TransactionRequest::new().to(self.address).data(data);
        let output = self.provider.call(&req.into()).await?;
        Ok(function.decode_output(&output)?)
    }
}

pub fn log_filter(contract: Address, events: &[EventKind], from: U64, to: U64) -> Filter {
    let topics = events.iter().map(|kind| Some(kind.topic())).collect();
    Filter::new()
        .address(contract)
        .from_block(BlockNumber::Number(from))
        .to_block(BlockNumber::Number(to))
        .topic0(ValueOrArray::Array(topics))
}

#[async_trait]
impl ContractClient for SolvableClient {
    fn contract_address(&self) -> Address {
        self.address
    }

    async fn get_game(&self, id: U256) -> Result<GameDetails, AppError> {
        let tokens = self.read("getGameDetails", &[Token::Uint(id)]).await?;
        GameDetails::from_tokens(tokens)
    }

    async fn get_active_games(&self, start: U256, limit: U256) -> Result<Vec<U256>, AppError> {
        let tokens = self
            .read("getActiveGames", &[Token::Uint(start), Token::Uint(limit)])
            .await?;
        match tokens.into_iter().next() {
            Some(Token::Array(items)) => items
                .into_iter()
                .map(|t| match t {
                    Token::Uint(v) => Ok(v),
                    other => Err(AppError::ParserError(format!(
                        "getActiveGames: unexpected item {:?}",
                        other
                    ))),
                })
                .collect(),
            other => Err(AppError::ParserError(format!(
                "getActiveGames: unexpected output {:?}",
                other
            ))),
        }
    }

    async fn get_challenge_fee(&self) -> Result<U256, AppError> {
        let tokens = self.read("challengeFee", &[]).await?;
        match tokens.into_iter().next() {
            Some(Token::Uint(fee)) => Ok(fee),
            other => Err(AppError::ParserError(format!(
                "challengeFee: unexpected output {:?}",
                other
            ))),
        }
    }

    async fn send_contract_tx(
        &self,
        call: ContractCall,
        value: Option<U256>,
    ) -> Result<TxResult, AppError> {
        let data = call.encode(self.abi)?;
        log_info!(
            "Sending {} (game {:?}) value={}",
            call.function_name(),
            call.game_id(),
            value.unwrap_or_default()
        );
        let ctx = TxContext {
            to: self.address,
            value: value.unwrap_or_default(),
            data,
            options: self.tx_options.clone(),
        };
        self.tx_service.execute(ctx).await
    }

    async fn get_block_number(&self) -> Result<U64, AppError> {
        self.provider.get_last_block_number().await
    }

    async fn get_logs(
        &self,
        events: &[EventKind],
        from: U64,
        to: U64,
    ) -> Result<Vec<Log>, AppError> {
        let filter = log_filter(self.address, events, from, to);
        self.provider.get_logs(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tx::gas::gas_service::GasService;
    use crate::services::tx::nonce::nonce_service::NonceService;
    use crate::services::tx::signer::LocalSigner;
    use crate::services::tx::signer::signer_trait::TxSigner;
    use crate::services::tx::simulation::simulation_service::SimulationService;
    use crate::test_support::game_tokens;
    use ethers_core::abi::encode;
    use ethers_core::types::transaction::eip2718::TypedTransaction;
    use ethers_core::types::{Bytes, TransactionReceipt};

    /// 只应答 eth_call：按 selector 返回预置结果
    struct ViewProvider {
        challenge_fee: U256,
        game: GameDetails,
    }

    #[async_trait]
    impl ProviderTrait for ViewProvider {
        async fn get_last_block_number(&self) -> Result<U64, AppError> {
            Ok(U64::from(10))
        }
        async fn get_chain_id(&self) -> Result<U256, AppError> {
            Ok(U256::from(31337u64))
        }
        async fn get_transaction_count(&self, _address: Address) -> Result<U256, AppError> {
            Ok(U256::zero())
        }
        async fn estimate_eip1559_fees(&self) -> Result<(U256, U256), AppError> {
            Ok((U256::one(), U256::one()))
        }
        async fn send_raw_transaction(
            &self,
            _rlp: Bytes,
            _timeout_secs: u64,
            _confirmations: usize,
        ) -> Result<TransactionReceipt, AppError> {
            Err(AppError::ProviderError("not scripted".into()))
        }
        async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, AppError> {
            let data = tx.data().cloned().unwrap_or_default();
            let abi = solvable_abi()?;
            let selector = &data[..4];
            let out = if selector == abi.function("challengeFee")?.short_signature() {
                encode(&[Token::Uint(self.challenge_fee)])
            } else if selector == abi.function("getActiveGames")?.short_signature() {
                encode(&[Token::Array(vec![Token::Uint(U256::from(3u64))])])
            } else {
                encode(&game_tokens(&self.game))
            };
            Ok(Bytes::from(out))
        }
        async fn estimate_gas(&self, _tx: &TypedTransaction) -> Result<U256, AppError> {
            Ok(U256::from(21_000u64))
        }
        async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, AppError> {
            Ok(vec![])
        }
    }

    fn client(challenge_fee: U256, game: GameDetails) -> SolvableClient {
        let provider: Arc<dyn ProviderTrait> = Arc::new(ViewProvider {
            challenge_fee,
            game,
        });
        let signer = LocalSigner::from_private_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            31337,
        )
        .unwrap();
        let address = signer.address();
        let tx_service = Arc::new(TxService::new(
            Arc::new(signer),
            Arc::new(NonceService::with_nonce(address, 0)),
            Arc::new(GasService::default()),
            Arc::new(SimulationService::new()),
            provider.clone(),
        ));
        SolvableClient::new(
            Address::repeat_byte(0xcc),
            provider,
            tx_service,
            TxOptions::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn default_entry_fee_is_challenge_fee_times_500() {
        let c = client(U256::exp10(16), GameDetails::default());
        assert_eq!(c.get_challenge_fee().await.unwrap(), U256::exp10(16));
        assert_eq!(
            c.get_default_entry_fee().await.unwrap(),
            U256::exp10(16) * U256::from(500u64)
        );
    }

    #[tokio::test]
    async fn default_entry_fee_overflow_is_error() {
        let c = client(U256::MAX, GameDetails::default());
        assert!(c.get_default_entry_fee().await.is_err());
    }

    #[tokio::test]
    async fn get_existing_game_maps_missing_to_not_found() {
        let c = client(U256::one(), GameDetails::default());
        let err = c.get_existing_game(U256::from(5u64)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let game = GameDetails {
            exists: true,
            puzzle: "p".into(),
            ..GameDetails::default()
        };
        let c = client(U256::one(), game.clone());
        assert_eq!(c.get_existing_game(U256::from(5u64)).await.unwrap(), game);
    }

    #[tokio::test]
    async fn active_games_decoded() {
        let c = client(U256::one(), GameDetails::default());
        assert_eq!(
            c.get_active_games(U256::zero(), U256::from(200u64)).await.unwrap(),
            vec![U256::from(3u64)]
        );
    }

    #[test]
    fn log_filter_targets_contract_and_topics() {
        let filter = log_filter(
            Address::repeat_byte(0xcc),
            &[EventKind::PuzzleProposed, EventKind::DonationReceived],
            U64::zero(),
            U64::from(100),
        );
        match &filter.topics[0] {
            Some(ValueOrArray::Array(topics)) => assert_eq!(topics.len(), 2),
            other => panic!("unexpected topic0 {:?}", other),
        }
    }
}
