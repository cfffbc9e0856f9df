use crate::services::facilitator_service::PaymentFacilitator;
use crate::services::game_service::GameService;
use std::sync::Arc;

/// 路由共享状态，只持有注入的服务
#[derive(Clone)]
pub struct AppState {
    pub games: Arc<GameService>,
    pub facilitator: Arc<dyn PaymentFacilitator>,
}

impl AppState {
    pub fn new(games: Arc<GameService>, facilitator: Arc<dyn PaymentFacilitator>) -> Self {
        Self { games, facilitator }
    }
}
