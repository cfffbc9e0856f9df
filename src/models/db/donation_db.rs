use crate::errors::error::AppError;
use crate::models::db::schema::game_donations;
use crate::models::domain::event::DonationReceivedEvent;
use crate::utils::{address_to_string, u256_to_bigdecimal, u256_to_i64};
use bigdecimal::BigDecimal;
use diesel::Insertable;

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = game_donations)]
pub struct DonationInsert {
    pub game_id: i64,
    pub donor_address: String,
    pub amount: BigDecimal,
    /// 目前只记录原生币捐赠
    pub token_address: Option<String>,
}

impl TryFrom<&DonationReceivedEvent> for DonationInsert {
    type Error = AppError;

    fn try_from(event: &DonationReceivedEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            game_id: u256_to_i64(event.game_id)?,
            donor_address: address_to_string(&event.donor),
            amount: u256_to_bigdecimal(event.amount),
            token_address: None,
        })
    }
}
