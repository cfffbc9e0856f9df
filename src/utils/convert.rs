use crate::errors::error::AppError;
use chrono::{DateTime, Utc};
use ethers_core::types::{Address, H256, U256};

pub fn address_to_string(address: &Address) -> String {
    format!("{:#x}", address)
}

/// 零地址视为空（winner / first_solver 未设置）
pub fn address_opt_to_string(address: &Address) -> Option<String> {
    if address.is_zero() {
        None
    } else {
        Some(address_to_string(address))
    }
}

pub fn h256_to_string(data: H256) -> String {
    format!("{:#x}", data)
}

pub fn u256_to_i64(u256_val: U256) -> Result<i64, AppError> {
    // 1. 检查 U256 是否超出 u128 范围
    let u128_val: u128 = u256_val.try_into().map_err(|e| {
        AppError::Conversion(format!("U256({}) exceeds u128 range: {}", u256_val, e))
    })?;

    // 2. 检查是否超出 i64 范围
    if u128_val > i64::MAX as u128 {
        return Err(AppError::Conversion(format!(
            "U256({}) exceeds i64 range (max {})",
            u256_val,
            i64::MAX
        )));
    }

    Ok(u128_val as i64)
}

/// 链上秒级时间戳，0 表示未设置
pub fn unix_seconds_to_datetime(seconds: U256) -> Result<Option<DateTime<Utc>>, AppError> {
    if seconds.is_zero() {
        return Ok(None);
    }
    let secs = u256_to_i64(seconds)?;
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(Some)
        .ok_or_else(|| AppError::Conversion(format!("timestamp {} out of range", secs)))
}

/// topic 是 32 字节大端整数（indexed uint256）
pub fn topic_to_u256(topic: &H256) -> U256 {
    U256::from_big_endian(topic.as_bytes())
}

pub fn u256_to_topic(value: U256) -> H256 {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    H256::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u256_to_i64_bounds() {
        assert_eq!(u256_to_i64(U256::from(42u64)).unwrap(), 42);
        assert_eq!(u256_to_i64(U256::from(i64::MAX as u64)).unwrap(), i64::MAX);
        assert!(u256_to_i64(U256::from(i64::MAX as u64) + 1).is_err());
        assert!(u256_to_i64(U256::MAX).is_err());
    }

    #[test]
    fn zero_address_maps_to_none() {
        assert_eq!(address_opt_to_string(&Address::zero()), None);
        assert_eq!(
            address_opt_to_string(&Address::repeat_byte(0xab)).as_deref(),
            Some("0xabababababababababababababababababababab")
        );
    }

    #[test]
    fn zero_deadline_maps_to_none() {
        assert_eq!(unix_seconds_to_datetime(U256::zero()).unwrap(), None);
        let dt = unix_seconds_to_datetime(U256::from(1_700_000_000u64))
            .unwrap()
            .unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }

    #[test]
    fn topic_roundtrip_keeps_full_width() {
        let id = U256::from(7u64) << 200;
        assert_eq!(topic_to_u256(&u256_to_topic(id)), id);
    }
}
