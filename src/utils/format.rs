use bigdecimal::BigDecimal;
use ethers_core::types::U256;
use std::str::FromStr;

/// 将 U256 转为 BigDecimal（NUMERIC 列）
pub fn u256_to_bigdecimal(value: U256) -> BigDecimal {
    // 先转十进制字符串再解析，大数最稳
    let s = value.to_string();
    BigDecimal::from_str(&s).unwrap_or_else(|_| BigDecimal::from(0))
}

/// wei 金额输出为不带小数点的十进制字符串
pub fn wei_to_string(value: &BigDecimal) -> String {
    // NUMERIC 读回来可能是负 scale，先归一到 scale=0 再取整数部分
    let (digits, _) = value.with_scale(0).into_bigint_and_exponent();
    digits.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_ether_survives_numeric_column() {
        let wei = U256::from_dec_str("1000000000000000000").unwrap();
        let dec = u256_to_bigdecimal(wei);
        assert_eq!(wei_to_string(&dec), "1000000000000000000");
    }

    #[test]
    fn max_u256_is_exact() {
        let dec = u256_to_bigdecimal(U256::MAX);
        assert_eq!(wei_to_string(&dec), U256::MAX.to_string());
    }
}
