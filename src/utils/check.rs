use ethers_core::types::Address;

/// 原生币游戏的 token 字段为零地址，其余均为 ERC-20 游戏
pub fn is_zero_address(address: &Address) -> bool {
    address.is_zero()
}

/// 答案规范化：去掉所有空白字符后再提交，"4 2" 与 "42" 等价
pub fn normalize_solution(solution: &str) -> String {
    solution.chars().filter(|c| !c.is_whitespace()).collect()
}
