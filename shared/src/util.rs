/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as entity ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC
///   - 12 bits: random
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF;
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000);
    (ts << 12) | rand_bits
}

/// Strip a CPF down to its digits.
///
/// Customers type CPFs as `123.456.789-09` or `12345678909`; both must
/// compare equal.
pub fn normalize_cpf(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A CPF is accepted as a credential when it has exactly 11 digits.
pub fn is_valid_cpf(raw: &str) -> bool {
    normalize_cpf(raw).len() == 11
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cpf() {
        assert_eq!(normalize_cpf("123.456.789-09"), "12345678909");
        assert_eq!(normalize_cpf(" 12345678909 "), "12345678909");
    }

    #[test]
    fn test_is_valid_cpf() {
        assert!(is_valid_cpf("123.456.789-09"));
        assert!(!is_valid_cpf("123.456"));
        assert!(!is_valid_cpf(""));
    }

    #[test]
    fn test_snowflake_ids_are_positive_and_distinct_enough() {
        let a = snowflake_id();
        let b = snowflake_id();
        assert!(a > 0);
        assert!(b > 0);
    }
}
