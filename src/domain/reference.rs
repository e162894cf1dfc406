//! Human-readable reference numbers for orders and payments.

use rand::Rng;

pub const ORDER_PREFIX: &str = "ORD";
pub const PAYMENT_PREFIX: &str = "TRX";

const SUFFIX_LEN: usize = 5;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// `<PREFIX>-<unix millis>-<5 random uppercase alphanumerics>`.
///
/// Collisions are unlikely but possible; the unique column is the arbiter.
#[must_use]
pub fn generate(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::rng();

    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
            char::from(SUFFIX_ALPHABET[idx])
        })
        .collect();

    format!("{prefix}-{millis}-{suffix}")
}

#[must_use]
pub fn order_number() -> String {
    generate(ORDER_PREFIX)
}

#[must_use]
pub fn transaction_number() -> String {
    generate(PAYMENT_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_shape() {
        let number = order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn transaction_number_prefix() {
        assert!(transaction_number().starts_with("TRX-"));
    }
}
