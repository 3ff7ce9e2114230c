use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_SUFFIX_LEN: usize = 6;
const PRODUCT_TOKEN_LEN: usize = 6;

/// Fresh document id such as `prod_3f2c...`.
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Short product marker for voucher codes: the first characters of the id
/// after its type prefix, so `prod_3f2c9a...` becomes `3F2C9A`.
pub fn product_token(product_id: &str) -> String {
    let tail = product_id.rsplit('_').next().unwrap_or(product_id);
    tail.chars()
        .filter(char::is_ascii_alphanumeric)
        .take(PRODUCT_TOKEN_LEN)
        .collect::<String>()
        .to_uppercase()
}

/// Voucher code: `RDM-<unix millis>-<product token>-<6 random chars>`,
/// uppercased and short enough for staff to type back in.
pub fn voucher_code(product_id: &str, at: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("RDM-{}-{}-{}", at.timestamp_millis(), product_token(product_id), suffix)
}

/// Canonical form used to compare a typed or scanned code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn voucher_code_shape() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let code = voucher_code("p3", at);
        assert!(code.starts_with("RDM-1700000000123-P3-"));
        let suffix = code.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn generated_product_ids_shrink_to_a_short_token() {
        let id = new_id("prod");
        let code = voucher_code(&id, Utc::now());
        assert_eq!(product_token(&id), id[5..11].to_uppercase());
        assert!(code.contains(&product_token(&id)));
        assert!(code.len() <= 32, "code too long to type: {code}");
        assert_eq!(product_token("p_x-1"), "X1");
    }

    #[test]
    fn voucher_codes_differ() {
        let at = Utc::now();
        assert_ne!(voucher_code("p1", at), voucher_code("p1", at));
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  rdm-1-p1-abc123 \n"), "RDM-1-P1-ABC123");
    }
}
