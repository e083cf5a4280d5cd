//! Random key generation and the password-reset token format.
//!
//! Reset tokens are `<random>_<unixTimestamp>`; validity is a pure function
//! of the token string, the configured expiry window, and the current time.

/// Generate a random auth key (64 character hex string)
#[must_use]
pub fn generate_auth_key() -> String {
    random_hex_string()
}

/// Random 64-char hex string from 32 bytes of RNG output.
#[must_use]
pub fn random_hex_string() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Build a fresh password-reset token stamped with the issue time.
#[must_use]
pub fn generate_password_reset_token(now_unix: i64) -> String {
    format!("{}_{now_unix}", random_hex_string())
}

/// Whether a reset token is still within its expiry window.
///
/// Empty tokens fail closed. The timestamp is whatever follows the last `_`;
/// a malformed suffix parses as 0 and is therefore long expired.
#[must_use]
pub fn is_password_reset_token_valid(token: &str, expire_secs: i64, now_unix: i64) -> bool {
    if token.is_empty() {
        return false;
    }

    let timestamp = token
        .rsplit('_')
        .next()
        .and_then(|part| part.parse::<i64>().ok())
        .unwrap_or(0);

    timestamp + expire_secs >= now_unix
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRE: i64 = 3600;
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_empty_token_is_invalid() {
        assert!(!is_password_reset_token_valid("", EXPIRE, NOW));
    }

    #[test]
    fn test_fresh_token_is_valid() {
        let token = format!("abc_{NOW}");
        assert!(is_password_reset_token_valid(&token, EXPIRE, NOW));
    }

    #[test]
    fn test_token_at_expiry_boundary() {
        let token = format!("abc_{}", NOW - EXPIRE);
        assert!(is_password_reset_token_valid(&token, EXPIRE, NOW));

        let token = format!("abc_{}", NOW - EXPIRE - 1);
        assert!(!is_password_reset_token_valid(&token, EXPIRE, NOW));
    }

    #[test]
    fn test_malformed_token_is_expired() {
        assert!(!is_password_reset_token_valid("no-timestamp-here", EXPIRE, NOW));
        assert!(!is_password_reset_token_valid("abc_notanumber", EXPIRE, NOW));
    }

    #[test]
    fn test_generated_token_round_trips() {
        let token = generate_password_reset_token(NOW);
        assert!(is_password_reset_token_valid(&token, EXPIRE, NOW));
        assert!(token.ends_with(&format!("_{NOW}")));
    }

    #[test]
    fn test_auth_keys_are_unique() {
        let a = generate_auth_key();
        let b = generate_auth_key();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
