//! Password digests and session tokens.
//!
//! Passwords are stored as salted, iterated SHA-256 digests in the form
//! `pbkdf-sha256$<iterations>$<salt-hex>$<digest-hex>`. Session cookies carry
//! a random token; only its SHA-256 hex digest is persisted, so a leaked
//! database does not yield usable sessions.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "taskdeck_session";

const HASH_SCHEME: &str = "pbkdf-sha256";
const HASH_ITERATIONS: u32 = 200_000;
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let digest = stretch(password.as_bytes(), &salt, HASH_ITERATIONS);
    format!(
        "{}${}${}${}",
        HASH_SCHEME,
        HASH_ITERATIONS,
        hex::encode(salt),
        hex::encode(digest)
    )
}

/// Verify a password against an encoded digest.
///
/// Malformed digests verify as false rather than erroring; the iteration
/// count is taken from the stored digest so old hashes keep verifying if
/// the default ever changes.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(digest)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != HASH_SCHEME || parts.next().is_some() {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };

    let candidate = hex::encode(stretch(password.as_bytes(), &salt, iterations));
    digests_equal(candidate.as_bytes(), digest.as_bytes())
}

/// Generate a fresh session token for the cookie value.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a session token for storage and lookup.
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Iterated salted digest.
fn stretch(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password);
    let mut digest: [u8; 32] = hasher.finalize().into();

    for _ in 1..iterations.max(1) {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(digest);
        digest = hasher.finalize().into();
    }

    digest
}

/// Constant-time digest comparison to prevent timing-based oracle attacks.
/// Returns `true` if `a == b` without short-circuiting on mismatch.
fn digests_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let encoded = hash_password("correct horse battery");
        assert!(verify_password("correct horse battery", &encoded));
        assert!(!verify_password("wrong horse battery", &encoded));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("hunter22222");
        let b = hash_password("hunter22222");
        assert_ne!(a, b);
        assert!(verify_password("hunter22222", &a));
        assert!(verify_password("hunter22222", &b));
    }

    #[test]
    fn malformed_digests_verify_false() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "pbkdf-sha256$notanumber$aa$bb"));
        assert!(!verify_password("x", "md5$1$aa$bb"));
        assert!(!verify_password("x", "pbkdf-sha256$1$zz-not-hex$bb"));
    }

    #[test]
    fn tokens_are_unique_and_hash_stably() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert_eq!(token_hash(&t1), token_hash(&t1));
        assert_ne!(token_hash(&t1), token_hash(&t2));
    }

    #[test]
    fn digest_compare_rejects_length_mismatch() {
        assert!(!digests_equal(b"abc", b"abcd"));
        assert!(digests_equal(b"abcd", b"abcd"));
    }
}
