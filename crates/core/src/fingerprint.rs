//! Client fingerprinting
//!
//! A keyed SHA-256 of the user agent. Used as a soft signal only: a mismatch
//! is logged by the validator and never rejects a token.

use sha2::{Digest, Sha256};

pub fn client_fingerprint(user_agent: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_agent.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_keyed() {
        let first = client_fingerprint("Mozilla/5.0", "salt-a");
        assert_eq!(first, client_fingerprint("Mozilla/5.0", "salt-a"));
        assert_eq!(first.len(), 64);
        assert_ne!(first, client_fingerprint("Mozilla/5.0", "salt-b"));
        assert_ne!(first, client_fingerprint("curl/8.0", "salt-a"));
    }
}
