//! Keyed, time-bucketed nonces
//!
//! A nonce is bound to an action string and a user id and stays valid for
//! between half and one full lifetime: time is cut into half-lifetime ticks
//! and both the current and the previous tick are accepted.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Action the attendee dashboard nonce is issued for.
pub const DASHBOARD_NONCE_ACTION: &str = "hbc_attendee_dashboard";

const DEFAULT_NONCE_LIFETIME_SECS: i64 = 60 * 60 * 24;
const NONCE_LENGTH: usize = 10;

#[derive(Debug, Clone)]
pub struct NonceIssuer {
    secret: String,
    lifetime_secs: i64,
}

impl NonceIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            lifetime_secs: DEFAULT_NONCE_LIFETIME_SECS,
        }
    }

    pub fn with_lifetime(mut self, lifetime_secs: i64) -> Self {
        self.lifetime_secs = lifetime_secs.max(2);
        self
    }

    /// Action string of the anti-replay nonce embedded in meeting claims.
    pub fn meeting_action(booking_id: i64, user_id: i64) -> String {
        format!("hbc_meeting_{}_{}", booking_id, user_id)
    }

    pub fn create(&self, action: &str, user_id: i64, now: DateTime<Utc>) -> String {
        self.digest(self.tick(now), action, user_id)
    }

    pub fn verify(&self, nonce: &str, action: &str, user_id: i64, now: DateTime<Utc>) -> bool {
        let nonce = nonce.trim();
        if nonce.len() != NONCE_LENGTH {
            return false;
        }
        let tick = self.tick(now);
        [tick, tick - 1]
            .into_iter()
            .any(|candidate| digests_match(&self.digest(candidate, action, user_id), nonce))
    }

    fn tick(&self, now: DateTime<Utc>) -> i64 {
        let half = self.lifetime_secs / 2;
        (now.timestamp() + half - 1).div_euclid(half)
    }

    fn digest(&self, tick: i64, action: &str, user_id: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(format!("{}|{}|{}", tick, action, user_id).as_bytes());
        let encoded = hex::encode(hasher.finalize());
        encoded[encoded.len() - NONCE_LENGTH - 2..encoded.len() - 2].to_string()
    }
}

/// Compares without exiting at the first differing byte.
fn digests_match(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn nonce_verifies_for_same_action_and_user() {
        let issuer = NonceIssuer::new("secret");
        let nonce = issuer.create(DASHBOARD_NONCE_ACTION, 7, now());

        assert_eq!(nonce.len(), NONCE_LENGTH);
        assert!(issuer.verify(&nonce, DASHBOARD_NONCE_ACTION, 7, now()));
        assert!(!issuer.verify(&nonce, DASHBOARD_NONCE_ACTION, 8, now()));
        assert!(!issuer.verify(&nonce, "other_action", 7, now()));
        assert!(!NonceIssuer::new("other").verify(&nonce, DASHBOARD_NONCE_ACTION, 7, now()));
    }

    #[test]
    fn nonce_survives_one_tick_and_then_expires() {
        let issuer = NonceIssuer::new("secret").with_lifetime(3600);
        let nonce = issuer.create(DASHBOARD_NONCE_ACTION, 7, now());

        assert!(issuer.verify(&nonce, DASHBOARD_NONCE_ACTION, 7, now() + Duration::minutes(30)));
        assert!(!issuer.verify(&nonce, DASHBOARD_NONCE_ACTION, 7, now() + Duration::hours(2)));
    }

    #[test]
    fn malformed_nonces_are_rejected() {
        let issuer = NonceIssuer::new("secret");
        assert!(!issuer.verify("", DASHBOARD_NONCE_ACTION, 7, now()));
        assert!(!issuer.verify("short", DASHBOARD_NONCE_ACTION, 7, now()));
    }

    #[test]
    fn nonce_with_one_altered_character_is_rejected() {
        let issuer = NonceIssuer::new("secret");
        let nonce = issuer.create(DASHBOARD_NONCE_ACTION, 7, now());
        let mut altered = nonce.clone().into_bytes();
        altered[NONCE_LENGTH - 1] = if altered[NONCE_LENGTH - 1] == b'0' { b'1' } else { b'0' };
        let altered = String::from_utf8(altered).unwrap();

        assert!(issuer.verify(&nonce, DASHBOARD_NONCE_ACTION, 7, now()));
        assert!(!issuer.verify(&altered, DASHBOARD_NONCE_ACTION, 7, now()));
    }

    #[test]
    fn meeting_action_is_scoped_to_booking_and_user() {
        assert_eq!(NonceIssuer::meeting_action(12, 5), "hbc_meeting_12_5");
    }
}
