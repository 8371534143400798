//! Runtime configuration
//!
//! Values come from `MG_*` environment variables with production defaults.
//! Everything that used to be ambient (site identity, override flag, grace
//! period) is carried here and passed explicitly to the code that needs it.

use chrono::{Duration, FixedOffset, Offset, Utc};
use rand::RngCore;
use tracing::warn;

use crate::meeting::{JitsiApi, JitsiConfig, DEFAULT_MEETING_LANGUAGE};

pub const DEFAULT_SITE_URL: &str = "http://localhost:8081";
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24;
pub const DEFAULT_GRACE_PERIOD_SECONDS: i64 = 15 * 60;
pub const DEFAULT_API_JOIN_LEAD_SECONDS: i64 = 5 * 60;
pub const DEFAULT_REMINDER_LEAD_SECONDS: i64 = 5 * 60;
pub const DEFAULT_CLEANUP_DELAY_SECONDS: i64 = 60;

#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Canonical site URL; doubles as the token's site identity.
    pub site_url: String,
    pub token_ttl_secs: i64,
    /// How long before the scheduled start the meeting page lets people in.
    pub grace_period_secs: i64,
    /// How long before the scheduled start the network API hands out links.
    pub api_join_lead_secs: i64,
    pub reminder_lead_secs: i64,
    pub cleanup_delay_secs: i64,
    /// Forces every meeting to `active`. Support and demo use only.
    pub testing_mode: bool,
    /// Offset used to read booking wall-clock dates.
    pub site_utc_offset_secs: i32,
    /// Key for client fingerprints and nonces.
    pub secret_salt: String,
    pub jitsi: JitsiConfig,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECONDS,
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECONDS,
            api_join_lead_secs: DEFAULT_API_JOIN_LEAD_SECONDS,
            reminder_lead_secs: DEFAULT_REMINDER_LEAD_SECONDS,
            cleanup_delay_secs: DEFAULT_CLEANUP_DELAY_SECONDS,
            testing_mode: false,
            site_utc_offset_secs: 0,
            secret_salt: "dev-salt-change-me".to_string(),
            jitsi: JitsiConfig::default(),
        }
    }
}

impl AccessConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let secret_salt = env_string("MG_SECRET_SALT").unwrap_or_else(|| {
            warn!("MG_SECRET_SALT is not set, using an ephemeral salt for this process");
            ephemeral_salt()
        });

        let jitsi = JitsiConfig {
            api: env_string("MG_JITSI_API")
                .and_then(|raw| raw.parse::<JitsiApi>().ok())
                .unwrap_or(defaults.jitsi.api),
            domain: env_string("MG_JITSI_DOMAIN").unwrap_or(defaults.jitsi.domain),
            app_id: env_string("MG_JITSI_APP_ID").unwrap_or_default(),
            language: env_string("MG_MEETING_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_MEETING_LANGUAGE.to_string()),
        };

        Self {
            site_url: env_string("MG_SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            token_ttl_secs: env_positive_i64("MG_TOKEN_TTL_SECONDS")
                .unwrap_or(defaults.token_ttl_secs),
            grace_period_secs: env_non_negative_i64("MG_GRACE_PERIOD_SECONDS")
                .unwrap_or(defaults.grace_period_secs),
            api_join_lead_secs: env_non_negative_i64("MG_API_JOIN_LEAD_SECONDS")
                .unwrap_or(defaults.api_join_lead_secs),
            reminder_lead_secs: env_non_negative_i64("MG_REMINDER_LEAD_SECONDS")
                .unwrap_or(defaults.reminder_lead_secs),
            cleanup_delay_secs: env_non_negative_i64("MG_CLEANUP_DELAY_SECONDS")
                .unwrap_or(defaults.cleanup_delay_secs),
            testing_mode: env_flag("MG_TESTING_MODE", false),
            site_utc_offset_secs: env_string("MG_SITE_UTC_OFFSET_MINUTES")
                .and_then(|raw| raw.parse::<i32>().ok())
                .filter(|minutes| minutes.abs() < 24 * 60)
                .map(|minutes| minutes * 60)
                .unwrap_or(defaults.site_utc_offset_secs),
            secret_salt,
            jitsi,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::seconds(self.grace_period_secs)
    }

    pub fn api_join_lead(&self) -> Duration {
        Duration::seconds(self.api_join_lead_secs)
    }

    pub fn reminder_lead(&self) -> Duration {
        Duration::seconds(self.reminder_lead_secs)
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::seconds(self.cleanup_delay_secs)
    }

    pub fn site_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.site_utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }

    /// URL under which a token is redeemed.
    pub fn meeting_page_url(&self, token: &str) -> String {
        format!("{}/meeting/{}", self.site_url.trim_end_matches('/'), token)
    }
}

pub fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" | "active" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_positive_i64(name: &str) -> Option<i64> {
    env_string(name)
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|value| *value > 0)
}

fn env_non_negative_i64(name: &str) -> Option<i64> {
    env_string(name)
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|value| *value >= 0)
}

fn ephemeral_salt() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
