//! Jitsi room naming and URLs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::booking::BookingDetails;

pub const DEFAULT_JITSI_DOMAIN: &str = "meet.jit.si";
pub const JAAS_DOMAIN: &str = "8x8.vc";
pub const DEFAULT_MEETING_LANGUAGE: &str = "en";

/// Hosted flavour of the video service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitsiApi {
    #[default]
    Free,
    /// Jitsi as a Service, always served from `8x8.vc`
    Jaas,
}

impl JitsiApi {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Jaas => "jaas",
        }
    }
}

impl fmt::Display for JitsiApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JitsiApi {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "jaas" => Ok(Self::Jaas),
            other => Err(format!("Unsupported Jitsi API '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JitsiConfig {
    pub api: JitsiApi,
    /// Self-hosted or public domain used by the free flavour
    pub domain: String,
    /// JaaS tenant; prefixed to room paths when set
    pub app_id: String,
    pub language: String,
}

impl Default for JitsiConfig {
    fn default() -> Self {
        Self {
            api: JitsiApi::Free,
            domain: DEFAULT_JITSI_DOMAIN.to_string(),
            app_id: String::new(),
            language: DEFAULT_MEETING_LANGUAGE.to_string(),
        }
    }
}

impl JitsiConfig {
    /// Domain rooms are actually served from
    pub fn effective_domain(&self) -> String {
        match self.api {
            JitsiApi::Jaas => JAAS_DOMAIN.to_string(),
            JitsiApi::Free => validate_domain(&self.domain),
        }
    }

    /// Origin of the embeddable `external_api.js`
    pub fn external_api_script(&self) -> String {
        format!("https://{}/external_api.js", self.effective_domain())
    }
}

/// Strip scheme and trailing slashes; anything that is not a plain host
/// (optionally with a port) falls back to the public instance.
pub fn validate_domain(raw: &str) -> String {
    let domain = raw.trim();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain)
        .trim_end_matches('/');

    let valid = !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));

    if valid {
        domain.to_ascii_lowercase()
    } else {
        DEFAULT_JITSI_DOMAIN.to_string()
    }
}

/// `meeting-<booking>-<title slug>-<8 hex>`, stable for a given booking slot
pub fn room_name(details: &BookingDetails) -> String {
    let booking = &details.booking;
    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{}{}{}",
            booking.id, booking.meeting_dates, booking.start_time
        )
        .as_bytes(),
    );
    let digest = hex::encode(hasher.finalize());

    let title = slugify(details.meeting_title.as_deref().unwrap_or("booking"));
    let title = if title.is_empty() {
        "booking".to_string()
    } else {
        title
    };

    format!("meeting-{}-{}-{}", booking.id, title, &digest[..8])
}

pub fn build_meeting_url(room_name: &str, config: &JitsiConfig) -> String {
    let path = match config.api {
        JitsiApi::Jaas if !config.app_id.is_empty() => {
            format!("{}/{}", config.app_id, room_name)
        }
        _ => room_name.to_string(),
    };
    let language = format!("\"{}\"", config.language);
    format!(
        "https://{}/{}#config.defaultLanguage={}",
        config.effective_domain(),
        path,
        urlencoding::encode(&language)
    )
}

fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Room record stored under `jitsi_meeting`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRoom {
    pub room_name: String,
    pub meeting_url: String,
    pub domain: String,
    #[serde(default)]
    pub api: JitsiApi,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub terminated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<DateTime<Utc>>,
}

impl MeetingRoom {
    pub fn provision(details: &BookingDetails, config: &JitsiConfig, now: DateTime<Utc>) -> Self {
        let room_name = room_name(details);
        Self {
            meeting_url: build_meeting_url(&room_name, config),
            domain: config.effective_domain(),
            api: config.api,
            room_name,
            created_at: now,
            terminated: false,
            terminated_at: None,
        }
    }

    /// Room path as the external API expects it
    pub fn qualified_room_name(&self, config: &JitsiConfig) -> String {
        match self.api {
            JitsiApi::Jaas if !config.app_id.is_empty() => {
                format!("{}/{}", config.app_id, self.room_name)
            }
            _ => self.room_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingDirectory;
    use crate::testing::{at, sample_directory, BOOKING_ID};

    #[test]
    fn domain_validation_strips_scheme_and_falls_back() {
        assert_eq!(validate_domain("https://jitsi.example.org/"), "jitsi.example.org");
        assert_eq!(validate_domain("http://Meet.Example.com"), "meet.example.com");
        assert_eq!(validate_domain("jitsi.local:8443"), "jitsi.local:8443");
        assert_eq!(validate_domain(""), DEFAULT_JITSI_DOMAIN);
        assert_eq!(validate_domain("not a domain/path"), DEFAULT_JITSI_DOMAIN);
    }

    #[test]
    fn jaas_always_uses_8x8() {
        let config = JitsiConfig {
            api: JitsiApi::Jaas,
            domain: "ignored.example".to_string(),
            app_id: "vpaas-magic-123".to_string(),
            ..JitsiConfig::default()
        };
        assert_eq!(config.effective_domain(), JAAS_DOMAIN);
        assert_eq!(
            build_meeting_url("room-1", &config),
            "https://8x8.vc/vpaas-magic-123/room-1#config.defaultLanguage=%22en%22"
        );
    }

    #[test]
    fn free_meeting_url_carries_language() {
        let url = build_meeting_url("room-1", &JitsiConfig::default());
        assert_eq!(url, "https://meet.jit.si/room-1#config.defaultLanguage=%22en%22");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Strategy Session!"), "strategy-session");
        assert_eq!(slugify("  Q&A -- Friday  "), "q-a-friday");
        assert_eq!(slugify("***"), "");
    }

    #[tokio::test]
    async fn room_name_is_deterministic_per_slot() {
        let directory = sample_directory();
        let details = directory.booking(BOOKING_ID).await.unwrap().unwrap();

        let name = room_name(&details);
        assert!(name.starts_with("meeting-100-strategy-session-"));
        assert_eq!(name.len(), "meeting-100-strategy-session-".len() + 8);
        assert_eq!(name, room_name(&details));

        let mut moved = details.clone();
        moved.booking.start_time = "11:00".to_string();
        assert_ne!(name, room_name(&moved));

        let room = MeetingRoom::provision(&details, &JitsiConfig::default(), at(8, 0));
        assert_eq!(room.room_name, name);
        assert_eq!(room.domain, DEFAULT_JITSI_DOMAIN);
        assert!(!room.terminated);
    }
}
