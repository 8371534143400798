//! Per-request inputs threaded into validation and issuance

use chrono::{DateTime, Utc};

use crate::fingerprint::client_fingerprint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub now: DateTime<Utc>,
    /// Canonical URL of the deployment handling the request
    pub site_identity: String,
    pub fingerprint: Option<String>,
}

impl RequestContext {
    pub fn new(now: DateTime<Utc>, site_identity: impl Into<String>) -> Self {
        Self {
            now,
            site_identity: site_identity.into(),
            fingerprint: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<&str>, salt: &str) -> Self {
        self.fingerprint = Some(client_fingerprint(user_agent.unwrap_or_default(), salt));
        self
    }
}
