//! URL-shortening service client.
//!
//! The drill-down links embedded in a rendered table go through an
//! internal shortening service; a raw query URL would blow the cell
//! width out. One POST per previously-unresolved key, wrapped in the
//! bounded retry policy; a key that still fails after the retries is
//! reported as unresolved and the report renders its bare count.

use log::error;
use serde_json::json;

use crate::retry::{self, with_retry};

const USER_AGENT: &str = "reportbot/0.3.1";

/// Client for the shortening endpoint.
pub struct ShortenClient {
    agent: ureq::Agent,
    api: String,
    user: String,
}

impl ShortenClient {
    /// `api` is the POST endpoint; `user` is the service account name the
    /// endpoint records against each created link.
    pub fn new(api: String, user: String) -> Self {
        ShortenClient { agent: ureq::agent(), api, user }
    }

    /// Shorten one long URL. Returns `None` after the retries are
    /// exhausted; the failure is logged, never fatal.
    pub fn shorten(&self, long_url: &str) -> Option<String> {
        let result = with_retry(
            "shorten",
            retry::DEFAULT_ATTEMPTS,
            retry::DEFAULT_DELAY,
            || self.request(long_url),
        );
        match result {
            Ok(short) => Some(short),
            Err(e) => {
                error!("short url for {} unavailable: {}", long_url, e);
                None
            }
        }
    }

    fn request(&self, long_url: &str) -> Result<String, String> {
        let payload = json!({
            "original_url": long_url,
            "short_key": "",
            "expire_type": "indefinitely",
            "user_id": self.user,
        });

        let response = self
            .agent
            .post(&self.api)
            .set("User-Agent", USER_AGENT)
            .send_json(payload)
            .map_err(|e| e.to_string())?;

        let body: serde_json::Value =
            response.into_json().map_err(|e| format!("invalid response body: {}", e))?;

        match body.get("short_url").and_then(|v| v.as_str()) {
            Some(short) if !short.is_empty() => Ok(short.to_string()),
            _ => Err("response carried no short_url".to_string()),
        }
    }
}
