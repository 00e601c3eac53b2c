//! Client configuration from environment.

use std::{env, time::Duration};

const DEFAULT_API_ROOT: &str = "http://localhost:8000";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_root: String,
    pub geocoder_url: String,
    pub geocoder_limit: usize,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocoder_limit: 5,
            timeout: Duration::from_secs(10),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_root: env::var("HORI_API_ROOT")
                .map(|url| trim_url(&url))
                .unwrap_or(defaults.api_root),
            geocoder_url: env::var("GEOCODER_URL")
                .map(|url| trim_url(&url))
                .unwrap_or(defaults.geocoder_url),
            geocoder_limit: env::var("GEOCODER_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.geocoder_limit),
            timeout: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_agent: env::var("HORI_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    pub fn with_api_root(mut self, url: &str) -> Self {
        self.api_root = trim_url(url);
        self
    }

    pub fn with_geocoder_url(mut self, url: &str) -> Self {
        self.geocoder_url = trim_url(url);
        self
    }

    pub fn route_url(&self) -> String {
        format!("{}/api/hori/route", self.api_root)
    }

    pub fn point_url(&self) -> String {
        format!("{}/api/hori/point", self.api_root)
    }
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn default_user_agent() -> String {
    format!("hori-trip/{}", env!("CARGO_PKG_VERSION"))
}
