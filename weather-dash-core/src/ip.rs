//! Public IP resolution used to seed the default location.

use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org";

#[derive(Debug, Deserialize)]
struct IpifyResponse {
    ip: String,
}

#[derive(Debug, Clone)]
pub struct IpResolver {
    url: String,
    http: Client,
}

impl Default for IpResolver {
    fn default() -> Self {
        Self::new(DEFAULT_IP_LOOKUP_URL)
    }
}

impl IpResolver {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string(), http: Client::new() }
    }

    async fn fetch(&self) -> Result<String, reqwest::Error> {
        let res = self
            .http
            .get(&self.url)
            .query(&[("format", "json")])
            .send()
            .await?
            .error_for_status()?;

        let body: IpifyResponse = res.json().await?;
        Ok(body.ip)
    }

    /// Best-effort public IP. Any failure yields an empty string, which the
    /// weather provider treats as "the caller's own IP".
    pub async fn resolve(&self) -> String {
        match self.fetch().await {
            Ok(ip) => {
                tracing::debug!(%ip, "Resolved public IP");
                ip
            }
            Err(e) => {
                tracing::warn!("Failed to get IP address: {}", e);
                String::new()
            }
        }
    }
}
