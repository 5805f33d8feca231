//! Server-side rendering delegation.
//!
//! The SSR server is a black box: the adapter POSTs the serialized page to
//! `{ssr_url}/render` and receives `{body, head}` back, where `head` may be
//! a single string or an array of fragments. Every failure mode degrades to
//! client-side rendering; SSR never aborts a response.

use std::time::Duration;

use serde::Deserialize;

use crate::config::InertiaConfig;

/// Rendered output from the SSR server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsrPage {
    /// HTML for the application container.
    pub body: String,
    /// Concatenated fragments for the document head.
    pub head: String,
}

#[derive(Debug, Deserialize)]
struct RawSsrPayload {
    #[serde(default)]
    body: String,
    #[serde(default)]
    head: HeadField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HeadField {
    One(String),
    Many(Vec<String>),
}

impl Default for HeadField {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<RawSsrPayload> for SsrPage {
    fn from(raw: RawSsrPayload) -> Self {
        let head = match raw.head {
            HeadField::One(head) => head,
            HeadField::Many(fragments) => fragments.concat(),
        };
        Self {
            body: raw.body,
            head,
        }
    }
}

fn parse_ssr_payload(raw: &str) -> Result<SsrPage, serde_json::Error> {
    serde_json::from_str::<RawSsrPayload>(raw).map(SsrPage::from)
}

/// HTTP client for the external SSR render server.
#[derive(Debug, Clone)]
pub struct SsrClient {
    http: Option<reqwest::Client>,
    url: String,
    enabled: bool,
}

impl SsrClient {
    /// Build the client from adapter configuration.
    ///
    /// A client that cannot be constructed leaves SSR disabled; the adapter
    /// then renders client-side only.
    #[must_use]
    pub fn from_config(config: &InertiaConfig) -> Self {
        let url = config.ssr_url.trim_end_matches('/').to_string();
        if !config.ssr_enabled {
            return Self {
                http: None,
                url,
                enabled: false,
            };
        }
        match reqwest::Client::builder()
            .timeout(Duration::from_millis(config.ssr_timeout_ms))
            .build()
        {
            Ok(client) => Self {
                http: Some(client),
                url,
                enabled: true,
            },
            Err(error) => {
                tracing::warn!(%error, "failed to build SSR HTTP client, rendering client-side");
                Self {
                    http: None,
                    url,
                    enabled: false,
                }
            }
        }
    }

    /// Whether SSR delegation is active.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Render the serialized page on the SSR server.
    ///
    /// Returns `None` on any failure (connection, status, payload shape);
    /// the caller falls back to client-side rendering.
    pub async fn render(&self, page_json: &str) -> Option<SsrPage> {
        let client = self.http.as_ref().filter(|_| self.enabled)?;
        match self.request(client, page_json).await {
            Ok(ssr) => Some(ssr),
            Err(error) => {
                tracing::warn!(%error, "SSR delegate failed, rendering client-side");
                None
            }
        }
    }

    async fn request(
        &self,
        client: &reqwest::Client,
        page_json: &str,
    ) -> anyhow::Result<SsrPage> {
        let response = client
            .post(format!("{}/render", self.url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(page_json.to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("SSR server returned status {status}");
        }

        let raw = response.text().await?;
        Ok(parse_ssr_payload(&raw)?)
    }

    /// Probe the SSR server's health endpoint.
    pub async fn is_available(&self) -> bool {
        let Some(client) = self.http.as_ref().filter(|_| self.enabled) else {
            return false;
        };
        match client.get(format!("{}/health", self.url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
