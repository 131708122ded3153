//! Ordered transport fallback shared by every provider.
//!
//! A logical request (one target URL) can be issued directly or through a
//! proxy that wraps the target URL. Transports are tried in order; the first
//! one that answers with a success status and a body that parses wins.

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::error::LookupError;

/// URL template for a fallback proxy.
///
/// `{url}` is replaced with the raw target URL and `{url_encoded}` with the
/// percent-encoded one. A template without a placeholder gets the raw target
/// appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyTemplate(String);

impl ProxyTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn wrap(&self, target: &str) -> String {
        if self.0.contains("{url_encoded}") {
            self.0.replace("{url_encoded}", &urlencoding::encode(target))
        } else if self.0.contains("{url}") {
            self.0.replace("{url}", target)
        } else {
            format!("{}{}", self.0, target)
        }
    }
}

impl std::fmt::Display for ProxyTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One concrete way of issuing a logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Direct,
    Proxy(ProxyTemplate),
}

impl Transport {
    pub fn request_url(&self, target: &Url) -> String {
        match self {
            Transport::Direct => target.to_string(),
            Transport::Proxy(template) => template.wrap(target.as_str()),
        }
    }

    /// Direct first, then every proxy in order.
    pub fn direct_then(proxies: &[ProxyTemplate]) -> Vec<Transport> {
        std::iter::once(Transport::Direct)
            .chain(proxies.iter().cloned().map(Transport::Proxy))
            .collect()
    }

    pub fn proxies_only(proxies: &[ProxyTemplate]) -> Vec<Transport> {
        proxies.iter().cloned().map(Transport::Proxy).collect()
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Direct => f.write_str("direct"),
            Transport::Proxy(template) => write!(f, "proxy {template}"),
        }
    }
}

/// Try `transports` in order and decode the first successful answer as `T`.
///
/// Bad statuses, connection faults and undecodable bodies all count as a
/// failed transport. Each transport is tried once; when none succeeds the
/// result is [`LookupError::NetworkError`].
pub async fn fetch_first_success<T: DeserializeOwned>(
    http: &Client,
    target: &Url,
    transports: &[Transport],
    what: &'static str,
) -> Result<T, LookupError> {
    for (attempt, transport) in transports.iter().enumerate() {
        let url = transport.request_url(target);

        match fetch_json::<T>(http, &url).await {
            Ok(parsed) => {
                debug!(what, attempt, %transport, "transport succeeded");
                return Ok(parsed);
            }
            Err(err) => {
                warn!(what, attempt, %transport, error = %format!("{err:#}"), "transport failed");
            }
        }
    }

    warn!(what, tried = transports.len(), "all transports exhausted");
    Err(LookupError::NetworkError)
}

async fn fetch_json<T: DeserializeOwned>(http: &Client, url: &str) -> Result<T> {
    let res = http.get(url).send().await.context("Failed to send request")?;

    let status = res.status();
    let body = res.text().await.context("Failed to read response body")?;

    if !status.is_success() {
        return Err(anyhow!("request failed with status {}: {}", status, truncate_body(&body)));
    }

    serde_json::from_str(&body).context("Failed to parse response JSON")
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "https://api.example.com/v1/forecast?latitude=1&longitude=2";

    #[test]
    fn raw_placeholder_keeps_target_verbatim() {
        let proxy = ProxyTemplate::new("https://corsproxy.io/?{url}");
        assert_eq!(proxy.wrap(TARGET), format!("https://corsproxy.io/?{TARGET}"));
    }

    #[test]
    fn encoded_placeholder_percent_encodes_target() {
        let proxy = ProxyTemplate::new("https://api.allorigins.win/raw?url={url_encoded}");
        let wrapped = proxy.wrap(TARGET);

        assert!(wrapped.starts_with("https://api.allorigins.win/raw?url=https%3A%2F%2F"));
        assert!(!wrapped.contains("&longitude"));
    }

    #[test]
    fn template_without_placeholder_appends_target() {
        let proxy = ProxyTemplate::new("https://proxy.local/?");
        assert_eq!(proxy.wrap(TARGET), format!("https://proxy.local/?{TARGET}"));
    }

    #[test]
    fn orderings() {
        let proxies = vec![ProxyTemplate::new("a/{url}"), ProxyTemplate::new("b/{url}")];

        let direct = Transport::direct_then(&proxies);
        assert_eq!(direct.len(), 3);
        assert_eq!(direct[0], Transport::Direct);
        assert_eq!(direct[2], Transport::Proxy(proxies[1].clone()));

        let proxied = Transport::proxies_only(&proxies);
        assert_eq!(proxied, vec![Transport::Proxy(proxies[0].clone()), Transport::Proxy(proxies[1].clone())]);
    }

    #[test]
    fn truncate_is_char_safe() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }

    #[tokio::test]
    async fn empty_transport_list_is_network_error() {
        let target = Url::parse(TARGET).unwrap();
        let result: Result<serde_json::Value, _> =
            fetch_first_success(&Client::new(), &target, &[], "test").await;
        assert_eq!(result.unwrap_err(), LookupError::NetworkError);
    }
}
