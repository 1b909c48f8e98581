use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::Settings;

pub fn build_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(settings.request_timeout())
        .user_agent(settings.user_agent.as_str());
    if let Some(proxy) = &settings.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy).context("Invalid proxy URL")?);
    }
    builder.build().context("Failed to build HTTP client")
}

/// Retry policy shared by the IMSDb and IMDb fetchers.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub max_retries: u32,
    pub base: Duration,
}

impl Backoff {
    pub fn from_settings(settings: &Settings) -> Self {
        Backoff {
            max_retries: settings.max_retries,
            base: settings.base_backoff(),
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.base * 2u32.saturating_pow(attempt)
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send a request, retrying rate limits, server errors and transport
/// failures with exponential backoff. Other statuses are returned as-is.
pub async fn send_with_retry<F>(label: &str, backoff: Backoff, build: F) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let outcome = build().send().await;
        let retryable = match &outcome {
            Ok(resp) => should_retry(resp.status()),
            Err(e) => e.is_timeout() || e.is_connect(),
        };

        if !retryable || attempt >= backoff.max_retries {
            let resp = outcome.with_context(|| format!("Request failed: {}", label))?;
            debug!("{} -> {}", label, resp.status());
            return Ok(resp);
        }

        let wait = backoff.delay(attempt);
        warn!(
            "Retrying {} (attempt {}/{}), backing off {:.1}s",
            label,
            attempt + 1,
            backoff.max_retries,
            wait.as_secs_f64()
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

/// GET a page body. Non-success statuses map to `None`.
pub async fn get_text(client: &Client, backoff: Backoff, url: &str) -> Result<Option<String>> {
    let resp = send_with_retry(url, backoff, || client.get(url)).await?;
    if !resp.status().is_success() {
        debug!("{} returned {}", url, resp.status());
        return Ok(None);
    }
    let body = resp.text().await.with_context(|| format!("Failed to read body of {}", url))?;
    Ok(Some(body))
}

// ── Tests ──
