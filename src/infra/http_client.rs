use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::app::ports::{HttpClientPort, HttpJsonResult, RateLimiterPort};
use crate::error::Result;

const USER_AGENT: &str = concat!("artist_finder/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed JSON transport, optionally throttled by a rate limiter
pub struct ReqwestHttp {
    client: reqwest::Client,
    limiter: Option<Arc<dyn RateLimiterPort>>,
}

impl ReqwestHttp {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            limiter: None,
        })
    }

    pub fn with_limiter(mut self, limiter: Arc<dyn RateLimiterPort>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<HttpJsonResult> {
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await,
            None => None,
        };

        let resp = request.header(ACCEPT, "application/json").send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        debug!(status, bytes = text.len(), "HTTP response");

        Ok(HttpJsonResult {
            status,
            body: parse_body(text),
        })
    }
}

/// Error pages are often plain text; keep them as a JSON string so callers can report them
fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<HttpJsonResult> {
        let mut request = self.client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.send(request).await
    }

    async fn post_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &Value,
    ) -> Result<HttpJsonResult> {
        let request = self
            .client
            .post(url)
            .query(query)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        self.send(request).await
    }
}
