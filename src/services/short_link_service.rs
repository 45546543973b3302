use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlShortener: Send + Sync {
    async fn shorten(&self, long_url: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ShortenRequest<'a> {
    long_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    link: Option<String>,
}

/// Bitly v4 `shorten` endpoint.
#[derive(Clone)]
pub struct BitlyShortener {
    client: Client,
    api_url: String,
    access_token: String,
}

impl BitlyShortener {
    pub fn new(client: Client, api_url: String, access_token: String) -> Self {
        Self {
            client,
            api_url,
            access_token,
        }
    }
}

#[async_trait]
impl UrlShortener for BitlyShortener {
    async fn shorten(&self, long_url: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&ShortenRequest { long_url })
            .send()
            .await?
            .error_for_status()?;

        let body = response.json::<ShortenResponse>().await?;
        body.link
            .filter(|link| !link.trim().is_empty())
            .ok_or_else(|| Error::Internal("Bitly returned no link".to_string()))
    }
}
