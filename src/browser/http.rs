//! Plain HTTP implementation of [`Browser`]
//!
//! This module handles:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests for listing pages, detail pages and JSON endpoints
//! - Classifying HTTP statuses, bot challenges and network errors into `FetchError`
//!
//! It cannot execute page scripts, so it never observes traffic and reports
//! every interaction as unavailable.

use super::{looks_like_bot_challenge, Browser, Interaction, PageSnapshot};
use crate::config::SiteConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `site` - The site configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(site: &SiteConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(site.user_agent.clone())
        .timeout(Duration::from_secs(site.timeout_seconds))
        .connect_timeout(Duration::from_secs(site.timeout_seconds.min(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Body of a successful GET
struct HttpResponse {
    final_url: Url,
    body: String,
}

/// [`Browser`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    /// Creates a browser from the site configuration
    ///
    /// A headed run is not possible without a rendering engine; the flag is
    /// accepted and reported.
    pub fn new(site: &SiteConfig, headed: bool) -> Result<Self, reqwest::Error> {
        if headed {
            tracing::warn!("--headed has no effect with the HTTP browser");
        }
        Ok(Self {
            client: build_http_client(site)?,
        })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &Url, accept: &str) -> Result<HttpResponse, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        if looks_like_bot_challenge(status, &body) {
            return Err(FetchError::BotChallenge {
                url: url.to_string(),
            });
        }

        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(HttpResponse { final_url, body })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&self, url: &Url) -> Result<PageSnapshot, FetchError> {
        let response = self
            .get(url, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .await?;

        Ok(PageSnapshot {
            final_url: response.final_url,
            html: response.body,
            observed: Vec::new(),
        })
    }

    async fn interact(
        &self,
        _page: &Url,
        _interaction: Interaction,
    ) -> Result<Option<PageSnapshot>, FetchError> {
        Ok(None)
    }

    async fn fetch_json(&self, url: &Url) -> Result<serde_json::Value, FetchError> {
        let response = self.get(url, "application/json").await?;

        serde_json::from_str(&response.body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            message: format!("invalid JSON: {}", e),
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Maps a transport error onto the retry classification
fn classify_reqwest_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_redirect() || error.is_builder() {
        FetchError::Malformed {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Connection {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&SiteConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_headed_flag_accepted() {
        assert!(HttpBrowser::new(&SiteConfig::default(), true).is_ok());
    }

    #[tokio::test]
    async fn test_interactions_unavailable() {
        let browser = HttpBrowser::new(&SiteConfig::default(), false).unwrap();
        let page = Url::parse("https://example.com/subject").unwrap();

        for interaction in [Interaction::LoadMore, Interaction::ScrollToBottom] {
            assert!(browser.interact(&page, interaction).await.unwrap().is_none());
        }
    }
}
