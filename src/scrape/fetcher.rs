use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::AppError;

/// Source of the HTML page that gets scraped.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page body as text.
    async fn fetch(&self) -> Result<String, AppError>;
}

/// Fetches a fixed URL over HTTP.
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(
        url: impl Into<String>,
        user_agent: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self) -> Result<String, AppError> {
        tracing::debug!("fetching {}", self.url);
        let html = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html)
    }
}

/// Serves a fixed HTML document.
#[cfg(test)]
pub struct StaticPage(pub String);

#[cfg(test)]
#[async_trait]
impl PageSource for StaticPage {
    async fn fetch(&self) -> Result<String, AppError> {
        Ok(self.0.clone())
    }
}
