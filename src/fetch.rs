//! Page transport for member medal pages.
//!
//! The engine only cares about the success/failure outcome of a fetch, so
//! the transport sits behind the [`FetchPage`] trait. Production uses
//! [`HttpFetcher`] (a shared `reqwest` client hitting
//! `{base_url}/{target}?tab=medals&all=1`); tests substitute scripted fakes.

use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Transport failures. Non-2xx statuses count as failures via
/// `error_for_status`, same as network errors.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cannot build member url for {target:?}")]
    BadUrl { target: String },
}

/// Fetch one target's raw page body.
pub trait FetchPage {
    async fn fetch_page(&self, target: &str) -> Result<String, FetchError>;
}

/// HTTP implementation over a shared client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn member_url(&self, target: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::BadUrl {
                target: target.to_string(),
            })?
            .push(target);
        url.query_pairs_mut()
            .append_pair("tab", "medals")
            .append_pair("all", "1");
        Ok(url)
    }
}

impl FetchPage for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%target))]
    async fn fetch_page(&self, target: &str) -> Result<String, FetchError> {
        let url = self.member_url(target)?;
        debug!(%url, "Fetching member page");
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(bytes = body.len(), "Fetched member page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_url_includes_medals_tab_query() {
        let fetcher = HttpFetcher::new(Url::parse("https://www.byond.com/members").unwrap());
        let url = fetcher.member_url("SomePlayer").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.byond.com/members/SomePlayer?tab=medals&all=1"
        );
    }

    #[test]
    fn member_url_escapes_awkward_identifiers() {
        let fetcher = HttpFetcher::new(Url::parse("https://www.byond.com/members").unwrap());
        let url = fetcher.member_url("a b").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.byond.com/members/a%20b?tab=medals&all=1"
        );
    }
}
