use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use crate::fetcher::{adapters::SiteAdapterWarning, errors::FetchError};

/// Rendered page as read from the browser.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub html: String,
    /// Name of the site adapter that prepared the page, if one matched.
    pub adapter: Option<&'static str>,
    pub warnings: Vec<SiteAdapterWarning>,
    pub fetched_at: DateTime<Utc>,
}

/// Anything that can turn a URL into rendered HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}
