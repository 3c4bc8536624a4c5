use chromiumoxide::error::CdpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation timeout")]
    Timeout,

    #[error("could not read page content: {0}")]
    Content(String),

    #[error("page script failed: {0}")]
    Script(String),
}

impl FetchError {
    pub fn from_cdp_error(err: CdpError, url: &str) -> Self {
        match err {
            CdpError::Timeout => Self::Timeout,
            other => Self::Navigation {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
