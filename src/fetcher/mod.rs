pub mod adapters;
pub mod client;
pub mod errors;
pub mod types;

pub use adapters::{
    FacebookEventAdapter, PageDriver, SiteAdapter, SiteAdapterRegistry, SiteAdapterWarning,
};
pub use client::BrowserFetcher;
pub use errors::FetchError;
pub use types::{FetchedPage, PageSource};
