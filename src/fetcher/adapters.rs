//! Site adapters: best-effort page interactions run before the rendered HTML
//! is read.
//!
//! Some pages hide their content behind consent banners, login walls or
//! "see more" toggles. An adapter knows how to get past those for one site.
//! Adapters are keyed by a URL pattern in a [`SiteAdapterRegistry`]; the
//! fetcher asks the registry for a match and never knows about any site by
//! name. Interactions go through the [`PageDriver`] capability so adapters can
//! be exercised without a browser.

use crate::fetcher::errors::FetchError;
use async_trait::async_trait;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Interactions an adapter may perform on a loaded page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Give client-side rendering time to finish.
    async fn settle(&self, delay: Duration);

    /// Click the first button whose accessible name contains `label`
    /// (case-insensitive). Returns `Ok(false)` when no such button exists.
    async fn click_button(&self, label: &str) -> Result<bool, FetchError>;

    /// Click the first element whose text contains `text` (case-insensitive).
    /// Returns `Ok(false)` when no such element exists.
    async fn click_text(&self, text: &str) -> Result<bool, FetchError>;
}

/// A failed best-effort interaction. Logged and reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteAdapterWarning {
    pub adapter: &'static str,
    pub step: &'static str,
    pub reason: String,
}

impl Display for SiteAdapterWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.adapter, self.step, self.reason)
    }
}

/// Page-specific preparation performed before extraction.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Run the interaction sequence. Every step is optional; failures come
    /// back as warnings and the page is read regardless.
    async fn prepare(&self, page: &dyn PageDriver) -> Vec<SiteAdapterWarning>;
}

struct RegisteredAdapter {
    pattern: Regex,
    adapter: Arc<dyn SiteAdapter>,
}

/// Registry of site adapters keyed by URL pattern.
///
/// Patterns are matched against the full URL string in registration order;
/// the first match wins.
#[derive(Default)]
pub struct SiteAdapterRegistry {
    adapters: Vec<RegisteredAdapter>,
}

impl SiteAdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Registry with the built-in adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_with(FACEBOOK_EVENT_PATTERN, FacebookEventAdapter::new());
        registry
    }

    /// Register an adapter for URLs matching `pattern`.
    pub fn register<A: SiteAdapter + 'static>(
        &mut self,
        pattern: &str,
        adapter: A,
    ) -> Result<(), regex::Error> {
        let pattern = Regex::new(pattern)?;
        self.adapters.push(RegisteredAdapter {
            pattern,
            adapter: Arc::new(adapter),
        });
        Ok(())
    }

    // Built-in patterns are literals known to compile.
    fn register_with<A: SiteAdapter + 'static>(&mut self, pattern: &'static str, adapter: A) {
        if let Err(e) = self.register(pattern, adapter) {
            warn!("Skipping built-in site adapter with bad pattern {}: {}", pattern, e);
        }
    }

    /// The adapter responsible for `url`, if any.
    pub fn find(&self, url: &Url) -> Option<Arc<dyn SiteAdapter>> {
        self.adapters
            .iter()
            .find(|entry| entry.pattern.is_match(url.as_str()))
            .map(|entry| Arc::clone(&entry.adapter))
    }

    /// Names of all registered adapters, in match order.
    pub fn registered_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|entry| entry.adapter.name()).collect()
    }
}

pub const FACEBOOK_EVENT_PATTERN: &str = r"facebook\.com/events";

const FACEBOOK_RENDER_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy)]
enum Control {
    Button,
    Text,
}

#[derive(Clone, Copy)]
struct Interaction {
    step: &'static str,
    control: Control,
    /// Alternatives tried in order; the UI label depends on the viewer locale.
    labels: &'static [&'static str],
    /// Whether a missing control deserves a warning. Consent and login
    /// dialogs are often simply not shown.
    warn_if_missing: bool,
}

const FACEBOOK_INTERACTIONS: &[Interaction] = &[
    Interaction {
        step: "dismiss cookie dialog",
        control: Control::Button,
        labels: &["Autoriser tous les cookies", "Allow all cookies"],
        warn_if_missing: false,
    },
    Interaction {
        step: "dismiss login dialog",
        control: Control::Button,
        labels: &["Fermer", "Close"],
        warn_if_missing: false,
    },
    Interaction {
        step: "expand description",
        control: Control::Text,
        labels: &["En voir plus", "See more"],
        warn_if_missing: true,
    },
];

/// Facebook event pages: close the consent and login dialogs, then expand
/// the truncated description.
///
/// Label matching relies on the French or English UI strings. Other locales
/// or UI experiments will simply produce warnings.
#[derive(Clone, Default)]
pub struct FacebookEventAdapter;

impl FacebookEventAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiteAdapter for FacebookEventAdapter {
    fn name(&self) -> &'static str {
        "facebook-event"
    }

    async fn prepare(&self, page: &dyn PageDriver) -> Vec<SiteAdapterWarning> {
        page.settle(FACEBOOK_RENDER_DELAY).await;

        let mut warnings = Vec::new();
        for interaction in FACEBOOK_INTERACTIONS {
            if let Some(warning) = run_interaction(self.name(), page, interaction).await {
                warn!("Site adapter step failed: {}", warning);
                warnings.push(warning);
            }
        }
        warnings
    }
}

async fn run_interaction(
    adapter: &'static str,
    page: &dyn PageDriver,
    interaction: &Interaction,
) -> Option<SiteAdapterWarning> {
    for label in interaction.labels {
        let clicked = match interaction.control {
            Control::Button => page.click_button(label).await,
            Control::Text => page.click_text(label).await,
        };
        match clicked {
            Ok(true) => {
                debug!(adapter, step = interaction.step, label, "Clicked");
                return None;
            }
            Ok(false) => continue,
            Err(e) => {
                return Some(SiteAdapterWarning {
                    adapter,
                    step: interaction.step,
                    reason: e.to_string(),
                });
            }
        }
    }

    if interaction.warn_if_missing {
        Some(SiteAdapterWarning {
            adapter,
            step: interaction.step,
            reason: format!("no control labelled {}", interaction.labels.join(" / ")),
        })
    } else {
        debug!(adapter, step = interaction.step, "Control not present");
        None
    }
}
