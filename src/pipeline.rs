//! One extraction run: fetch, clean, isolate, extract.
//!
//! Stages run strictly one after another and any failure ends the run. Only
//! site adapter warnings and a language mismatch are tolerated; both are
//! logged and carried in the output.

use std::fmt::{Display, Formatter};

use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::extractor::{self, EventDate, EventDetails, ExtractError, language};
use crate::fetcher::{FetchError, PageSource, SiteAdapterWarning};
use crate::llm::{LlmError, OpenRouterClient, stages};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Clean,
    Isolate,
    Extract,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Clean => "clean",
            Stage::Isolate => "isolate",
            Stage::Extract => "extract",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("fetch stage failed: {0}")]
    Fetch(#[source] FetchError),

    #[error("clean stage failed: {0}")]
    Clean(#[source] ExtractError),

    #[error("isolate stage failed: {0}")]
    Isolate(#[source] LlmError),

    #[error("extract stage failed: {0}")]
    Extract(#[source] LlmError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch(_) => Stage::Fetch,
            Self::Clean(_) => Stage::Clean,
            Self::Isolate(_) => Stage::Isolate,
            Self::Extract(_) => Stage::Extract,
        }
    }
}

/// Result of a run with its intermediate artifacts.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub details: EventDetails,
    /// `details.date` parsed, when the model gave a recognisable date.
    pub start_date: Option<EventDate>,
    pub markdown: String,
    pub isolated: String,
    pub warnings: Vec<SiteAdapterWarning>,
}

pub struct Pipeline<S> {
    source: S,
    client: OpenRouterClient,
    config: Config,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(source: S, client: OpenRouterClient, config: Config) -> Self {
        Self {
            source,
            client,
            config,
        }
    }

    pub async fn run(&self) -> Result<PipelineOutput, PipelineError> {
        let span = info_span!("run", run_id = %Uuid::new_v4(), url = %self.config.url());
        self.run_stages().instrument(span).await
    }

    async fn run_stages(&self) -> Result<PipelineOutput, PipelineError> {
        let config = &self.config;

        // 1. Render the page
        info!(stage = %Stage::Fetch, "Downloading HTML");
        let page = self
            .source
            .fetch(config.url())
            .await
            .map_err(PipelineError::Fetch)?;
        info!(
            stage = %Stage::Fetch,
            status = "done",
            adapter = page.adapter.unwrap_or("none"),
            fetched_at = %page.fetched_at,
            "HTML downloaded"
        );

        // 2. Strip noise and convert
        info!(stage = %Stage::Clean, "Cleaning HTML and converting to markdown");
        let markdown = extractor::clean_to_markdown(&page.html).map_err(PipelineError::Clean)?;
        info!(
            stage = %Stage::Clean,
            status = "done",
            markdown_bytes = markdown.len(),
            "HTML converted to markdown"
        );

        // 3. Keep only what concerns the event
        info!(stage = %Stage::Isolate, model = config.model(), "Isolating event content");
        let isolated = stages::isolate(
            &self.client,
            config.model(),
            config.language(),
            config.isolation_temperature(),
            &markdown,
        )
        .await
        .map_err(PipelineError::Isolate)?;
        if let Some(detected) = language::language_mismatch(&isolated, config.language()) {
            warn!(
                expected = config.language(),
                detected = detected.eng_name(),
                "Isolated content is not in the requested language"
            );
        }
        info!(stage = %Stage::Isolate, status = "done", "Data isolated");

        // 4. Structure it
        info!(stage = %Stage::Extract, "Extracting structured data");
        let details = stages::extract(&self.client, config.model(), config.language(), &isolated)
            .await
            .map_err(PipelineError::Extract)?;
        if details.is_empty() {
            warn!("No event field could be extracted");
        }
        let start_date = details.start_date();
        if let (Some(raw), None) = (&details.date, &start_date) {
            warn!(date = %raw, "Event date is not ISO 8601");
        }
        info!(stage = %Stage::Extract, status = "done", ?start_date, "Done");

        Ok(PipelineOutput {
            details,
            start_date,
            markdown,
            isolated,
            warnings: page.warnings,
        })
    }
}
