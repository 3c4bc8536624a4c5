use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use eventlens::{
    config::{self, Config},
    fetcher::{BrowserFetcher, SiteAdapterRegistry, SiteAdapterWarning},
    llm::OpenRouterClient,
    pipeline::Pipeline,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Extract structured event details from an event web page.
#[derive(Parser, Debug)]
#[command(name = "eventlens", version, about, long_about = None)]
struct Cli {
    /// Event page to read
    #[arg(env = config::ENV_URL, default_value = config::DEFAULT_URL)]
    url: String,

    /// Gateway model identifier
    #[arg(long, env = config::ENV_MODEL, default_value = config::DEFAULT_MODEL)]
    model: String,

    /// Language of the isolated description
    #[arg(long, env = config::ENV_LANGUAGE, default_value = config::DEFAULT_LANGUAGE)]
    language: String,

    /// Sampling temperature of the isolation stage
    #[arg(long, default_value_t = config::DEFAULT_ISOLATION_TEMPERATURE)]
    isolation_temperature: f32,

    /// Gateway base URL
    #[arg(long, env = config::ENV_API_BASE_URL, default_value = config::DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Page navigation timeout, in seconds
    #[arg(long, default_value_t = config::DEFAULT_NAV_TIMEOUT.as_secs())]
    nav_timeout_secs: u64,

    /// Gateway request timeout, in seconds
    #[arg(long, default_value_t = config::DEFAULT_LLM_TIMEOUT.as_secs())]
    llm_timeout_secs: u64,

    /// Print the cleaned page markdown to stderr
    #[arg(long)]
    show_markdown: bool,

    /// Print the isolated event prose to stderr
    #[arg(long)]
    show_isolated: bool,

    /// Output format of the extracted record
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

impl Cli {
    fn to_config(&self) -> Result<Config, config::ConfigError> {
        let api_key = config::api_key_from_env()?;
        Config::new(&self.url, api_key)?
            .with_model(&self.model)
            .with_language(&self.language)
            .with_api_base_url(&self.api_base_url)
            .with_nav_timeout(Duration::from_secs(self.nav_timeout_secs))
            .with_llm_timeout(Duration::from_secs(self.llm_timeout_secs))
            .with_isolation_temperature(self.isolation_temperature)
    }
}

/// Adapter steps that did not go through, one per line.
fn warning_summary(warnings: &[SiteAdapterWarning]) -> Option<String> {
    if warnings.is_empty() {
        return None;
    }
    let mut summary = format!("{} page preparation step(s) failed:", warnings.len());
    for warning in warnings {
        summary.push_str(&format!("\n  - {}", warning));
    }
    Some(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eventlens=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = cli.to_config()?;
    info!(?config, "Starting extraction");

    let fetcher = BrowserFetcher::new(SiteAdapterRegistry::with_defaults(), config.nav_timeout());
    let client = OpenRouterClient::from_config(&config)?;
    let pipeline = Pipeline::new(fetcher, client, config);

    let output = pipeline.run().await?;

    if let Some(summary) = warning_summary(&output.warnings) {
        eprintln!("{}", summary);
    }

    if cli.show_markdown {
        eprintln!("----- markdown -----\n{}\n", output.markdown);
    }
    if cli.show_isolated {
        eprintln!("----- isolated -----\n{}\n", output.isolated);
    }

    let rendered = match cli.format {
        OutputFormat::Json => serde_json::to_string(&output.details)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(&output.details)?,
    };
    println!("{}", rendered);
    Ok(())
}
