mod config;
mod dispatch;
mod errors;
mod intents;
mod llm_client;
mod mail;
mod posting;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dispatch::pacing::IntervalGate;
use crate::dispatch::{DispatchLoop, Pacing};
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::mail::SmtpMailer;
use crate::posting::archive::PostArchive;
use crate::posting::http::HttpPageScraper;
use crate::posting::links::load_posting_urls;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: a missing credential is fatal before anything runs.
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job-mailer v{}", env!("CARGO_PKG_VERSION"));

    let urls = match prepare(&config) {
        Ok(urls) => urls,
        Err(e) => {
            error!(code = e.code(), "{e}");
            return Err(e.into());
        }
    };

    let scraper = HttpPageScraper::new(config.scrape_timeout)?;

    let llm = LlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    let mailer = SmtpMailer::new(&config.smtp)?;

    let archive = config.posts_archive.clone().map(PostArchive::new);
    if let Some(archive) = &archive {
        info!("Archiving scraped postings to {}", archive.path().display());
    }

    let dispatch = DispatchLoop::new(
        Arc::new(scraper),
        Arc::new(llm),
        Arc::new(mailer),
        Pacing {
            llm: Arc::new(IntervalGate::new(config.llm_pacing)),
            mail: Arc::new(IntervalGate::new(config.mail_pacing)),
        },
        config.applicant_profile.clone(),
    )
    .with_attachments(config.attachments.clone())
    .with_archive(archive);

    let report = dispatch.run(&urls).await;
    info!(
        "Sent: {}, skipped: {}, failed: {}",
        report.sent(),
        report.skipped(),
        report.failed()
    );
    if let Ok(json) = serde_json::to_string_pretty(&report) {
        debug!("Batch report:\n{json}");
    }

    Ok(())
}

/// Startup checks that must pass before the batch begins.
fn prepare(config: &Config) -> Result<Vec<String>, AppError> {
    config.validate()?;
    load_posting_urls(&config.links_file)
}
