use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::errors::AppError;
use crate::llm_client::{DEFAULT_API_URL, DEFAULT_MODEL};

/// SMTP relay settings for the mail transport.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Application configuration loaded from environment variables.
/// Secrets may be given inline or as `<NAME>_FILE` pointing at a file holding them.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub smtp: SmtpConfig,
    pub attachments: Vec<PathBuf>,
    pub applicant_profile: String,
    pub links_file: PathBuf,
    pub posts_archive: Option<PathBuf>,
    pub mail_pacing: Duration,
    pub llm_pacing: Duration,
    pub scrape_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = require(&lookup, "SMTP_USERNAME")?;
        let from = optional(&lookup, "MAIL_FROM").unwrap_or_else(|| username.clone());

        Ok(Config {
            llm_api_url: optional(&lookup, "LLM_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            llm_api_key: require_secret(&lookup, "LLM_API_KEY")?,
            llm_model: optional(&lookup, "LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            smtp: SmtpConfig {
                host: optional(&lookup, "SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                port: parse_or(&lookup, "SMTP_PORT", 587)?,
                username,
                password: require_secret(&lookup, "SMTP_PASSWORD")?,
                from,
            },
            attachments: optional(&lookup, "MAIL_ATTACHMENTS")
                .map(|list| parse_path_list(&list))
                .unwrap_or_default(),
            applicant_profile: require(&lookup, "APPLICANT_PROFILE")?,
            links_file: optional(&lookup, "LINKS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("job_links.txt")),
            posts_archive: optional(&lookup, "POSTS_ARCHIVE").map(PathBuf::from),
            mail_pacing: Duration::from_millis(parse_or(&lookup, "MAIL_PACING_MS", 500)?),
            llm_pacing: Duration::from_millis(parse_or(&lookup, "LLM_PACING_MS", 500)?),
            scrape_timeout: Duration::from_secs(parse_or(&lookup, "SCRAPE_TIMEOUT_SECS", 15)?),
            rust_log: optional(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Checks the filesystem preconditions of a run. Every attachment must be a file.
    pub fn validate(&self) -> Result<(), AppError> {
        for path in &self.attachments {
            if !path.is_file() {
                return Err(AppError::MissingAttachment(path.clone()));
            }
        }
        Ok(())
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| {
        AppError::Config(format!("Required environment variable '{key}' is not set")).into()
    })
}

/// Reads `key` directly, falling back to the file named by `<key>_FILE`.
fn require_secret<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = optional(lookup, key) {
        return Ok(value);
    }

    let file_key = format!("{key}_FILE");
    let Some(path) = optional(lookup, &file_key) else {
        return Err(AppError::Config(format!(
            "Required secret '{key}' is not set (set {key} or {file_key})"
        ))
        .into());
    };

    read_secret_file(Path::new(&path)).with_context(|| format!("Reading {file_key}"))
}

fn read_secret_file(path: &Path) -> Result<String> {
    let secret = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read secret file {}", path.display()))?
        .trim()
        .to_string();

    if secret.is_empty() {
        return Err(AppError::Config(format!("Secret file {} is empty", path.display())).into());
    }
    Ok(secret)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} must be a valid number, got '{raw}'")).into()),
        None => Ok(default),
    }
}

/// Splits a comma-separated path list, ignoring empty entries.
fn parse_path_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}
