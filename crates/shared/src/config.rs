use anyhow::{Context, Result};
use std::env;

use crate::formatter::{FormatDirective, DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::recency::RecencyWindow;
use crate::selector::RelaxationPolicy;

const SETUP_HINT: &str = "To fix this, create ~/.config/daily-digest/.env with:\n  \
    SERPAPI_API_KEY=your_key_here\n  \
    OPENAI_API_KEY=your_key_here\n  \
    EMAIL_USER=you@gmail.com\n  \
    EMAIL_PASS=your_app_password";

pub const DEFAULT_QUERY: &str = "Latest AI advancements in India government startup research MNC \
    site:thehindu.com OR site:livemint.com OR site:economictimes.com \
    OR site:business-standard.com OR site:pib.gov.in OR site:indiatoday.in";

pub const DEFAULT_PLACEHOLDER: &str = "No sufficiently recent AI news found today.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub username: String,
    pub password: String,
    pub recipient: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

/// Secrets and endpoints, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub serpapi_api_key: String,
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub openai_model: String,
    pub email: Option<EmailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let serpapi_api_key = get("SERPAPI_API_KEY")
            .with_context(|| format!("SERPAPI_API_KEY not found.\n\n{}", SETUP_HINT))?;

        let openai_api_key = get("OPENAI_API_KEY")
            .with_context(|| format!("OPENAI_API_KEY not found.\n\n{}", SETUP_HINT))?;

        let email = match (get("EMAIL_USER"), get("EMAIL_PASS")) {
            (Some(username), Some(password)) => {
                let smtp_port = match get("SMTP_PORT") {
                    Some(port) => port
                        .trim()
                        .parse()
                        .with_context(|| format!("SMTP_PORT is not a valid port: {}", port))?,
                    None => 465,
                };
                Some(EmailConfig {
                    recipient: get("DIGEST_RECIPIENT").unwrap_or_else(|| username.clone()),
                    username,
                    password,
                    smtp_host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                    smtp_port,
                })
            }
            _ => None,
        };

        Ok(Self {
            serpapi_api_key,
            openai_api_key,
            openai_api_base: get("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            email,
        })
    }

    pub fn require_email(&self) -> Result<&EmailConfig> {
        self.email
            .as_ref()
            .with_context(|| format!("Missing EMAIL_USER or EMAIL_PASS.\n\n{}", SETUP_HINT))
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/daily-digest/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("daily-digest").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

/// Knobs for a single pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub query: String,
    pub target_count: usize,
    pub check_relevance: bool,
    /// `None` disables the recency check
    pub window: Option<RecencyWindow>,
    pub relaxation: RelaxationPolicy,
    pub date_from_snippet: bool,
    pub skip_linkless: bool,
    pub placeholder: String,
    pub format: FormatDirective,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            target_count: 3,
            check_relevance: true,
            window: Some(RecencyWindow::default()),
            relaxation: RelaxationPolicy::Rescan,
            date_from_snippet: true,
            skip_linkless: true,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            format: FormatDirective::Html,
        }
    }
}
