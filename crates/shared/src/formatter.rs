use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::DigestItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatDirective {
    #[serde(alias = "plain")]
    Text,
    #[default]
    Html,
}

/// Turns the selected items into readable digest prose
#[async_trait]
pub trait DigestFormatter: Send + Sync {
    async fn format(&self, items: &[DigestItem], directive: FormatDirective) -> Result<String>;
}

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

/// Chat-completions client for any OpenAI-compatible endpoint
pub struct OpenAiFormatter {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAiFormatter {
    pub fn new(api_key: String, api_base: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn build_prompt(items: &[DigestItem], directive: FormatDirective) -> String {
        let mut sources_text = String::new();
        for item in items {
            sources_text.push_str(&format!("{}. {}\nURL: {}\n", item.index, item.title, item.url));
            if let Some(text) = &item.supporting_text {
                sources_text.push_str(&format!("Context: {}\n", text));
            }
            sources_text.push('\n');
        }

        let output_rules = match directive {
            FormatDirective::Html => {
                "Format the report as an HTML fragment (no <html> or <body> tags). \
                Use <h3> for each headline, a <ul> for the key points, a <p> for the impact, \
                and an <a href> link whose href is the exact URL given."
            }
            FormatDirective::Text => {
                "Format the report as plain text with no markup. \
                Print each URL on its own line exactly as given."
            }
        };

        format!(
            r#"You are a professional AI news editor.

Summarize these real news articles into a daily report.

For each item provide:
- Headline
- 2 Key Points
- Impact on India
- Keep the exact same URL

Use ONLY the articles below. Do not add, remove or reorder articles, and never change a URL.

{}

Articles:
{}"#,
            output_rules,
            sources_text.trim_end()
        )
    }
}

#[async_trait]
impl DigestFormatter for OpenAiFormatter {
    async fn format(&self, items: &[DigestItem], directive: FormatDirective) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.2,
            messages: vec![Message {
                role: "user".to_string(),
                content: Self::build_prompt(items, directive),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the language model")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Language model API error: {} - {}", status, error_text);
        }

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse language model response")?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            anyhow::bail!("Language model returned an empty digest");
        }

        Ok(content)
    }
}
