use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::EmailConfig;
use crate::formatter::FormatDirective;

pub const SUBJECT: &str = "🇮🇳 Daily AI News – India";

/// Final delivery of a finished digest
#[async_trait]
pub trait DigestSink: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()>;
}

pub struct NewsletterRenderer;

impl NewsletterRenderer {
    /// Wraps digest content in the newsletter layout. Plain-text content is
    /// escaped and kept in a preformatted block.
    pub fn render(
        content: &str,
        directive: FormatDirective,
        max_age_days: u32,
        date: NaiveDate,
    ) -> String {
        let mut html = String::new();

        html.push_str("<html>\n");
        html.push_str("<body style=\"font-family: Arial, sans-serif; line-height:1.6;\">\n");
        html.push_str(&format!("  <h2>{}</h2>\n", SUBJECT));
        html.push_str(&format!(
            "  <p style=\"color: gray;\">Curated AI developments from India (last {} days) · {}</p>\n",
            max_age_days,
            date.format("%A, %-d %B %Y")
        ));
        html.push_str("  <hr>\n");

        match directive {
            FormatDirective::Html => {
                html.push_str(content);
                html.push('\n');
            }
            FormatDirective::Text => {
                html.push_str("  <pre style=\"font-family: inherit; white-space: pre-wrap;\">");
                html.push_str(&Self::escape_html(content));
                html.push_str("</pre>\n");
            }
        }

        html.push_str("  <hr>\n");
        html.push_str(
            "  <p style=\"font-size:12px;color:gray;\">Generated automatically by AutoNews Agent</p>\n",
        );
        html.push_str("</body>\n</html>");
        html
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }
}

/// Sends over SMTP with implicit TLS
pub struct EmailSender {
    config: EmailConfig,
}

impl EmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, subject: &str, html_body: &str, recipient: &str) -> Result<Message> {
        let from: Mailbox = self
            .config
            .username
            .parse()
            .with_context(|| format!("Invalid sender address: {}", self.config.username))?;
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", recipient))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("Failed to build email message")
    }
}

#[async_trait]
impl DigestSink for EmailSender {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()> {
        let message = self.build_message(subject, html_body, recipient)?;

        let transport = SmtpTransport::relay(&self.config.smtp_host)
            .with_context(|| format!("Failed to set up SMTP relay {}", self.config.smtp_host))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        // lettre's SmtpTransport blocks
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("Email task panicked")?
            .context("Failed to send email")?;

        tracing::info!(recipient, "digest email sent");
        Ok(())
    }
}
