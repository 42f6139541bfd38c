use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::models::Candidate;

/// Where the raw candidate pool comes from
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<Vec<Candidate>>;
}

const SERPAPI_BASE_URL: &str = "https://serpapi.com";

/// SerpAPI answers with this "error" when Google simply found nothing
const NO_RESULTS_ERROR: &str = "Google hasn't returned any results for this query.";

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<Candidate>,
    #[serde(default)]
    error: Option<String>,
}

pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: SERPAPI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search.json?engine=google&q={}&api_key={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl CandidateSource for SerpApiClient {
    async fn fetch(&self, query: &str) -> Result<Vec<Candidate>> {
        let response = self
            .client
            .get(self.search_url(query))
            .send()
            .await
            .context("Failed to send request to SerpAPI")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("SerpAPI returned error: {} - {}", status, error_text);
        }

        let serp_response = response
            .json::<SerpApiResponse>()
            .await
            .context("Failed to parse SerpAPI response")?;

        match serp_response.error {
            Some(error) if error != NO_RESULTS_ERROR => {
                anyhow::bail!("SerpAPI error: {}", error)
            }
            _ => {}
        }

        tracing::info!(
            results = serp_response.organic_results.len(),
            "search returned organic results"
        );

        Ok(serp_response.organic_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SerpApiClient {
        SerpApiClient::new("test-key".to_string())
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_fetch_maps_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("engine", "google"))
            .and(query_param("q", "AI news India"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "search_metadata": {"status": "Success"},
                "organic_results": [
                    {
                        "position": 1,
                        "title": "India's AI Mission launches new fund",
                        "link": "https://www.livemint.com/ai/fund",
                        "snippet": "The Centre announced ...",
                        "date": "2 days ago"
                    },
                    {
                        "position": 2,
                        "title": "No snippet here"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let results = client(&server).fetch("AI news India").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].link, "https://www.livemint.com/ai/fund");
        assert_eq!(results[0].date_text.as_deref(), Some("2 days ago"));
        assert_eq!(results[1].snippet, "");
        assert_eq!(results[1].link, "");
        assert_eq!(results[1].date_text, None);
    }

    #[tokio::test]
    async fn test_no_results_is_empty_pool() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": NO_RESULTS_ERROR
            })))
            .mount(&server)
            .await;

        let results = client(&server).fetch("nothing").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Invalid API key."
            })))
            .mount(&server)
            .await;

        let err = client(&server).fetch("AI").await.unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_http_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        assert!(client(&server).fetch("AI").await.is_err());
    }
}
