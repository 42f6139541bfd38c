use serde::{Deserialize, Deserializer, Serialize};

/// Absent and `null` both become an empty string
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A raw search hit before any filtering. Missing text fields are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub snippet: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub link: String,
    #[serde(default, rename = "date")]
    pub date_text: Option<String>,
}

impl Candidate {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        link: impl Into<String>,
        date_text: Option<&str>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            link: link.into(),
            date_text: date_text.map(str::to_string),
        }
    }

    pub fn has_link(&self) -> bool {
        !self.link.trim().is_empty()
    }
}

/// One numbered entry handed to the formatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestItem {
    pub index: usize,
    pub title: String,
    pub url: String,
    pub supporting_text: Option<String>,
}

impl DigestItem {
    /// Numbers candidates from 1 in the order given. Links pass through untouched.
    pub fn from_candidates<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> Vec<Self> {
        candidates
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| Self {
                index: i + 1,
                title: candidate.title.clone(),
                url: candidate.link.clone(),
                supporting_text: Some(candidate.snippet.trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            })
            .collect()
    }
}

/// What a pipeline run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestOutcome {
    /// Formatter output, returned verbatim
    Digest(String),
    /// Nothing qualified; the configured fixed message
    Placeholder(String),
}

impl DigestOutcome {
    pub fn text(&self) -> &str {
        match self {
            DigestOutcome::Digest(text) | DigestOutcome::Placeholder(text) => text,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, DigestOutcome::Placeholder(_))
    }
}
