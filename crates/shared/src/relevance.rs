use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::Candidate;

fn default_min_snippet_matches() -> usize {
    2
}

/// A named list of lowercase keywords, matched as plain substrings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_min_snippet_matches")]
    pub min_snippet_matches: usize,
}

impl RuleGroup {
    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut group = Self {
            name: name.into(),
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_string())
                .collect(),
            min_snippet_matches: default_min_snippet_matches(),
        };
        group.normalize();
        group
    }

    pub fn with_min_snippet_matches(mut self, min: usize) -> Self {
        self.min_snippet_matches = min;
        self
    }

    /// Lowercases and drops empty or repeated keywords. Whitespace inside a
    /// keyword is kept as written: "ai " is not the same keyword as "ai".
    fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.keywords.len());
        for keyword in self.keywords.drain(..) {
            let keyword = keyword.to_lowercase();
            if !keyword.trim().is_empty() && !seen.contains(&keyword) {
                seen.push(keyword);
            }
        }
        self.keywords = seen;
    }

    /// Title contains any keyword, or the snippet contains enough distinct ones.
    /// Both arguments must already be lowercase.
    fn is_satisfied_by(&self, title: &str, snippet: &str) -> bool {
        if self.keywords.iter().any(|k| title.contains(k.as_str())) {
            return true;
        }

        let snippet_hits = self
            .keywords
            .iter()
            .filter(|k| snippet.contains(k.as_str()))
            .count();
        snippet_hits > 0 && snippet_hits >= self.min_snippet_matches
    }
}

/// Every group must be satisfied for a candidate to count as relevant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelevanceRuleSet {
    pub groups: Vec<RuleGroup>,
}

impl RelevanceRuleSet {
    pub fn new(groups: Vec<RuleGroup>) -> Self {
        let mut rule_set = Self { groups };
        rule_set.groups.iter_mut().for_each(RuleGroup::normalize);
        rule_set
    }

    /// Built-in vocabulary: AI developments concerning India
    pub fn india_ai() -> Self {
        Self::new(vec![
            RuleGroup::new(
                "topic",
                [
                    "ai ",
                    " ai",
                    "ai-",
                    "artificial intelligence",
                    "machine learning",
                    "deep learning",
                    "generative",
                    "genai",
                    "llm",
                    "large language model",
                    "chatbot",
                    "neural",
                    "gpu",
                ],
            ),
            RuleGroup::new(
                "region",
                [
                    "india",
                    "indian",
                    "bharat",
                    "meity",
                    "niti aayog",
                    "bengaluru",
                    "bangalore",
                    "delhi",
                    "mumbai",
                    "hyderabad",
                    "chennai",
                    "pune",
                ],
            ),
        ])
    }

    /// Loads `{"groups": [{"name": .., "keywords": [..], "min_snippet_matches": 2}]}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule set file: {}", path.display()))?;
        let parsed: RelevanceRuleSet = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse rule set file: {}", path.display()))?;

        if parsed.groups.is_empty() {
            anyhow::bail!("Rule set file {} defines no groups", path.display());
        }

        Ok(Self::new(parsed.groups))
    }
}

/// Lexical relevance check over a fixed rule set
#[derive(Debug, Clone)]
pub struct TopicRelevanceClassifier {
    rule_set: RelevanceRuleSet,
}

impl TopicRelevanceClassifier {
    pub fn new(rule_set: RelevanceRuleSet) -> Self {
        Self { rule_set }
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        let title = candidate.title.to_lowercase();
        let snippet = candidate.snippet.to_lowercase();

        self.rule_set
            .groups
            .iter()
            .all(|group| group.is_satisfied_by(&title, &snippet))
    }
}
