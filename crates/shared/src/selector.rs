use serde::{Deserialize, Serialize};

use crate::models::Candidate;
use crate::recency::{RecencyEvaluator, RecencyWindow};
use crate::relevance::TopicRelevanceClassifier;

/// How the second pass loosens the first one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelaxationPolicy {
    /// Rescan the pool with the same checks as the strict pass
    #[default]
    Rescan,
    /// Keep relevance mandatory, stop checking recency
    DropRecency,
}

/// The pass that admitted a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionTier {
    Strict,
    Relaxed,
    Unfiltered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCandidate {
    pub candidate: Candidate,
    pub tier: SelectionTier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Selected(Vec<SelectedCandidate>),
    NoQualifyingContent,
}

impl Selection {
    pub fn len(&self) -> usize {
        match self {
            Selection::Selected(picked) => picked.len(),
            Selection::NoQualifyingContent => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn candidates(&self) -> Vec<&Candidate> {
        match self {
            Selection::Selected(picked) => picked.iter().map(|p| &p.candidate).collect(),
            Selection::NoQualifyingContent => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorConfig {
    pub relaxation: RelaxationPolicy,
    /// Read the snippet as the date text when a hit has no date of its own
    pub date_from_snippet: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            relaxation: RelaxationPolicy::Rescan,
            date_from_snippet: true,
        }
    }
}

/// Picks up to `target_count` candidates from a search pool.
///
/// Three passes over the pool, each only run while the result is still short:
///
/// 1. strict: every configured check must hold
/// 2. relaxed: per [`RelaxationPolicy`]
/// 3. unfiltered: whatever is left, in pool order
///
/// Candidates are compared as whole records, so a hit appearing twice in the
/// pool is selected at most once. Order within each pass follows the pool.
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    evaluator: RecencyEvaluator,
    config: SelectorConfig,
}

impl CandidateSelector {
    pub fn new(evaluator: RecencyEvaluator, config: SelectorConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn select(
        &self,
        pool: &[Candidate],
        classifier: Option<&TopicRelevanceClassifier>,
        window: Option<&RecencyWindow>,
        target_count: usize,
    ) -> Selection {
        let mut picked: Vec<SelectedCandidate> = Vec::with_capacity(target_count);

        Self::fill(pool, &mut picked, target_count, SelectionTier::Strict, |c| {
            self.passes(c, classifier, window)
        });

        if picked.len() < target_count {
            let relaxed_window = match self.config.relaxation {
                RelaxationPolicy::Rescan => window,
                RelaxationPolicy::DropRecency => None,
            };
            Self::fill(pool, &mut picked, target_count, SelectionTier::Relaxed, |c| {
                self.passes(c, classifier, relaxed_window)
            });
        }

        if picked.len() < target_count {
            Self::fill(pool, &mut picked, target_count, SelectionTier::Unfiltered, |_| true);
        }

        picked.truncate(target_count);

        tracing::debug!(
            pool = pool.len(),
            selected = picked.len(),
            strict = picked.iter().filter(|p| p.tier == SelectionTier::Strict).count(),
            relaxed = picked.iter().filter(|p| p.tier == SelectionTier::Relaxed).count(),
            unfiltered = picked.iter().filter(|p| p.tier == SelectionTier::Unfiltered).count(),
            "candidate selection finished"
        );

        if picked.is_empty() {
            Selection::NoQualifyingContent
        } else {
            Selection::Selected(picked)
        }
    }

    fn fill<F>(
        pool: &[Candidate],
        picked: &mut Vec<SelectedCandidate>,
        target_count: usize,
        tier: SelectionTier,
        accept: F,
    ) where
        F: Fn(&Candidate) -> bool,
    {
        for candidate in pool {
            if picked.len() >= target_count {
                break;
            }
            if picked.iter().any(|p| &p.candidate == candidate) {
                continue;
            }
            if accept(candidate) {
                picked.push(SelectedCandidate {
                    candidate: candidate.clone(),
                    tier,
                });
            }
        }
    }

    fn passes(
        &self,
        candidate: &Candidate,
        classifier: Option<&TopicRelevanceClassifier>,
        window: Option<&RecencyWindow>,
    ) -> bool {
        if let Some(classifier) = classifier {
            if !classifier.matches(candidate) {
                return false;
            }
        }

        match window {
            Some(window) => self
                .evaluator
                .is_recent(self.date_text(candidate), window),
            None => true,
        }
    }

    fn date_text<'a>(&self, candidate: &'a Candidate) -> Option<&'a str> {
        let own_date = candidate
            .date_text
            .as_deref()
            .filter(|d| !d.trim().is_empty());

        match own_date {
            Some(date) => Some(date),
            None if self.config.date_from_snippet => Some(candidate.snippet.as_str()),
            None => None,
        }
    }
}
