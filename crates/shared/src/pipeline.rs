use anyhow::{Context, Result};

use crate::config::PipelineSettings;
use crate::formatter::DigestFormatter;
use crate::models::{Candidate, DigestItem, DigestOutcome};
use crate::recency::RecencyEvaluator;
use crate::relevance::{RelevanceRuleSet, TopicRelevanceClassifier};
use crate::search::CandidateSource;
use crate::selector::{CandidateSelector, Selection, SelectorConfig};

/// Search, select, format. One call to each collaborator, in that order.
pub struct DigestPipeline<S, F> {
    source: S,
    formatter: F,
    selector: CandidateSelector,
    classifier: TopicRelevanceClassifier,
    settings: PipelineSettings,
}

impl<S, F> DigestPipeline<S, F>
where
    S: CandidateSource,
    F: DigestFormatter,
{
    pub fn new(
        source: S,
        formatter: F,
        rule_set: RelevanceRuleSet,
        evaluator: RecencyEvaluator,
        settings: PipelineSettings,
    ) -> Self {
        let selector = CandidateSelector::new(
            evaluator,
            SelectorConfig {
                relaxation: settings.relaxation,
                date_from_snippet: settings.date_from_snippet,
            },
        );

        Self {
            source,
            formatter,
            selector,
            classifier: TopicRelevanceClassifier::new(rule_set),
            settings,
        }
    }

    pub async fn run(&self) -> Result<DigestOutcome> {
        let pool = self
            .source
            .fetch(&self.settings.query)
            .await
            .context("Search failed")?;
        tracing::info!(candidates = pool.len(), "fetched candidate pool");

        let pool = self.prepare_pool(pool);

        let selection = self.selector.select(
            &pool,
            self.settings.check_relevance.then_some(&self.classifier),
            self.settings.window.as_ref(),
            self.settings.target_count,
        );

        let picked = match selection {
            Selection::NoQualifyingContent => {
                tracing::info!("no qualifying content, returning placeholder");
                return Ok(DigestOutcome::Placeholder(self.settings.placeholder.clone()));
            }
            Selection::Selected(picked) => picked,
        };

        for (i, p) in picked.iter().enumerate() {
            tracing::info!(
                index = i + 1,
                tier = ?p.tier,
                title = %p.candidate.title,
                link = %p.candidate.link,
                "selected candidate"
            );
        }

        let items = DigestItem::from_candidates(picked.iter().map(|p| &p.candidate));
        let digest = self
            .formatter
            .format(&items, self.settings.format)
            .await
            .context("Formatting failed")?;

        Ok(DigestOutcome::Digest(digest))
    }

    fn prepare_pool(&self, pool: Vec<Candidate>) -> Vec<Candidate> {
        if !self.settings.skip_linkless {
            return pool;
        }

        let before = pool.len();
        let pool: Vec<Candidate> = pool.into_iter().filter(Candidate::has_link).collect();
        if pool.len() < before {
            tracing::warn!(dropped = before - pool.len(), "dropped search results without a link");
        }
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::FormatDirective;
    use crate::recency::{RecencyWindow, UnparseableDatePolicy};
    use crate::relevance::RuleGroup;
    use crate::selector::RelaxationPolicy;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct FakeSource {
        pool: Vec<Candidate>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(pool: Vec<Candidate>) -> Self {
            Self {
                pool,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CandidateSource for FakeSource {
        async fn fetch(&self, query: &str) -> Result<Vec<Candidate>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.pool.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CandidateSource for FailingSource {
        async fn fetch(&self, _query: &str) -> Result<Vec<Candidate>> {
            anyhow::bail!("search quota exhausted")
        }
    }

    #[derive(Default)]
    struct RecordingFormatter {
        calls: Mutex<Vec<(Vec<DigestItem>, FormatDirective)>>,
        fail: bool,
    }

    #[async_trait]
    impl DigestFormatter for RecordingFormatter {
        async fn format(&self, items: &[DigestItem], directive: FormatDirective) -> Result<String> {
            self.calls.lock().unwrap().push((items.to_vec(), directive));
            if self.fail {
                anyhow::bail!("model unavailable");
            }
            Ok(items
                .iter()
                .map(|i| format!("{}|{}", i.index, i.url))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    fn evaluator() -> RecencyEvaluator {
        RecencyEvaluator::at(
            NaiveDate::from_ymd_opt(2026, 10, 19)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap(),
        )
    }

    fn rules() -> RelevanceRuleSet {
        RelevanceRuleSet::new(vec![RuleGroup::new("topic", ["ai "])])
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            query: "ai india".to_string(),
            window: Some(RecencyWindow::new(14, UnparseableDatePolicy::Reject)),
            relaxation: RelaxationPolicy::Rescan,
            ..PipelineSettings::default()
        }
    }

    fn hit(title: &str, link: &str, date: Option<&str>) -> Candidate {
        Candidate::new(title, "", link, date)
    }

    fn pipeline<S: CandidateSource>(
        source: S,
        settings: PipelineSettings,
    ) -> DigestPipeline<S, RecordingFormatter> {
        DigestPipeline::new(
            source,
            RecordingFormatter::default(),
            rules(),
            evaluator(),
            settings,
        )
    }

    #[tokio::test]
    async fn test_selected_items_are_formatted() {
        let source = FakeSource::new(vec![
            hit("Cricket", "https://a.in/0", Some("1 day ago")),
            hit("New AI lab", "https://a.in/1?x=y", Some("2 days ago")),
            hit("AI policy draft", "https://a.in/2", Some("Oct 10, 2026")),
        ]);
        let pipeline = pipeline(source, settings());

        let outcome = pipeline.run().await.unwrap();

        assert_eq!(
            outcome,
            DigestOutcome::Digest("1|https://a.in/1?x=y\n2|https://a.in/2\n3|https://a.in/0".to_string())
        );
        assert_eq!(pipeline.source.queries.lock().unwrap().as_slice(), ["ai india"]);

        let calls = pipeline.formatter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, FormatDirective::Html);
        assert_eq!(calls[0].0[0].title, "New AI lab");
    }

    #[tokio::test]
    async fn test_empty_pool_returns_placeholder_without_formatting() {
        let pipeline = pipeline(FakeSource::new(Vec::new()), settings());

        let outcome = pipeline.run().await.unwrap();

        assert_eq!(outcome, DigestOutcome::Placeholder(settings().placeholder));
        assert!(pipeline.formatter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_linkless_results_are_dropped() {
        let source = FakeSource::new(vec![
            hit("New AI lab", "", Some("1 day ago")),
            hit("Cricket", "https://a.in/c", None),
        ]);
        let pipeline = pipeline(source, settings());

        let outcome = pipeline.run().await.unwrap();

        assert_eq!(outcome.text(), "1|https://a.in/c");
    }

    #[tokio::test]
    async fn test_only_linkless_results_gives_placeholder() {
        let source = FakeSource::new(vec![hit("New AI lab", " ", Some("1 day ago"))]);
        let pipeline = pipeline(source, settings());

        let outcome = pipeline.run().await.unwrap();

        assert!(outcome.is_placeholder());
    }

    #[tokio::test]
    async fn test_linkless_results_kept_when_allowed() {
        let source = FakeSource::new(vec![hit("New AI lab", "", Some("1 day ago"))]);
        let settings = PipelineSettings {
            skip_linkless: false,
            ..settings()
        };
        let pipeline = pipeline(source, settings);

        let outcome = pipeline.run().await.unwrap();

        assert_eq!(outcome.text(), "1|");
    }

    #[tokio::test]
    async fn test_target_count_and_format_come_from_settings() {
        let source = FakeSource::new(vec![
            hit("AI one", "https://a.in/1", Some("1 day ago")),
            hit("AI two", "https://a.in/2", Some("1 day ago")),
            hit("AI three", "https://a.in/3", Some("1 day ago")),
        ]);
        let settings = PipelineSettings {
            target_count: 1,
            format: FormatDirective::Text,
            ..settings()
        };
        let pipeline = pipeline(source, settings);

        let outcome = pipeline.run().await.unwrap();

        assert_eq!(outcome.text(), "1|https://a.in/1");
        assert_eq!(
            pipeline.formatter.calls.lock().unwrap()[0].1,
            FormatDirective::Text
        );
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let pipeline = pipeline(FailingSource, settings());

        let err = pipeline.run().await.unwrap_err();

        assert!(format!("{:#}", err).contains("search quota exhausted"));
        assert!(pipeline.formatter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_formatter_failure_propagates() {
        let source = FakeSource::new(vec![hit("AI one", "https://a.in/1", Some("1 day ago"))]);
        let pipeline = DigestPipeline::new(
            source,
            RecordingFormatter {
                fail: true,
                ..RecordingFormatter::default()
            },
            rules(),
            evaluator(),
            settings(),
        );

        let err = pipeline.run().await.unwrap_err();

        assert!(format!("{:#}", err).contains("model unavailable"));
    }
}
