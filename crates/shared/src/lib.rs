// Public modules
pub mod config;
pub mod email;
pub mod formatter;
pub mod models;
pub mod pipeline;
pub mod recency;
pub mod relevance;
pub mod search;
pub mod selector;

// Re-export commonly used types
pub use config::{Config, EmailConfig, PipelineSettings};
pub use email::{DigestSink, EmailSender, NewsletterRenderer};
pub use formatter::{DigestFormatter, FormatDirective, OpenAiFormatter};
pub use models::{Candidate, DigestItem, DigestOutcome};
pub use pipeline::DigestPipeline;
pub use recency::{RecencyEvaluator, RecencyWindow, UnparseableDatePolicy};
pub use relevance::{RelevanceRuleSet, RuleGroup, TopicRelevanceClassifier};
pub use search::{CandidateSource, SerpApiClient};
pub use selector::{
    CandidateSelector, RelaxationPolicy, SelectedCandidate, Selection, SelectionTier,
    SelectorConfig,
};
