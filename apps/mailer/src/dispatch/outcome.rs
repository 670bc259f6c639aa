use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle stage of one posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStage {
    Scraping,
    Generating,
    Extracting,
    Dispatching,
    Done,
    Failed,
}

/// What happened to one posting-level failure or one intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Sent {
        recipient: String,
        subject: String,
    },
    SkippedNoRecipient {
        subject: String,
    },
    /// `stage` is where it failed: scraping/generating for a whole posting,
    /// dispatching for a single intent.
    Failed {
        stage: PostingStage,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Sent,
    SkippedNoRecipient,
    Failed,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Sent { .. } => OutcomeKind::Sent,
            Outcome::SkippedNoRecipient { .. } => OutcomeKind::SkippedNoRecipient,
            Outcome::Failed { .. } => OutcomeKind::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub posting_url: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Everything one batch run produced, in order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub postings: usize,
    pub outcomes: Vec<OutcomeRecord>,
    /// Postings whose completion needed an extraction diagnostic.
    pub extraction_warnings: usize,
}

impl BatchReport {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            postings: 0,
            outcomes: Vec::new(),
            extraction_warnings: 0,
        }
    }

    pub fn record(&mut self, posting_url: &str, outcome: Outcome) {
        self.outcomes.push(OutcomeRecord {
            posting_url: posting_url.to_string(),
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn kinds(&self) -> Vec<OutcomeKind> {
        self.outcomes.iter().map(|r| r.outcome.kind()).collect()
    }

    fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes
            .iter()
            .filter(|r| r.outcome.kind() == kind)
            .count()
    }

    pub fn sent(&self) -> usize {
        self.count(OutcomeKind::Sent)
    }

    pub fn skipped(&self) -> usize {
        self.count(OutcomeKind::SkippedNoRecipient)
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeKind::Failed)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} postings: {} sent, {} skipped (no recipient), {} failed, {} extraction warnings",
            self.postings,
            self.sent(),
            self.skipped(),
            self.failed(),
            self.extraction_warnings
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_summary() {
        let mut report = BatchReport::start();
        report.postings = 2;
        report.record(
            "https://a",
            Outcome::Sent {
                recipient: "a@x.com".to_string(),
                subject: "S".to_string(),
            },
        );
        report.record(
            "https://a",
            Outcome::SkippedNoRecipient {
                subject: "S2".to_string(),
            },
        );
        report.record(
            "https://b",
            Outcome::Failed {
                stage: PostingStage::Generating,
                reason: "LLM returned status 503".to_string(),
            },
        );

        assert_eq!((report.sent(), report.skipped(), report.failed()), (1, 1, 1));
        assert_eq!(
            report.summary(),
            "2 postings: 1 sent, 1 skipped (no recipient), 1 failed, 0 extraction warnings"
        );
    }

    #[test]
    fn test_outcome_record_serializes_flat() {
        let record = OutcomeRecord {
            posting_url: "https://b".to_string(),
            outcome: Outcome::Failed {
                stage: PostingStage::Scraping,
                reason: "timeout".to_string(),
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "scraping");
        assert_eq!(json["posting_url"], "https://b");
    }
}
