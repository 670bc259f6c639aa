// Completion → EmailIntent pipeline.
// extractor: locate and flatten the JSON payload; normalizer: validate each record.

pub mod extractor;
pub mod normalizer;
pub mod prompts;

use tracing::warn;

use crate::intents::extractor::{extract, ExtractionDiagnostic};
use crate::intents::normalizer::{normalize, EmailIntent};

/// Intents recovered from one completion, plus the extraction diagnostic if any.
#[derive(Debug, Clone, Default)]
pub struct ParsedCompletion {
    pub intents: Vec<EmailIntent>,
    pub diagnostic: Option<ExtractionDiagnostic>,
    /// Records that parsed but carried no usable message body.
    pub dropped: usize,
}

/// Runs extraction then normalization over a raw completion. Never fails.
pub fn intents_from_completion(completion: &str) -> ParsedCompletion {
    let extraction = extract(completion);
    let total = extraction.records.len();
    let intents: Vec<EmailIntent> = extraction.records.iter().filter_map(normalize).collect();
    let dropped = total - intents.len();

    if dropped > 0 {
        warn!("Dropped {dropped} of {total} records with no message body");
    }

    ParsedCompletion {
        intents,
        diagnostic: extraction.diagnostic,
        dropped,
    }
}
