//! Response Extractor: isolates the JSON payload inside a free-form model completion
//! and flattens it into string-keyed records.
//!
//! The model is asked for JSON only, but completions routinely arrive wrapped in prose
//! or code fences, and multi-job postings come back as comma-separated sibling objects
//! with no enclosing array. Extraction never fails: malformed input yields zero records
//! plus an [`ExtractionDiagnostic`].
//!
//! Strategy:
//! 1. Slice from the first `{` to the last `}` (the candidate payload).
//! 2. Parse the candidate directly. A single well-formed object ends here, even when its
//!    string values contain braces.
//! 3. Otherwise scan the candidate for top-level objects, tracking string and escape state
//!    so braces inside values are not counted. Two or more objects are wrapped in `[...]`
//!    and parsed as an array; if that still fails, each object is parsed on its own and
//!    the well-formed ones are kept.

use serde_json::Value;
use tracing::{debug, warn};

/// Why an extraction produced fewer records than the completion appeared to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionDiagnostic {
    /// No `{ ... }` pair in the completion.
    NoJsonFound,
    /// The payload (or part of it) is not valid JSON.
    MalformedJson,
    /// Valid JSON, but neither an object nor an array containing objects.
    UnexpectedShape,
}

impl std::fmt::Display for ExtractionDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExtractionDiagnostic::NoJsonFound => "no JSON found in completion",
            ExtractionDiagnostic::MalformedJson => "malformed JSON in completion",
            ExtractionDiagnostic::UnexpectedShape => "unexpected JSON shape in completion",
        };
        f.write_str(label)
    }
}

/// One flattened JSON object. Field order follows the completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field, replacing an existing value under the same key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Result of extracting one completion.
///
/// `diagnostic` may be set alongside non-empty `records` when some sibling objects were
/// recovered and others were not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    pub diagnostic: Option<ExtractionDiagnostic>,
}

impl Extraction {
    fn empty(diagnostic: ExtractionDiagnostic) -> Self {
        Self {
            records: vec![],
            diagnostic: Some(diagnostic),
        }
    }

    fn ok(records: Vec<RawRecord>) -> Self {
        Self {
            records,
            diagnostic: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Extracts every JSON object embedded in a raw model completion.
pub fn extract(completion: &str) -> Extraction {
    let Some(candidate) = candidate_payload(completion) else {
        warn!("No JSON object boundaries found in completion");
        return Extraction::empty(ExtractionDiagnostic::NoJsonFound);
    };

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return records_from_value(value);
    }

    let spans = top_level_objects(candidate);
    debug!("Direct parse failed; scanned {} top-level objects", spans.len());

    if spans.len() <= 1 {
        warn!("Completion payload is not valid JSON");
        return Extraction::empty(ExtractionDiagnostic::MalformedJson);
    }

    if let Ok(value) = serde_json::from_str::<Value>(&format!("[{candidate}]")) {
        return records_from_value(value);
    }

    // Sibling objects with stray text or missing commas between them: keep what parses.
    let mut records = Vec::new();
    let mut rejected = 0usize;
    for span in &spans {
        match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(map)) => records.push(flatten_object(&map)),
            _ => rejected += 1,
        }
    }

    if rejected > 0 {
        warn!(
            "{} of {} sibling objects in completion are malformed",
            rejected,
            spans.len()
        );
    }

    Extraction {
        diagnostic: (rejected > 0).then_some(ExtractionDiagnostic::MalformedJson),
        records,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Slices `text` from its first `{` through its last `}` inclusive.
fn candidate_payload(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Splits `payload` into the substrings of its top-level `{ ... }` objects.
///
/// Braces inside string literals are ignored. An object left open at the end of the
/// payload is dropped.
fn top_level_objects(payload: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in payload.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(&payload[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

/// Converts a parsed payload into records according to its shape.
fn records_from_value(value: Value) -> Extraction {
    match value {
        Value::Object(map) => Extraction::ok(vec![flatten_object(&map)]),
        Value::Array(items) => {
            let records: Vec<RawRecord> = items
                .iter()
                .filter_map(|item| item.as_object().map(flatten_object))
                .collect();
            if records.is_empty() {
                warn!("Completion JSON array contains no objects");
                Extraction::empty(ExtractionDiagnostic::UnexpectedShape)
            } else {
                Extraction::ok(records)
            }
        }
        _ => {
            warn!("Completion JSON is neither an object nor an array");
            Extraction::empty(ExtractionDiagnostic::UnexpectedShape)
        }
    }
}

fn flatten_object(map: &serde_json::Map<String, Value>) -> RawRecord {
    map.iter()
        .map(|(key, value)| (key.clone(), stringify(value)))
        .collect()
}

/// Strings pass through unquoted; JSON `null` becomes the text `null`; anything else
/// is rendered as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
