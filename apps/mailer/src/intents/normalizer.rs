//! Record Normalizer: turns an extracted record into a dispatchable `EmailIntent`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::intents::extractor::RawRecord;

pub const SUBJECT_KEY: &str = "subject";
pub const MESSAGE_KEY: &str = "message";
pub const RECEIVER_KEY: &str = "receiver_email";

/// Subject used when the model left it out or blank.
pub const FALLBACK_SUBJECT: &str = "Application";

/// Token the model is told to emit when the posting names no address.
pub const NULL_SENTINEL: &str = "null";

/// A normalized email ready for dispatch.
///
/// `subject` and `body` are never blank. `recipient` is `None` when the posting gave no
/// usable address; it is never an empty string or the sentinel text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailIntent {
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
impl EmailIntent {
    /// The field set this intent normalizes from, using the model's key names.
    pub fn to_raw(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert(SUBJECT_KEY, self.subject.clone());
        raw.insert(MESSAGE_KEY, self.body.clone());
        if let Some(recipient) = &self.recipient {
            raw.insert(RECEIVER_KEY, recipient.clone());
        }
        raw
    }
}

/// Normalizes one raw record.
///
/// Returns `None` only when the record has no usable message body.
pub fn normalize(raw: &RawRecord) -> Option<EmailIntent> {
    let Some(body) = non_blank(raw.get(MESSAGE_KEY)) else {
        debug!(
            keys = ?raw.keys().collect::<Vec<_>>(),
            "Dropping record without a message body"
        );
        return None;
    };

    let subject = non_blank(raw.get(SUBJECT_KEY)).unwrap_or(FALLBACK_SUBJECT);

    Some(EmailIntent {
        recipient: normalize_recipient(raw.get(RECEIVER_KEY)),
        subject: subject.to_string(),
        body: body.to_string(),
    })
}

/// Missing, blank, and the literal `null` all mean "no recipient".
/// The sentinel comparison is by value and case-sensitive.
fn normalize_recipient(value: Option<&str>) -> Option<String> {
    non_blank(value)
        .filter(|v| *v != NULL_SENTINEL)
        .map(str::to_string)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, &str)]) -> RawRecord {
        fields.iter().copied().collect()
    }

    #[test]
    fn test_full_record_normalizes_trimmed() {
        let raw = record(&[
            ("subject", "  Rust Engineer application "),
            ("message", "\nDear hiring team,\nPlease find my CV attached.\n"),
            ("receiver_email", " careers@acme.io "),
        ]);

        let intent = normalize(&raw).unwrap();
        assert_eq!(intent.subject, "Rust Engineer application");
        assert_eq!(
            intent.body,
            "Dear hiring team,\nPlease find my CV attached."
        );
        assert_eq!(intent.recipient.as_deref(), Some("careers@acme.io"));
    }

    #[test]
    fn test_missing_message_yields_no_intent() {
        let raw = record(&[("subject", "Hello"), ("receiver_email", "a@b.com")]);
        assert!(normalize(&raw).is_none());
    }

    #[test]
    fn test_blank_message_yields_no_intent() {
        let raw = record(&[("subject", "Hello"), ("message", "   \n\t ")]);
        assert!(normalize(&raw).is_none());
    }

    #[test]
    fn test_blank_subject_falls_back() {
        let raw = record(&[("subject", "   "), ("message", "Body")]);
        assert_eq!(normalize(&raw).unwrap().subject, FALLBACK_SUBJECT);

        let raw = record(&[("message", "Body")]);
        assert_eq!(normalize(&raw).unwrap().subject, FALLBACK_SUBJECT);
    }

    #[test]
    fn test_recipient_absent_variants() {
        for value in [None, Some(""), Some("   "), Some("null"), Some(" null ")] {
            let mut raw = record(&[("subject", "S"), ("message", "M")]);
            if let Some(v) = value {
                raw.insert("receiver_email", v);
            }
            assert_eq!(
                normalize(&raw).unwrap().recipient,
                None,
                "receiver_email {:?} should normalize to absent",
                value
            );
        }
    }

    /// The sentinel must be matched by value: a freshly built string equal to "null"
    /// (not the same allocation as any literal) still counts as absent.
    #[test]
    fn test_null_sentinel_compared_by_value() {
        let sentinel = String::from_utf8(b"null".to_vec()).unwrap();
        let mut raw = record(&[("subject", "S"), ("message", "M")]);
        raw.insert("receiver_email", sentinel);
        assert_eq!(normalize(&raw).unwrap().recipient, None);
    }

    #[test]
    fn test_sentinel_match_is_case_sensitive() {
        let raw = record(&[("subject", "S"), ("message", "M"), ("receiver_email", "NULL")]);
        assert_eq!(normalize(&raw).unwrap().recipient.as_deref(), Some("NULL"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            record(&[("subject", " A "), ("message", " body "), ("receiver_email", " x@y.z ")]),
            record(&[("message", "body only")]),
            record(&[("subject", "S"), ("message", "M"), ("receiver_email", "null")]),
        ];

        for raw in &inputs {
            let once = normalize(raw).unwrap();
            let twice = normalize(&once.to_raw()).unwrap();
            assert_eq!(once, twice);
        }
    }
}
