//! Spell-error extraction
//!
//! Builds one prompt per method from its detections, sends it to the
//! reviewer and parses the reply with a single line grammar:
//!
//! ```text
//! ERROR: <word> | COORDINATES: x:<x>, y:<y>
//! ```
//!
//! Lines that do not match are dropped. A failed request only empties its
//! own method's list.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::client::SpellReviewer;
use super::types::{ErrorRecord, ReviewOutcome};
use crate::ocr::{Coordinates, Detection, Method};

/// Raw-response key used when the reviewer is down at pipeline start
pub const UNAVAILABLE_KEY: &str = "error";

fn error_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"ERROR:\s*(\w+)\s*\|\s*COORDINATES:\s*x:(\d+),\s*y:(\d+)")
            .expect("error line pattern is valid")
    })
}

/// Build the review prompt for one method
pub fn build_prompt(method: Method, detections: &[Detection]) -> String {
    let lines: Vec<String> = detections
        .iter()
        .map(|d| {
            format!(
                "Text: {} (at x:{}, y:{}, confidence:{:.2})",
                d.text,
                d.anchor.x,
                d.anchor.y,
                d.confidence.unwrap_or(0.0)
            )
        })
        .collect();

    format!(
        "I have OCR results from an image using the {} method. Please identify any spelling errors.\n\
         For each error, provide:\n\
         1. The misspelled word\n\
         2. The coordinates (x,y)\n\
         \n\
         Format each error as: \"ERROR: [misspelled word] | COORDINATES: x:[x], y:[y]\"\n\
         \n\
         Here are the OCR results:\n{}\n",
        method,
        lines.join("\n")
    )
}

/// Parse a reviewer reply into error records
pub fn parse_reply(reply: &str, method: Method, image_index: usize) -> Vec<ErrorRecord> {
    let pattern = error_line_pattern();
    let mut errors = Vec::new();

    for line in reply.lines() {
        for caps in pattern.captures_iter(line) {
            let (Ok(x), Ok(y)) = (caps[2].parse::<i32>(), caps[3].parse::<i32>()) else {
                continue;
            };
            errors.push(ErrorRecord {
                word: caps[1].to_string(),
                coordinates: Coordinates { x, y },
                method,
                image_index,
            });
        }
    }

    errors
}

/// Review every method's detections.
///
/// `passes` must be in fixed method order. Methods without detections are
/// not sent.
pub async fn extract_errors(
    reviewer: &dyn SpellReviewer,
    passes: &[(Method, Vec<Detection>)],
    image_index: usize,
) -> ReviewOutcome {
    let mut outcome = ReviewOutcome::default();

    if !reviewer.is_available().await {
        tracing::warn!(reviewer = %reviewer.describe(), "Review service unavailable, skipping spell check");
        outcome.raw_responses.insert(
            UNAVAILABLE_KEY.to_string(),
            format!(
                "{} is not available. Please ensure the review service is running.",
                reviewer.describe()
            ),
        );
        return outcome;
    }

    for (method, detections) in passes {
        if detections.is_empty() {
            continue;
        }

        let prompt = build_prompt(*method, detections);
        match reviewer.review(&prompt).await {
            Ok(reply) => {
                let errors = parse_reply(&reply, *method, image_index);
                tracing::info!(method = %method, errors = errors.len(), "Review complete");
                outcome.raw_responses.insert(method.name().to_string(), reply);
                outcome.errors.insert(*method, errors);
            }
            Err(e) => {
                tracing::warn!(method = %method, error = %e, "Review request failed");
                outcome.raw_responses.insert(
                    method.name().to_string(),
                    format!("Error connecting to review service: {}", e),
                );
            }
        }
    }

    outcome
}

/// Group records by method, preserving order within each method
pub fn group_by_method(records: &[ErrorRecord]) -> BTreeMap<Method, Vec<ErrorRecord>> {
    let mut grouped: BTreeMap<Method, Vec<ErrorRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.method).or_default().push(record.clone());
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::Geometry;
    use crate::review::client::MockReviewer;

    fn detection(text: &str, x: i32, y: i32, method: Method) -> Detection {
        Detection {
            text: text.to_string(),
            confidence: Some(0.876),
            anchor: Coordinates { x, y },
            geometry: Geometry::Box {
                left: x,
                top: y,
                width: 10,
                height: 10,
            },
            method,
        }
    }

    #[test]
    fn test_build_prompt_lists_detections() {
        let prompt = build_prompt(
            Method::TESSERACT_ORIGINAL,
            &[detection("Teh", 12, 40, Method::TESSERACT_ORIGINAL)],
        );
        assert!(prompt.contains("using the tesseract_original method"));
        assert!(prompt.contains("Text: Teh (at x:12, y:40, confidence:0.88)"));
    }

    #[test]
    fn test_parse_reply_skips_nonconforming_lines() {
        let reply = "Here are the errors I found:\n\
                     ERROR: Teh | COORDINATES: x:12, y:40\n\
                     ERROR: qiuck | COORDINATES: x:90\n\
                     - ERROR: recieve | COORDINATES: x:300, y:41 (probably)\n\
                     ERROR: | COORDINATES: x:1, y:1\n\
                     ERROR: big | COORDINATES: x:99999999999, y:1\n\
                     That's all.";

        let errors = parse_reply(reply, Method::PADDLE_ORIGINAL, 2);
        let words: Vec<_> = errors.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["Teh", "recieve"]);
        assert_eq!(errors[1].coordinates, Coordinates { x: 300, y: 41 });
        assert!(errors.iter().all(|e| e.image_index == 2));
        assert!(errors.iter().all(|e| e.method == Method::PADDLE_ORIGINAL));
    }

    #[test]
    fn test_parse_reply_empty() {
        assert!(parse_reply("", Method::PADDLE_ORIGINAL, 0).is_empty());
        assert!(parse_reply("No spelling errors found.", Method::PADDLE_ORIGINAL, 0).is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_method_does_not_abort_others() {
        let reviewer = MockReviewer::new()
            .reply("paddle_original", "ERROR: Teh | COORDINATES: x:10, y:10")
            .fail("tesseract_original", 500)
            .reply("paddle_rotated", "ERROR: fxo | COORDINATES: x:50, y:60")
            .reply("tesseract_rotated", "ERROR: qiuck | COORDINATES: x:70, y:80");

        let passes: Vec<_> = Method::ALL
            .iter()
            .map(|m| (*m, vec![detection("word", 1, 1, *m)]))
            .collect();

        let outcome = extract_errors(&reviewer, &passes, 0).await;

        assert_eq!(reviewer.call_count(), 4);
        assert_eq!(outcome.errors.len(), 3);
        assert!(!outcome.errors.contains_key(&Method::TESSERACT_ORIGINAL));
        assert!(outcome.raw_responses["tesseract_original"].starts_with("Error connecting"));
        assert_eq!(outcome.raw_responses.len(), 4);
        assert_eq!(outcome.flatten().len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_reviewer_records_placeholder() {
        let mut reviewer = MockReviewer::new();
        reviewer.available = false;

        let passes = vec![(
            Method::PADDLE_ORIGINAL,
            vec![detection("Teh", 1, 1, Method::PADDLE_ORIGINAL)],
        )];
        let outcome = extract_errors(&reviewer, &passes, 0).await;

        assert_eq!(reviewer.call_count(), 0);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.raw_responses.len(), 1);
        assert!(outcome.raw_responses.contains_key(UNAVAILABLE_KEY));
    }

    #[tokio::test]
    async fn test_methods_without_detections_are_not_sent() {
        let reviewer = MockReviewer::new();
        let passes = vec![
            (Method::PADDLE_ORIGINAL, Vec::new()),
            (
                Method::TESSERACT_ORIGINAL,
                vec![detection("fine", 1, 1, Method::TESSERACT_ORIGINAL)],
            ),
        ];

        let outcome = extract_errors(&reviewer, &passes, 0).await;
        assert_eq!(reviewer.call_count(), 1);
        assert_eq!(outcome.errors.len(), 1);
    }
}
