//! Error deduplication
//!
//! Different methods often flag the same misspelling at nearly the same
//! spot. Records are collapsed when their word matches and their
//! coordinates fall in the same 10-pixel bucket; the first record seen wins.

use std::collections::HashSet;

use crate::review::ErrorRecord;

/// Bucket size in pixels
pub const BUCKET_SIZE: i32 = 10;

/// Identity of an error for deduplication purposes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueErrorKey {
    pub word: String,
    pub x: i32,
    pub y: i32,
}

impl UniqueErrorKey {
    pub fn of(record: &ErrorRecord) -> Self {
        Self {
            word: record.word.clone(),
            x: bucket(record.coordinates.x),
            y: bucket(record.coordinates.y),
        }
    }
}

fn bucket(value: i32) -> i32 {
    value.div_euclid(BUCKET_SIZE) * BUCKET_SIZE
}

/// Drop duplicate records, keeping first-seen order
pub fn deduplicate(records: Vec<ErrorRecord>) -> Vec<ErrorRecord> {
    let mut seen = HashSet::new();
    let total = records.len();

    let unique: Vec<ErrorRecord> = records
        .into_iter()
        .filter(|record| seen.insert(UniqueErrorKey::of(record)))
        .collect();

    if unique.len() < total {
        tracing::debug!(total = total, unique = unique.len(), "Collapsed duplicate errors");
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{Coordinates, Method};

    fn record(word: &str, x: i32, y: i32, method: Method) -> ErrorRecord {
        ErrorRecord {
            word: word.to_string(),
            coordinates: Coordinates { x, y },
            method,
            image_index: 0,
        }
    }

    #[test]
    fn test_nearby_duplicates_collapse_to_first() {
        let records = vec![
            record("teh", 101, 202, Method::PADDLE_ORIGINAL),
            record("teh", 105, 208, Method::TESSERACT_ORIGINAL),
            record("teh", 150, 200, Method::TESSERACT_ORIGINAL),
        ];

        let unique = deduplicate(records);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].coordinates, Coordinates { x: 101, y: 202 });
        assert_eq!(unique[0].method, Method::PADDLE_ORIGINAL);
        assert_eq!(unique[1].coordinates, Coordinates { x: 150, y: 200 });
        assert_eq!(
            UniqueErrorKey::of(&unique[0]),
            UniqueErrorKey {
                word: "teh".to_string(),
                x: 100,
                y: 200
            }
        );
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let records = vec![
            record("teh", 10, 10, Method::PADDLE_ORIGINAL),
            record("fxo", 10, 10, Method::PADDLE_ORIGINAL),
            record("teh", 40, 10, Method::PADDLE_ROTATED),
        ];

        let once = deduplicate(records.clone());
        assert_eq!(once, records);
        assert_eq!(deduplicate(once.clone()), once);
    }

    #[test]
    fn test_words_are_case_sensitive() {
        let unique = deduplicate(vec![
            record("Teh", 10, 10, Method::PADDLE_ORIGINAL),
            record("teh", 10, 10, Method::TESSERACT_ORIGINAL),
        ]);
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_negative_coordinates_bucket_downwards() {
        assert_eq!(bucket(-1), -10);
        assert_eq!(bucket(0), 0);
        assert_eq!(bucket(9), 0);
        assert_eq!(bucket(10), 10);
    }
}
