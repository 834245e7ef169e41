//! Categorical value encoding
//!
//! Maps raw category strings to the integer codes the classifier was
//! trained with. The table is loaded once at startup and never mutated,
//! so it is shared read-only across requests.

use std::collections::HashMap;

use crate::models::VocabularyEntry;

/// Encoder field names, as recorded by the training pipeline
pub const PRIORITY_FIELD: &str = "Priority";
pub const CATEGORY_FIELD: &str = "Category";
pub const ITEM_FIELD: &str = "Item";
pub const SUB_CATEGORY_FIELD: &str = "Sub Category";

/// Sentinel values the training data may contain
const NAN_SENTINEL: &str = "nan";
const UNKNOWN_SENTINEL: &str = "unknown";

/// Code for a value with no match and no sentinel to fall back on
pub const UNSEEN_CODE: i64 = -1;

/// Field name -> ordered list of known values; a value's index is its code.
#[derive(Debug, Clone)]
pub struct CategoryEncoderTable {
    fields: HashMap<String, Vec<String>>,
}

impl CategoryEncoderTable {
    pub fn new(fields: HashMap<String, Vec<String>>) -> Self {
        Self { fields }
    }

    /// Encode a raw value for a field.
    ///
    /// Returns `None` when the field itself is unknown to the table (the
    /// caller leaves the feature at its zero default). For known fields
    /// the lookup is total: the value is lower-cased and trimmed, then
    /// resolved in strict order: exact match, `"nan"` sentinel,
    /// `"unknown"` sentinel, fixed `-1`.
    pub fn encode(&self, field: &str, raw: &str) -> Option<i64> {
        let classes = self.fields.get(field)?;
        let needle = raw.trim().to_lowercase();

        Some(
            position_of(classes, &needle)
                .or_else(|| position_of(classes, NAN_SENTINEL))
                .or_else(|| position_of(classes, UNKNOWN_SENTINEL))
                .unwrap_or(UNSEEN_CODE),
        )
    }

    /// Vocabulary for a field as `{value, label}` pairs sorted by label.
    ///
    /// Sentinels are excluded; labels are title-cased, with dashes
    /// flattened to spaces when `dashes_to_spaces` is set (used for the
    /// category field, matching the dashboard's display rules).
    pub fn vocabulary(&self, field: &str, dashes_to_spaces: bool) -> Option<Vec<VocabularyEntry>> {
        let classes = self.fields.get(field)?;
        let mut entries: Vec<VocabularyEntry> = classes
            .iter()
            .filter(|v| v.as_str() != NAN_SENTINEL && v.as_str() != UNKNOWN_SENTINEL)
            .map(|v| {
                let display = if dashes_to_spaces {
                    v.replace('-', " ")
                } else {
                    v.clone()
                };
                VocabularyEntry {
                    value: v.clone(),
                    label: title_case(&display),
                }
            })
            .collect();
        entries.sort_by(|a, b| a.label.cmp(&b.label));
        Some(entries)
    }
}

fn position_of(classes: &[String], needle: &str) -> Option<i64> {
    classes.iter().position(|c| c == needle).map(|i| i as i64)
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
