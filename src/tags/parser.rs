//! Extraction of tag/frequency pairs from model metadata.

use serde_json::Value;

use crate::header::Metadata;
use crate::models::{TagFrequency, TagKind};

use super::normalizer::TagNormalizer;

/// Metadata keys that may hold training tag frequencies, in lookup order.
///
/// Every key that is present contributes tags.
pub const TAG_FREQUENCY_KEYS: [&str; 4] = [
    "ss_tag_frequency",
    "ss_tag_frequency_0",
    "tag_frequency",
    "tags",
];

const CHARACTER_TAGS_KEY: &str = "ss_character_tags";
const DATASET_NAME_KEY: &str = "ss_dataset_name";
const NETWORK_ARGS_KEY: &str = "ss_network_args";

/// Parses all tags found in the metadata.
///
/// # Sources
///
/// - Frequency tables under [`TAG_FREQUENCY_KEYS`]. A JSON object maps tag to
///   count, or dataset directory to such a map. A JSON array lists tag strings
///   or `{"name", "frequency"}` objects. A value that is not JSON at all
///   becomes a single tag.
/// - `ss_character_tags`: JSON array of character names.
/// - `ss_dataset_name`: a synthetic `dataset: {name}` tag.
/// - `ss_network_args`: a synthetic `network: {module}` tag.
///
/// Tag names are normalized and tags that normalize to nothing are dropped.
/// The result keeps metadata order; use [`sort_by_frequency`] before sampling.
pub fn parse_tags(metadata: &Metadata) -> Vec<TagFrequency> {
    let mut tags = Vec::new();

    for key in TAG_FREQUENCY_KEYS {
        if let Some(raw) = metadata.get(key) {
            parse_frequency_table(key, raw, &mut tags);
        }
    }

    if let Some(raw) = metadata.get(CHARACTER_TAGS_KEY) {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => {
                for name in items.iter().filter_map(Value::as_str) {
                    push_tag(&mut tags, name, 1.0, TagKind::Character);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(key = CHARACTER_TAGS_KEY, error = %e, "ignoring invalid JSON"),
        }
    }

    if let Some(name) = metadata.get(DATASET_NAME_KEY) {
        push_tag(&mut tags, &format!("dataset: {name}"), 1.0, TagKind::Dataset);
    }

    if let Some(raw) = metadata.get(NETWORK_ARGS_KEY) {
        match serde_json::from_str::<Value>(raw) {
            Ok(args) => {
                if let Some(module) = args.get("network_module") {
                    let module = match module {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    push_tag(&mut tags, &format!("network: {module}"), 1.0, TagKind::Network);
                }
            }
            Err(e) => tracing::debug!(key = NETWORK_ARGS_KEY, error = %e, "ignoring invalid JSON"),
        }
    }

    tags
}

/// Sorts tags by descending frequency.
///
/// The sort is stable, so tags with equal counts keep their metadata order.
pub fn sort_by_frequency(tags: &mut [TagFrequency]) {
    tags.sort_by(|a, b| b.frequency().total_cmp(&a.frequency()));
}

fn parse_frequency_table(key: &str, raw: &str, tags: &mut Vec<TagFrequency>) {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "tag metadata is not JSON, using it as a single tag");
            push_tag(tags, raw, 1.0, TagKind::Training);
            return;
        }
    };

    match value {
        Value::Object(entries) => {
            for (tag, freq) in &entries {
                match freq {
                    // dataset directory -> {tag: count}
                    Value::Object(inner) => {
                        for (inner_tag, inner_freq) in inner {
                            push_counted(tags, inner_tag, inner_freq);
                        }
                    }
                    _ => push_counted(tags, tag, freq),
                }
            }
        }
        Value::Array(items) => {
            for item in &items {
                match item {
                    Value::String(tag) => push_tag(tags, tag, 1.0, TagKind::Training),
                    Value::Object(obj) => {
                        if let Some(name) = obj.get("name").and_then(Value::as_str) {
                            let freq = obj
                                .get("frequency")
                                .and_then(Value::as_f64)
                                .unwrap_or(1.0);
                            push_tag(tags, name, freq, TagKind::Training);
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => tracing::debug!(key, "tag metadata is neither an object nor an array"),
    }
}

fn push_counted(tags: &mut Vec<TagFrequency>, tag: &str, freq: &Value) {
    match freq.as_f64() {
        Some(freq) => push_tag(tags, tag, freq, TagKind::Training),
        None => tracing::debug!(tag, "skipping tag with non-numeric frequency"),
    }
}

fn push_tag(tags: &mut Vec<TagFrequency>, tag: &str, frequency: f64, kind: TagKind) {
    let normalized = TagNormalizer::normalize_tag(tag);
    if normalized.is_empty() {
        return;
    }
    tags.push(TagFrequency::with_kind(normalized, frequency, kind));
}
