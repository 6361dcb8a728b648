use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Flat key/value view of a document's YAML front matter.
///
/// Keys keep their original spelling; lookups through [`FrontMatter::get`]
/// ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    entries: BTreeMap<String, String>,
}

impl FrontMatter {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str).or_else(|| {
            self.entries
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.as_str())
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    fn insert(&mut self, key: String, value: String) {
        self.entries.entry(key).or_insert(value);
    }
}

/// Parse the leading `---` block of a document.
///
/// Valid YAML is read through `serde_yaml`; anything else falls back to plain
/// `key: value` lines. Never fails: a document without front matter yields an
/// empty map.
#[must_use]
pub fn parse_front_matter(input: &str) -> FrontMatter {
    let (_, payload) = split_front_matter_block(input);
    let Some(payload) = payload else {
        return FrontMatter::default();
    };

    match serde_yaml::from_str::<Value>(payload) {
        Ok(Value::Mapping(mapping)) => from_yaml_mapping(&mapping),
        Ok(Value::Null) => FrontMatter::default(),
        _ => from_plain_lines(payload),
    }
}

/// Split `input` into `(body, front_matter_payload)`.
///
/// The payload is only recognized when the very first line is `---` and a
/// closing `---` line follows.
#[must_use]
pub fn split_front_matter_block(input: &str) -> (&str, Option<&str>) {
    let input_without_bom = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut segments = input_without_bom.split_inclusive('\n');
    let Some(first_segment) = segments.next() else {
        return (input, None);
    };
    if first_segment.trim_end_matches(['\r', '\n']).trim_end() != "---" {
        return (input, None);
    }

    let payload_start = first_segment.len();
    let mut offset = payload_start;
    for segment in segments {
        let line = segment.trim_end_matches(['\r', '\n']);
        let segment_start = offset;
        offset += segment.len();
        if line.trim_end() == "---" {
            let payload = input_without_bom[payload_start..segment_start].trim_matches(['\r', '\n']);
            return (&input_without_bom[offset..], Some(payload));
        }
    }

    (input, None)
}

fn from_yaml_mapping(mapping: &serde_yaml::Mapping) -> FrontMatter {
    let mut front_matter = FrontMatter::default();
    for (key, value) in mapping {
        let Some(key) = scalar_text(key) else {
            continue;
        };
        let value = match value {
            Value::Sequence(items) => items
                .iter()
                .filter_map(scalar_text)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Value::Mapping(_) => continue,
            other => match scalar_text(other) {
                Some(text) => text,
                None => continue,
            },
        };
        let key = key.trim().to_string();
        if !key.is_empty() {
            front_matter.insert(key, value.trim().to_string());
        }
    }
    front_matter
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => Some(text.clone()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn from_plain_lines(payload: &str) -> FrontMatter {
    let mut front_matter = FrontMatter::default();
    for line in payload.lines() {
        // Indented lines belong to nested structures.
        if line.starts_with([' ', '\t']) {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = strip_quotes(key.trim()).trim();
        if key.is_empty() {
            continue;
        }
        front_matter.insert(key.to_string(), plain_value(value.trim()));
    }
    front_matter
}

fn plain_value(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        return inner
            .split(',')
            .map(|item| strip_quotes(item.trim()))
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
    }
    if raw == "null" || raw == "~" {
        return String::new();
    }
    strip_quotes(raw).to_string()
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_front_matter_yields_empty_map() {
        assert!(parse_front_matter("# Title\n\nphase: B\n").is_empty());
        assert!(parse_front_matter("").is_empty());
        assert!(parse_front_matter("---\nphase: B\n").is_empty());
    }

    #[test]
    fn reads_yaml_scalars_and_lists() {
        let doc = "---\nphase: \"B\"\ntitle: 'Business Architecture'\nversion: 2\ntags: [arch, business]\nowner:\n---\n# Body\n";
        let fm = parse_front_matter(doc);
        assert_eq!(fm.get("phase"), Some("B"));
        assert_eq!(fm.get("Title"), Some("Business Architecture"));
        assert_eq!(fm.get("version"), Some("2"));
        assert_eq!(fm.get("tags"), Some("arch, business"));
        assert_eq!(fm.get("owner"), Some(""));
    }

    #[test]
    fn skips_nested_maps() {
        let doc = "---\nphase: D\nreview:\n  by: someone\n  on: 2024-01-01\n---\n";
        let fm = parse_front_matter(doc);
        assert_eq!(fm.get("phase"), Some("D"));
        assert_eq!(fm.get("review"), None);
        assert_eq!(fm.len(), 1);
    }

    #[test]
    fn falls_back_to_plain_lines_on_invalid_yaml() {
        let doc = "---\nphase: \"C\"\ntitle: Apps: the sequel\nthis line has no colon\n  nested: skipped\nlist: ['a', b]\n---\n";
        let fm = parse_front_matter(doc);
        assert_eq!(fm.get("phase"), Some("C"));
        assert_eq!(fm.get("title"), Some("Apps: the sequel"));
        assert_eq!(fm.get("nested"), None);
        assert_eq!(fm.get("list"), Some("a, b"));
    }

    #[test]
    fn split_returns_body_after_closing_marker() {
        let (body, payload) = split_front_matter_block("---\na: 1\n---\nbody\n");
        assert_eq!(payload, Some("a: 1"));
        assert_eq!(body, "body\n");

        let (body, payload) = split_front_matter_block("\u{feff}---\r\na: 1\r\n---\r\nrest");
        assert_eq!(payload, Some("a: 1"));
        assert_eq!(body, "rest");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_front_matter_is_total(input in "(---\n)?[a-z:'\" \n\\[\\],-]{0,96}(\n---\n)?") {
            let fm = parse_front_matter(&input);
            for (key, _) in fm.iter() {
                prop_assert!(!key.trim().is_empty());
            }
        }
    }
}
