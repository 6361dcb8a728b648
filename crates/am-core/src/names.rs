//! Name cleanup and comparison helpers.
//!
//! Element names come straight out of Markdown cells, so they carry emphasis
//! markers, links and irregular spacing. Comparison always happens on the
//! normalized form: lower-case, every non-alphanumeric character replaced by a
//! space, whitespace collapsed.

const PLACEHOLDERS: [&str; 9] = ["", "-", "--", "—", "n/a", "na", "tbd", "none", "null"];

/// Normalize a name for comparison.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for lowered in raw.chars().flat_map(char::to_lowercase) {
        if lowered.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(lowered);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Strip Markdown decoration from a table cell and collapse whitespace.
#[must_use]
pub fn clean_cell_text(raw: &str) -> String {
    let without_links = strip_markdown_links(raw);
    let replaced = without_links
        .replace("<br/>", " ")
        .replace("<br>", " ")
        .replace('`', "")
        .replace("**", "")
        .replace("__", "");
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|ch: char| ch == '*' || ch == '_')
        .trim()
        .to_string()
}

/// True when a cell carries no usable value (`-`, `N/A`, `TBD`, ...).
#[must_use]
pub fn is_placeholder(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    PLACEHOLDERS.contains(&lowered.as_str())
}

/// True when `needle` appears in `haystack` as a run of whole words.
///
/// Both arguments must already be normalized with [`normalize_name`].
#[must_use]
pub fn contains_word_run(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let hay: Vec<&str> = haystack.split(' ').collect();
    let pattern: Vec<&str> = needle.split(' ').collect();
    if pattern.len() > hay.len() {
        return false;
    }
    hay.windows(pattern.len()).any(|window| window == pattern.as_slice())
}

/// Split a comma or semicolon separated cell into cleaned, non-placeholder parts.
#[must_use]
pub fn split_list_cell(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(clean_cell_text)
        .filter(|part| !is_placeholder(part))
        .collect()
}

fn strip_markdown_links(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('[') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find("](") else {
            break;
        };
        let after_target = &after_open[close + 2..];
        let Some(paren) = after_target.find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&after_open[..close]);
        rest = &after_target[paren + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_case_punctuation_and_spacing() {
        assert_eq!(normalize_name("  API-Gateway  (v2) "), "api gateway v2");
        assert_eq!(normalize_name("Order_Service"), "order service");
        assert_eq!(normalize_name("***"), "");
    }

    #[test]
    fn cleans_markdown_decoration() {
        assert_eq!(clean_cell_text("**CRM  System**"), "CRM System");
        assert_eq!(clean_cell_text("[Billing](./billing.md)"), "Billing");
        assert_eq!(clean_cell_text("`redis` cache"), "redis cache");
        assert_eq!(clean_cell_text("Line one<br>line two"), "Line one line two");
        assert_eq!(clean_cell_text("[unclosed link"), "[unclosed link");
    }

    #[test]
    fn recognizes_placeholders() {
        for value in ["", " - ", "N/A", "tbd", "None", "—"] {
            assert!(is_placeholder(value), "{value:?}");
        }
        assert!(!is_placeholder("Node"));
    }

    #[test]
    fn word_runs_respect_word_boundaries() {
        assert!(contains_word_run("api gateway cluster", "api gateway"));
        assert!(contains_word_run("api gateway", "api gateway"));
        assert!(!contains_word_run("rapid gateway", "api gateway"));
        assert!(!contains_word_run("api", "api gateway"));
        assert!(!contains_word_run("api", ""));
    }

    #[test]
    fn splits_list_cells() {
        assert_eq!(
            split_list_cell("REST API, GraphQL; - ,  "),
            vec!["REST API".to_string(), "GraphQL".to_string()]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_normalize_is_idempotent(input in ".{0,64}") {
            let once = normalize_name(&input);
            prop_assert_eq!(normalize_name(&once), once.clone());
            prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
            prop_assert!(!once.contains("  "));
        }

        #[test]
        fn prop_clean_cell_text_is_total(input in ".{0,64}") {
            let cleaned = clean_cell_text(&input);
            prop_assert!(!cleaned.contains('`'));
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        }
    }
}
