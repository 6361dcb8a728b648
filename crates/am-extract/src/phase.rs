use am_core::normalize_name;
use am_parser::FrontMatter;
use serde::{Deserialize, Serialize};

/// Architecture development phase a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Preliminary,
    Vision,
    Business,
    InformationSystems,
    Technology,
    Opportunities,
    Migration,
    Governance,
    Requirements,
}

/// Front-matter keys consulted for the phase, first recognized value wins.
pub const PHASE_KEYS: [&str; 5] = ["phase", "adm_phase", "togaf_phase", "category", "type"];

struct PhaseSignals {
    phase: Phase,
    values: &'static [&'static str],
    /// Word prefixes of the file name; the last word may be cut short.
    file_fragments: &'static [&'static str],
}

const SIGNALS: [PhaseSignals; 9] = [
    PhaseSignals {
        phase: Phase::Preliminary,
        values: &["preliminary", "principles", "p", "0"],
        file_fragments: &["principle", "preliminary"],
    },
    PhaseSignals {
        phase: Phase::Vision,
        values: &["a", "vision", "architecture vision", "stakeholders"],
        file_fragments: &["vision", "stakeholder"],
    },
    PhaseSignals {
        phase: Phase::Business,
        values: &["b", "business", "business architecture"],
        file_fragments: &["business"],
    },
    PhaseSignals {
        phase: Phase::InformationSystems,
        values: &["c", "application", "data", "information systems"],
        file_fragments: &["application", "information", "data arch"],
    },
    PhaseSignals {
        phase: Phase::Technology,
        values: &["d", "technology", "infrastructure"],
        file_fragments: &["technology", "infrastructure"],
    },
    PhaseSignals {
        phase: Phase::Opportunities,
        values: &["e", "opportunities", "solutions", "building blocks"],
        file_fragments: &["opportunit", "solution", "building block"],
    },
    PhaseSignals {
        phase: Phase::Migration,
        values: &["f", "migration", "roadmap"],
        file_fragments: &["migration", "roadmap"],
    },
    PhaseSignals {
        phase: Phase::Governance,
        values: &["g", "h", "governance", "decisions", "risks", "adr"],
        file_fragments: &["decision", "adr", "risk", "governance"],
    },
    PhaseSignals {
        phase: Phase::Requirements,
        values: &["requirements", "rm", "requirements management"],
        file_fragments: &["requirement"],
    },
];

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preliminary => "preliminary",
            Self::Vision => "vision",
            Self::Business => "business",
            Self::InformationSystems => "information-systems",
            Self::Technology => "technology",
            Self::Opportunities => "opportunities",
            Self::Migration => "migration",
            Self::Governance => "governance",
            Self::Requirements => "requirements",
        }
    }

    /// Phase of a document: declared front-matter value first, file name second.
    #[must_use]
    pub fn detect(front_matter: &FrontMatter, document_name: &str) -> Option<Self> {
        PHASE_KEYS
            .iter()
            .filter_map(|key| front_matter.get(key))
            .find_map(Self::from_declared)
            .or_else(|| Self::from_file_name(document_name))
    }

    /// Read a declared phase such as `B`, `Phase C` or `Technology Architecture`.
    #[must_use]
    pub fn from_declared(value: &str) -> Option<Self> {
        let normalized = normalize_name(value);
        let normalized = normalized
            .strip_prefix("phase ")
            .unwrap_or(&normalized)
            .to_string();
        if normalized.is_empty() {
            return None;
        }

        if let Some(signals) = SIGNALS
            .iter()
            .find(|signals| signals.values.contains(&normalized.as_str()))
        {
            return Some(signals.phase);
        }

        // `b business architecture`, `technology architecture`, ...
        let first_word = normalized.split(' ').next().unwrap_or_default();
        SIGNALS
            .iter()
            .find(|signals| signals.values.contains(&first_word))
            .map(|signals| signals.phase)
    }

    #[must_use]
    pub fn from_file_name(document_name: &str) -> Option<Self> {
        let file_name = document_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(document_name);
        let normalized = normalize_name(file_name);
        let words: Vec<&str> = normalized.split(' ').collect();
        SIGNALS
            .iter()
            .find(|signals| {
                signals
                    .file_fragments
                    .iter()
                    .any(|fragment| starts_words(&words, fragment))
            })
            .map(|signals| signals.phase)
    }
}

/// True when `fragment` lines up with the start of a word in `words`.
fn starts_words(words: &[&str], fragment: &str) -> bool {
    let pattern: Vec<&str> = fragment.split(' ').collect();
    let Some((last, whole)) = pattern.split_last() else {
        return false;
    };
    words.windows(pattern.len()).any(|window| {
        window[..whole.len()] == *whole && window[whole.len()].starts_with(last)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_parser::parse_front_matter;

    #[test]
    fn declared_values_are_normalized() {
        assert_eq!(Phase::from_declared("B"), Some(Phase::Business));
        assert_eq!(Phase::from_declared("Phase C"), Some(Phase::InformationSystems));
        assert_eq!(Phase::from_declared("phase-d"), Some(Phase::Technology));
        assert_eq!(Phase::from_declared("Architecture Vision"), Some(Phase::Vision));
        assert_eq!(Phase::from_declared("Technology Architecture"), Some(Phase::Technology));
        assert_eq!(Phase::from_declared("Requirements Management"), Some(Phase::Requirements));
        assert_eq!(Phase::from_declared("ADR"), Some(Phase::Governance));
        assert_eq!(Phase::from_declared("meeting notes"), None);
        assert_eq!(Phase::from_declared(""), None);
    }

    #[test]
    fn file_names_are_a_fallback() {
        assert_eq!(Phase::from_file_name("arch/02-business-architecture.md"), Some(Phase::Business));
        assert_eq!(Phase::from_file_name("Technology.md"), Some(Phase::Technology));
        assert_eq!(Phase::from_file_name("adr/0001-use-postgres.md"), None);
        assert_eq!(Phase::from_file_name("risks.md"), Some(Phase::Governance));
        assert_eq!(Phase::from_file_name("notes.md"), None);
        assert_eq!(Phase::from_file_name("data-architecture.md"), Some(Phase::InformationSystems));
        assert_eq!(Phase::from_file_name("05_Building_Blocks.md"), Some(Phase::Opportunities));
    }

    #[test]
    fn file_name_fragments_match_at_word_starts() {
        assert_eq!(Phase::from_file_name("adr-001.md"), Some(Phase::Governance));
        assert_eq!(Phase::from_file_name("decision-log.md"), Some(Phase::Governance));
        assert_eq!(Phase::from_file_name("quadrant.md"), None);
        assert_eq!(Phase::from_file_name("metadata-notes.md"), None);
        assert_eq!(Phase::from_file_name("misinformation.md"), None);
    }

    #[test]
    fn front_matter_wins_over_file_name() {
        let fm = parse_front_matter("---\ntogaf_phase: D\n---\n");
        assert_eq!(Phase::detect(&fm, "business.md"), Some(Phase::Technology));

        let fm = parse_front_matter("---\ntitle: Nothing useful\n---\n");
        assert_eq!(Phase::detect(&fm, "roadmap.md"), Some(Phase::Migration));

        let fm = parse_front_matter("---\ncategory: diary\n---\n");
        assert_eq!(Phase::detect(&fm, "application-landscape.md"), Some(Phase::InformationSystems));
    }

    #[test]
    fn unrecognized_phase_value_falls_through_to_later_keys() {
        let fm = parse_front_matter("---\nphase: draft\ncategory: technology\n---\n");
        assert_eq!(Phase::detect(&fm, "notes.md"), Some(Phase::Technology));

        let fm = parse_front_matter("---\nphase: draft\ntype: note\n---\n");
        assert_eq!(Phase::detect(&fm, "roadmap.md"), Some(Phase::Migration));
    }
}
