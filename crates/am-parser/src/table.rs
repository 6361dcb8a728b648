use am_core::normalize_name;
use serde::{Deserialize, Serialize};

/// One Markdown pipe table, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTable {
    /// Text of the nearest heading above the table, if any.
    pub heading: Option<String>,
    /// Header cells exactly as written; duplicates and blanks are kept.
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ParsedTable {
    /// True when some header answers to `column`.
    #[must_use]
    pub fn has(&self, column: Column) -> bool {
        self.header_for(column).is_some()
    }

    /// The header that `column` resolves to in this table.
    #[must_use]
    pub fn header_for(&self, column: Column) -> Option<&str> {
        column
            .aliases()
            .iter()
            .find_map(|alias| {
                self.headers
                    .iter()
                    .find(|header| normalize_name(header) == *alias)
            })
            .map(String::as_str)
    }

    #[must_use]
    pub fn heading_mentions(&self, needle: &str) -> bool {
        self.heading
            .as_deref()
            .is_some_and(|heading| heading.to_lowercase().contains(needle))
    }
}

/// A data row: `(header, cell)` pairs in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    cells: Vec<(String, String)>,
}

impl TableRow {
    #[must_use]
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    /// Cell text for a known column, trying its aliases in priority order.
    #[must_use]
    pub fn get(&self, column: Column) -> Option<&str> {
        self.position(column).map(|index| self.cells[index].1.as_str())
    }

    /// Cell text of the first header matching `column`, but only if non-blank.
    #[must_use]
    pub fn value(&self, column: Column) -> Option<&str> {
        self.get(column)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Header text that `column` resolved to for this row.
    #[must_use]
    pub fn header(&self, column: Column) -> Option<&str> {
        self.position(column).map(|index| self.cells[index].0.as_str())
    }

    /// Lookup by raw header text, ignoring case and punctuation.
    #[must_use]
    pub fn cell(&self, header: &str) -> Option<&str> {
        let wanted = normalize_name(header);
        self.cells
            .iter()
            .find(|(candidate, _)| normalize_name(candidate) == wanted)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .map(|(header, value)| (header.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn position(&self, column: Column) -> Option<usize> {
        column.aliases().iter().find_map(|alias| {
            self.cells
                .iter()
                .position(|(header, _)| normalize_name(header) == *alias)
        })
    }
}

/// Columns the extraction rules know by name.
///
/// Each variant answers to a list of header aliases, compared after
/// [`normalize_name`]. Earlier aliases win when a table carries several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Principle,
    Stakeholder,
    Concerns,
    Goal,
    Driver,
    Process,
    Actor,
    Service,
    Owner,
    Component,
    Interfaces,
    DataEntity,
    Technology,
    Sbb,
    Abb,
    WorkPackage,
    Deliverable,
    Plateau,
    Decision,
    Risk,
    Id,
    Title,
    RequirementType,
    Gap,
    Baseline,
    Target,
    Status,
    Realizes,
    Serves,
    DependsOn,
}

impl Column {
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["name", "title"],
            Self::Principle => &["principle", "principle name", "principle title", "name", "title"],
            Self::Stakeholder => &["stakeholder", "stakeholder name", "stakeholder group", "role", "name"],
            Self::Concerns => &["concerns", "concern", "key concerns", "primary concerns"],
            Self::Goal => &["goal", "goals", "goal name", "objective", "business goal"],
            Self::Driver => &["driver", "drivers", "driver name", "business driver"],
            Self::Process => &["process", "business process", "process name", "capability"],
            Self::Actor => &["actor", "business actor", "actor name"],
            Self::Service => &["service", "business service", "service name"],
            Self::Owner => &["owner", "process owner", "responsible", "accountable"],
            Self::Component => &[
                "component",
                "application",
                "application component",
                "component name",
                "application name",
                "system",
                "name",
            ],
            Self::Interfaces => &["interfaces", "interface", "apis", "api", "integrations"],
            Self::DataEntity => &["data entity", "entity", "data object", "data entities"],
            Self::Technology => &[
                "component",
                "technology",
                "technology component",
                "platform",
                "infrastructure",
                "name",
            ],
            Self::Sbb => &["sbb", "solution building block", "solution", "sbb name"],
            Self::Abb => &[
                "abb",
                "architecture building block",
                "abb name",
                "requirement",
                "addresses requirement",
                "realizes requirement",
            ],
            Self::WorkPackage => &["work package", "workpackage", "initiative", "project"],
            Self::Deliverable => &["deliverable", "deliverables", "output"],
            Self::Plateau => &["plateau", "transition", "transition architecture", "transition state"],
            Self::Decision => &["decision", "decision title", "adr title"],
            Self::Risk => &["risk", "risk description", "risk name"],
            Self::Id => &[
                "id",
                "ref",
                "reference",
                "req id",
                "requirement id",
                "decision id",
                "risk id",
                "adr",
                "key",
            ],
            Self::Title => &["title", "name", "requirement", "description", "summary", "statement"],
            Self::RequirementType => &["type", "category", "kind", "classification", "requirement type"],
            Self::Gap => &["gap", "gap description", "identified gap", "gaps"],
            Self::Baseline => &["baseline", "current", "current state", "as is", "baseline state"],
            Self::Target => &["target", "target state", "to be", "future state"],
            Self::Status => &["status", "lifecycle", "migration", "change", "state", "migration status"],
            Self::Realizes => &["realizes", "realises", "implements"],
            Self::Serves => &["serves", "supports", "used by"],
            Self::DependsOn => &["depends on", "dependencies", "hosted on", "runs on", "dependency"],
        }
    }
}

/// Find every pipe table in `input`, skipping fenced code blocks.
///
/// A table needs a header row and a `|---|` separator row; it continues
/// while lines start with `|`. Tables without data rows are dropped.
#[must_use]
pub fn parse_tables(input: &str) -> Vec<ParsedTable> {
    let lines: Vec<&str> = input.lines().collect();
    let mut tables = Vec::new();
    let mut heading: Option<String> = None;
    let mut in_fence = false;
    let mut index = 0;

    while index < lines.len() {
        let trimmed = lines[index].trim();
        if is_fence(trimmed) {
            in_fence = !in_fence;
            index += 1;
            continue;
        }
        if in_fence {
            index += 1;
            continue;
        }
        if let Some(text) = heading_text(trimmed) {
            heading = Some(text);
            index += 1;
            continue;
        }

        let separator = lines.get(index + 1).map(|line| line.trim());
        if trimmed.starts_with('|') && separator.is_some_and(is_separator_row) {
            let headers: Vec<String> = split_row(trimmed)
                .into_iter()
                .map(|cell| cell.trim().to_string())
                .collect();
            let mut rows = Vec::new();
            index += 2;
            while let Some(line) = lines.get(index).map(|line| line.trim()) {
                if !line.starts_with('|') {
                    break;
                }
                rows.push(build_row(&headers, split_row(line)));
                index += 1;
            }
            if !rows.is_empty() {
                tables.push(ParsedTable {
                    heading: heading.clone(),
                    headers,
                    rows,
                });
            }
            continue;
        }

        index += 1;
    }

    tables
}

fn build_row(headers: &[String], cells: Vec<String>) -> TableRow {
    let mut cells = cells.into_iter();
    TableRow::new(
        headers
            .iter()
            .map(|header| {
                let value = cells.next().map(|cell| cell.trim().to_string());
                (header.clone(), value.unwrap_or_default())
            })
            .collect(),
    )
}

/// Split a `| a | b |` line on unescaped pipes; `\|` becomes a literal pipe.
fn split_row(line: &str) -> Vec<String> {
    let body = line.strip_prefix('|').unwrap_or(line);
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();
    let mut closed = false;

    while let Some(ch) = chars.next() {
        closed = false;
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => {
                cells.push(std::mem::take(&mut current));
                closed = true;
            }
            _ => current.push(ch),
        }
    }
    if !closed && !current.trim().is_empty() {
        cells.push(current);
    }
    cells
}

fn is_separator_row(line: &str) -> bool {
    if !line.starts_with('|') || !line.contains('-') {
        return false;
    }
    split_row(line).iter().all(|cell| {
        let cell = cell.trim();
        !cell.is_empty() && cell.chars().all(|ch| matches!(ch, '-' | ':'))
    })
}

fn heading_text(line: &str) -> Option<String> {
    let level = line.chars().take_while(|ch| *ch == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub(crate) fn is_fence(line: &str) -> bool {
    line.starts_with("```") || line.starts_with("~~~")
}
