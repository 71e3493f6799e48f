//! Survey schema mapping.
//!
//! Column headers are human-authored strings such as
//! `"4.1 Ameaças aos direitos humanos... [Imediato (2025)]"`. This module turns
//! them into a [`SchemaIndex`] (dimension → period → headers) and, on top of
//! that, a [`VariableCatalog`] that groups the headers of one question across
//! periods by its numeric code.

use crate::config::{AnalysisConfig, DimensionPrefix, PeriodPhrases};
use crate::types::{Dimension, TimePeriod, VariableCode};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([0-9]+\.[0-9]+)").expect("valid code regex"));

// A code ends at whitespace or end of text; `1.5°C` is description text.
static LEADING_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[0-9]+\.[0-9]+(\s+|$)").expect("valid leading code regex"));

/// Symbols that make a leading number a measurement rather than a code.
const UNIT_SYMBOLS: [char; 3] = ['°', '%', '‰'];

// Closing bracket is optional: the export truncates long headers mid-annotation.
static TRAILING_ANNOTATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\[([^\[\]]*)\]?\s*$").expect("valid annotation regex")
});

const LABEL_KEYWORDS: &[&str] = &[
    "crise",
    "risco",
    "impacto",
    "consequência",
    "contaminação",
    "disrupção",
];

/// Why a header is missing from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Not a survey question (timestamp, organisation, ...).
    NoDimensionPrefix,
    /// Belongs to a dimension but names no known time period.
    NoPeriodPhrase,
}

impl ExclusionReason {
    pub const fn description(self) -> &'static str {
        match self {
            Self::NoDimensionPrefix => "no dimension prefix",
            Self::NoPeriodPhrase => "no period phrase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedHeader {
    /// Zero-based column position in the input.
    pub position: usize,
    pub header: String,
    pub reason: ExclusionReason,
}

/// Headers grouped by dimension and period.
///
/// Every (dimension, period) cell exists, possibly empty, and each header
/// appears in at most one cell. Built once per load and read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaIndex {
    cells: BTreeMap<Dimension, BTreeMap<TimePeriod, Vec<String>>>,
    /// Input column position of each header in `cells`, same shape.
    positions: BTreeMap<Dimension, BTreeMap<TimePeriod, Vec<usize>>>,
    excluded: Vec<ExcludedHeader>,
}

impl Default for SchemaIndex {
    fn default() -> Self {
        fn empty<T>() -> BTreeMap<Dimension, BTreeMap<TimePeriod, Vec<T>>> {
            Dimension::ALL
                .iter()
                .map(|d| (*d, TimePeriod::ALL.iter().map(|p| (*p, Vec::new())).collect()))
                .collect()
        }
        Self {
            cells: empty(),
            positions: empty(),
            excluded: Vec::new(),
        }
    }
}

impl SchemaIndex {
    /// Build the index with the dimension prefixes and period phrases of `config`.
    pub fn from_config<S: AsRef<str>>(headers: &[S], config: &AnalysisConfig) -> Self {
        build_index(headers, &config.dimension_prefixes, &config.period_phrases)
    }

    pub fn headers(&self, dimension: Dimension, period: TimePeriod) -> &[String] {
        self.cells
            .get(&dimension)
            .and_then(|periods| periods.get(&period))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All cells in (dimension, period) order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, TimePeriod, &[String])> + '_ {
        self.cells.iter().flat_map(|(dimension, periods)| {
            periods
                .iter()
                .map(move |(period, headers)| (*dimension, *period, headers.as_slice()))
        })
    }

    /// Every indexed column as (dimension, period, position, header).
    ///
    /// Positions tell apart columns whose headers are identical.
    pub fn columns(&self) -> impl Iterator<Item = (Dimension, TimePeriod, usize, &str)> + '_ {
        self.iter().flat_map(move |(dimension, period, headers)| {
            let positions = self
                .positions
                .get(&dimension)
                .and_then(|p| p.get(&period))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            positions
                .iter()
                .zip(headers)
                .map(move |(position, header)| (dimension, period, *position, header.as_str()))
        })
    }

    pub fn dimension_total(&self, dimension: Dimension) -> usize {
        self.cells
            .get(&dimension)
            .map(|periods| periods.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn total_indexed(&self) -> usize {
        self.cells.keys().map(|d| self.dimension_total(*d)).sum()
    }

    /// Cell holding `header`, if it was indexed.
    pub fn locate(&self, header: &str) -> Option<(Dimension, TimePeriod)> {
        self.iter()
            .find(|(_, _, headers)| headers.iter().any(|h| h == header))
            .map(|(d, p, _)| (d, p))
    }

    /// Every header left out of the index, in input order.
    pub fn excluded(&self) -> &[ExcludedHeader] {
        &self.excluded
    }

    /// Survey headers that matched a dimension but no period phrase.
    pub fn unassigned(&self) -> impl Iterator<Item = &ExcludedHeader> {
        self.excluded
            .iter()
            .filter(|e| e.reason == ExclusionReason::NoPeriodPhrase)
    }

    /// Non-survey columns such as timestamps or organisation fields.
    pub fn metadata_columns(&self) -> impl Iterator<Item = &ExcludedHeader> {
        self.excluded
            .iter()
            .filter(|e| e.reason == ExclusionReason::NoDimensionPrefix)
    }
}

/// Group headers into dimension → period cells.
///
/// A header belongs to a dimension when it starts with that dimension's
/// prefix (leading whitespace ignored). Period phrase sets are tried in the
/// given order and the first set with a matching phrase wins. Phrases are
/// looked up in the trailing `[...]` annotation first and in the whole header
/// only when the annotation is absent or matches nothing.
pub fn build_index<S: AsRef<str>>(
    headers: &[S],
    dimension_prefixes: &[DimensionPrefix],
    period_phrase_sets: &[PeriodPhrases],
) -> SchemaIndex {
    let mut index = SchemaIndex::default();

    for (position, header) in headers.iter().enumerate() {
        let header = header.as_ref();
        let Some(dimension) = match_dimension(header, dimension_prefixes) else {
            debug!(position, header, "skipping non-survey column");
            index.excluded.push(ExcludedHeader {
                position,
                header: header.to_string(),
                reason: ExclusionReason::NoDimensionPrefix,
            });
            continue;
        };
        let Some(period) = match_period(header, period_phrase_sets) else {
            warn!(position, header, %dimension, "survey column names no known period");
            index.excluded.push(ExcludedHeader {
                position,
                header: header.to_string(),
                reason: ExclusionReason::NoPeriodPhrase,
            });
            continue;
        };
        index
            .cells
            .entry(dimension)
            .or_default()
            .entry(period)
            .or_default()
            .push(header.to_string());
        index
            .positions
            .entry(dimension)
            .or_default()
            .entry(period)
            .or_default()
            .push(position);
    }

    for dimension in Dimension::ALL {
        info!(%dimension, variables = index.dimension_total(dimension), "mapped dimension");
        for period in TimePeriod::ALL {
            debug!(
                %dimension,
                %period,
                variables = index.headers(dimension, period).len(),
                "mapped period"
            );
        }
    }

    index
}

/// Dimension whose prefix the header starts with.
pub fn match_dimension(header: &str, dimension_prefixes: &[DimensionPrefix]) -> Option<Dimension> {
    let header = header.trim_start();
    dimension_prefixes
        .iter()
        .find(|p| !p.prefix.is_empty() && header.starts_with(p.prefix.as_str()))
        .map(|p| p.dimension)
}

/// First period (in phrase-set order) whose phrases occur in the header.
pub fn match_period(header: &str, period_phrase_sets: &[PeriodPhrases]) -> Option<TimePeriod> {
    let find_in = |text: &str| {
        period_phrase_sets
            .iter()
            .find(|set| {
                set.phrases
                    .iter()
                    .any(|phrase| !phrase.is_empty() && text.contains(phrase.as_str()))
            })
            .map(|set| set.period)
    };
    period_annotation(header)
        .and_then(find_in)
        .or_else(|| find_in(header))
}

/// Text inside the trailing `[...]`, tolerating a missing `]`.
pub fn period_annotation(header: &str) -> Option<&str> {
    TRAILING_ANNOTATION_RE
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Leading `N.N` code of a header.
pub fn extract_variable_code(header: &str) -> Option<VariableCode> {
    let caps = CODE_RE.captures(header)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Header text without the leading code and the trailing period annotation,
/// whitespace collapsed.
///
/// Stripping repeats until nothing changes, so the result never carries a
/// leading code or trailing annotation and a second call is a no-op. A
/// number glued to text (`1.5°C`) or followed by a unit symbol (`1.5 °C`)
/// is not a code. Any trailing `[...]` group is stripped, including one that
/// belongs to the description.
pub fn extract_description(header: &str) -> String {
    let mut current = collapse_whitespace(header);
    loop {
        let stripped = strip_leading_code(&current);
        let stripped = TRAILING_ANNOTATION_RE.replace(stripped, "");
        let next = collapse_whitespace(&stripped);
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Short label for table cells and chart axes.
///
/// Descriptions of up to five words are kept whole. Longer ones keep the
/// first four words plus later risk keywords or long words, five at most,
/// with `...` marking the cut.
pub fn short_label(header: &str) -> String {
    let description = extract_description(header);
    let words: Vec<&str> = description.split_whitespace().collect();
    if words.len() <= 5 {
        return description;
    }

    let mut kept: Vec<&str> = Vec::with_capacity(5);
    for word in &words {
        if kept.len() >= 5 {
            break;
        }
        if kept.len() < 4 || is_label_keyword(word) || word.chars().count() > 8 {
            kept.push(word);
        }
    }

    let mut label = kept.join(" ");
    if kept.len() < words.len() {
        label.push_str("...");
    }
    label
}

fn strip_leading_code(s: &str) -> &str {
    match LEADING_CODE_RE.find(s) {
        Some(code) if !s[code.end()..].starts_with(&UNIT_SYMBOLS[..]) => &s[code.end()..],
        _ => s,
    }
}

fn is_label_keyword(word: &str) -> bool {
    let bare: String = word
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    LABEL_KEYWORDS.contains(&bare.as_str())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One survey question, across all periods.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub code: VariableCode,
    pub dimension: Dimension,
    /// Canonical description: the first one seen in period order, replaced
    /// by a longer variant it is a truncation of.
    pub description: String,
    pub headers: BTreeMap<TimePeriod, Vec<String>>,
    /// Every distinct description seen for this code.
    pub descriptions: BTreeSet<String>,
}

impl CatalogEntry {
    pub fn label(&self) -> String {
        self.headers
            .values()
            .flatten()
            .next()
            .map(|h| short_label(h))
            .unwrap_or_else(|| self.description.clone())
    }

    /// First header for `period`; further ones are reported as duplicates.
    pub fn header_for(&self, period: TimePeriod) -> Option<&str> {
        self.headers
            .get(&period)
            .and_then(|h| h.first())
            .map(String::as_str)
    }

    /// Whether any column asked this question for `period`.
    pub fn asked_in(&self, period: TimePeriod) -> bool {
        self.headers.contains_key(&period)
    }

    pub fn periods(&self) -> impl Iterator<Item = TimePeriod> + '_ {
        self.headers.keys().copied()
    }

    /// Descriptions that differ beyond truncation or trailing punctuation.
    pub fn has_conflict(&self) -> bool {
        let all: Vec<&String> = self.descriptions.iter().collect();
        all.iter().enumerate().any(|(i, a)| {
            all[i + 1..]
                .iter()
                .any(|b| !descriptions_agree(a.as_str(), b.as_str()))
        })
    }
}

/// Survey variables keyed by (dimension, code).
///
/// Headers that share a code are treated as the same question regardless of
/// wording; differing wordings are kept and surfaced through
/// [`VariableCatalog::conflicts`] rather than merged silently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VariableCatalog {
    entries: BTreeMap<(Dimension, VariableCode), CatalogEntry>,
    uncoded: Vec<String>,
}

impl VariableCatalog {
    pub fn from_index(index: &SchemaIndex) -> Self {
        let mut catalog = VariableCatalog::default();

        for (dimension, period, headers) in index.iter() {
            for header in headers {
                let Some(code) = extract_variable_code(header) else {
                    warn!(header = header.as_str(), "indexed column has no variable code");
                    catalog.uncoded.push(header.clone());
                    continue;
                };
                let description = extract_description(header);
                let entry = catalog
                    .entries
                    .entry((dimension, code.clone()))
                    .or_insert_with(|| CatalogEntry {
                        code,
                        dimension,
                        description: description.clone(),
                        headers: BTreeMap::new(),
                        descriptions: BTreeSet::new(),
                    });
                if is_truncation_of(&entry.description, &description) {
                    entry.description = description.clone();
                }
                entry.descriptions.insert(description);
                entry.headers.entry(period).or_default().push(header.clone());
            }
        }

        for entry in catalog.conflicts() {
            warn!(
                code = %entry.code,
                variants = entry.descriptions.len(),
                "variable description differs between columns"
            );
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn dimension_entries(&self, dimension: Dimension) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(move |((d, _), _)| *d == dimension)
            .map(|(_, entry)| entry)
    }

    pub fn get(&self, dimension: Dimension, code: &VariableCode) -> Option<&CatalogEntry> {
        self.entries.get(&(dimension, code.clone()))
    }

    /// Look a variable up by code alone.
    pub fn find(&self, code: &VariableCode) -> Option<&CatalogEntry> {
        self.entries.values().find(|e| &e.code == code)
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values().filter(|e| e.has_conflict())
    }

    /// (variable, period) cells holding more than one header.
    pub fn duplicates(&self) -> Vec<(&CatalogEntry, TimePeriod)> {
        self.entries
            .values()
            .flat_map(|entry| {
                entry
                    .headers
                    .iter()
                    .filter(|(_, headers)| headers.len() > 1)
                    .map(move |(period, _)| (entry, *period))
            })
            .collect()
    }

    pub fn uncoded(&self) -> &[String] {
        &self.uncoded
    }
}

fn normalize_description(s: &str) -> String {
    s.trim_end_matches(|c: char| c == '.' || c == '…' || c.is_whitespace())
        .to_lowercase()
}

fn descriptions_agree(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_description(a), normalize_description(b));
    a.starts_with(&b) || b.starts_with(&a)
}

fn is_truncation_of(short: &str, long: &str) -> bool {
    let (short, long) = (normalize_description(short), normalize_description(long));
    long.len() > short.len() && long.starts_with(&short)
}
