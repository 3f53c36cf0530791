use std::collections::HashMap;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::format::Format;

/// Recognizes a label header (`label` + separator glyph) at the start of a
/// trimmed line. Leading markdown decoration (`#`, `-`, `*`, `・`) and bold
/// wrappers around the label are tolerated.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    /// Anchored at the start of a trimmed line.
    leading: Option<Regex>,
    /// Matches a header at any offset.
    anywhere: Option<Regex>,
    canonical: HashMap<String, String>,
}

impl LabelMatcher {
    /// `names` yields (spelling, canonical label) pairs.
    pub fn new<'a, I>(names: I, separators: &[char]) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let canonical: HashMap<String, String> = names
            .into_iter()
            .map(|(spelling, label)| (spelling.to_string(), label.to_string()))
            .collect();
        if canonical.is_empty() || separators.is_empty() {
            return Ok(LabelMatcher {
                leading: None,
                anywhere: None,
                canonical,
            });
        }

        // Longest first: the regex alternation is leftmost-first.
        let mut spellings: Vec<&str> = canonical.keys().map(String::as_str).collect();
        spellings.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        let alternation = spellings
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let glyphs: String = separators
            .iter()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        let header = format!(r"(?:\*\*)?({alternation})(?:\*\*)?[{glyphs}](?:\*\*)?");

        Ok(LabelMatcher {
            leading: Some(Regex::new(&format!(r"^(?:[#\-*・]+[ \t]*)?{header}"))?),
            anywhere: Some(Regex::new(&header)?),
            canonical,
        })
    }

    /// Canonical label and the byte offset where its body begins.
    pub fn match_line(&self, line: &str) -> Option<(&str, usize)> {
        let caps = self.leading.as_ref()?.captures(line)?;
        let label = self.canonical.get(caps.get(1)?.as_str())?;
        Some((label.as_str(), caps.get(0)?.end()))
    }

    /// Every header in `text` wherever it sits: (label, start, end).
    pub fn find_all(&self, text: &str) -> Vec<(&str, usize, usize)> {
        let Some(re) = &self.anywhere else {
            return Vec::new();
        };
        re.captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let label = self.canonical.get(caps.get(1)?.as_str())?;
                Some((label.as_str(), whole.start(), whole.end()))
            })
            .collect()
    }
}

/// One located label header. `label == None` marks a boundary that closes
/// the open section without starting a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelHit<'a> {
    pub label: Option<&'a str>,
    /// Offset of the line holding the header.
    pub start: usize,
    /// Offset just past the separator.
    pub body_start: usize,
}

/// Lines of `text` with their byte offsets.
pub fn line_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0usize, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

/// Offset of `matched_end` (relative to the trimmed line) within the full text.
pub fn body_offset(line_start: usize, line: &str, matched_end: usize) -> usize {
    line_start + (line.len() - line.trim_start().len()) + matched_end
}

/// Trim every line, join with newlines, trim the result.
pub fn collect_body(span: &str) -> String {
    span.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Label → body, in the order labels were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(String, String)>,
}

impl SectionMap {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, body)| body.as_str())
    }

    /// A repeated label replaces the earlier body but keeps its position.
    pub fn insert(&mut self, label: &str, body: String) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 = body,
            None => self.entries.push((label.to_string(), body)),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, body) in &self.entries {
            map.serialize_entry(label, body)?;
        }
        map.end()
    }
}

/// Splits a passage into labeled sections.
#[derive(Debug, Clone)]
pub struct SectionParser {
    labels: LabelMatcher,
}

impl SectionParser {
    pub fn new(format: &Format) -> Result<Self, regex::Error> {
        Ok(SectionParser {
            labels: LabelMatcher::new(format.label_spellings(), &format.separators)?,
        })
    }

    /// Locate every label header in `raw`.
    pub fn tokenize(&self, raw: &str) -> Vec<LabelHit<'_>> {
        line_spans(raw)
            .filter_map(|(start, line)| {
                let (label, end) = self.labels.match_line(line.trim())?;
                Some(LabelHit {
                    label: Some(label),
                    start,
                    body_start: body_offset(start, line, end),
                })
            })
            .collect()
    }

    /// Each section spans from its header to the next located header.
    /// Text before the first label is dropped.
    pub fn parse(&self, raw: &str) -> SectionMap {
        assemble(raw, &self.tokenize(raw))
    }

    /// As `parse`, but each offset in `boundaries` also closes the open section.
    pub fn parse_with_boundaries(&self, raw: &str, boundaries: &[usize]) -> SectionMap {
        let mut hits = self.tokenize(raw);
        hits.extend(boundaries.iter().map(|&start| LabelHit {
            label: None,
            start,
            body_start: start,
        }));
        hits.sort_by_key(|h| (h.start, h.label.is_some()));
        assemble(raw, &hits)
    }
}

fn assemble(raw: &str, hits: &[LabelHit<'_>]) -> SectionMap {
    let mut sections = SectionMap::default();

    for (i, hit) in hits.iter().enumerate() {
        let Some(label) = hit.label else { continue };
        let end = hits
            .get(i + 1)
            .map_or(raw.len(), |next| next.start)
            .max(hit.body_start);
        sections.insert(label, collect_body(&raw[hit.body_start..end]));
    }

    sections
}

// ── Tests ──
