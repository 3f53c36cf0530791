use serde::Serialize;

use super::format::Format;
use super::sections::{body_offset, collect_body, line_spans, LabelHit, LabelMatcher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubGroup {
    pub label: String,
    pub body: String,
    /// False when `body` is the placeholder.
    pub found: bool,
}

/// Derivatives, synonyms and antonyms. Always holds one entry per sub-label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedWordGroup {
    pub groups: Vec<SubGroup>,
}

impl RelatedWordGroup {
    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.label == label)
            .map(|g| g.body.as_str())
    }

    pub fn any_found(&self) -> bool {
        self.groups.iter().any(|g| g.found)
    }
}

#[derive(Debug, Clone)]
pub struct RelatedWordSplitter {
    sub_labels: Vec<String>,
    subs: LabelMatcher,
    /// Top-level labels end a sub-group when splitting a whole passage.
    stops: LabelMatcher,
    placeholder: String,
}

impl RelatedWordSplitter {
    pub fn new(format: &Format) -> Result<Self, regex::Error> {
        Ok(RelatedWordSplitter {
            sub_labels: format.sub_labels.clone(),
            subs: LabelMatcher::new(format.sub_label_spellings(), &format.separators)?,
            stops: LabelMatcher::new(format.label_spellings(), &format.separators)?,
            placeholder: format.placeholder.clone(),
        })
    }

    fn tokenize(&self, body: &str) -> Vec<LabelHit<'_>> {
        let mut hits = Vec::new();
        for (start, line) in line_spans(body) {
            let trimmed = line.trim();
            let rest = match self.subs.match_line(trimmed) {
                Some((label, end)) => {
                    let body_start = body_offset(start, line, end);
                    hits.push(LabelHit {
                        label: Some(label),
                        start,
                        body_start,
                    });
                    body_start
                }
                None => {
                    if self.stops.match_line(trimmed).is_some() {
                        hits.push(LabelHit {
                            label: None,
                            start,
                            body_start: start,
                        });
                    }
                    start
                }
            };
            // Further headers may follow on the same line.
            let tail = &body[rest..start + line.len()];
            for (label, from, to) in self.subs.find_all(tail) {
                hits.push(LabelHit {
                    label: Some(label),
                    start: rest + from,
                    body_start: rest + to,
                });
            }
        }
        hits
    }

    /// Offsets where sub-group headers begin in `text`.
    pub fn header_starts(&self, text: &str) -> Vec<usize> {
        self.tokenize(text)
            .into_iter()
            .filter(|h| h.label.is_some())
            .map(|h| h.start)
            .collect()
    }

    /// Each sub-group runs from the first header carrying its label up to the
    /// next header of any kind. Missing sub-groups get the placeholder.
    pub fn split(&self, body: &str) -> RelatedWordGroup {
        let hits = self.tokenize(body);

        let groups = self
            .sub_labels
            .iter()
            .map(|label| {
                let Some(i) = hits.iter().position(|h| h.label == Some(label.as_str())) else {
                    return SubGroup {
                        label: label.clone(),
                        body: self.placeholder.clone(),
                        found: false,
                    };
                };
                let end = hits.get(i + 1).map_or(body.len(), |next| next.start);
                SubGroup {
                    label: label.clone(),
                    body: collect_body(&body[hits[i].body_start..end]),
                    found: true,
                }
            })
            .collect();

        RelatedWordGroup { groups }
    }
}
