use serde::Serialize;
use tracing::warn;

use super::format::{Format, RelatedLayout};
use super::related::RelatedWordGroup;
use super::sections::SectionMap;
use super::sentences::{self, ExamplePair};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// `None` clears the choice.
    Select(Option<String>),
    MultiSelect(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub label: String,
    pub icon: String,
    pub color: String,
    pub body: String,
}

/// Typed properties plus the ordered content blocks for one word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WordRecord {
    pub properties: Vec<Property>,
    pub blocks: Vec<ContentBlock>,
}

#[cfg(test)]
impl WordRecord {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    pub fn block(&self, label: &str) -> Option<&ContentBlock> {
        self.blocks.iter().find(|b| b.label == label)
    }
}

pub fn split_tags(body: &str, delimiters: &[char]) -> Vec<String> {
    body.split(|c: char| delimiters.contains(&c))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn select_value(format: &Format, label: &str, body: &str) -> PropertyValue {
    if body.is_empty() {
        return PropertyValue::Select(None);
    }
    if let Some(choices) = format.expected_choices(label) {
        if !choices.iter().any(|c| c == body) {
            warn!(label, value = body, "unexpected choice, passing through");
        }
    }
    PropertyValue::Select(Some(body.to_string()))
}

fn block(format: &Format, label: &str, body: String) -> ContentBlock {
    let style = format.style(label);
    ContentBlock {
        label: label.to_string(),
        icon: style.icon,
        color: style.color,
        body,
    }
}

/// Every sub-group under its own icon header, separated by dividers.
pub fn render_related(group: &RelatedWordGroup, format: &Format) -> String {
    group
        .groups
        .iter()
        .map(|g| format!("{} {}\n{}\n---", format.style(&g.label).icon, g.label, g.body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the record. Only sections present in `sections` (and a related
/// group, when one was recovered) produce output.
pub fn map_record(
    sections: &SectionMap,
    related: Option<&RelatedWordGroup>,
    pairs: Option<&[ExamplePair]>,
    format: &Format,
) -> WordRecord {
    let mut record = WordRecord::default();

    for label in &format.labels {
        let Some(body) = sections.get(label) else { continue };
        let value = if format.scalar_labels.contains(label) {
            select_value(format, label, body)
        } else if *label == format.tag_label {
            PropertyValue::MultiSelect(split_tags(body, &format.tag_delimiters))
        } else {
            continue;
        };
        record.properties.push(Property {
            name: label.clone(),
            value,
        });
    }

    for label in &format.narrative_labels {
        let Some(body) = sections.get(label) else { continue };
        let body = if *label == format.examples_label {
            match pairs {
                Some(pairs) => sentences::render(pairs),
                None => sentences::render(&sentences::pair(body)),
            }
        } else {
            body.to_string()
        };
        record.blocks.push(block(format, label, body));
    }

    if let Some(group) = related {
        match format.related_layout {
            RelatedLayout::Split => {
                for g in &group.groups {
                    record.blocks.push(block(format, &g.label, g.body.clone()));
                }
            }
            RelatedLayout::Combined => {
                let body = render_related(group, format);
                record.blocks.push(block(format, &format.related_label, body));
            }
        }
    }

    record
}
