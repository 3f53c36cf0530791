pub mod format;
pub mod mapper;
pub mod related;
pub mod sections;
pub mod sentences;

use tracing::{debug, warn};

use format::Format;
use mapper::WordRecord;
use related::RelatedWordSplitter;
use sections::{SectionMap, SectionParser};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no content to parse")]
    EmptyPassage,
    #[error("invalid label vocabulary: {0}")]
    Pattern(#[from] regex::Error),
}

/// Passage → sections → (related groups, example pairs) → record.
#[derive(Debug, Clone)]
pub struct Engine {
    format: Format,
    sections: SectionParser,
    related: RelatedWordSplitter,
}

impl Engine {
    pub fn new(format: Format) -> Result<Self, ParseError> {
        Ok(Engine {
            sections: SectionParser::new(&format)?,
            related: RelatedWordSplitter::new(&format)?,
            format,
        })
    }

    pub fn sections(&self, raw: &str) -> SectionMap {
        self.sections.parse(raw)
    }

    pub fn process(&self, raw: &str) -> Result<WordRecord, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::EmptyPassage);
        }

        let mut sections = self.sections.parse(raw);
        if sections.is_empty() {
            warn!("no recognizable labels in passage");
        }

        let mut related = sections
            .get(&self.format.related_label)
            .map(|body| self.related.split(body));
        // Some passages drop the related-words header and list the
        // sub-groups directly. Their headers then close whatever section
        // they interrupt, so each line lands in exactly one place.
        if related.is_none() {
            let group = self.related.split(raw);
            if group.any_found() {
                let cuts = self.related.header_starts(raw);
                sections = self.sections.parse_with_boundaries(raw, &cuts);
                related = Some(group);
            }
        }
        let pairs = sections
            .get(&self.format.examples_label)
            .map(sentences::pair);

        debug!(
            labels = ?sections.labels().collect::<Vec<_>>(),
            related = related.is_some(),
            pairs = pairs.as_ref().map_or(0, Vec::len),
            "parsed passage"
        );

        Ok(mapper::map_record(
            &sections,
            related.as_ref(),
            pairs.as_deref(),
            &self.format,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapper::PropertyValue;

    fn engine() -> Engine {
        Engine::new(Format::japanese()).unwrap()
    }

    #[test]
    fn empty_passage_is_an_error() {
        assert!(matches!(engine().process(""), Err(ParseError::EmptyPassage)));
        assert!(matches!(engine().process(" \n\t\n"), Err(ParseError::EmptyPassage)));
    }

    #[test]
    fn unlabeled_passage_yields_empty_record() {
        let record = engine().process("I could not find that word.").unwrap();
        assert!(record.properties.is_empty());
        assert!(record.blocks.is_empty());
    }

    #[test]
    fn missing_difficulty() {
        let raw = "頻度: よく使う\n品詞: 動詞\n意味: 適用する";
        let record = engine().process(raw).unwrap();
        assert!(record.property("難易度").is_none());
        assert!(record.block("難易度").is_none());
        assert!(record.property("頻度").is_some());
    }

    #[test]
    fn scenario_related_blocks() {
        let raw = "頻度: よく使う\n意味: 適用する\n関連語:\n派生語: applicable - 応用できる\n類義語: apply\n反意語: なし";
        let record = engine().process(raw).unwrap();
        let labels: Vec<&str> = record.blocks.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["意味", "派生語", "類義語", "反意語"]);
        assert_eq!(record.block("派生語").unwrap().body, "applicable - 応用できる");
        assert_eq!(record.block("反意語").unwrap().body, "なし");
    }

    #[test]
    fn related_without_header_taken_from_passage() {
        let raw = "意味: 適用する\n自由記述: 補足\n派生語: applicable\n類義語: employ";
        let record = engine().process(raw).unwrap();
        assert_eq!(record.block("自由記述").unwrap().body, "補足");
        assert_eq!(record.block("派生語").unwrap().body, "applicable");
        assert_eq!(record.block("類義語").unwrap().body, "employ");
        assert_eq!(
            record.block("反意語").unwrap().body,
            engine().format.placeholder
        );
    }

    #[test]
    fn no_related_content_means_no_related_blocks() {
        let record = engine().process("意味: 適用する").unwrap();
        assert!(record.block("派生語").is_none());
        assert_eq!(record.blocks.len(), 1);
    }

    #[test]
    fn apply_fixture_record() {
        let raw = std::fs::read_to_string("tests/fixtures/apply.txt").unwrap();
        let record = engine().process(&raw).unwrap();

        assert_eq!(record.properties.len(), 5);
        assert_eq!(
            record.property("品詞"),
            Some(&PropertyValue::MultiSelect(vec!["動詞".into()]))
        );
        assert_eq!(record.blocks.len(), 10);

        let examples = &record.block("例文").unwrap().body;
        assert_eq!(examples.split("\n\n").count(), 3);
        assert!(!examples.contains("(unpaired)"));

        let derived = &record.block("派生語").unwrap().body;
        assert!(derived.contains("application"));
        assert!(!derived.contains("類義語"));

        // The closing divider is an ordinary body line of the last section.
        let antonyms = &record.block("反意語").unwrap().body;
        assert!(antonyms.starts_with("withdraw"));
        assert!(antonyms.ends_with("\n---"));
    }

    #[test]
    fn note_mentioning_sub_label_keeps_its_lines() {
        let raw = "自由記述: 注意点\n類義語: use との違いに注意。\nまた活用に注意。\n関連語:\n派生語: applicant\n類義語: employ\n反意語: withdraw";
        let record = engine().process(raw).unwrap();
        assert_eq!(
            record.block("自由記述").unwrap().body,
            "注意点\n類義語: use との違いに注意。\nまた活用に注意。"
        );
        assert_eq!(record.block("類義語").unwrap().body, "employ");
        assert_eq!(record.block("反意語").unwrap().body, "withdraw");
    }

    #[test]
    fn headerless_related_on_one_line() {
        let raw = "意味: 適用する 派生語: applicant\n類義語: employ";
        let record = engine().process(raw).unwrap();
        assert_eq!(record.block("意味").unwrap().body, "適用する");
        assert_eq!(record.block("派生語").unwrap().body, "applicant");
        assert_eq!(record.block("類義語").unwrap().body, "employ");
    }

    #[test]
    fn loose_fixture_record() {
        let raw = std::fs::read_to_string("tests/fixtures/loose.txt").unwrap();
        let record = engine().process(&raw).unwrap();

        assert!(record.property("難易度").is_none());
        assert_eq!(
            record.property("頻度"),
            Some(&PropertyValue::Select(Some("たまに使う".into())))
        );
        assert!(record.block("コロケーション").is_some());
        assert_eq!(record.block("例文").unwrap().body.split("\n\n").count(), 2);
        assert_eq!(record.block("類義語").unwrap().body, "leap\n跳ねる");
        assert_eq!(
            record.block("反意語").unwrap().body,
            engine().format.placeholder
        );
    }
}
