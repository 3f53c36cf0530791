use std::collections::HashMap;

pub const DEFAULT_ICON: &str = "💡";
pub const DEFAULT_COLOR: &str = "default";

/// How the related-words sub-groups are laid out as content blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelatedLayout {
    /// One block per sub-group, in sub-label order.
    #[default]
    Split,
    /// A single related-words block holding every sub-group under its own header.
    Combined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub icon: String,
    pub color: String,
}

/// Everything that varies between passage formats: label vocabulary,
/// separator glyphs, which labels become properties and which become
/// blocks, and the presentation table.
#[derive(Debug, Clone)]
pub struct Format {
    /// Top-level section labels, in canonical order.
    pub labels: Vec<String>,
    /// Alternate spelling → canonical label.
    pub aliases: Vec<(String, String)>,
    pub separators: Vec<char>,
    pub related_label: String,
    pub sub_labels: Vec<String>,
    pub placeholder: String,
    pub scalar_labels: Vec<String>,
    pub tag_label: String,
    pub tag_delimiters: Vec<char>,
    pub examples_label: String,
    /// Labels rendered as blocks (related words excluded), in output order.
    pub narrative_labels: Vec<String>,
    pub choices: HashMap<String, Vec<String>>,
    pub styles: HashMap<String, Style>,
    pub related_layout: RelatedLayout,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Format {
    /// The vocabulary-note format the prompt in `llm` asks for.
    pub fn japanese() -> Self {
        let choices = [
            ("頻度", &["よく使う", "そこそこ使う", "たまに使う", "あまり使わない"][..]),
            ("難易度", &["A1", "A2", "B1", "B2", "C1", "C2"][..]),
            ("フォーマル度", &["〇", "△", "×"][..]),
            ("カジュアル度", &["〇", "△", "×"][..]),
        ]
        .into_iter()
        .map(|(label, values)| (label.to_string(), owned(values)))
        .collect();

        let styles = [
            ("発音", "🔊", "gray_background"),
            ("意味", "📖", "purple_background"),
            ("語源", "🧬", "gray_background"),
            ("語感", "💭", "gray_background"),
            ("コロケーション", "📌", "green_background"),
            ("例文", "📝", "blue_background"),
            ("自由記述", "🧠", "gray_background"),
            ("派生語", "📘", "gray_background"),
            ("類義語", "📗", "gray_background"),
            ("反意語", "📕", "gray_background"),
        ]
        .into_iter()
        .map(|(label, icon, color)| {
            (
                label.to_string(),
                Style {
                    icon: icon.to_string(),
                    color: color.to_string(),
                },
            )
        })
        .collect();

        Format {
            labels: owned(&[
                "頻度",
                "難易度",
                "品詞",
                "フォーマル度",
                "カジュアル度",
                "発音",
                "意味",
                "語源",
                "語感",
                "コロケーション",
                "例文",
                "自由記述",
                "関連語",
            ]),
            aliases: [
                ("代表的なコロケーション", "コロケーション"),
                ("代表的な例文", "例文"),
                ("例文（英文と訳）", "例文"),
                ("補足", "自由記述"),
            ]
            .into_iter()
            .map(|(a, c)| (a.to_string(), c.to_string()))
            .collect(),
            separators: vec![':', '：'],
            related_label: "関連語".to_string(),
            sub_labels: owned(&["派生語", "類義語", "反意語"]),
            placeholder: "該当情報が取得できませんでした。".to_string(),
            scalar_labels: owned(&["頻度", "難易度", "フォーマル度", "カジュアル度"]),
            tag_label: "品詞".to_string(),
            tag_delimiters: vec!['、', '，', ','],
            examples_label: "例文".to_string(),
            narrative_labels: owned(&[
                "発音",
                "意味",
                "語源",
                "語感",
                "コロケーション",
                "例文",
                "自由記述",
            ]),
            choices,
            styles,
            related_layout: RelatedLayout::Split,
        }
    }

    pub fn with_related_layout(mut self, layout: RelatedLayout) -> Self {
        self.related_layout = layout;
        self
    }

    /// Icon and color for a block label, falling back to the neutral default.
    pub fn style(&self, label: &str) -> Style {
        self.styles.get(label).cloned().unwrap_or_else(|| Style {
            icon: DEFAULT_ICON.to_string(),
            color: DEFAULT_COLOR.to_string(),
        })
    }

    pub fn expected_choices(&self, label: &str) -> Option<&[String]> {
        self.choices.get(label).map(Vec::as_slice)
    }

    /// (spelling, canonical) pairs for every top-level label and alias.
    pub fn label_spellings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels
            .iter()
            .map(|l| (l.as_str(), l.as_str()))
            .chain(self.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str())))
    }

    pub fn sub_label_spellings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sub_labels.iter().map(|l| (l.as_str(), l.as_str()))
    }
}

impl Default for Format {
    fn default() -> Self {
        Format::japanese()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_lookup_and_fallback() {
        let format = Format::japanese();
        let style = format.style("例文");
        assert_eq!(style.icon, "📝");
        assert_eq!(style.color, "blue_background");

        let unknown = format.style("関連語");
        assert_eq!(unknown.icon, DEFAULT_ICON);
        assert_eq!(unknown.color, DEFAULT_COLOR);
    }

    #[test]
    fn aliases_point_at_known_labels() {
        let format = Format::japanese();
        for (_, canonical) in &format.aliases {
            assert!(format.labels.contains(canonical), "dangling alias target {}", canonical);
        }
    }

    #[test]
    fn every_narrative_label_is_a_top_level_label() {
        let format = Format::japanese();
        for label in &format.narrative_labels {
            assert!(format.labels.contains(label));
        }
        assert_eq!(format.sub_labels.len(), 3);
    }
}
