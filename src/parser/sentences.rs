use serde::Serialize;

/// An example sentence and its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamplePair {
    pub sentence: String,
    pub translation: String,
}

/// Regroup the example section into sentence/translation pairs, two
/// non-empty lines at a time. An odd trailing line is dropped.
pub fn pair(body: &str) -> Vec<ExamplePair> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .chunks_exact(2)
        .map(|chunk| ExamplePair {
            sentence: chunk[0].to_string(),
            translation: chunk[1].to_string(),
        })
        .collect()
}

/// Sentence line, translation line; pairs separated by a blank line.
pub fn render(pairs: &[ExamplePair]) -> String {
    pairs
        .iter()
        .map(|p| format!("{}\n{}", p.sentence, p.translation))
        .collect::<Vec<_>>()
        .join("\n\n")
}
