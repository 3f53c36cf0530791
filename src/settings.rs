use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const CONFIG_FILE: &str = "wordbook";

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_notion_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_title_property() -> String {
    "名前".to_string()
}

fn default_database_path() -> String {
    "data/wordbook.sqlite".to_string()
}

/// Process settings. Credentials may be absent at load time; commands that
/// need one ask for it through [`Settings::require`].
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub notion_api_key: Option<String>,
    pub notion_database_id: Option<String>,
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_notion_base_url")]
    pub notion_base_url: String,
    #[serde(default = "default_notion_version")]
    pub notion_version: String,
    #[serde(default = "default_title_property")]
    pub title_property: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Render related words as one combined block instead of three.
    #[serde(default)]
    pub combined_related: bool,
}

impl Settings {
    /// `.env`, then an optional `wordbook.toml`, then the environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{} must be set (environment, .env or {}.toml)", name.to_uppercase(), CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(text: &str) -> Settings {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let s = from_toml("notion_api_key = \"secret\"");
        assert_eq!(s.notion_api_key.as_deref(), Some("secret"));
        assert!(s.openai_api_key.is_none());
        assert_eq!(s.openai_model, "gpt-4o");
        assert_eq!(s.notion_version, "2022-06-28");
        assert_eq!(s.title_property, "名前");
        assert_eq!(s.database_path, "data/wordbook.sqlite");
        assert!(!s.combined_related);
    }

    #[test]
    fn require_rejects_missing_and_blank() {
        let s = from_toml("openai_api_key = \"  \"\nnotion_database_id = \"abc\"");
        assert!(Settings::require(&s.openai_api_key, "openai_api_key").is_err());
        assert!(Settings::require(&s.notion_api_key, "notion_api_key").is_err());
        assert_eq!(
            Settings::require(&s.notion_database_id, "notion_database_id").unwrap(),
            "abc"
        );
    }

    #[test]
    fn overrides() {
        let s = from_toml("openai_model = \"gpt-4o-mini\"\ncombined_related = true");
        assert_eq!(s.openai_model, "gpt-4o-mini");
        assert!(s.combined_related);
    }
}
