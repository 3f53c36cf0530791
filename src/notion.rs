use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::parser::mapper::{ContentBlock, PropertyValue, WordRecord};

/// Max characters in a single rich-text object.
const RICH_TEXT_LIMIT: usize = 2000;
/// Max children per append request.
const APPEND_BATCH: usize = 100;

pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseProperty {
    pub name: String,
    pub id: String,
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct PageCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseInfo {
    properties: Map<String, Value>,
}

// ── Payloads ──

/// Page properties carrying just the title.
pub fn title_properties(title_property: &str, word: &str) -> Value {
    json!({
        title_property: {
            "title": [{ "type": "text", "text": { "content": word } }]
        }
    })
}

pub fn properties_payload(record: &WordRecord) -> Value {
    let props: Map<String, Value> = record
        .properties
        .iter()
        .map(|p| {
            let value = match &p.value {
                PropertyValue::Select(Some(name)) => json!({ "select": { "name": name } }),
                PropertyValue::Select(None) => json!({ "select": null }),
                PropertyValue::MultiSelect(tags) => json!({
                    "multi_select": tags.iter().map(|t| json!({ "name": t })).collect::<Vec<_>>()
                }),
            };
            (p.name.clone(), value)
        })
        .collect();
    Value::Object(props)
}

/// Split into pieces of at most `limit` characters.
fn chunk_chars(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(limit).map(|c| c.iter().collect()).collect()
}

pub fn callout_block(block: &ContentBlock) -> Value {
    let content = format!("{}：\n{}", block.label, block.body);
    let rich_text: Vec<Value> = chunk_chars(&content, RICH_TEXT_LIMIT)
        .into_iter()
        .map(|piece| json!({ "type": "text", "text": { "content": piece } }))
        .collect();
    json!({
        "object": "block",
        "type": "callout",
        "callout": {
            "icon": { "type": "emoji", "emoji": block.icon },
            "rich_text": rich_text,
            "color": block.color,
        }
    })
}

pub fn callout_blocks(record: &WordRecord) -> Vec<Value> {
    record.blocks.iter().map(callout_block).collect()
}

fn parse_database_properties(info: DatabaseInfo) -> Vec<DatabaseProperty> {
    info.properties
        .into_iter()
        .map(|(key, value)| DatabaseProperty {
            name: value["name"].as_str().unwrap_or(&key).to_string(),
            id: value["id"].as_str().unwrap_or_default().to_string(),
            kind: value["type"].as_str().unwrap_or("unknown").to_string(),
        })
        .collect()
}

// ── Client ──

impl NotionClient {
    pub fn new(base_url: &str, api_key: &str, version: &str) -> Self {
        NotionClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            version: version.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/v1/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.version)
    }

    async fn send(&self, builder: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to {}", what))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Failed to {}: {} {}", what, status, body);
        }
        Ok(response)
    }

    /// Create a page titled `word`; returns the page id without hyphens.
    pub async fn create_page(&self, database_id: &str, title_property: &str, word: &str) -> Result<String> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": title_properties(title_property, word),
        });
        let response = self
            .send(self.request(reqwest::Method::POST, "pages").json(&body), "create page")
            .await?;
        let page: PageCreated = response.json().await.context("Unexpected create page response")?;
        let page_id = page.id.replace('-', "");
        info!(word, page_id = %page_id, "Created page");
        Ok(page_id)
    }

    pub async fn update_properties(&self, page_id: &str, record: &WordRecord) -> Result<()> {
        if record.properties.is_empty() {
            debug!(page_id, "No properties to set");
            return Ok(());
        }
        let body = json!({ "properties": properties_payload(record) });
        self.send(
            self.request(reqwest::Method::PATCH, &format!("pages/{}", page_id)).json(&body),
            "update properties",
        )
        .await?;
        info!(page_id, count = record.properties.len(), "Updated properties");
        Ok(())
    }

    pub async fn append_blocks(&self, page_id: &str, record: &WordRecord) -> Result<()> {
        let children = callout_blocks(record);
        for batch in children.chunks(APPEND_BATCH) {
            let body = json!({ "children": batch });
            self.send(
                self.request(reqwest::Method::PATCH, &format!("blocks/{}/children", page_id))
                    .json(&body),
                "append callouts",
            )
            .await?;
        }
        info!(page_id, count = children.len(), "Appended callouts");
        Ok(())
    }

    pub async fn database_properties(&self, database_id: &str) -> Result<Vec<DatabaseProperty>> {
        let response = self
            .send(
                self.request(reqwest::Method::GET, &format!("databases/{}", database_id)),
                "retrieve database",
            )
            .await?;
        let info: DatabaseInfo = response.json().await.context("Unexpected database response")?;
        Ok(parse_database_properties(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::mapper::Property;

    fn record() -> WordRecord {
        WordRecord {
            properties: vec![
                Property {
                    name: "頻度".into(),
                    value: PropertyValue::Select(Some("よく使う".into())),
                },
                Property {
                    name: "難易度".into(),
                    value: PropertyValue::Select(None),
                },
                Property {
                    name: "品詞".into(),
                    value: PropertyValue::MultiSelect(vec!["動詞".into(), "名詞".into()]),
                },
            ],
            blocks: vec![ContentBlock {
                label: "意味".into(),
                icon: "📖".into(),
                color: "purple_background".into(),
                body: "適用する".into(),
            }],
        }
    }

    #[test]
    fn properties_shape() {
        let props = properties_payload(&record());
        assert_eq!(props["頻度"], json!({ "select": { "name": "よく使う" } }));
        assert_eq!(props["難易度"], json!({ "select": null }));
        assert_eq!(
            props["品詞"],
            json!({ "multi_select": [{ "name": "動詞" }, { "name": "名詞" }] })
        );
    }

    #[test]
    fn title_shape() {
        let props = title_properties("名前", "apply");
        assert_eq!(props["名前"]["title"][0]["text"]["content"], "apply");
    }

    #[test]
    fn callout_shape() {
        let blocks = callout_blocks(&record());
        assert_eq!(blocks.len(), 1);
        let callout = &blocks[0]["callout"];
        assert_eq!(blocks[0]["type"], "callout");
        assert_eq!(callout["icon"]["emoji"], "📖");
        assert_eq!(callout["color"], "purple_background");
        assert_eq!(callout["rich_text"][0]["text"]["content"], "意味：\n適用する");
    }

    #[test]
    fn long_bodies_are_chunked() {
        let mut r = record();
        r.blocks[0].body = "あ".repeat(4500);
        let block = callout_block(&r.blocks[0]);
        let pieces = block["callout"]["rich_text"].as_array().unwrap();
        assert_eq!(pieces.len(), 3);
        for piece in pieces {
            let text = piece["text"]["content"].as_str().unwrap();
            assert!(text.chars().count() <= RICH_TEXT_LIMIT);
        }
        let joined: String = pieces
            .iter()
            .map(|p| p["text"]["content"].as_str().unwrap())
            .collect();
        assert_eq!(joined, format!("意味：\n{}", "あ".repeat(4500)));
    }

    #[test]
    fn database_properties_listing() {
        let info: DatabaseInfo = serde_json::from_str(
            r#"{"properties":{
                "名前":{"id":"title","name":"名前","type":"title"},
                "品詞":{"id":"a%3Bb","name":"品詞","type":"multi_select"}
            }}"#,
        )
        .unwrap();
        let mut props = parse_database_properties(info);
        props.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].kind, "multi_select");
        assert_eq!(props[1].name, "名前");
        assert_eq!(props[1].kind, "title");
    }
}
