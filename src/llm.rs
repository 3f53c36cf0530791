use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Asks for the thirteen labeled sections the parser understands, one
/// `見出し: 内容` line each.
pub const SYSTEM_PROMPT: &str = "\
あなたは語源や英語教育に精通した英語教師です。
以下の英単語について、次の13の観点で出力してください：
頻度（よく使う、そこそこ使う、たまに使う、あまり使わない）、
難易度（A1〜C2のCEFR基準）、品詞（形容詞、動詞、名詞、副詞など）、
フォーマル度（〇、△、×）、カジュアル度（〇、△、×）、
発音（例：/əˈplɒd/）、意味（簡潔な日本語訳）、
語源（英語またはラテン語などからの由来）、語感（ネイティブの感覚的な意味合いやニュアンス）、
代表的なコロケーション（5個＋日本語訳）、
代表的な例文（3個＋日本語訳。英文と訳は段落を分けて）、
自由記述（補足情報や注意点、活用など）、
関連語（以下の分類ラベルを使って書いてください：「派生語：」「類義語：」「反意語：」。各カテゴリに1つ以上＋各語に2〜3行の簡潔な解説を含めてください）

形式は以下のように、各行を「見出し: 内容」の形式で出力してください：
---
頻度:
難易度:
品詞:
フォーマル度:
カジュアル度:
発音:
意味:
語源:
語感:
コロケーション:
例文:
自由記述:
関連語:
---
";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        ChatClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fetch the raw passage describing `word`.
    pub async fn ask_about(&self, word: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = build_request(&self.model, word);

        info!(word, model = %self.model, "Querying language model");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to reach the language model")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Language model returned {}: {}", status, body);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Unexpected language model response")?;
        let passage = first_content(parsed)?;
        debug!(chars = passage.chars().count(), "Received passage");
        Ok(passage)
    }
}

fn build_request<'a>(model: &'a str, word: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: word,
            },
        ],
    }
}

fn first_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .context("Language model returned no content")
}
