use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;

/// プロンプトから構造化されたデータを生成するバックエンド。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// プロンプトを送信し、`schema`に従ったJSONを受け取る。
    ///
    /// # Arguments
    ///
    /// * `prompt` - 送信するプロンプト
    /// * `schema` - 出力に要求するスキーマ
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<Value>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

/// Gemini APIのレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let config = Config::from_env().unwrap();
/// let client = GeminiClient::new(&config);
/// let value = client.generate("prompt", &schema).await.unwrap();
/// ```
pub struct GeminiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// 新しい`GeminiClient`を返す。
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<Value> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };
        debug!("Sending prompt to {}: {}", url, prompt);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Gemini API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to deserialize response")?;
        info!("length of candidates: {}", response.candidates.len());

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
            .context("Response contains no generated text")?;
        debug!("Generated text: {}", text);

        serde_json::from_str(&text)
            .with_context(|| format!("Generated text is not valid JSON: {}", text))
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::{GeminiClient, GenerativeBackend};
    use crate::config::Config;

    fn dummy_config(api_url: String) -> Config {
        Config {
            api_key: "dummy-key".to_string(),
            api_url,
            model: "gemini-test".to_string(),
        }
    }

    fn response_body(text: &str) -> String {
        json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": text}]}}
            ]
        })
        .to_string()
    }

    /// 生成されたテキストをJSONとして返すことを確認する。
    #[tokio::test]
    async fn test_generate() {
        let mut server = Server::new_async().await;
        let schema = json!({"type": "OBJECT"});
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "dummy-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "OBJECT"},
                },
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body(r#"{"predictedDuration": 28, "confidence": "medium"}"#))
            .create_async()
            .await;
        let client = GeminiClient::new(&dummy_config(server.url()));

        let value = client.generate("hello", &schema).await.unwrap();

        mock.assert_async().await;
        assert_eq!(value, json!({"predictedDuration": 28, "confidence": "medium"}));
    }

    /// エラーステータスの場合はエラーとなることを確認する。
    #[tokio::test]
    async fn test_generate_error_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .with_status(429)
            .with_body(r#"{"error": {"message": "quota"}}"#)
            .create_async()
            .await;
        let client = GeminiClient::new(&dummy_config(server.url()));

        let result = client.generate("hello", &json!({})).await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    /// 候補が無い場合はエラーとなることを確認する。
    #[tokio::test]
    async fn test_generate_no_candidates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;
        let client = GeminiClient::new(&dummy_config(server.url()));

        let result = client.generate("hello", &json!({})).await;

        assert!(result.is_err());
    }

    /// 生成されたテキストがJSONでない場合はエラーとなることを確認する。
    #[tokio::test]
    async fn test_generate_text_not_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body("about thirty minutes"))
            .create_async()
            .await;
        let client = GeminiClient::new(&dummy_config(server.url()));

        let result = client.generate("hello", &json!({})).await;

        assert!(result.is_err());
    }
}
