use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One fully built generation request: what the adapter hands to the
/// boundary, independent of any provider wire format.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub response_schema: Value,
}

/// The external generation boundary. One call in, raw JSON text out.
/// Kept behind a trait so the adapter can be exercised without a network.
#[async_trait]
pub trait GenerationBoundary: Send + Sync {
    async fn generate_json(&self, model: &str, request: &ModelRequest) -> Result<String>;
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    fn build_request(request: &ModelRequest) -> GenerateRequest {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: request.system_instruction.clone(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: request.response_schema.clone(),
            },
        }
    }
}

#[async_trait]
impl GenerationBoundary for GeminiClient {
    async fn generate_json(&self, model: &str, request: &ModelRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let body = Self::build_request(request);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error {}: {}", status, text));
        }

        let reply: GenerateResponse = response.json().await?;
        let text: String = reply
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(anyhow!("Gemini returned no candidates"));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_to_gemini_wire_format() {
        let request = ModelRequest {
            system_instruction: "be brief".to_string(),
            prompt: "hello".to_string(),
            response_schema: json!({"type": "OBJECT"}),
        };

        let body = GeminiClient::build_request(&request);
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            json!("be brief")
        );
        assert_eq!(value["contents"][0]["role"], json!("user"));
        assert_eq!(value["contents"][0]["parts"][0]["text"], json!("hello"));
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(
            value["generationConfig"]["responseSchema"]["type"],
            json!("OBJECT")
        );
    }

    #[test]
    fn test_response_parses_candidate_parts() {
        let raw = json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}
            ]
        })
        .to_string();

        let reply: GenerateResponse = serde_json::from_str(&raw).unwrap();
        let text: String = reply.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "{\"a\":1}");
    }
}
