//! HTTP client for the hosted OCR and chat services.
//!
//! [`MistralClient`] wraps a single [`reqwest::Client`] and the API
//! credential, constructed once from [`PipelineConfig`] at process start and
//! immutable thereafter. All four remote round-trips the pipeline makes live
//! here — file upload, signed-URL retrieval, OCR processing, and chat
//! completion — so the pipeline stages stay free of wire-format details.
//!
//! No retry is performed at this layer: a failed call surfaces as a hard
//! [`ExtractError`] carrying the stage, HTTP status, and raw message.

use crate::config::PipelineConfig;
use crate::error::{ApiStage, ExtractError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for the hosted OCR + LLM API.
///
/// Cheap to share behind an `Arc`; holds no mutable state.
pub struct MistralClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    ocr_model: String,
    chat_model: String,
    max_tokens: u32,
    signed_url_expiry_hours: u32,
}

impl MistralClient {
    /// Build a client from the pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Result<Self, ExtractError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            ocr_model: config.ocr_model.clone(),
            chat_model: config.chat_model.clone(),
            max_tokens: config.max_tokens,
            signed_url_expiry_hours: config.signed_url_expiry_hours,
        })
    }

    /// Upload a document to the files endpoint, tagged for OCR purpose.
    pub async fn upload_for_ocr(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, ExtractError> {
        let form = reqwest::multipart::Form::new().text("purpose", "ocr").part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string()),
        );

        let response = self
            .http
            .post(format!("{}/v1/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractError::Http {
                stage: ApiStage::Upload,
                source: e,
            })?;

        let uploaded: UploadedFile = decode(ApiStage::Upload, response).await?;
        debug!("uploaded '{}' as file {}", file_name, uploaded.id);
        Ok(uploaded)
    }

    /// Obtain a short-lived signed access URL for an uploaded file.
    ///
    /// The URL must be consumed by the OCR request before it lapses; no
    /// refresh is attempted.
    pub async fn signed_url(&self, file_id: &str) -> Result<SignedUrl, ExtractError> {
        let response = self
            .http
            .get(format!("{}/v1/files/{}/url", self.base_url, file_id))
            .query(&[("expiry", self.signed_url_expiry_hours)])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ExtractError::Http {
                stage: ApiStage::SignedUrl,
                source: e,
            })?;

        decode(ApiStage::SignedUrl, response).await
    }

    /// Run OCR over a signed document URL, requesting page-level markdown.
    ///
    /// Image payloads are disabled to keep the response small; only the
    /// per-page markdown is used downstream.
    pub async fn ocr(&self, document_url: &str) -> Result<OcrResponse, ExtractError> {
        let request = OcrRequest {
            model: &self.ocr_model,
            document: DocumentSource {
                kind: "document_url",
                document_url,
            },
            include_image_base64: false,
        };

        let response = self
            .http
            .post(format!("{}/v1/ocr", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::Http {
                stage: ApiStage::Ocr,
                source: e,
            })?;

        decode(ApiStage::Ocr, response).await
    }

    /// Send a single-user-message chat completion and return the reply text.
    pub async fn complete(&self, prompt: &str) -> Result<String, ExtractError> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::Http {
                stage: ApiStage::Chat,
                source: e,
            })?;

        let completion: ChatResponse = decode(ApiStage::Chat, response).await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ExtractError::UnexpectedResponse {
                stage: ApiStage::Chat,
                detail: "completion carried no choices".into(),
            })
    }
}

/// Check the status and decode the JSON body, attributing failures to `stage`.
async fn decode<T: DeserializeOwned>(
    stage: ApiStage,
    response: reqwest::Response,
) -> Result<T, ExtractError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ExtractError::Api {
            stage,
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ExtractError::UnexpectedResponse {
            stage,
            detail: e.to_string(),
        })
}

// ── Wire types ───────────────────────────────────────────────────────────

/// Response of the files endpoint; only the object id is used.
#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub id: String,
}

/// A signed, time-bounded access URL for one uploaded object.
#[derive(Debug, Deserialize)]
pub struct SignedUrl {
    pub url: String,
}

#[derive(Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentSource<'a>,
    include_image_base64: bool,
}

#[derive(Serialize)]
struct DocumentSource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    document_url: &'a str,
}

/// OCR result: a collection of pages in source order.
#[derive(Debug, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub pages: Vec<OcrPage>,
}

/// One OCR'd page. The markdown field may be absent for pages the service
/// produced no text for.
#[derive(Debug, Deserialize)]
pub struct OcrPage {
    #[serde(default)]
    pub markdown: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = PipelineConfig::builder("sk-test")
            .api_base_url("https://api.example.com/")
            .build()
            .unwrap();
        let client = MistralClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
    }

    #[test]
    fn ocr_request_serialises_expected_shape() {
        let request = OcrRequest {
            model: "mistral-ocr-latest",
            document: DocumentSource {
                kind: "document_url",
                document_url: "https://signed.example/doc",
            },
            include_image_base64: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "mistral-ocr-latest");
        assert_eq!(value["document"]["type"], "document_url");
        assert_eq!(value["include_image_base64"], false);
    }

    #[test]
    fn ocr_response_tolerates_missing_fields() {
        let parsed: OcrResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.pages.is_empty());

        let parsed: OcrResponse =
            serde_json::from_str(r##"{"pages": [{"index": 0}, {"markdown": "# Hi"}]}"##).unwrap();
        assert_eq!(parsed.pages.len(), 2);
        assert!(parsed.pages[0].markdown.is_none());
        assert_eq!(parsed.pages[1].markdown.as_deref(), Some("# Hi"));
    }

    #[test]
    fn chat_response_content_is_reachable() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }
}
