use crate::error::ExtractError;
use crate::models::{EntityCandidate, ExtractedEntities, Intent};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use lopdf::Document;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Extracts plain text out of spec-sheet PDF bytes.
pub trait PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfTextExtractor for LopdfExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let document =
            Document::load_mem(bytes).map_err(|error| ExtractError::PdfParse(error.to_string()))?;

        let mut pages_text = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| ExtractError::PdfParse(error.to_string()))?;
            if !text.trim().is_empty() {
                pages_text.push(text.trim().to_string());
            }
        }

        if pages_text.is_empty() {
            return Err(ExtractError::EmptyDocument(
                "pdf had no readable page text".to_string(),
            ));
        }

        Ok(pages_text.join("\n"))
    }
}

#[derive(Debug, Clone)]
pub struct DocumentServiceConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

fn document_service_config() -> Option<DocumentServiceConfig> {
    let endpoint = std::env::var("DOCUMENT_ANALYSIS_ENDPOINT").ok()?;
    let endpoint = endpoint.trim().to_string();
    if endpoint.is_empty() {
        return None;
    }

    let api_key = std::env::var("DOCUMENT_ANALYSIS_KEY").ok().and_then(|value| {
        let key = value.trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    });

    Some(DocumentServiceConfig { endpoint, api_key })
}

#[derive(Debug, Clone, Serialize)]
struct DocumentAnalysisRequest {
    pdf_base64: String,
    model: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DocumentAnalysisResponse {
    pages: Option<Vec<AnalyzedPage>>,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnalyzedPage {
    #[serde(default)]
    lines: Vec<String>,
}

/// Local parse first; the remote layout service is only tried for unreadable
/// PDFs and only when `DOCUMENT_ANALYSIS_ENDPOINT` is configured.
pub fn extract_document_text(bytes: &[u8]) -> Result<String, ExtractError> {
    match LopdfExtractor.extract_text(bytes) {
        Ok(text) => Ok(text),
        Err(ExtractError::PdfParse(parse_error) | ExtractError::EmptyDocument(parse_error)) => {
            match analyze_document_remote(bytes) {
                Ok(Some(text)) => Ok(text),
                Ok(None) => Err(ExtractError::PdfParse(parse_error)),
                Err(remote_error) => Err(ExtractError::PdfParse(format!(
                    "{parse_error}; document service fallback failed: {remote_error}"
                ))),
            }
        }
        Err(error) => Err(error),
    }
}

fn analyze_document_remote(bytes: &[u8]) -> Result<Option<String>, ExtractError> {
    tokio::task::block_in_place(|| analyze_document_remote_blocking(bytes))
}

fn analyze_document_remote_blocking(bytes: &[u8]) -> Result<Option<String>, ExtractError> {
    let cfg = match document_service_config() {
        Some(cfg) => cfg,
        None => return Ok(None),
    };

    let payload = DocumentAnalysisRequest {
        pdf_base64: STANDARD.encode(bytes),
        model: "prebuilt-document".to_string(),
    };

    let mut request = reqwest::blocking::Client::new()
        .post(&cfg.endpoint)
        .header("content-type", "application/json")
        .json(&payload);

    if let Some(api_key) = cfg.api_key {
        request = request.header("Ocp-Apim-Subscription-Key", api_key);
    }

    let response = request.send()?;
    if !response.status().is_success() {
        return Err(ExtractError::Service {
            code: response.status().to_string(),
            message: format!("document analysis at {} failed", cfg.endpoint),
        });
    }

    let payload: DocumentAnalysisResponse = response.json()?;
    let text = analysis_to_text(&payload);

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyDocument(
            "document service returned no text".to_string(),
        ));
    }

    Ok(Some(text))
}

fn analysis_to_text(payload: &DocumentAnalysisResponse) -> String {
    if let Some(pages) = &payload.pages {
        let lines: Vec<&str> = pages
            .iter()
            .flat_map(|page| page.lines.iter())
            .map(String::as_str)
            .filter(|line| !line.trim().is_empty())
            .collect();
        if !lines.is_empty() {
            return lines.join("\n");
        }
    }

    payload
        .text
        .as_deref()
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

#[async_trait]
pub trait EntityRecognizer {
    async fn recognize_entities(&self, text: &str) -> Result<ExtractedEntities, ExtractError>;
}

pub struct LanguageServiceClient {
    client: Client,
    endpoint: String,
    api_key: String,
    project_name: String,
    deployment_name: String,
}

impl LanguageServiceClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            project_name: "Ordenador-Entidades".to_string(),
            deployment_name: "production".to_string(),
        }
    }

    pub fn with_project(
        mut self,
        project_name: impl Into<String>,
        deployment_name: impl Into<String>,
    ) -> Self {
        self.project_name = project_name.into();
        self.deployment_name = deployment_name.into();
        self
    }
}

#[async_trait]
impl EntityRecognizer for LanguageServiceClient {
    async fn recognize_entities(&self, text: &str) -> Result<ExtractedEntities, ExtractError> {
        let body = json!({
            "kind": "CustomEntityRecognition",
            "parameters": {
                "projectName": self.project_name,
                "deploymentName": self.deployment_name,
            },
            "analysisInput": {
                "documents": [{ "id": "1", "language": "es", "text": text }]
            }
        });

        let response = self
            .client
            .post(format!("{}/language/:analyze-text", self.endpoint))
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Service {
                code: response.status().to_string(),
                message: "entity recognition request failed".to_string(),
            });
        }

        let payload: RecognitionResponse = response.json().await?;
        let entities = recognition_to_entities(&payload)?;
        debug!(categories = entities.len(), "entities recognized");
        Ok(entities)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RecognitionResponse {
    results: RecognitionResults,
}

#[derive(Debug, Clone, Deserialize)]
struct RecognitionResults {
    #[serde(default)]
    documents: Vec<RecognizedDocument>,
    #[serde(default)]
    errors: Vec<RecognitionError>,
}

#[derive(Debug, Clone, Deserialize)]
struct RecognizedDocument {
    #[serde(default)]
    entities: Vec<RecognizedEntity>,
}

#[derive(Debug, Clone, Deserialize)]
struct RecognizedEntity {
    category: String,
    text: String,
    #[serde(rename = "confidenceScore")]
    confidence_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct RecognitionError {
    error: RecognitionErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
struct RecognitionErrorBody {
    code: String,
    message: String,
}

fn recognition_to_entities(
    payload: &RecognitionResponse,
) -> Result<ExtractedEntities, ExtractError> {
    if let Some(error) = payload.results.errors.first() {
        return Err(ExtractError::Service {
            code: error.error.code.clone(),
            message: error.error.message.clone(),
        });
    }

    let mut entities = ExtractedEntities::new();
    for document in &payload.results.documents {
        for entity in &document.entities {
            entities
                .entry(entity.category.clone())
                .or_default()
                .push(EntityCandidate::new(
                    entity.text.clone(),
                    entity.confidence_score,
                ));
        }
    }
    Ok(entities)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceAnalysis {
    pub intent: Intent,
    pub entities: ExtractedEntities,
}

#[async_trait]
pub trait ConversationAnalyzer {
    async fn analyze(&self, utterance: &str) -> Result<UtteranceAnalysis, ExtractError>;
}

pub struct ConversationClient {
    client: Client,
    endpoint: String,
    api_key: String,
    project_name: String,
    deployment_name: String,
}

impl ConversationClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            project_name: "Ordenador-conversational".to_string(),
            deployment_name: "production".to_string(),
        }
    }
}

#[async_trait]
impl ConversationAnalyzer for ConversationClient {
    async fn analyze(&self, utterance: &str) -> Result<UtteranceAnalysis, ExtractError> {
        let body = json!({
            "kind": "Conversation",
            "analysisInput": {
                "conversationItem": {
                    "id": "1",
                    "participantId": "user",
                    "text": utterance,
                }
            },
            "parameters": {
                "projectName": self.project_name,
                "deploymentName": self.deployment_name,
            }
        });

        let response = self
            .client
            .post(format!("{}/language/:analyze-conversations", self.endpoint))
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Service {
                code: response.status().to_string(),
                message: "conversation analysis request failed".to_string(),
            });
        }

        let payload: ConversationResponse = response.json().await?;
        Ok(prediction_to_analysis(&payload))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ConversationResponse {
    result: ConversationResult,
}

#[derive(Debug, Clone, Deserialize)]
struct ConversationResult {
    prediction: ConversationPrediction,
}

#[derive(Debug, Clone, Deserialize)]
struct ConversationPrediction {
    #[serde(rename = "topIntent")]
    top_intent: String,
    #[serde(default)]
    entities: Vec<ConversationEntity>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConversationEntity {
    category: String,
    text: String,
}

fn prediction_to_analysis(payload: &ConversationResponse) -> UtteranceAnalysis {
    let prediction = &payload.result.prediction;
    let mut entities = ExtractedEntities::new();

    // Conversational entities come without a score.
    for entity in &prediction.entities {
        entities
            .entry(entity.category.clone())
            .or_default()
            .push(EntityCandidate::new(entity.text.clone(), 1.0));
    }

    UtteranceAnalysis {
        intent: Intent::from_top_intent(&prediction.top_intent),
        entities,
    }
}

#[async_trait]
pub trait ChatCompletion {
    async fn complete(&self, user_message: &str) -> Result<String, ExtractError>;
}

const SYSTEM_PROMPT: &str =
    "Eres un asistente experto en ordenadores. Responde con información concisa y útil.";

pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

impl OpenAiChatClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: "2024-07-01-preview".to_string(),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChatClient {
    async fn complete(&self, user_message: &str) -> Result<String, ExtractError> {
        let body = json!({
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_message },
            ],
            "temperature": 0.7,
            "max_tokens": 150,
        });

        let response = self
            .client
            .post(format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.endpoint, self.deployment, self.api_version
            ))
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExtractError::Service {
                code: response.status().to_string(),
                message: "chat completion request failed".to_string(),
            });
        }

        let payload: ChatResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ExtractError::Service {
                code: "empty_response".to_string(),
                message: "chat completion returned no choices".to_string(),
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_payload_groups_entities_by_category() -> Result<(), ExtractError> {
        let payload: RecognitionResponse = serde_json::from_str(
            r#"{
                "results": {
                    "documents": [{
                        "entities": [
                            {"category": "Marca", "text": "Dell", "confidenceScore": 0.98},
                            {"category": "Memoria RAM", "text": "16GB", "confidenceScore": 0.91},
                            {"category": "Memoria RAM", "text": "8GB", "confidenceScore": 0.35}
                        ]
                    }],
                    "errors": []
                }
            }"#,
        )?;

        let entities = recognition_to_entities(&payload)?;
        assert_eq!(entities["Marca"].len(), 1);
        assert_eq!(entities["Memoria RAM"].len(), 2);
        assert_eq!(entities["Memoria RAM"][0].text, "16GB");
        Ok(())
    }

    #[test]
    fn recognition_payload_surfaces_service_errors() -> Result<(), serde_json::Error> {
        let payload: RecognitionResponse = serde_json::from_str(
            r#"{
                "results": {
                    "documents": [],
                    "errors": [{"error": {"code": "InvalidRequest", "message": "bad project"}}]
                }
            }"#,
        )?;

        match recognition_to_entities(&payload) {
            Err(ExtractError::Service { code, .. }) => assert_eq!(code, "InvalidRequest"),
            other => panic!("expected service error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn conversation_payload_maps_intent_and_normalizes_confidence(
    ) -> Result<(), serde_json::Error> {
        let payload: ConversationResponse = serde_json::from_str(
            r#"{
                "result": {
                    "prediction": {
                        "topIntent": "Search_Computer",
                        "entities": [
                            {"category": "Marca", "text": "Lenovo"},
                            {"category": "Procesador", "text": "i7"}
                        ]
                    }
                }
            }"#,
        )?;

        let analysis = prediction_to_analysis(&payload);
        assert_eq!(analysis.intent, Intent::SearchComputer);
        assert_eq!(analysis.entities["Marca"][0].confidence, 1.0);
        assert_eq!(analysis.entities["Procesador"][0].text, "i7");
        Ok(())
    }

    #[test]
    fn analysis_prefers_page_lines_over_flat_text() {
        let payload = DocumentAnalysisResponse {
            pages: Some(vec![
                AnalyzedPage {
                    lines: vec!["Dell XPS 15".to_string(), "  ".to_string()],
                },
                AnalyzedPage {
                    lines: vec!["16GB DDR5".to_string()],
                },
            ]),
            text: Some("ignored".to_string()),
        };

        assert_eq!(analysis_to_text(&payload), "Dell XPS 15\n16GB DDR5");
    }

    #[test]
    fn analysis_falls_back_to_flat_text() {
        let payload = DocumentAnalysisResponse {
            pages: None,
            text: Some("  Dell XPS 15  ".to_string()),
        };
        assert_eq!(analysis_to_text(&payload), "Dell XPS 15");
    }

    #[test]
    fn unreadable_bytes_are_a_parse_error() {
        let result = LopdfExtractor.extract_text(b"%PDF-1.4\n%broken");
        assert!(matches!(result, Err(ExtractError::PdfParse(_))));
    }
}
