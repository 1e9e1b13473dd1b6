use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{multipart, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::OpenAiConfig, dto::conversion::ConvertedPurchaseOrder, entities::item,
    errors::ServiceError, services::catalog::CatalogService,
};

const ASSISTANT_NAME: &str = "Purchase Order Converter";
const USER_PROMPT: &str = "Analyze this purchase order and return in JSON format.";

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json|```").expect("code fence pattern is valid"));

/// A file received on the conversion endpoint, held in memory.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    fn is_pending(self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling)
    }
}

#[derive(Debug, Deserialize)]
struct Run {
    id: String,
    status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
    Text { text: MessageText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
}

/// Turns an uploaded purchase order document into structured JSON with a
/// one-shot assistant on an OpenAI-compatible Assistants v2 API.
#[derive(Clone)]
pub struct DocumentConversionService {
    client: Client,
    config: OpenAiConfig,
    catalog: Arc<CatalogService>,
}

impl DocumentConversionService {
    pub fn new(config: OpenAiConfig, catalog: Arc<CatalogService>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build AI API client: {}", e))
            })?;
        Ok(Self {
            client,
            config,
            catalog,
        })
    }

    /// Whether an API key is configured.
    pub fn is_enabled(&self) -> bool {
        self.config.api_key().is_some()
    }

    #[instrument(skip(self, document), fields(file_name = %document.file_name, size = document.bytes.len()))]
    pub async fn convert(
        &self,
        document: UploadedDocument,
    ) -> Result<ConvertedPurchaseOrder, ServiceError> {
        if document.bytes.is_empty() {
            return Err(ServiceError::BadRequest("Uploaded file is empty".to_string()));
        }
        let api_key = self.config.api_key().ok_or_else(|| {
            ServiceError::ServiceUnavailable("Document conversion is not configured".to_string())
        })?;

        let items = self.catalog.item_models().await?;
        let assistant_id = self
            .create_assistant(api_key, build_instructions(&items))
            .await?;

        let outcome = self
            .convert_with_assistant(api_key, &assistant_id, document)
            .await;
        self.delete_resource(api_key, &format!("assistants/{}", assistant_id))
            .await;

        match &outcome {
            Ok(order) => info!(
                line_items = order.purchase_order_line_items.len(),
                "Converted purchase order document"
            ),
            Err(e) => error!(error = %e, "Error processing file"),
        }
        outcome
    }

    async fn convert_with_assistant(
        &self,
        api_key: &str,
        assistant_id: &str,
        document: UploadedDocument,
    ) -> Result<ConvertedPurchaseOrder, ServiceError> {
        let file_id = self.upload_file(api_key, document).await?;
        let outcome = self.analyze(api_key, assistant_id, &file_id).await;
        self.delete_resource(api_key, &format!("files/{}", file_id))
            .await;
        outcome
    }

    async fn analyze(
        &self,
        api_key: &str,
        assistant_id: &str,
        file_id: &str,
    ) -> Result<ConvertedPurchaseOrder, ServiceError> {
        let thread: ObjectId = send_json(
            self.request(Method::POST, "threads", api_key).json(&json!({
                "messages": [{
                    "role": "user",
                    "content": USER_PROMPT,
                    "attachments": [{ "file_id": file_id, "tools": [{ "type": "file_search" }] }],
                }]
            })),
            "create thread",
        )
        .await?;

        let run: Run = send_json(
            self.request(Method::POST, &format!("threads/{}/runs", thread.id), api_key)
                .json(&json!({ "assistant_id": assistant_id })),
            "create run",
        )
        .await?;

        let run = self.wait_for_run(api_key, &thread.id, run).await?;
        if run.status != RunStatus::Completed {
            return Err(ServiceError::ExternalServiceError(format!(
                "assistant run {} finished as {:?}",
                run.id, run.status
            )));
        }

        let messages: MessageList = send_json(
            self.request(
                Method::GET,
                &format!("threads/{}/messages", thread.id),
                api_key,
            )
            .query(&[("run_id", run.id.as_str())]),
            "list messages",
        )
        .await?;

        let text = reply_text(messages).ok_or_else(|| {
            ServiceError::ExternalServiceError("assistant returned no text reply".to_string())
        })?;
        parse_converted(&text)
    }

    async fn wait_for_run(&self, api_key: &str, thread_id: &str, mut run: Run) -> Result<Run, ServiceError> {
        let mut attempts = 0;
        while run.status.is_pending() {
            if attempts >= self.config.max_poll_attempts {
                return Err(ServiceError::ExternalServiceError(format!(
                    "assistant run {} did not finish after {} polls",
                    run.id, attempts
                )));
            }
            attempts += 1;
            tokio::time::sleep(self.config.poll_interval()).await;
            run = send_json(
                self.request(
                    Method::GET,
                    &format!("threads/{}/runs/{}", thread_id, run.id),
                    api_key,
                ),
                "poll run",
            )
            .await?;
            debug!(run_id = %run.id, status = ?run.status, attempts, "Polled assistant run");
        }
        Ok(run)
    }

    async fn create_assistant(&self, api_key: &str, instructions: String) -> Result<String, ServiceError> {
        let assistant: ObjectId = send_json(
            self.request(Method::POST, "assistants", api_key).json(&json!({
                "name": ASSISTANT_NAME,
                "instructions": instructions,
                "model": self.config.model,
                "tools": [{ "type": "file_search" }],
            })),
            "create assistant",
        )
        .await?;
        debug!(assistant_id = %assistant.id, "Created assistant");
        Ok(assistant.id)
    }

    async fn upload_file(&self, api_key: &str, document: UploadedDocument) -> Result<String, ServiceError> {
        let mut part = multipart::Part::bytes(document.bytes.to_vec()).file_name(document.file_name);
        if let Some(content_type) = document.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(|e| {
                ServiceError::BadRequest(format!("Invalid content type '{}': {}", content_type, e))
            })?;
        }
        let form = multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let file: ObjectId = send_json(
            self.request(Method::POST, "files", api_key).multipart(form),
            "upload file",
        )
        .await?;
        debug!(file_id = %file.id, "Uploaded document");
        Ok(file.id)
    }

    // Cleanup never masks the conversion outcome.
    async fn delete_resource(&self, api_key: &str, path: &str) {
        match self.request(Method::DELETE, path, api_key).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(resource = path, "Deleted AI resource");
            }
            Ok(response) => {
                warn!(resource = path, status = %response.status(), "Failed to delete AI resource");
            }
            Err(e) => warn!(resource = path, error = %e, "Failed to delete AI resource"),
        }
    }

    fn request(&self, method: Method, path: &str, api_key: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        self.client
            .request(method, url)
            .bearer_auth(api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, step: &str) -> Result<T, ServiceError> {
    let response = request.send().await.map_err(|e| {
        ServiceError::ExternalServiceError(format!("{} request failed: {}", step, e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::ExternalServiceError(format!(
            "{} returned {}: {}",
            step, status, body
        )));
    }

    response.json::<T>().await.map_err(|e| {
        ServiceError::ExternalServiceError(format!("{} returned an unexpected body: {}", step, e))
    })
}

// The run's reply is the last message listed; only its first content block counts.
fn reply_text(messages: MessageList) -> Option<String> {
    let message = messages.data.into_iter().last()?;
    match message.content.into_iter().next()? {
        MessageContent::Text { text } => Some(text.value),
        MessageContent::Other => None,
    }
}

/// Assistant instructions: the target JSON shape plus one line per catalog item.
pub fn build_instructions(items: &[item::Model]) -> String {
    let catalog = items
        .iter()
        .map(|item| format!("SKU: {}, Name: {}, ID: {}", item.sku, item.name, item.id))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an AI assistant that receives files of any format representing purchase orders for an ecommerce brand.
Analyze the file and convert it into the specified JSON format.
You must ONLY respond with JSON format. Do not respond with anything else.
{{
    "vendor_name": "Vendor",
    "order_date": "2022-01-01",
    "expected_delivery_date": "2022-01-01",
    "purchase_order_line_items": [
        {{
            "item_id": "1",
            "quantity": 1,
            "unit_cost": 1.0
        }}
    ]
}}
Items:
{}"#,
        catalog
    )
}

/// Strips markdown code fences from an assistant reply and parses it.
pub fn parse_converted(raw: &str) -> Result<ConvertedPurchaseOrder, ServiceError> {
    let cleaned = CODE_FENCE_RE.replace_all(raw, "");
    serde_json::from_str(cleaned.trim()).map_err(|e| {
        ServiceError::ExternalServiceError(format!("assistant reply is not a purchase order: {}", e))
    })
}
