use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response,
    multipart::{Form, Part},
};
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    application::services::provider::MessagingProvider,
    domain::{
        errors::DispatchError,
        models::{MediaKind, TemplateMessage},
    },
    infrastructure::whatsapp::{
        mime::{extension_for, infer_mime},
        payload::{MediaUploadResponse, SendTemplateRequest, SendTemplateResponse},
    },
};

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_base: String,
    pub api_version: String,
    pub access_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub request_timeout: Duration,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base: "https://graph.facebook.com".to_string(),
            api_version: "v24.0".to_string(),
            access_token: None,
            phone_number_id: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// WhatsApp Cloud API adapter: storage fetch, media upload and template send.
pub struct WhatsAppClient {
    http: Client,
    config: WhatsAppConfig,
}

struct Credentials<'a> {
    token: &'a str,
    phone_number_id: &'a str,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig) -> anyhow::Result<Arc<Self>> {
        let http = Client::builder()
            .user_agent("wish-dispatch/whatsapp")
            .timeout(config.request_timeout)
            .build()?;
        Ok(Arc::new(Self { http, config }))
    }

    fn credentials(&self) -> Result<Credentials<'_>, DispatchError> {
        let token = present(self.config.access_token.as_deref())
            .ok_or_else(|| DispatchError::Configuration("WHATSAPP_ACCESS_TOKEN is not set".into()))?;
        let phone_number_id = present(self.config.phone_number_id.as_deref()).ok_or_else(|| {
            DispatchError::Configuration("WHATSAPP_PHONE_NUMBER_ID is not set".into())
        })?;
        Ok(Credentials {
            token,
            phone_number_id,
        })
    }

    fn endpoint(&self, phone_number_id: &str, resource: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.api_version,
            phone_number_id,
            resource
        )
    }

    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, DispatchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| DispatchError::MediaFetch {
                status: None,
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::MediaFetch {
                status: Some(status.as_u16()),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| DispatchError::MediaFetch {
                status: None,
                reason: err.to_string(),
            })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppClient {
    fn ensure_ready(&self) -> Result<(), DispatchError> {
        self.credentials().map(|_| ())
    }

    async fn upload_media(&self, url: &str, kind: MediaKind) -> Result<String, DispatchError> {
        let credentials = self.credentials()?;
        let bytes = self.fetch_media(url).await?;
        let mime = infer_mime(url, kind);

        debug!(kind = kind.as_str(), mime, size = bytes.len(), "uploading media");

        let part = Part::bytes(bytes)
            .file_name(format!("media.{}", extension_for(mime)))
            .mime_str(mime)
            .map_err(|err| DispatchError::MediaUpload {
                status: None,
                body: json!({ "error": { "message": err.to_string() } }),
            })?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", mime)
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint(credentials.phone_number_id, "media"))
            .bearer_auth(credentials.token)
            .multipart(form)
            .send()
            .await
            .map_err(|err| DispatchError::MediaUpload {
                status: None,
                body: json!({ "error": { "message": err.to_string() } }),
            })?;

        let status = response.status();
        let body = read_body(response).await;
        if !status.is_success() {
            return Err(DispatchError::MediaUpload {
                status: Some(status.as_u16()),
                body,
            });
        }

        serde_json::from_value::<MediaUploadResponse>(body.clone())
            .ok()
            .and_then(|upload| upload.id)
            .ok_or(DispatchError::MediaUpload {
                status: Some(status.as_u16()),
                body,
            })
    }

    async fn send_template(&self, message: &TemplateMessage) -> Result<String, DispatchError> {
        let credentials = self.credentials()?;
        let request = SendTemplateRequest::from_message(message);

        let response = self
            .http
            .post(self.endpoint(credentials.phone_number_id, "messages"))
            .bearer_auth(credentials.token)
            .json(&request)
            .send()
            .await
            .map_err(|err| DispatchError::Dispatch {
                status: None,
                body: json!({ "error": { "message": err.to_string() } }),
            })?;

        let status = response.status();
        let body = read_body(response).await;
        if !status.is_success() {
            return Err(DispatchError::Dispatch {
                status: Some(status.as_u16()),
                body,
            });
        }

        serde_json::from_value::<SendTemplateResponse>(body.clone())
            .ok()
            .and_then(|sent| sent.messages.into_iter().next())
            .map(|sent| sent.id)
            .ok_or(DispatchError::Dispatch {
                status: Some(status.as_u16()),
                body,
            })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Provider bodies are JSON in practice; anything else is kept as text.
async fn read_body(response: Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
