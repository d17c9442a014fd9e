use serde::{Deserialize, Serialize};

use crate::{
    application::services::sanitize::{format_phone_number, sanitize_parameter},
    domain::models::{MediaKind, TemplateMessage},
};

#[derive(Debug, Serialize)]
pub struct SendTemplateRequest {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: String,
    #[serde(rename = "type")]
    message_type: &'static str,
    template: TemplatePayload,
}

#[derive(Debug, Serialize)]
struct TemplatePayload {
    name: String,
    language: LanguagePayload,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<ComponentPayload>,
}

#[derive(Debug, Serialize)]
struct LanguagePayload {
    code: String,
}

#[derive(Debug, Serialize)]
struct ComponentPayload {
    #[serde(rename = "type")]
    component_type: &'static str,
    parameters: Vec<ParameterPayload>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ParameterPayload {
    Text { text: String },
    Image { image: MediaId },
    Video { video: MediaId },
    Document { document: MediaId },
}

#[derive(Debug, Serialize)]
struct MediaId {
    id: String,
}

impl SendTemplateRequest {
    /// Header media goes in its own component, text parameters in the body,
    /// each sanitized again right before it leaves the process.
    pub fn from_message(message: &TemplateMessage) -> Self {
        let mut components = Vec::with_capacity(2);

        if let Some(header) = &message.header {
            let id = MediaId {
                id: header.handle.clone(),
            };
            let parameter = match header.kind {
                MediaKind::Image => ParameterPayload::Image { image: id },
                MediaKind::Video => ParameterPayload::Video { video: id },
                MediaKind::Document => ParameterPayload::Document { document: id },
            };
            components.push(ComponentPayload {
                component_type: "header",
                parameters: vec![parameter],
            });
        }

        if !message.body_parameters.is_empty() {
            components.push(ComponentPayload {
                component_type: "body",
                parameters: message
                    .body_parameters
                    .iter()
                    .map(|text| ParameterPayload::Text {
                        text: sanitize_parameter(text),
                    })
                    .collect(),
            });
        }

        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: format_phone_number(&message.to),
            message_type: "template",
            template: TemplatePayload {
                name: message.template_name.clone(),
                language: LanguagePayload {
                    code: message.locale.clone(),
                },
                components,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendTemplateResponse {
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaUploadResponse {
    pub id: Option<String>,
}
