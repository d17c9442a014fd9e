use serde::{Deserialize, Serialize};

use super::wish::MediaKind;

/// Outbound template shapes. Primary templates carry the whole greeting,
/// follow-ups carry one attachment and the sender name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    TextPrimary,
    ImagePrimary,
    VideoPrimary,
    DocumentPrimary,
    VideoFollowUp,
    DocumentFollowUp,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::TextPrimary => "text_primary",
            TemplateKind::ImagePrimary => "image_primary",
            TemplateKind::VideoPrimary => "video_primary",
            TemplateKind::DocumentPrimary => "document_primary",
            TemplateKind::VideoFollowUp => "video_follow_up",
            TemplateKind::DocumentFollowUp => "document_follow_up",
        }
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            TemplateKind::TextPrimary => None,
            TemplateKind::ImagePrimary => Some(MediaKind::Image),
            TemplateKind::VideoPrimary | TemplateKind::VideoFollowUp => Some(MediaKind::Video),
            TemplateKind::DocumentPrimary | TemplateKind::DocumentFollowUp => {
                Some(MediaKind::Document)
            }
        }
    }

    pub fn carries_full_body(&self) -> bool {
        matches!(
            self,
            TemplateKind::TextPrimary
                | TemplateKind::ImagePrimary
                | TemplateKind::VideoPrimary
                | TemplateKind::DocumentPrimary
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    pub kind: MediaKind,
    pub url: String,
}

/// One entry of the ordered send plan for a wish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMessage {
    pub template: TemplateKind,
    pub media: Option<MediaReference>,
}

/// Provider-side media handle placed in a template header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMedia {
    pub kind: MediaKind,
    pub handle: String,
}

/// A fully resolved template send, ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMessage {
    pub to: String,
    pub template_name: String,
    pub locale: String,
    pub header: Option<HeaderMedia>,
    pub body_parameters: Vec<String>,
}
