use crate::domain::models::{Attachments, MediaKind, MediaReference, PlannedMessage, TemplateKind};

struct PrimaryRule {
    media: MediaKind,
    template: TemplateKind,
}

struct FollowUpRule {
    media: MediaKind,
    template: TemplateKind,
}

/// First matching rule picks the primary template, which carries the full greeting.
const PRIMARY_RULES: &[PrimaryRule] = &[
    PrimaryRule {
        media: MediaKind::Image,
        template: TemplateKind::ImagePrimary,
    },
    PrimaryRule {
        media: MediaKind::Video,
        template: TemplateKind::VideoPrimary,
    },
    PrimaryRule {
        media: MediaKind::Document,
        template: TemplateKind::DocumentPrimary,
    },
];

const FALLBACK_PRIMARY: TemplateKind = TemplateKind::TextPrimary;

/// Applied in order after the primary, for attachments the primary did not use.
const FOLLOW_UP_RULES: &[FollowUpRule] = &[
    FollowUpRule {
        media: MediaKind::Video,
        template: TemplateKind::VideoFollowUp,
    },
    FollowUpRule {
        media: MediaKind::Document,
        template: TemplateKind::DocumentFollowUp,
    },
];

/// Ordered send plan for a wish: the primary message first, then one
/// sender-only follow-up per remaining attachment.
pub fn select_templates(attachments: &Attachments) -> Vec<PlannedMessage> {
    let reference = |kind: MediaKind| {
        attachments.url(kind).map(|url| MediaReference {
            kind,
            url: url.to_string(),
        })
    };

    let primary = PRIMARY_RULES
        .iter()
        .find(|rule| attachments.has(rule.media))
        .map(|rule| PlannedMessage {
            template: rule.template,
            media: reference(rule.media),
        })
        .unwrap_or(PlannedMessage {
            template: FALLBACK_PRIMARY,
            media: None,
        });

    let primary_media = primary.template.media_kind();
    let follow_ups = FOLLOW_UP_RULES
        .iter()
        .filter(|rule| attachments.has(rule.media) && primary_media != Some(rule.media))
        .map(|rule| PlannedMessage {
            template: rule.template,
            media: reference(rule.media),
        });

    std::iter::once(primary).chain(follow_ups).collect()
}

/// Template kinds chosen for a combination of attachment flags.
pub fn plan_for(has_image: bool, has_video: bool, has_document: bool) -> Vec<TemplateKind> {
    let flag = |present: bool, url: &str| present.then(|| url.to_string());
    let attachments = Attachments {
        image_url: flag(has_image, "image"),
        video_url: flag(has_video, "video"),
        document_url: flag(has_document, "document"),
    };
    select_templates(&attachments)
        .into_iter()
        .map(|planned| planned.template)
        .collect()
}
