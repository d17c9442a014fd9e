use poem::http::StatusCode;
use tracing::error;

use crate::{
    application::{
        handlers::wish_dispatcher::WishDispatchReport,
        usecases::{
            broadcast_marketing::BroadcastReport, dispatch_due_wishes::DispatchRunReport,
            reconcile_status::ReconcileReport,
        },
    },
    domain::{errors::DispatchError, models::Wish},
    presentation::http::responses::{
        BroadcastResponseDto, BroadcastResultDto, DispatchResponseDto, WebhookResponseDto,
        WishDispatchResultDto, WishDto,
    },
};

pub fn map_wish(wish: &Wish) -> WishDto {
    WishDto {
        id: wish.id,
        sender_name: wish.sender_name.clone(),
        recipient_name: wish.recipient_name.clone(),
        recipient_phone: wish.recipient_phone.clone(),
        occasion: wish.occasion.into(),
        message_text: wish.message_text.clone(),
        language: wish.language.clone(),
        image_url: wish.attachments.image_url.clone(),
        video_url: wish.attachments.video_url.clone(),
        document_url: wish.attachments.document_url.clone(),
        scheduled_at: wish.scheduled_at.to_rfc3339(),
        status: wish.status.into(),
        delivered_at: wish.delivered_at.map(|at| at.to_rfc3339()),
        provider_message_id: wish.provider_message_id.clone(),
        provider_status: wish.provider_status.map(Into::into),
        provider_status_updated_at: wish.provider_status_updated_at.map(|at| at.to_rfc3339()),
        provider_error: wish.provider_error.clone(),
        created_at: wish.created_at.to_rfc3339(),
        updated_at: wish.updated_at.to_rfc3339(),
    }
}

pub fn map_wish_report(report: &WishDispatchReport) -> WishDispatchResultDto {
    WishDispatchResultDto {
        wish_id: report.wish_id,
        recipient_name: report.recipient_name.clone(),
        status: report.status.into(),
        messages_planned: report.messages_planned as u32,
        messages_sent: report.messages_sent as u32,
        provider_message_id: report.provider_message_id.clone(),
        errors: report.errors.clone(),
    }
}

pub fn map_run_report(report: &DispatchRunReport) -> DispatchResponseDto {
    DispatchResponseDto {
        success: true,
        reclaimed: report.reclaimed as u32,
        claimed: report.claimed as u32,
        sent: report.sent as u32,
        failed: report.failed as u32,
        skipped: report.skipped as u32,
        results: report.results.iter().map(map_wish_report).collect(),
        errors: report.errors.clone(),
    }
}

pub fn map_broadcast_report(report: &BroadcastReport) -> BroadcastResponseDto {
    BroadcastResponseDto {
        total: report.total as u32,
        successful: report.successful as u32,
        failed: report.failed as u32,
        results: report
            .results
            .iter()
            .map(|result| BroadcastResultDto {
                phone: result.phone.clone(),
                success: result.provider_message_id.is_some(),
                message_id: result.provider_message_id.clone(),
                error: result.error.clone(),
            })
            .collect(),
    }
}

pub fn map_reconcile_report(report: &ReconcileReport, skipped: usize) -> WebhookResponseDto {
    WebhookResponseDto {
        success: true,
        applied: report.applied as u32,
        stale: report.stale as u32,
        unmatched: report.unmatched as u32,
        failed: report.failed as u32,
        inbound: report.inbound as u32,
        skipped: skipped as u32,
    }
}

pub fn status_for(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
        DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::ClaimConflict(_) => StatusCode::CONFLICT,
        DispatchError::MediaFetch { .. }
        | DispatchError::MediaUpload { .. }
        | DispatchError::Dispatch { .. }
        | DispatchError::Configuration(_)
        | DispatchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn map_dispatch_error(err: DispatchError) -> poem::Error {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    poem::Error::from_string(err.to_string(), status)
}
