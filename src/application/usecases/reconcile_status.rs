use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    events::ProviderEvent,
    repositories::{StatusApplyOutcome, WishRepository},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub applied: usize,
    pub stale: usize,
    pub unmatched: usize,
    pub failed: usize,
    pub inbound: usize,
}

/// Applies provider status callbacks to stored wishes. A failure on one
/// event is logged and counted, never propagated to its siblings.
pub struct ReconcileStatusUseCase {
    repo: Arc<dyn WishRepository>,
}

impl ReconcileStatusUseCase {
    pub fn new(repo: Arc<dyn WishRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, events: Vec<ProviderEvent>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for event in events {
            match event {
                ProviderEvent::Status(status) => {
                    match self.repo.apply_provider_status(&status).await {
                        Ok(StatusApplyOutcome::Applied) => {
                            debug!(
                                provider_message_id = %status.provider_message_id,
                                status = status.status.as_str(),
                                "provider status applied"
                            );
                            report.applied += 1;
                        }
                        Ok(StatusApplyOutcome::Stale) => {
                            debug!(
                                provider_message_id = %status.provider_message_id,
                                status = status.status.as_str(),
                                "ignoring out-of-order provider status"
                            );
                            report.stale += 1;
                        }
                        Ok(StatusApplyOutcome::Unmatched) => {
                            info!(
                                provider_message_id = %status.provider_message_id,
                                "no wish for provider status"
                            );
                            report.unmatched += 1;
                        }
                        Err(err) => {
                            warn!(
                                provider_message_id = %status.provider_message_id,
                                error = %err,
                                "failed to apply provider status"
                            );
                            report.failed += 1;
                        }
                    }
                }
                ProviderEvent::InboundMessage(message) => {
                    info!(
                        provider_message_id = %message.provider_message_id,
                        from = %message.from,
                        message_type = %message.message_type,
                        contact = message.contact_name.as_deref().unwrap_or_default(),
                        "inbound message received"
                    );
                    report.inbound += 1;
                }
            }
        }

        report
    }
}
