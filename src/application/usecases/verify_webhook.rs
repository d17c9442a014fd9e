use tracing::warn;

const SUBSCRIBE_MODE: &str = "subscribe";

#[derive(Debug, Clone, Default)]
pub struct VerifyWebhookRequest {
    pub mode: Option<String>,
    pub verify_token: Option<String>,
    pub challenge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Echo this challenge back verbatim.
    Verified(String),
    Rejected,
}

/// Stateless subscription handshake for the provider webhook.
pub struct VerifyWebhookUseCase {
    verify_token: Option<String>,
}

impl VerifyWebhookUseCase {
    pub fn new(verify_token: Option<String>) -> Self {
        Self { verify_token }
    }

    pub fn execute(&self, request: VerifyWebhookRequest) -> VerifyOutcome {
        let Some(expected) = self.verify_token.as_deref().filter(|t| !t.is_empty()) else {
            warn!("webhook verification attempted without WHATSAPP_VERIFY_TOKEN");
            return VerifyOutcome::Rejected;
        };

        let matches = request.mode.as_deref() == Some(SUBSCRIBE_MODE)
            && request.verify_token.as_deref() == Some(expected);
        match (matches, request.challenge) {
            (true, Some(challenge)) => VerifyOutcome::Verified(challenge),
            _ => {
                warn!(mode = request.mode.as_deref().unwrap_or_default(), "webhook verification rejected");
                VerifyOutcome::Rejected
            }
        }
    }
}
