use poem_openapi::Enum;

use crate::domain::models::{Occasion, ProviderStatus, WishStatus};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum OccasionKind {
    #[oai(rename = "birthday")]
    Birthday,
    #[oai(rename = "anniversary")]
    Anniversary,
    #[oai(rename = "festival")]
    Festival,
    #[oai(rename = "apology")]
    Apology,
    #[oai(rename = "appreciation")]
    Appreciation,
    #[oai(rename = "congratulations")]
    Congratulations,
    #[oai(rename = "get_well_soon")]
    GetWellSoon,
    #[oai(rename = "just_because")]
    JustBecause,
}

impl From<Occasion> for OccasionKind {
    fn from(value: Occasion) -> Self {
        match value {
            Occasion::Birthday => OccasionKind::Birthday,
            Occasion::Anniversary => OccasionKind::Anniversary,
            Occasion::Festival => OccasionKind::Festival,
            Occasion::Apology => OccasionKind::Apology,
            Occasion::Appreciation => OccasionKind::Appreciation,
            Occasion::Congratulations => OccasionKind::Congratulations,
            Occasion::GetWellSoon => OccasionKind::GetWellSoon,
            Occasion::JustBecause => OccasionKind::JustBecause,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum WishStatusDto {
    #[oai(rename = "scheduled")]
    Scheduled,
    #[oai(rename = "sending")]
    Sending,
    #[oai(rename = "sent")]
    Sent,
    #[oai(rename = "failed")]
    Failed,
}

impl From<WishStatus> for WishStatusDto {
    fn from(value: WishStatus) -> Self {
        match value {
            WishStatus::Scheduled => WishStatusDto::Scheduled,
            WishStatus::Sending => WishStatusDto::Sending,
            WishStatus::Sent => WishStatusDto::Sent,
            WishStatus::Failed => WishStatusDto::Failed,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProviderStatusDto {
    #[oai(rename = "sent")]
    Sent,
    #[oai(rename = "delivered")]
    Delivered,
    #[oai(rename = "read")]
    Read,
    #[oai(rename = "failed")]
    Failed,
}

impl From<ProviderStatus> for ProviderStatusDto {
    fn from(value: ProviderStatus) -> Self {
        match value {
            ProviderStatus::Sent => ProviderStatusDto::Sent,
            ProviderStatus::Delivered => ProviderStatusDto::Delivered,
            ProviderStatus::Read => ProviderStatusDto::Read,
            ProviderStatus::Failed => ProviderStatusDto::Failed,
        }
    }
}
