pub mod template;
pub mod wish;

pub use template::{HeaderMedia, MediaReference, PlannedMessage, TemplateKind, TemplateMessage};
pub use wish::{
    Attachments, DeliveryOutcome, MediaKind, NewWish, Occasion, ProviderStatus, Wish, WishStatus,
};
