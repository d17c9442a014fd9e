pub mod provider;
pub mod sanitize;
pub mod template_selector;
