pub mod client;
pub mod mime;
pub mod payload;
pub mod webhook;
