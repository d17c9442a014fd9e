pub mod broadcast;
pub mod dispatch;
pub mod health;
pub mod root;
pub mod webhook;
pub mod wishes;
