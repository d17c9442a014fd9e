pub mod repositories;
pub mod scheduler;
pub mod whatsapp;
