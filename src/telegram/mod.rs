//! Minimal Telegram Bot API transport: webhook update models and the
//! calls the relay needs to answer them.

pub mod client;
pub mod models;

pub use client::*;
pub use models::*;

pub const GREETING_MESSAGE: &str = "Hi! I'm your AI assistant. How can I help you today?";
