pub mod api;
pub mod cli;
pub mod conversation;
pub mod core;
pub mod history;
pub mod jobs;
pub mod limiter;
pub mod openai;
pub mod telegram;
