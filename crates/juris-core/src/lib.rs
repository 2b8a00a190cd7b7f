pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod state;

// Re-export main types for convenience
pub use client::{AnswerClient, HttpAnswerClient};
pub use config::Config;
pub use conversation::{Conversation, Dispatch, FALLBACK_REPLY, GREETING};
pub use error::{ClientError, ParseModeError};
pub use models::{ChatRequest, ChatResponse, ChatResult, Comparison, Mode, Source};
pub use state::{Message, Sender};
