//! UI-agnostic transcript types
//!
//! A [`Message`] is one bubble in the conversation. Its body is private and
//! only reachable through constructors, so a message is either text, an
//! answer (optionally with sources) or a comparison, and never changes once
//! built.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::{Comparison, Source};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Text(String),
    Answer {
        content: String,
        sources: Option<Vec<Source>>,
    },
    Comparison(Comparison),
}

/// A single entry in the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    sender: Sender,
    timestamp: DateTime<Local>,
    body: Body,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, Body::Text(content.into()))
    }

    /// Bot text with no answer payload (greeting, fallback).
    pub fn bot_text(content: impl Into<String>) -> Self {
        Self::new(Sender::Bot, Body::Text(content.into()))
    }

    pub fn bot_answer(content: impl Into<String>, sources: Option<Vec<Source>>) -> Self {
        Self::new(
            Sender::Bot,
            Body::Answer {
                content: content.into(),
                sources,
            },
        )
    }

    pub fn bot_comparison(comparison: Comparison) -> Self {
        Self::new(Sender::Bot, Body::Comparison(comparison))
    }

    fn new(sender: Sender, body: Body) -> Self {
        Self {
            sender,
            timestamp: Local::now(),
            body,
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Text of the bubble. `None` for comparison results.
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            Body::Text(content) | Body::Answer { content, .. } => Some(content),
            Body::Comparison(_) => None,
        }
    }

    pub fn sources(&self) -> Option<&[Source]> {
        match &self.body {
            Body::Answer { sources, .. } => sources.as_deref(),
            _ => None,
        }
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        match &self.body {
            Body::Comparison(comparison) => Some(comparison),
            _ => None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// True for bot messages that carry something worth a detail view.
    pub fn has_details(&self) -> bool {
        self.sources().is_some_and(|s| !s.is_empty()) || self.comparison().is_some()
    }
}
