//! Transcript plus the "awaiting an answer" flag.
//!
//! [`Conversation`] is the only writer of both. A round trip is
//! `submit` -> (caller sends the [`Dispatch`]) -> `complete`, and always adds
//! exactly one user and one bot message. Only one query may be in flight;
//! submitting while awaiting is refused.

use crate::client::AnswerClient;
use crate::error::ClientError;
use crate::models::{ChatResponse, Mode};
use crate::state::Message;

/// Shown in place of any transport failure.
pub const FALLBACK_REPLY: &str = "Server error.";

pub const GREETING: &str =
    "Hello! I am your legal AI assistant. How can I help you with Consumer Law?";

/// What the caller must send after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub query: String,
    pub mode: Mode,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    awaiting: bool,
    mode: Mode,
    /// Pending text in the input box.
    pub input: String,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting() -> Self {
        let mut conversation = Self::new();
        conversation.messages.push(Message::bot_text(GREETING));
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn submit(&mut self, query: impl Into<String>) -> Option<Dispatch> {
        let query = query.into();
        if query.trim().is_empty() {
            return None;
        }
        if self.awaiting {
            tracing::debug!("submit refused: an answer is still pending");
            return None;
        }

        self.messages.push(Message::user(query.clone()));
        self.input.clear();
        self.awaiting = true;

        tracing::debug!(mode = %self.mode, "query dispatched");
        Some(Dispatch {
            query,
            mode: self.mode,
        })
    }

    /// Submit whatever is in the input buffer.
    pub fn submit_input(&mut self) -> Option<Dispatch> {
        let query = self.input.clone();
        self.submit(query)
    }

    pub fn on_result(&mut self, response: ChatResponse) {
        if !self.awaiting {
            tracing::debug!("answer ignored: no query pending");
            return;
        }
        let message = match response {
            ChatResponse::Comparison { comparison, .. } => Message::bot_comparison(comparison),
            ChatResponse::Standard { answer, sources, .. } => Message::bot_answer(answer, sources),
        };
        self.messages.push(message);
        self.awaiting = false;
    }

    pub fn on_failure(&mut self, error: &ClientError) {
        if !self.awaiting {
            tracing::debug!(error = %error, "failure ignored: no query pending");
            return;
        }
        tracing::error!(error = %error, "answering service request failed");
        self.messages.push(Message::bot_text(FALLBACK_REPLY));
        self.awaiting = false;
    }

    pub fn complete(&mut self, outcome: Result<ChatResponse, ClientError>) {
        match outcome {
            Ok(response) => self.on_result(response),
            Err(e) => self.on_failure(&e),
        }
    }

    /// Full round trip against `client`. Returns false if the submit was refused.
    pub async fn ask<C>(&mut self, client: &C, query: impl Into<String>) -> bool
    where
        C: AnswerClient + ?Sized,
    {
        let Some(dispatch) = self.submit(query) else {
            return false;
        };
        let outcome = client.send(&dispatch.query, dispatch.mode).await;
        self.complete(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatResult, Comparison, Source};
    use crate::state::Sender;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a canned outcome and records what it was asked.
    struct ScriptedClient {
        reply: Mutex<Option<Result<ChatResponse, ClientError>>>,
        seen: Mutex<Vec<(String, Mode)>>,
    }

    impl ScriptedClient {
        fn new(reply: Result<ChatResponse, ClientError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AnswerClient for ScriptedClient {
        async fn send(&self, query: &str, mode: Mode) -> Result<ChatResponse, ClientError> {
            self.seen.lock().unwrap().push((query.to_string(), mode));
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(ClientError::Decode("no more replies".into())))
        }
    }

    fn standard(answer: &str, sources: Option<Vec<Source>>) -> ChatResponse {
        ChatResponse::Standard {
            answer: answer.to_string(),
            sources,
            processing_time: Some(0.5),
        }
    }

    fn comparison() -> ChatResponse {
        ChatResponse::Comparison {
            comparison: Comparison {
                naive: ChatResult {
                    answer: "N".to_string(),
                    sources: Vec::new(),
                    processing_time: 0.1,
                },
                advanced: ChatResult {
                    answer: "A".to_string(),
                    sources: Vec::new(),
                    processing_time: 0.2,
                },
            },
            processing_time: None,
        }
    }

    #[test]
    fn test_blank_submits_are_noops() {
        let mut conversation = Conversation::new();
        conversation.input = "   ".to_string();

        assert!(conversation.submit("").is_none());
        assert!(conversation.submit("   ").is_none());
        assert!(conversation.submit_input().is_none());

        assert!(conversation.is_empty());
        assert!(!conversation.is_awaiting());
        assert_eq!(conversation.input, "   ");
    }

    #[test]
    fn test_submit_appends_user_message_and_awaits() {
        let mut conversation = Conversation::new();
        conversation.set_mode(Mode::Naive);
        conversation.input = "Is a warranty mandatory?".to_string();

        let dispatch = conversation.submit_input().unwrap();

        assert_eq!(dispatch.query, "Is a warranty mandatory?");
        assert_eq!(dispatch.mode, Mode::Naive);
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.last().unwrap().sender(), Sender::User);
        assert!(conversation.input.is_empty());
        assert!(conversation.is_awaiting());
    }

    #[test]
    fn test_submit_while_awaiting_is_refused() {
        let mut conversation = Conversation::new();
        conversation.submit("first").unwrap();
        conversation.input = "draft".to_string();

        assert!(conversation.submit("second").is_none());
        assert_eq!(conversation.len(), 1);
        assert!(conversation.is_awaiting());
        assert_eq!(conversation.input, "draft");
    }

    #[test]
    fn test_mode_is_read_at_submit_time() {
        let mut conversation = Conversation::new();
        conversation.set_mode(Mode::Compare);
        let dispatch = conversation.submit("q").unwrap();
        conversation.set_mode(Mode::Naive);
        assert_eq!(dispatch.mode, Mode::Compare);
    }

    #[test]
    fn test_standard_result_scenario() {
        let mut conversation = Conversation::new();
        conversation.set_mode(Mode::Advanced);
        conversation.submit("q").unwrap();
        conversation.on_result(standard("X", Some(Vec::new())));

        let last = conversation.last().unwrap();
        assert_eq!(last.sender(), Sender::Bot);
        assert_eq!(last.content(), Some("X"));
        assert_eq!(last.sources(), Some(&[][..]));
        assert!(last.comparison().is_none());
        assert!(!conversation.is_awaiting());
    }

    #[test]
    fn test_comparison_result_scenario() {
        let mut conversation = Conversation::new();
        conversation.set_mode(Mode::Compare);
        conversation.submit("q").unwrap();
        conversation.on_result(comparison());

        let last = conversation.last().unwrap();
        assert!(last.content().is_none());
        assert!(last.sources().is_none());
        let data = last.comparison().unwrap();
        assert_eq!(data.naive.answer, "N");
        assert_eq!(data.advanced.answer, "A");
        assert!(!conversation.is_awaiting());
    }

    #[test]
    fn test_failure_appends_fallback() {
        let mut conversation = Conversation::new();
        conversation.submit("q").unwrap();
        conversation.on_failure(&ClientError::Decode("bad body".into()));

        let last = conversation.last().unwrap();
        assert_eq!(last.sender(), Sender::Bot);
        assert_eq!(last.content(), Some(FALLBACK_REPLY));
        assert!(last.sources().is_none());
        assert!(last.comparison().is_none());
        assert!(!conversation.is_awaiting());
    }

    #[test]
    fn test_completion_without_pending_query_is_ignored() {
        let mut conversation = Conversation::with_greeting();

        conversation.on_result(standard("stray", None));
        conversation.on_failure(&ClientError::Decode("stray".into()));
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.is_awaiting());

        conversation.submit("q").unwrap();
        conversation.on_result(standard("answer", None));
        conversation.on_result(standard("duplicate", None));
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.last().unwrap().content(), Some("answer"));
    }

    #[test]
    fn test_earlier_messages_survive_later_rounds() {
        let mut conversation = Conversation::with_greeting();
        let greeting = conversation.messages()[0].clone();

        conversation.submit("one").unwrap();
        conversation.on_result(standard("first answer", None));
        let first_answer = conversation.messages()[2].clone();

        conversation.submit("two").unwrap();
        conversation.on_result(comparison());

        assert_eq!(conversation.messages()[0], greeting);
        assert_eq!(conversation.messages()[2], first_answer);
        assert_eq!(conversation.len(), 5);
    }

    #[tokio::test]
    async fn test_ask_round_trip_adds_two_messages() {
        let client = ScriptedClient::new(Ok(standard("Fourteen days.", None)));
        let mut conversation = Conversation::with_greeting();
        conversation.set_mode(Mode::Advanced);

        assert!(conversation.ask(&client, "Withdrawal delay?").await);

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.last().unwrap().content(), Some("Fourteen days."));
        assert!(!conversation.is_awaiting());
        assert_eq!(
            client.seen.lock().unwrap().as_slice(),
            &[("Withdrawal delay?".to_string(), Mode::Advanced)]
        );
    }

    #[tokio::test]
    async fn test_ask_failure_still_completes() {
        let client = ScriptedClient::new(Err(ClientError::Decode("garbage".into())));
        let mut conversation = Conversation::new();

        assert!(conversation.ask(&client, "q").await);

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last().unwrap().content(), Some(FALLBACK_REPLY));
        assert!(!conversation.is_awaiting());
    }

    #[tokio::test]
    async fn test_ask_blank_never_reaches_client() {
        let client = ScriptedClient::new(Ok(standard("unused", None)));
        let mut conversation = Conversation::new();

        assert!(!conversation.ask(&client, "  \t ").await);
        assert!(conversation.is_empty());
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_message_carries_sources_and_comparison() {
        let mut conversation = Conversation::with_greeting();
        conversation.submit("a").unwrap();
        conversation.on_result(standard("x", Some(Vec::new())));
        conversation.submit("b").unwrap();
        conversation.on_result(comparison());
        conversation.submit("c").unwrap();
        conversation.on_failure(&ClientError::Decode("e".into()));

        for msg in conversation.messages() {
            assert!(!(msg.sources().is_some() && msg.comparison().is_some()));
            if msg.is_user() {
                assert!(msg.sources().is_none() && msg.comparison().is_none());
            }
        }
    }
}
