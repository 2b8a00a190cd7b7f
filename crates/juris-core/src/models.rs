//! Wire types exchanged with the answering service.
//!
//! The service answers `POST /api/message` with one JSON object whose fields
//! are all optional. [`ChatResponse`] folds that into a proper enum at decode
//! time so nothing downstream has to look at field presence again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseModeError;

/// Retrieval strategy requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Naive,
    #[default]
    Advanced,
    Compare,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Naive => "naive",
            Mode::Advanced => "advanced",
            Mode::Compare => "compare",
        }
    }

    pub fn all() -> Vec<Mode> {
        vec![Mode::Naive, Mode::Advanced, Mode::Compare]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Naive => "Naive RAG",
            Mode::Advanced => "Advanced RAG",
            Mode::Compare => "Compare (naive vs advanced)",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "naive" => Ok(Mode::Naive),
            "advanced" => Ok(Mode::Advanced),
            "compare" => Ok(Mode::Compare),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// One cited excerpt backing an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub article_number: String,
    pub content: String,
    pub score: f64,
    /// Opaque service-side payload, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// A single strategy's full answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub answer: String,
    pub sources: Vec<Source>,
    pub processing_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub naive: ChatResult,
    pub advanced: ChatResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub mode: Mode,
}

/// Decoded answer from the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireResponse")]
pub enum ChatResponse {
    Standard {
        answer: String,
        sources: Option<Vec<Source>>,
        processing_time: Option<f64>,
    },
    Comparison {
        comparison: Comparison,
        /// Total time for both pipelines, when the service reports it.
        processing_time: Option<f64>,
    },
}

impl ChatResponse {
    pub fn processing_time(&self) -> Option<f64> {
        match self {
            ChatResponse::Standard { processing_time, .. }
            | ChatResponse::Comparison { processing_time, .. } => *processing_time,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    sources: Option<Vec<Source>>,
    #[serde(default)]
    processing_time: Option<f64>,
    #[serde(default)]
    comparison: Option<Comparison>,
}

impl TryFrom<WireResponse> for ChatResponse {
    type Error = String;

    fn try_from(wire: WireResponse) -> Result<Self, Self::Error> {
        if let Some(comparison) = wire.comparison {
            return Ok(ChatResponse::Comparison {
                comparison,
                processing_time: wire.processing_time,
            });
        }

        match wire.answer {
            Some(answer) => Ok(ChatResponse::Standard {
                answer,
                sources: wire.sources,
                processing_time: wire.processing_time,
            }),
            None => Err("response carries neither `answer` nor `comparison`".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_parses_literals() {
        assert_eq!("naive".parse::<Mode>().unwrap(), Mode::Naive);
        assert_eq!("Advanced".parse::<Mode>().unwrap(), Mode::Advanced);
        assert_eq!(" compare ".parse::<Mode>().unwrap(), Mode::Compare);
        assert!("hybrid".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_default_is_advanced() {
        assert_eq!(Mode::default(), Mode::Advanced);
    }

    #[test]
    fn test_request_serializes_mode_literal() {
        let request = ChatRequest {
            query: "Can I return a gift?".to_string(),
            mode: Mode::Compare,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"query": "Can I return a gift?", "mode": "compare"}));
    }

    #[test]
    fn test_standard_response_with_sources() {
        let body = json!({
            "answer": "X",
            "sources": [{
                "article_number": "L221-18",
                "content": "Le consommateur dispose d'un délai de quatorze jours",
                "score": 0.82,
                "metadata": {"theme": "retractation", "type": "article"}
            }],
            "processing_time": 1.4
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();
        match response {
            ChatResponse::Standard { answer, sources, processing_time } => {
                assert_eq!(answer, "X");
                let sources = sources.unwrap();
                assert_eq!(sources.len(), 1);
                assert_eq!(sources[0].article_number, "L221-18");
                assert_eq!(sources[0].metadata.as_ref().unwrap()["theme"], "retractation");
                assert_eq!(processing_time, Some(1.4));
            }
            other => panic!("expected standard response, got {:?}", other),
        }
    }

    #[test]
    fn test_standard_response_tolerates_nulls() {
        let body = json!({
            "answer": "Only an answer",
            "sources": null,
            "processing_time": null,
            "comparison": null
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(
            response,
            ChatResponse::Standard {
                answer: "Only an answer".to_string(),
                sources: None,
                processing_time: None,
            }
        );
    }

    #[test]
    fn test_comparison_response_keeps_total_time() {
        let body = json!({
            "answer": null,
            "sources": null,
            "processing_time": 0.35,
            "comparison": {
                "naive": {"answer": "N", "sources": [], "processing_time": 0.1},
                "advanced": {"answer": "A", "sources": [], "processing_time": 0.2}
            }
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();
        match response {
            ChatResponse::Comparison { comparison, processing_time } => {
                assert_eq!(comparison.naive.answer, "N");
                assert_eq!(comparison.advanced.answer, "A");
                assert_eq!(processing_time, Some(0.35));
            }
            other => panic!("expected comparison response, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_wins_over_stray_answer() {
        let body = json!({
            "answer": "ignored",
            "comparison": {
                "naive": {"answer": "N", "sources": [], "processing_time": 0.1},
                "advanced": {"answer": "A", "sources": [], "processing_time": 0.2}
            }
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();
        assert!(matches!(response, ChatResponse::Comparison { .. }));
    }

    #[test]
    fn test_empty_response_is_rejected() {
        let result = serde_json::from_value::<ChatResponse>(json!({"processing_time": 0.2}));
        assert!(result.is_err());
    }

    #[test]
    fn test_source_without_metadata() {
        let source: Source = serde_json::from_value(json!({
            "article_number": "L212-1",
            "content": "Excerpt",
            "score": 0.5
        }))
        .unwrap();
        assert!(source.metadata.is_none());
    }
}
