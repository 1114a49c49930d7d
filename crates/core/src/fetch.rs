//! Fetch contract between the engine and per-source item fetchers.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{EnrichmentPayload, Record};

/// Failure of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote asked us to slow down (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Transient server-side unavailability (HTTP 502/503/504, timeouts).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Any other HTTP status. Classified by the code, never by the message.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response arrived but could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The record lacks a field needed to even attempt the fetch.
    #[error("missing precondition: {0}")]
    MissingPrecondition(String),

    /// Untyped failure from a collaborator that only reports text.
    /// Classified by its message.
    #[error("{0}")]
    Other(String),
}

/// How the retry controller treats a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    MissingPrecondition,
    Terminal,
}

const RETRYABLE_MARKERS: [&str; 4] = ["429", "503", "rate", "too many"];

impl FetchError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Maps an HTTP status to the matching error variant.
    pub fn from_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            429 => Self::RateLimited(msg),
            502..=504 => Self::Unavailable(msg),
            404 => Self::NotFound(msg),
            _ => Self::Http {
                status,
                message: msg,
            },
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            Self::RateLimited(_) | Self::Unavailable(_) => FailureClass::Retryable,
            Self::MissingPrecondition(_) => FailureClass::MissingPrecondition,
            Self::NotFound(_) | Self::Malformed(_) => FailureClass::Terminal,
            Self::Http { status, .. } => classify_status(*status),
            Self::Other(msg) => classify_message(msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == FailureClass::Retryable
    }
}

fn classify_status(status: u16) -> FailureClass {
    match status {
        429 | 502..=504 => FailureClass::Retryable,
        _ => FailureClass::Terminal,
    }
}

/// Legacy text heuristic for untyped failures.
pub fn classify_message(msg: &str) -> FailureClass {
    let msg = msg.to_lowercase();
    if RETRYABLE_MARKERS.iter().any(|marker| msg.contains(marker)) {
        FailureClass::Retryable
    } else {
        FailureClass::Terminal
    }
}

/// Fetches enrichment data for one record from a remote source.
///
/// Implementations are responsible for bounding each request with their own
/// timeout; the engine never cancels an in-flight fetch.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch(&self, record: &Record) -> std::result::Result<EnrichmentPayload, FetchError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "fetcher"
    }
}
