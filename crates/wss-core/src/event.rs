//! Audit events for security token processing.
//!
//! Every call into a token processor produces exactly one event describing
//! what was accepted or why it was refused. Events are emitted through
//! `tracing` under the `wss::audit` target so deployments can route them to
//! a separate sink.
//!
//! All events include:
//! - Timestamp (RFC 3339)
//! - Event type and outcome
//! - Token identifier and issuer (when the token parsed far enough)
//! - Whether the token carried a verified signature

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenEventType {
    /// A token was parsed and its results handed to the pipeline.
    TokenProcessed,
    /// A token was refused.
    TokenRejected,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEvent {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: TokenEventType,

    /// Outcome of the event.
    pub outcome: TokenEventOutcome,

    /// Token kind, e.g. `saml2`.
    pub token_kind: String,

    /// Identifier of the token (assertion ID).
    pub token_id: Option<String>,

    /// Issuer of the token.
    pub issuer: Option<String>,

    /// Whether a signature was present and verified.
    pub signed: bool,

    /// Error message (for failure events).
    pub error: Option<String>,
}

impl TokenEvent {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: TokenEventType, token_kind: &'static str) -> TokenEventBuilder {
        TokenEventBuilder::new(event_type, token_kind)
    }

    /// Writes the event to the `wss::audit` tracing target.
    pub fn emit(&self) {
        match self.outcome {
            TokenEventOutcome::Success => tracing::info!(
                target: "wss::audit",
                event_id = %self.id,
                event_type = ?self.event_type,
                token_kind = %self.token_kind,
                token_id = self.token_id.as_deref().unwrap_or("-"),
                issuer = self.issuer.as_deref().unwrap_or("-"),
                signed = self.signed,
                "Security token processed"
            ),
            TokenEventOutcome::Failure => tracing::info!(
                target: "wss::audit",
                event_id = %self.id,
                event_type = ?self.event_type,
                token_kind = %self.token_kind,
                token_id = self.token_id.as_deref().unwrap_or("-"),
                error = self.error.as_deref().unwrap_or("-"),
                "Security token rejected"
            ),
        }
    }
}

/// Builder for creating events.
pub struct TokenEventBuilder {
    event_type: TokenEventType,
    outcome: TokenEventOutcome,
    token_kind: &'static str,
    token_id: Option<String>,
    issuer: Option<String>,
    signed: bool,
    error: Option<String>,
}

impl TokenEventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: TokenEventType, token_kind: &'static str) -> Self {
        Self {
            event_type,
            outcome: TokenEventOutcome::Success,
            token_kind,
            token_id: None,
            issuer: None,
            signed: false,
            error: None,
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = TokenEventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = TokenEventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the token identifier.
    #[must_use]
    pub fn token_id(mut self, id: impl Into<String>) -> Self {
        self.token_id = Some(id.into());
        self
    }

    /// Sets the issuer.
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Records whether the token signature was verified.
    #[must_use]
    pub const fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> TokenEvent {
        TokenEvent {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            token_kind: self.token_kind.to_string(),
            token_id: self.token_id,
            issuer: self.issuer,
            signed: self.signed,
            error: self.error,
        }
    }
}
