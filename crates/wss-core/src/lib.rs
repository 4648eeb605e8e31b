//! # wss-core
//!
//! Configuration, audit events, and error handling shared by the WS-Security
//! token processing crates.
//!
//! This crate provides foundational types used across the `wss-*` crates:
//!
//! - [`config`] - processor limits and signature policy, loadable from TOML
//! - [`event`] - structured audit events for processed and rejected tokens
//! - [`error`] - errors raised while loading configuration

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::{
    ProcessorConfig, SignaturePolicy, TimestampPolicy, XmlLimits, MAX_CLOCK_SKEW_SECS,
};
pub use error::{Error, Result};
pub use event::{TokenEvent, TokenEventBuilder, TokenEventOutcome, TokenEventType};
