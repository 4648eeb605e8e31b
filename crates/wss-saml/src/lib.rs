//! SAML 2.0 assertion processing for WS-Security headers.
//!
//! This crate turns an untrusted `saml2:Assertion` element into the facts a
//! security-header pipeline needs to make a trust decision:
//!
//! - **Hardened parsing** - DTDs refused, node and byte limits, and the
//!   token re-parsed into an isolated document
//! - **XML signature validation** - exclusive C14N, reference and wrapping
//!   checks, digest and signature value against a [`wss_crypto::TrustProvider`]
//! - **Claims and validity** - attributes, issuer, and the `Conditions` window
//!
//! # Architecture
//!
//! - [`bootstrap`] - one-time, thread-safe setup of the unmarshaller registry
//! - [`parser`] - hardened XML parsing and assertion binding
//! - [`signature`] - canonicalization and signature validation
//! - [`extract`] - claims, issuer and validity window
//! - [`result`] - result entries handed to the pipeline
//! - [`processor`] - the token processor orchestrating the above
//! - [`types`] - the assertion object model
//! - [`error`] - error types and WS-Security fault codes
//!
//! # Example
//!
//! ```rust,ignore
//! use wss_core::ProcessorConfig;
//! use wss_crypto::TrustStore;
//! use wss_saml::{ProcessingContext, Saml2TokenProcessor};
//!
//! let trust = TrustStore::new();
//! let processor = Saml2TokenProcessor::new(&ProcessorConfig::default());
//! let results = processor.handle_token_str(xml, &ProcessingContext::new(&trust))?;
//! ```
//!
//! # Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)
//! - [Exclusive XML Canonicalization](https://www.w3.org/TR/xml-exc-c14n/)
//! - [WSS SAML Token Profile](https://docs.oasis-open.org/wss-m/wss/v1.1.1/wss-SAMLTokenProfile-v1.1.1.html)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod error;
pub mod extract;
pub mod parser;
pub mod processor;
pub mod result;
pub mod signature;
pub mod types;
mod xml;

pub use bootstrap::{Bootstrap, BootstrapState};
pub use error::{BootstrapError, ParseError, SecurityError, SecurityResult, SignatureError};
pub use extract::{Claim, ValidityWindow, WindowStatus};
pub use parser::AssertionParser;
pub use processor::{KeyResolver, ProcessingContext, Saml2TokenProcessor, TokenProcessor};
pub use result::{merge_results, EngineResult, SamlVersion, TokenKind, ValidationResult};
pub use signature::{ExclusiveC14n, SignatureValidator};
pub use types::Assertion;
