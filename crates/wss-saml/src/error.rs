//! Error types for SAML token processing.
//!
//! Each stage has its own error: [`BootstrapError`] for object-model
//! initialization, [`ParseError`] for turning XML into an [`Assertion`], and
//! [`SignatureError`] for XML-DSig verification. The processor surfaces all of
//! them as [`SecurityError`], which also knows the WS-Security fault code to
//! report.
//!
//! [`Assertion`]: crate::types::Assertion

use thiserror::Error;
use wss_crypto::{AlgorithmError, CryptoError, TrustError};

use crate::types::fault_codes;

/// Result type for token processing.
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Object-model initialization failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BootstrapError {
    /// Two unmarshallers were registered for the same element.
    #[error("duplicate unmarshaller for {{{namespace}}}{local_name}")]
    DuplicateUnmarshaller {
        /// Element namespace URI.
        namespace: String,
        /// Element local name.
        local_name: String,
    },

    /// The initializer failed.
    #[error("SAML object model initialization failed: {0}")]
    Initialization(String),
}

/// Failures turning untrusted XML into a typed assertion.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Object model could not be initialized.
    #[error("SAML library is not available")]
    Bootstrap(#[from] BootstrapError),

    /// Input exceeds the configured size limit.
    #[error("token is {actual} bytes, limit is {limit}")]
    TooLarge {
        /// Configured limit.
        limit: usize,
        /// Input size.
        actual: usize,
    },

    /// Input declares a document type.
    #[error("document type declarations are not allowed in security tokens")]
    DtdForbidden,

    /// Input is not well-formed XML or exceeds the node limit.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// Root element has no registered unmarshaller.
    #[error("no unmarshaller registered for {{{namespace}}}{local_name}")]
    UnknownElement {
        /// Element namespace URI (empty if none).
        namespace: String,
        /// Element local name.
        local_name: String,
    },

    /// A required element is absent.
    #[error("missing required element: {0}")]
    MissingElement(&'static str),

    /// A required attribute is absent.
    #[error("missing required attribute {attribute} on {element}")]
    MissingAttribute {
        /// Owning element.
        element: &'static str,
        /// Attribute name.
        attribute: &'static str,
    },

    /// An element occurs where the schema does not allow it.
    #[error("unexpected element {0}")]
    UnexpectedElement(String),

    /// A value does not satisfy its schema type.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field or attribute name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Assertion is not SAML 2.0.
    #[error("unsupported SAML version: {0}")]
    UnsupportedVersion(String),

    /// Content that this processor does not handle.
    #[error("unsupported content: {0}")]
    Unsupported(&'static str),
}

/// XML-DSig verification failures.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The signature element does not have the expected shape.
    #[error("malformed signature: {0}")]
    Malformed(String),

    /// An algorithm is unknown or refused by policy.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(#[from] AlgorithmError),

    /// A canonicalization or transform URI is not accepted.
    #[error("unsupported transform: {0}")]
    UnsupportedTransform(String),

    /// The reference does not point at the assertion.
    #[error("signature reference '{found}' does not cover assertion '{expected}'")]
    ReferenceMismatch {
        /// `#` followed by the assertion ID.
        expected: String,
        /// Reference URI found in the signature.
        found: String,
    },

    /// The referenced ID is declared more than once.
    #[error("ID '{0}' is not unique in the token")]
    DuplicateId(String),

    /// The reference digest does not match the content.
    #[error("digest of the signed content does not match")]
    DigestMismatch,

    /// Base64 content could not be decoded.
    #[error("invalid base64 in {element}: {reason}")]
    Encoding {
        /// Element holding the value.
        element: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// No certificate is available to check the signature.
    #[error("no signing certificate available for issuer '{0}'")]
    NoSigningKey(String),

    /// The signing certificate is not trusted.
    #[error("signing certificate rejected: {0}")]
    Untrusted(#[from] TrustError),

    /// The signature value does not verify.
    #[error("signature value rejected: {0}")]
    Crypto(#[from] CryptoError),

    /// Signed content could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// The isolated token document could not be read back.
    #[error("token document unreadable: {0}")]
    Document(String),
}

/// Unified error returned by the token processor.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Object model could not be initialized.
    #[error("SAML library bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// Token could not be parsed.
    #[error("failure in unmarshalling the assertion: {0}")]
    Parse(#[from] ParseError),

    /// Token signature was rejected.
    #[error("SAML signature validation failed: {0}")]
    Signature(#[from] SignatureError),
}

impl SecurityError {
    /// Returns the WS-Security fault code for this error.
    #[must_use]
    pub const fn fault_code(&self) -> &'static str {
        match self {
            Self::Bootstrap(_) | Self::Parse(_) => fault_codes::INVALID_SECURITY_TOKEN,
            Self::Signature(_) => fault_codes::FAILED_CHECK,
        }
    }
}
