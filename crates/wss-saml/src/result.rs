//! Validation results handed to the security-header pipeline.

use std::sync::Arc;

use serde::Serialize;

use crate::extract::{Claim, ValidityWindow};
use crate::types::{Assertion, SAML_NS};

/// Kind of token a result describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Assertion without a verified signature.
    UnsignedSaml,
    /// Assertion whose signature verified.
    SignedSaml,
}

impl TokenKind {
    /// Kind for a verification outcome.
    #[must_use]
    pub const fn from_signed(signed: bool) -> Self {
        if signed {
            Self::SignedSaml
        } else {
            Self::UnsignedSaml
        }
    }
}

/// SAML version of a processed assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SamlVersion {
    /// SAML 2.0.
    #[default]
    #[serde(rename = "urn:oasis:names:tc:SAML:2.0:assertion")]
    V2_0,
}

impl SamlVersion {
    /// Namespace URI identifying the version.
    #[must_use]
    pub const fn namespace(&self) -> &'static str {
        match self {
            Self::V2_0 => SAML_NS,
        }
    }
}

/// Everything the pipeline needs to make a trust decision about one token.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Signed or unsigned.
    pub kind: TokenKind,
    /// The parsed assertion.
    pub assertion: Arc<Assertion>,
    /// SAML version tag.
    pub version: SamlVersion,
    /// Assertion ID.
    pub token_id: String,
    /// Issuer identifier.
    pub issuer: String,
    /// Subject attributes.
    pub claims: Vec<Claim>,
    /// Validity window.
    pub validity: ValidityWindow,
    /// Whether the signature was present and verified.
    pub signed: bool,
}

/// One entry of a processor's result batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "result", rename_all = "snake_case")]
pub enum EngineResult {
    /// The token result.
    SamlToken(Box<ValidationResult>),
    /// Validity window for the downstream timestamp check.
    SamlTimestamp(ValidityWindow),
}

/// Packages the derived facts of an assertion.
///
/// `signed` must match `assertion.signed()`.
pub fn build(
    assertion: Arc<Assertion>,
    signed: bool,
    issuer: String,
    claims: Vec<Claim>,
    validity: ValidityWindow,
) -> ValidationResult {
    debug_assert_eq!(signed, assertion.signed(), "signed flag disagrees with assertion");
    ValidationResult {
        kind: TokenKind::from_signed(signed),
        token_id: assertion.id.clone(),
        assertion,
        version: SamlVersion::V2_0,
        issuer,
        claims,
        validity,
        signed,
    }
}

/// Inserts a batch at the front of `results`, keeping the batch order.
///
/// Results are kept most recent first.
pub fn merge_results(results: &mut Vec<EngineResult>, batch: Vec<EngineResult>) {
    results.splice(0..0, batch);
}
