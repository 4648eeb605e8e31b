//! SAML name identifier types.
//!
//! `saml:NameID` and `saml:Issuer` share the `NameIDType` schema type: a
//! string value with optional format and qualifiers.

use serde::Serialize;

/// Entity format URI, the default for `saml:Issuer`.
pub const ENTITY_FORMAT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:entity";

/// `saml:NameID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameId {
    /// Identifier text.
    pub value: String,

    /// Format URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// `NameQualifier` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,

    /// `SPNameQualifier` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,

    /// `SPProvidedID` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_provided_id: Option<String>,
}

impl NameId {
    /// Creates a name ID with the given value and no qualifiers.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            name_qualifier: None,
            sp_name_qualifier: None,
            sp_provided_id: None,
        }
    }
}

/// Issuer of an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issuer {
    /// Issuer identifier, normally the IdP entity ID.
    pub value: String,

    /// Name format; absent means entity format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Issuer {
    /// Returns the effective format URI.
    #[must_use]
    pub fn effective_format(&self) -> &str {
        self.format.as_deref().unwrap_or(ENTITY_FORMAT)
    }
}
