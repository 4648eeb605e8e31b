//! The `saml:Assertion` object model.
//!
//! Only the parser constructs these values.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Issuer, NameId};
use crate::signature::XmlSignature;

/// A parsed `saml:Assertion`.
///
/// Immutable once returned by the parser. [`Assertion::signed`] turns true
/// only on values the token processor has verified.
#[derive(Debug, Clone, Serialize)]
pub struct Assertion {
    /// `ID` attribute; the signature reference target.
    pub id: String,

    /// `Version` attribute, always `2.0`.
    pub version: String,

    /// `IssueInstant` attribute.
    pub issue_instant: DateTime<Utc>,

    /// Asserting party.
    pub issuer: Issuer,

    /// `saml:Subject`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// `saml:Conditions`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Authentication statements, in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authn_statements: Vec<AuthnStatement>,

    /// Attribute statements, in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attribute_statements: Vec<AttributeStatement>,

    #[serde(skip)]
    pub(crate) signature: Option<XmlSignature>,

    #[serde(skip)]
    pub(crate) signed: bool,

    /// Serialized isolated document the assertion was bound from.
    #[serde(skip)]
    pub(crate) source: Arc<str>,
}

impl Assertion {
    /// Returns true if the assertion carries a `ds:Signature` child.
    #[must_use]
    pub const fn signature_present(&self) -> bool {
        self.signature.is_some()
    }

    /// Returns true only once the signature has been verified.
    #[must_use]
    pub const fn signed(&self) -> bool {
        self.signed
    }

    /// Returns the signature summary, if a signature is present.
    #[must_use]
    pub const fn signature(&self) -> Option<&XmlSignature> {
        self.signature.as_ref()
    }

    /// Returns the isolated XML document this assertion was parsed from.
    #[must_use]
    pub fn source_xml(&self) -> &str {
        &self.source
    }

    /// Returns the subject name identifier, if any.
    #[must_use]
    pub fn subject_name_id(&self) -> Option<&NameId> {
        self.subject.as_ref().and_then(|s| s.name_id.as_ref())
    }

    /// Iterates over every audience in every audience restriction.
    pub fn audiences(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .flat_map(|c| c.audience_restrictions.iter())
            .flat_map(|r| r.audiences.iter().map(String::as_str))
    }

    /// Returns this assertion marked as signature-verified.
    pub(crate) fn into_verified(mut self) -> Self {
        self.signed = true;
        self
    }
}

/// `saml:Subject`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Subject {
    /// Principal identifier.
    pub name_id: Option<NameId>,
    /// Confirmations, in document order.
    pub subject_confirmations: Vec<SubjectConfirmation>,
}

/// `saml:SubjectConfirmation`: how a relying party may confirm the subject.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectConfirmation {
    /// Method URI, see [`super::confirmation_methods`].
    pub method: String,
    /// Constraints on the confirmation.
    pub subject_confirmation_data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    /// Returns true for the bearer method.
    #[must_use]
    pub fn is_bearer(&self) -> bool {
        self.method == super::confirmation_methods::BEARER
    }
}

/// `saml:SubjectConfirmationData`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubjectConfirmationData {
    /// ID of the request being answered.
    pub in_response_to: Option<String>,
    /// Confirmation expiry.
    pub not_on_or_after: Option<DateTime<Utc>>,
    /// Confirmation start.
    pub not_before: Option<DateTime<Utc>>,
    /// Endpoint the assertion may be delivered to.
    pub recipient: Option<String>,
    /// Network address of the presenter.
    pub address: Option<String>,
}

/// `saml:Conditions`.
///
/// `not_before` is inclusive and `not_on_or_after` exclusive; the parser
/// guarantees `not_before < not_on_or_after` when both are set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conditions {
    /// Start of validity.
    pub not_before: Option<DateTime<Utc>>,
    /// End of validity.
    pub not_on_or_after: Option<DateTime<Utc>>,
    /// Each restriction must be satisfied by the relying party.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audience_restrictions: Vec<AudienceRestriction>,
    /// `saml:OneTimeUse` was present.
    pub one_time_use: bool,
    /// `saml:ProxyRestriction`, if any.
    pub proxy_restriction: Option<ProxyRestriction>,
}

/// `saml:AudienceRestriction`; satisfied by any one of its audiences.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AudienceRestriction {
    /// Audience URIs.
    pub audiences: Vec<String>,
}

/// `saml:ProxyRestriction`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProxyRestriction {
    /// Maximum number of indirections.
    pub count: Option<u32>,
    /// Audiences a derived assertion may be issued to.
    pub audiences: Vec<String>,
}

/// `saml:AuthnStatement`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthnStatement {
    /// When the subject authenticated.
    pub authn_instant: DateTime<Utc>,
    /// Session index at the issuer.
    pub session_index: Option<String>,
    /// Session expiry requested by the issuer.
    pub session_not_on_or_after: Option<DateTime<Utc>>,
    /// How the subject authenticated.
    pub authn_context: AuthnContext,
    /// Where the subject authenticated from.
    pub subject_locality: Option<SubjectLocality>,
}

/// `saml:AuthnContext`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthnContext {
    /// `AuthnContextClassRef` URI.
    pub authn_context_class_ref: Option<String>,
    /// `AuthnContextDeclRef` URI.
    pub authn_context_decl_ref: Option<String>,
    /// `AuthenticatingAuthority` entity IDs.
    pub authenticating_authorities: Vec<String>,
}

/// `saml:SubjectLocality`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubjectLocality {
    /// `Address` attribute.
    pub address: Option<String>,
    /// `DNSName` attribute.
    pub dns_name: Option<String>,
}

/// `saml:AttributeStatement`. Never empty once parsed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttributeStatement {
    /// Attributes, in document order.
    pub attributes: Vec<Attribute>,
}

/// `saml:Attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Name format URI.
    pub name_format: Option<String>,
    /// Display name.
    pub friendly_name: Option<String>,
    /// Text of each `saml:AttributeValue`, in document order.
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assertion() -> Assertion {
        Assertion {
            id: "abc123".into(),
            version: "2.0".into(),
            issue_instant: Utc::now(),
            issuer: Issuer {
                value: "https://idp.example".into(),
                format: None,
            },
            subject: Some(Subject {
                name_id: Some(NameId::new("alice")),
                subject_confirmations: Vec::new(),
            }),
            conditions: Some(Conditions {
                audience_restrictions: vec![
                    AudienceRestriction {
                        audiences: vec!["https://sp.example".into()],
                    },
                    AudienceRestriction {
                        audiences: vec!["https://other.example".into()],
                    },
                ],
                ..Conditions::default()
            }),
            authn_statements: Vec::new(),
            attribute_statements: Vec::new(),
            signature: None,
            signed: false,
            source: Arc::from("<saml:Assertion/>"),
        }
    }

    #[test]
    fn unsigned_until_verified() {
        let assertion = assertion();
        assert!(!assertion.signature_present());
        assert!(!assertion.signed());
        assert!(assertion.into_verified().signed());
    }

    #[test]
    fn audiences_flatten_restrictions() {
        let assertion = assertion();
        let audiences: Vec<_> = assertion.audiences().collect();
        assert_eq!(audiences, ["https://sp.example", "https://other.example"]);
        assert_eq!(assertion.subject_name_id().map(|n| n.value.as_str()), Some("alice"));
    }

    #[test]
    fn serializes_without_internal_state() {
        let json = serde_json::to_value(assertion()).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["issuer"]["value"], "https://idp.example");
        assert!(json.get("source").is_none());
        assert!(json.get("signed").is_none());
        assert!(json.get("authn_statements").is_none());
    }
}
