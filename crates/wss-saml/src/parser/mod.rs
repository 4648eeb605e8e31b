//! Hardened assertion parsing.
//!
//! Input is parsed by `roxmltree` with DTDs disallowed, so no entity can be
//! declared, expanded or fetched. Node count and byte size are bounded by
//! [`XmlLimits`]. A caller's DOM element is first serialized, with every
//! in-scope namespace declared on its root, and parsed again into an isolated
//! document; the caller's tree is never reused.
//!
//! The root element is bound through the [`UnmarshallerRegistry`] built by
//! [`Bootstrap`].

pub mod registry;
mod unmarshal;

pub use registry::{QualifiedName, Unmarshaller, UnmarshallerRegistry};
pub use unmarshal::unmarshal_assertion;

use std::collections::HashSet;
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use roxmltree::{Document, Node, ParsingOptions};
use wss_core::XmlLimits;

use crate::bootstrap::{self, Bootstrap};
use crate::error::ParseError;
use crate::types::Assertion;

/// Parses untrusted XML into typed assertions.
#[derive(Debug, Clone)]
pub struct AssertionParser<'b> {
    limits: XmlLimits,
    bootstrap: &'b Bootstrap,
}

impl AssertionParser<'static> {
    /// Creates a parser backed by the process-wide bootstrap.
    #[must_use]
    pub fn new(limits: XmlLimits) -> Self {
        Self::with_bootstrap(limits, bootstrap::global())
    }
}

impl Default for AssertionParser<'static> {
    fn default() -> Self {
        Self::new(XmlLimits::default())
    }
}

impl<'b> AssertionParser<'b> {
    /// Creates a parser backed by a specific bootstrap.
    #[must_use]
    pub const fn with_bootstrap(limits: XmlLimits, bootstrap: &'b Bootstrap) -> Self {
        Self { limits, bootstrap }
    }

    /// Returns the resource limits in force.
    #[must_use]
    pub const fn limits(&self) -> &XmlLimits {
        &self.limits
    }

    /// Returns the bootstrap providing the unmarshaller registry.
    #[must_use]
    pub const fn bootstrap(&self) -> &'b Bootstrap {
        self.bootstrap
    }

    /// Parses an element from a caller's document.
    ///
    /// # Errors
    ///
    /// See [`AssertionParser::parse_str`].
    pub fn parse(&self, element: Node<'_, '_>) -> Result<Assertion, ParseError> {
        let isolated = isolate(element)?;
        self.parse_str(&isolated)
    }

    /// Parses a serialized assertion.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if bootstrap fails, the input breaks a limit,
    /// declares a DTD, is not well-formed, has an unregistered root, or does
    /// not match the assertion schema.
    pub fn parse_str(&self, xml: &str) -> Result<Assertion, ParseError> {
        let registry = self.bootstrap.ensure_initialized()?;

        if xml.len() > self.limits.max_bytes {
            return Err(ParseError::TooLarge {
                limit: self.limits.max_bytes,
                actual: xml.len(),
            });
        }

        let doc = Document::parse_with_options(xml, hardened_options(&self.limits))
            .map_err(|e| match e {
                roxmltree::Error::DtdDetected => ParseError::DtdForbidden,
                other => ParseError::Xml(other.to_string()),
            })?;

        let root = doc.root_element();
        let name = QualifiedName::of(root);
        let unmarshal = registry.get(&name).ok_or_else(|| ParseError::UnknownElement {
            namespace: name.namespace.clone(),
            local_name: name.local_name.clone(),
        })?;

        let mut assertion = unmarshal(root)?;
        assertion.source = Arc::from(xml);
        tracing::debug!(
            id = %assertion.id,
            issuer = %assertion.issuer.value,
            signature = assertion.signature_present(),
            "Parsed SAML2 assertion"
        );
        Ok(assertion)
    }
}

fn hardened_options(limits: &XmlLimits) -> ParsingOptions {
    let mut options = ParsingOptions::default();
    options.allow_dtd = false;
    options.nodes_limit = limits.max_nodes;
    options
}

/// Serializes `element` as a standalone document.
///
/// The element's source text is kept byte for byte; only its start tag is
/// rewritten to declare the namespaces it inherits.
fn isolate(element: Node<'_, '_>) -> Result<String, ParseError> {
    if !element.is_element() {
        return Err(ParseError::Xml("token is not an element".to_string()));
    }
    let raw = &element.document().input_text()[element.range()];

    let mut reader = Reader::from_str(raw);
    let (mut start, empty) = match reader.read_event() {
        Ok(Event::Start(start)) => (start.into_owned(), false),
        Ok(Event::Empty(start)) => (start.into_owned(), true),
        Ok(_) => return Err(ParseError::Xml("token has no start tag".to_string())),
        Err(e) => return Err(ParseError::Xml(e.to_string())),
    };
    let start_len = usize::try_from(reader.buffer_position())
        .map_err(|e| ParseError::Xml(e.to_string()))?;

    let declared: HashSet<Vec<u8>> = start
        .attributes()
        .filter_map(Result::ok)
        .map(|attr| attr.key.as_ref().to_vec())
        .filter(|key| key == b"xmlns" || key.starts_with(b"xmlns:"))
        .collect();

    for namespace in element.namespaces() {
        let key = match namespace.name() {
            Some("xml") => continue,
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        if !declared.contains(key.as_bytes()) {
            start.push_attribute((key.as_str(), namespace.uri()));
        }
    }

    let mut writer = Writer::new(Vec::with_capacity(raw.len() + 128));
    let event = if empty {
        Event::Empty(start)
    } else {
        Event::Start(start)
    };
    writer
        .write_event(event)
        .map_err(|e| ParseError::Xml(e.to_string()))?;

    let mut out = writer.into_inner();
    out.extend_from_slice(raw.get(start_len..).unwrap_or_default().as_bytes());
    String::from_utf8(out).map_err(|e| ParseError::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::default_registry;
    use crate::error::BootstrapError;

    const ASSERTION: &str = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="abc123" Version="2.0" IssueInstant="2024-01-01T00:00:00Z"><saml:Issuer>https://idp.example</saml:Issuer></saml:Assertion>"#;

    #[test]
    fn parses_string_input() {
        let assertion = AssertionParser::default().parse_str(ASSERTION).unwrap();
        assert_eq!(assertion.id, "abc123");
        assert_eq!(assertion.source_xml(), ASSERTION);
    }

    #[test]
    fn doctype_is_refused() {
        let xml = format!(
            r#"<!DOCTYPE saml:Assertion [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>{}"#,
            ASSERTION.replace("https://idp.example", "&xxe;")
        );
        assert!(matches!(
            AssertionParser::default().parse_str(&xml),
            Err(ParseError::DtdForbidden)
        ));
    }

    #[test]
    fn limits_are_enforced() {
        let tiny = XmlLimits {
            max_bytes: 64,
            ..XmlLimits::default()
        };
        assert!(matches!(
            AssertionParser::new(tiny).parse_str(ASSERTION),
            Err(ParseError::TooLarge { limit: 64, .. })
        ));

        let few_nodes = XmlLimits {
            max_nodes: 3,
            ..XmlLimits::default()
        };
        assert!(matches!(
            AssertionParser::new(few_nodes).parse_str(ASSERTION),
            Err(ParseError::Xml(_))
        ));
    }

    #[test]
    fn unknown_root_is_reported() {
        let err = AssertionParser::default()
            .parse_str(r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:1.0:assertion"/>"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownElement { ref namespace, .. } if namespace == "urn:oasis:names:tc:SAML:1.0:assertion"
        ));
    }

    #[test]
    fn malformed_xml_is_reported() {
        assert!(matches!(
            AssertionParser::default().parse_str("<saml:Assertion"),
            Err(ParseError::Xml(_))
        ));
    }

    #[test]
    fn element_is_isolated_with_inherited_namespaces() {
        let envelope = format!(
            r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"><soap:Header>{}</soap:Header></soap:Envelope>"#,
            r#"<saml:Assertion ID="abc123" Version="2.0" IssueInstant="2024-01-01T00:00:00Z"><saml:Issuer>https://idp.example</saml:Issuer></saml:Assertion>"#
        );
        let doc = Document::parse(&envelope).unwrap();
        let token = doc
            .descendants()
            .find(|n| n.tag_name().name() == "Assertion")
            .unwrap();

        let assertion = AssertionParser::default().parse(token).unwrap();
        assert_eq!(assertion.issuer.value, "https://idp.example");

        let isolated = Document::parse(assertion.source_xml()).unwrap();
        let root = isolated.root_element();
        assert_eq!(root.tag_name().name(), "Assertion");
        assert_eq!(
            root.lookup_namespace_uri(Some("soap")),
            Some("http://www.w3.org/2003/05/soap-envelope")
        );
        assert!(assertion.source_xml().ends_with("</saml:Assertion>"));
    }

    #[test]
    fn parse_is_deterministic() {
        let parser = AssertionParser::default();
        let first = parser.parse_str(ASSERTION).unwrap();
        let second = parser.parse_str(ASSERTION).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.issuer, second.issuer);
        assert_eq!(first.issue_instant, second.issue_instant);
    }

    #[test]
    fn bootstrap_failure_is_wrapped() {
        fn failing() -> Result<UnmarshallerRegistry, BootstrapError> {
            Err(BootstrapError::Initialization("unavailable".into()))
        }
        let bootstrap = Bootstrap::new(failing);
        let parser = AssertionParser::with_bootstrap(XmlLimits::default(), &bootstrap);
        assert!(matches!(parser.parse_str(ASSERTION), Err(ParseError::Bootstrap(_))));

        let working = Bootstrap::new(default_registry);
        let parser = AssertionParser::with_bootstrap(XmlLimits::default(), &working);
        assert!(parser.parse_str(ASSERTION).is_ok());
    }
}
