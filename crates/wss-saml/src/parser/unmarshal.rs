//! Binding of `saml:Assertion` elements into [`Assertion`] values.
//!
//! Follows the `AssertionType` content model of SAML 2.0 core: `Issuer`,
//! an optional enveloped `ds:Signature`, `Subject`, `Conditions`, `Advice`,
//! then statements. Elements out of order, repeated where the schema
//! allows one, or from foreign namespaces are rejected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use roxmltree::Node;

use crate::error::ParseError;
use crate::signature::XmlSignature;
use crate::types::{
    Assertion, Attribute, AttributeStatement, AudienceRestriction, AuthnContext, AuthnStatement,
    Conditions, Issuer, NameId, ProxyRestriction, Subject, SubjectConfirmation,
    SubjectConfirmationData, SubjectLocality, SAML_NS, XMLDSIG_NS,
};
use crate::xml::{children_named, element_children, is_element, text_content};

/// Required SAML version.
const SAML_VERSION: &str = "2.0";

/// Unmarshals a `saml:Assertion` element.
///
/// # Errors
///
/// Returns a [`ParseError`] when the element does not match the schema.
pub fn unmarshal_assertion(node: Node<'_, '_>) -> Result<Assertion, ParseError> {
    if !is_element(node, SAML_NS, "Assertion") {
        return Err(ParseError::UnexpectedElement(node.tag_name().name().to_string()));
    }

    let version = required_attr(node, "saml:Assertion", "Version")?;
    if version != SAML_VERSION {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }
    let id = required_attr(node, "saml:Assertion", "ID")?;
    if id.chars().any(char::is_whitespace) {
        return Err(ParseError::InvalidValue {
            field: "ID",
            reason: "must not contain whitespace".to_string(),
        });
    }
    let issue_instant = instant("IssueInstant", required_attr(node, "saml:Assertion", "IssueInstant")?)?;

    let mut children = element_children(node).peekable();
    let issuer = match children.next() {
        Some(child) if is_element(child, SAML_NS, "Issuer") => unmarshal_issuer(child)?,
        _ => return Err(ParseError::MissingElement("saml:Issuer")),
    };

    let signature = match children.peek() {
        Some(child) if is_element(*child, XMLDSIG_NS, "Signature") => {
            let signature = XmlSignature::from_node(*child);
            children.next();
            Some(signature)
        }
        _ => None,
    };

    let mut assertion = Assertion {
        id: id.to_string(),
        version: version.to_string(),
        issue_instant,
        issuer,
        subject: None,
        conditions: None,
        authn_statements: Vec::new(),
        attribute_statements: Vec::new(),
        signature,
        signed: false,
        source: Arc::from(""),
    };

    let mut stage = Stage::Subject;
    for child in children {
        if child.tag_name().namespace() != Some(SAML_NS) {
            return Err(unexpected(child));
        }
        match child.tag_name().name() {
            "Subject" => {
                stage.advance(Stage::Subject, Stage::Conditions, child)?;
                assertion.subject = Some(unmarshal_subject(child)?);
            }
            "Conditions" => {
                stage.advance(Stage::Conditions, Stage::Advice, child)?;
                assertion.conditions = Some(unmarshal_conditions(child)?);
            }
            "Advice" => stage.advance(Stage::Advice, Stage::Statements, child)?,
            "AuthnStatement" => {
                stage.advance(Stage::Statements, Stage::Statements, child)?;
                assertion.authn_statements.push(unmarshal_authn_statement(child)?);
            }
            "AttributeStatement" => {
                stage.advance(Stage::Statements, Stage::Statements, child)?;
                assertion
                    .attribute_statements
                    .push(unmarshal_attribute_statement(child)?);
            }
            "AuthzDecisionStatement" | "Statement" => {
                stage.advance(Stage::Statements, Stage::Statements, child)?;
                tracing::debug!(element = child.tag_name().name(), "Ignoring statement");
            }
            _ => return Err(unexpected(child)),
        }
    }

    Ok(assertion)
}

/// Position in the assertion content model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Subject,
    Conditions,
    Advice,
    Statements,
}

impl Stage {
    /// Accepts an element allowed at `at`, then moves to `next`.
    fn advance(&mut self, at: Self, next: Self, node: Node<'_, '_>) -> Result<(), ParseError> {
        if *self > at {
            return Err(unexpected(node));
        }
        *self = next;
        Ok(())
    }
}

fn unmarshal_issuer(node: Node<'_, '_>) -> Result<Issuer, ParseError> {
    Ok(Issuer {
        value: non_empty_text(node, "saml:Issuer")?,
        format: optional_attr(node, "Format"),
    })
}

fn unmarshal_name_id(node: Node<'_, '_>) -> Result<NameId, ParseError> {
    Ok(NameId {
        value: non_empty_text(node, "saml:NameID")?,
        format: optional_attr(node, "Format"),
        name_qualifier: optional_attr(node, "NameQualifier"),
        sp_name_qualifier: optional_attr(node, "SPNameQualifier"),
        sp_provided_id: optional_attr(node, "SPProvidedID"),
    })
}

fn unmarshal_subject(node: Node<'_, '_>) -> Result<Subject, ParseError> {
    let mut subject = Subject::default();
    for child in element_children(node) {
        if child.tag_name().namespace() != Some(SAML_NS) {
            return Err(unexpected(child));
        }
        match child.tag_name().name() {
            "NameID" if subject.name_id.is_none() && subject.subject_confirmations.is_empty() => {
                subject.name_id = Some(unmarshal_name_id(child)?);
            }
            "EncryptedID" => return Err(ParseError::Unsupported("encrypted subject identifier")),
            "SubjectConfirmation" => subject
                .subject_confirmations
                .push(unmarshal_subject_confirmation(child)?),
            _ => return Err(unexpected(child)),
        }
    }
    Ok(subject)
}

fn unmarshal_subject_confirmation(node: Node<'_, '_>) -> Result<SubjectConfirmation, ParseError> {
    let method = required_attr(node, "saml:SubjectConfirmation", "Method")?.to_string();
    let subject_confirmation_data = children_named(node, SAML_NS, "SubjectConfirmationData")
        .next()
        .map(|data| -> Result<_, ParseError> {
            Ok(SubjectConfirmationData {
                in_response_to: optional_attr(data, "InResponseTo"),
                not_on_or_after: optional_instant(data, "NotOnOrAfter")?,
                not_before: optional_instant(data, "NotBefore")?,
                recipient: optional_attr(data, "Recipient"),
                address: optional_attr(data, "Address"),
            })
        })
        .transpose()?;

    Ok(SubjectConfirmation {
        method,
        subject_confirmation_data,
    })
}

fn unmarshal_conditions(node: Node<'_, '_>) -> Result<Conditions, ParseError> {
    let mut conditions = Conditions {
        not_before: optional_instant(node, "NotBefore")?,
        not_on_or_after: optional_instant(node, "NotOnOrAfter")?,
        ..Conditions::default()
    };
    if let (Some(not_before), Some(not_on_or_after)) =
        (conditions.not_before, conditions.not_on_or_after)
    {
        if not_before >= not_on_or_after {
            return Err(ParseError::InvalidValue {
                field: "Conditions",
                reason: "NotBefore must be earlier than NotOnOrAfter".to_string(),
            });
        }
    }

    for child in element_children(node) {
        if child.tag_name().namespace() != Some(SAML_NS) {
            return Err(unexpected(child));
        }
        match child.tag_name().name() {
            "AudienceRestriction" => {
                let audiences = audiences(child);
                if audiences.is_empty() {
                    return Err(ParseError::MissingElement("saml:Audience"));
                }
                conditions
                    .audience_restrictions
                    .push(AudienceRestriction { audiences });
            }
            "OneTimeUse" if !conditions.one_time_use => conditions.one_time_use = true,
            "ProxyRestriction" if conditions.proxy_restriction.is_none() => {
                let count = optional_attr(child, "Count")
                    .map(|count| {
                        count.parse::<u32>().map_err(|e| ParseError::InvalidValue {
                            field: "Count",
                            reason: e.to_string(),
                        })
                    })
                    .transpose()?;
                conditions.proxy_restriction = Some(ProxyRestriction {
                    count,
                    audiences: audiences(child),
                });
            }
            "Condition" => return Err(ParseError::Unsupported("custom condition")),
            _ => return Err(unexpected(child)),
        }
    }

    Ok(conditions)
}

fn audiences(node: Node<'_, '_>) -> Vec<String> {
    children_named(node, SAML_NS, "Audience")
        .map(text_content)
        .filter(|a| !a.is_empty())
        .collect()
}

fn unmarshal_authn_statement(node: Node<'_, '_>) -> Result<AuthnStatement, ParseError> {
    let authn_instant = instant(
        "AuthnInstant",
        required_attr(node, "saml:AuthnStatement", "AuthnInstant")?,
    )?;

    let subject_locality = children_named(node, SAML_NS, "SubjectLocality")
        .next()
        .map(|locality| SubjectLocality {
            address: optional_attr(locality, "Address"),
            dns_name: optional_attr(locality, "DNSName"),
        });

    let context = children_named(node, SAML_NS, "AuthnContext")
        .next()
        .ok_or(ParseError::MissingElement("saml:AuthnContext"))?;
    let first_text = |local: &'static str| {
        children_named(context, SAML_NS, local)
            .next()
            .map(text_content)
    };
    let authn_context = AuthnContext {
        authn_context_class_ref: first_text("AuthnContextClassRef"),
        authn_context_decl_ref: first_text("AuthnContextDeclRef"),
        authenticating_authorities: children_named(context, SAML_NS, "AuthenticatingAuthority")
            .map(text_content)
            .collect(),
    };

    Ok(AuthnStatement {
        authn_instant,
        session_index: optional_attr(node, "SessionIndex"),
        session_not_on_or_after: optional_instant(node, "SessionNotOnOrAfter")?,
        authn_context,
        subject_locality,
    })
}

fn unmarshal_attribute_statement(node: Node<'_, '_>) -> Result<AttributeStatement, ParseError> {
    let mut statement = AttributeStatement::default();
    for child in element_children(node) {
        if is_element(child, SAML_NS, "Attribute") {
            statement.attributes.push(unmarshal_attribute(child)?);
        } else if is_element(child, SAML_NS, "EncryptedAttribute") {
            return Err(ParseError::Unsupported("encrypted attribute"));
        } else {
            return Err(unexpected(child));
        }
    }
    if statement.attributes.is_empty() {
        return Err(ParseError::MissingElement("saml:Attribute"));
    }
    Ok(statement)
}

fn unmarshal_attribute(node: Node<'_, '_>) -> Result<Attribute, ParseError> {
    Ok(Attribute {
        name: required_attr(node, "saml:Attribute", "Name")?.to_string(),
        name_format: optional_attr(node, "NameFormat"),
        friendly_name: optional_attr(node, "FriendlyName"),
        values: children_named(node, SAML_NS, "AttributeValue")
            .map(text_content)
            .collect(),
    })
}

fn required_attr<'a>(
    node: Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, ParseError> {
    match node.attribute(attribute) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ParseError::MissingAttribute { element, attribute }),
    }
}

fn optional_attr(node: Node<'_, '_>, attribute: &str) -> Option<String> {
    node.attribute(attribute).map(ToString::to_string)
}

fn non_empty_text(node: Node<'_, '_>, element: &'static str) -> Result<String, ParseError> {
    let text = text_content(node);
    if text.is_empty() {
        return Err(ParseError::InvalidValue {
            field: element,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(text)
}

fn instant(field: &'static str, value: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ParseError::InvalidValue {
            field,
            reason: format!("'{value}' is not an RFC 3339 timestamp: {e}"),
        })
}

fn optional_instant(
    node: Node<'_, '_>,
    attribute: &'static str,
) -> Result<Option<DateTime<Utc>>, ParseError> {
    node.attribute(attribute)
        .map(|value| instant(attribute, value))
        .transpose()
}

fn unexpected(node: Node<'_, '_>) -> ParseError {
    ParseError::UnexpectedElement(crate::xml::source_qname(node).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<Assertion, ParseError> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        unmarshal_assertion(doc.root_element())
    }

    fn assertion_with(body: &str) -> String {
        format!(
            r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="abc123" Version="2.0" IssueInstant="2024-01-01T00:00:00Z"><saml:Issuer>https://idp.example</saml:Issuer>{body}</saml:Assertion>"#
        )
    }

    #[test]
    fn full_assertion_is_bound() {
        let assertion = parse(&assertion_with(
            r#"<saml:Subject>
                 <saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">alice@example.com</saml:NameID>
                 <saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer">
                   <saml:SubjectConfirmationData Recipient="https://sp.example/acs" NotOnOrAfter="2024-01-01T00:05:00Z"/>
                 </saml:SubjectConfirmation>
               </saml:Subject>
               <saml:Conditions NotBefore="2024-01-01T00:00:00Z" NotOnOrAfter="2024-01-01T01:00:00Z">
                 <saml:AudienceRestriction><saml:Audience>https://sp.example</saml:Audience></saml:AudienceRestriction>
                 <saml:OneTimeUse/>
                 <saml:ProxyRestriction Count="2"/>
               </saml:Conditions>
               <saml:AuthnStatement AuthnInstant="2024-01-01T00:00:00Z" SessionIndex="s1">
                 <saml:AuthnContext><saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:Password</saml:AuthnContextClassRef></saml:AuthnContext>
               </saml:AuthnStatement>
               <saml:AttributeStatement>
                 <saml:Attribute Name="role" FriendlyName="Role"><saml:AttributeValue>admin</saml:AttributeValue><saml:AttributeValue>user</saml:AttributeValue></saml:Attribute>
               </saml:AttributeStatement>"#,
        ))
        .unwrap();

        assert_eq!(assertion.id, "abc123");
        assert_eq!(assertion.issuer.value, "https://idp.example");
        assert_eq!(assertion.subject_name_id().unwrap().value, "alice@example.com");
        let subject = assertion.subject.as_ref().unwrap();
        assert!(subject.subject_confirmations[0].is_bearer());

        let conditions = assertion.conditions.as_ref().unwrap();
        assert!(conditions.one_time_use);
        assert_eq!(conditions.proxy_restriction.as_ref().unwrap().count, Some(2));
        assert_eq!(assertion.audiences().collect::<Vec<_>>(), ["https://sp.example"]);

        assert_eq!(assertion.authn_statements[0].session_index.as_deref(), Some("s1"));
        let attribute = &assertion.attribute_statements[0].attributes[0];
        assert_eq!(attribute.values, ["admin", "user"]);
        assert_eq!(attribute.friendly_name.as_deref(), Some("Role"));
        assert!(!assertion.signature_present());
    }

    #[test]
    fn version_must_be_two() {
        let xml = assertion_with("").replace(r#"Version="2.0""#, r#"Version="1.1""#);
        assert!(matches!(parse(&xml), Err(ParseError::UnsupportedVersion(v)) if v == "1.1"));
    }

    #[test]
    fn id_and_issuer_are_required() {
        let xml = assertion_with("").replace(r#"ID="abc123""#, r#"ID="""#);
        assert!(matches!(
            parse(&xml),
            Err(ParseError::MissingAttribute { attribute: "ID", .. })
        ));

        let xml = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="a" Version="2.0" IssueInstant="2024-01-01T00:00:00Z"/>"#;
        assert!(matches!(parse(xml), Err(ParseError::MissingElement("saml:Issuer"))));
    }

    #[test]
    fn bad_timestamps_are_rejected() {
        let xml = assertion_with("").replace("2024-01-01T00:00:00Z", "yesterday");
        assert!(matches!(
            parse(&xml),
            Err(ParseError::InvalidValue { field: "IssueInstant", .. })
        ));

        let inverted = assertion_with(
            r#"<saml:Conditions NotBefore="2024-01-02T00:00:00Z" NotOnOrAfter="2024-01-01T00:00:00Z"/>"#,
        );
        assert!(matches!(
            parse(&inverted),
            Err(ParseError::InvalidValue { field: "Conditions", .. })
        ));
    }

    #[test]
    fn content_model_order_is_enforced() {
        let conditions_twice = assertion_with("<saml:Conditions/><saml:Conditions/>");
        assert!(matches!(parse(&conditions_twice), Err(ParseError::UnexpectedElement(_))));

        let subject_after_statement = assertion_with(
            r#"<saml:AttributeStatement><saml:Attribute Name="a"/></saml:AttributeStatement><saml:Subject/>"#,
        );
        assert!(matches!(
            parse(&subject_after_statement),
            Err(ParseError::UnexpectedElement(name)) if name == "saml:Subject"
        ));

        let foreign = assertion_with(r#"<x:Extra xmlns:x="urn:example"/>"#);
        assert!(matches!(parse(&foreign), Err(ParseError::UnexpectedElement(name)) if name == "x:Extra"));
    }

    #[test]
    fn misplaced_signature_is_rejected() {
        let xml = assertion_with(
            r#"<saml:Subject/><ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"/>"#,
        );
        assert!(matches!(parse(&xml), Err(ParseError::UnexpectedElement(_))));
    }

    #[test]
    fn encrypted_content_is_unsupported() {
        let xml = assertion_with(
            "<saml:AttributeStatement><saml:EncryptedAttribute/></saml:AttributeStatement>",
        );
        assert!(matches!(parse(&xml), Err(ParseError::Unsupported(_))));
    }

    #[test]
    fn statements_keep_document_order() {
        let assertion = parse(&assertion_with(
            r#"<saml:AttributeStatement><saml:Attribute Name="a"><saml:AttributeValue>1</saml:AttributeValue></saml:Attribute></saml:AttributeStatement>
               <saml:AuthzDecisionStatement/>
               <saml:AttributeStatement><saml:Attribute Name="b"/><saml:Attribute Name="a"/></saml:AttributeStatement>"#,
        ))
        .unwrap();

        let names: Vec<_> = assertion
            .attribute_statements
            .iter()
            .flat_map(|s| s.attributes.iter().map(|a| a.name.as_str()))
            .collect();
        assert_eq!(names, ["a", "b", "a"]);
    }
}
