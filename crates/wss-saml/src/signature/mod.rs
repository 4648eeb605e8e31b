//! XML Signature support for SAML assertions.
//!
//! Assertions carry enveloped XML-DSig signatures. This module holds the
//! summary recorded at parse time ([`XmlSignature`]), exclusive
//! canonicalization ([`ExclusiveC14n`]) and the verifier
//! ([`SignatureValidator`]).
//!
//! # Accepted algorithms
//!
//! - Canonicalization: exclusive C14N, with or without comments
//! - Transforms: enveloped signature, exclusive C14N
//! - Signatures: RSA-SHA256/384/512, ECDSA-SHA256/384/512
//!
//! Legacy SHA-1 digests and signatures are refused unless the signature
//! policy allows them.

mod c14n;
mod validator;

pub use c14n::ExclusiveC14n;
pub use validator::SignatureValidator;

use roxmltree::Node;

use crate::types::{canonicalization_algorithms, XMLDSIG_NS};
use crate::xml::children_named;

/// A canonicalization method named by `Algorithm` URI.
///
/// Inclusive C14N is recognized so it can be reported, but never accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalizationAlgorithm {
    exclusive: bool,
    with_comments: bool,
}

impl CanonicalizationAlgorithm {
    /// Exclusive C14N without comments.
    pub const EXCLUSIVE: Self = Self {
        exclusive: true,
        with_comments: false,
    };

    /// Looks up a C14N 1.0 or exclusive C14N URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        let (exclusive, with_comments) = match uri {
            canonicalization_algorithms::EXCLUSIVE_C14N => (true, false),
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS => (true, true),
            canonicalization_algorithms::C14N => (false, false),
            canonicalization_algorithms::C14N_WITH_COMMENTS => (false, true),
            _ => return None,
        };
        Some(Self {
            exclusive,
            with_comments,
        })
    }

    /// URI naming this method.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match (self.exclusive, self.with_comments) {
            (true, false) => canonicalization_algorithms::EXCLUSIVE_C14N,
            (true, true) => canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS,
            (false, false) => canonicalization_algorithms::C14N,
            (false, true) => canonicalization_algorithms::C14N_WITH_COMMENTS,
        }
    }

    /// Returns true for exclusive C14N.
    #[must_use]
    pub const fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Returns true if comments are kept.
    #[must_use]
    pub const fn with_comments(&self) -> bool {
        self.with_comments
    }
}

impl Default for CanonicalizationAlgorithm {
    fn default() -> Self {
        Self::EXCLUSIVE
    }
}

/// `ds:Signature` as recorded by the parser.
///
/// Informational only. The validator re-reads the signature from the
/// isolated document and never trusts these values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlSignature {
    /// `CanonicalizationMethod/@Algorithm`.
    pub canonicalization_method: Option<String>,
    /// `SignatureMethod/@Algorithm`.
    pub signature_method: Option<String>,
    /// `Reference/@URI` values, in document order.
    pub reference_uris: Vec<String>,
    /// Number of `X509Certificate` elements in `KeyInfo`.
    pub certificate_count: usize,
}

impl XmlSignature {
    /// Records the shape of a `ds:Signature` element.
    pub(crate) fn from_node(signature: Node<'_, '_>) -> Self {
        let signed_info = dsig_child(signature, "SignedInfo");
        let algorithm = |local| {
            signed_info
                .and_then(|si| dsig_child(si, local))
                .and_then(|m| m.attribute("Algorithm"))
                .map(ToString::to_string)
        };

        Self {
            canonicalization_method: algorithm("CanonicalizationMethod"),
            signature_method: algorithm("SignatureMethod"),
            reference_uris: signed_info
                .into_iter()
                .flat_map(|si| children_named(si, XMLDSIG_NS, "Reference"))
                .map(|r| r.attribute("URI").unwrap_or_default().to_string())
                .collect(),
            certificate_count: x509_certificates(signature).count(),
        }
    }
}

/// First `ds:` child named `local`.
fn dsig_child<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    local: &'a str,
) -> Option<Node<'a, 'input>> {
    children_named(node, XMLDSIG_NS, local).next()
}

/// `KeyInfo/X509Data/X509Certificate` elements of a signature.
pub(crate) fn x509_certificates<'a, 'input: 'a>(
    signature: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    children_named(signature, XMLDSIG_NS, "KeyInfo")
        .flat_map(|k| children_named(k, XMLDSIG_NS, "X509Data"))
        .flat_map(|d| children_named(d, XMLDSIG_NS, "X509Certificate"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_methods_round_trip_through_uris() {
        for uri in [
            canonicalization_algorithms::EXCLUSIVE_C14N,
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS,
            canonicalization_algorithms::C14N,
            canonicalization_algorithms::C14N_WITH_COMMENTS,
        ] {
            let method = CanonicalizationAlgorithm::from_uri(uri).unwrap();
            assert_eq!(method.uri(), uri);
        }

        let inclusive =
            CanonicalizationAlgorithm::from_uri(canonicalization_algorithms::C14N).unwrap();
        assert!(!inclusive.is_exclusive());
        assert!(CanonicalizationAlgorithm::from_uri(
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS
        )
        .unwrap()
        .with_comments());
        assert_eq!(CanonicalizationAlgorithm::default(), CanonicalizationAlgorithm::EXCLUSIVE);
        assert!(CanonicalizationAlgorithm::from_uri("urn:unknown").is_none());
    }

    #[test]
    fn summary_records_signature_shape() {
        let doc = roxmltree::Document::parse(
            r##"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
                 <ds:SignedInfo>
                   <ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/>
                   <ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256"/>
                   <ds:Reference URI="#abc123"/>
                 </ds:SignedInfo>
                 <ds:SignatureValue>AA==</ds:SignatureValue>
                 <ds:KeyInfo><ds:X509Data><ds:X509Certificate>AA==</ds:X509Certificate></ds:X509Data></ds:KeyInfo>
               </ds:Signature>"##,
        )
        .unwrap();

        let summary = XmlSignature::from_node(doc.root_element());
        assert_eq!(
            summary.canonicalization_method.as_deref(),
            Some(canonicalization_algorithms::EXCLUSIVE_C14N)
        );
        assert_eq!(summary.reference_uris, ["#abc123"]);
        assert_eq!(summary.certificate_count, 1);
    }
}
