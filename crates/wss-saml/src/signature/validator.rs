//! XML Signature validation.
//!
//! Verifies the enveloped signature of a parsed assertion. Everything is read
//! again from the assertion's isolated document, so the checks apply to the
//! exact bytes the claims were bound from.

use base64::Engine;
use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};
use wss_core::SignaturePolicy;
use wss_crypto::algorithm::enforce_sha1_policy;
use wss_crypto::{DigestAlgorithm, SignatureAlgorithm, TrustProvider};

use super::{x509_certificates, CanonicalizationAlgorithm, ExclusiveC14n};
use crate::error::SignatureError;
use crate::types::{transforms, Assertion, EXC_C14N_NS, XMLDSIG_NS};
use crate::xml::{children_named, element_children, is_element, text_content};

/// XML signature validator.
///
/// Checks the signature structure, that it covers exactly the assertion,
/// the reference digest, the signing certificate's trust, and finally the
/// signature value.
#[derive(Debug, Clone, Default)]
pub struct SignatureValidator {
    /// Whether to allow SHA-1 signatures (deprecated but sometimes needed).
    allow_sha1: bool,
}

impl SignatureValidator {
    /// Creates a validator enforcing `policy`.
    #[must_use]
    pub const fn new(policy: &SignaturePolicy) -> Self {
        Self {
            allow_sha1: policy.allow_sha1,
        }
    }

    /// Verifies the assertion signature at the current time.
    ///
    /// Returns `Ok(false)` if the assertion carries no signature.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureError`] for any structural, digest, trust or
    /// cryptographic failure.
    pub fn verify(
        &self,
        assertion: &Assertion,
        trust: &dyn TrustProvider,
    ) -> Result<bool, SignatureError> {
        self.verify_at(assertion, trust, Utc::now())
    }

    /// Verifies the assertion signature, evaluating certificates at `now`.
    ///
    /// # Errors
    ///
    /// See [`SignatureValidator::verify`].
    pub fn verify_at(
        &self,
        assertion: &Assertion,
        trust: &dyn TrustProvider,
        now: DateTime<Utc>,
    ) -> Result<bool, SignatureError> {
        if !assertion.signature_present() {
            return Ok(false);
        }

        let mut options = roxmltree::ParsingOptions::default();
        options.allow_dtd = false;
        let doc = Document::parse_with_options(assertion.source_xml(), options)
            .map_err(|e| SignatureError::Document(e.to_string()))?;
        let root = doc.root_element();

        let signature = single(root, "Signature")?;
        let signed_info = single(signature, "SignedInfo")?;

        let signed_info_c14n = canonicalizer(single(signed_info, "CanonicalizationMethod")?)?;
        let algorithm = SignatureAlgorithm::from_uri(algorithm_uri(single(
            signed_info,
            "SignatureMethod",
        )?)?)?;
        enforce_sha1_policy(algorithm.uri(), algorithm.is_deprecated(), self.allow_sha1)?;

        let reference = single(signed_info, "Reference")?;
        check_reference(&doc, root, &assertion.id, reference)?;
        // Same-document reference: the node set never carries comments.
        let content_c14n = reference_transforms(reference)?.without_comments();

        let digest_algorithm =
            DigestAlgorithm::from_uri(algorithm_uri(single(reference, "DigestMethod")?)?)?;
        enforce_sha1_policy(
            digest_algorithm.uri(),
            digest_algorithm.is_deprecated(),
            self.allow_sha1,
        )?;
        let expected_digest = decode("DigestValue", single(reference, "DigestValue")?)?;
        let content = content_c14n.canonicalize(root, Some(signature))?;
        let actual_digest = wss_crypto::hash(digest_algorithm, &content);
        if !wss_crypto::digest_matches(&actual_digest, &expected_digest) {
            return Err(SignatureError::DigestMismatch);
        }

        let signature_value = decode("SignatureValue", single(signature, "SignatureValue")?)?;
        let signed_bytes = signed_info_c14n.canonicalize(signed_info, None)?;
        verify_signing_key(
            assertion,
            signature,
            trust,
            now,
            algorithm,
            &signed_bytes,
            &signature_value,
        )?;

        tracing::debug!(
            id = %assertion.id,
            algorithm = algorithm.uri(),
            "Assertion signature verified"
        );
        Ok(true)
    }
}

fn single<'a, 'input>(
    parent: Node<'a, 'input>,
    local: &'static str,
) -> Result<Node<'a, 'input>, SignatureError> {
    let mut matches = children_named(parent, XMLDSIG_NS, local);
    match (matches.next(), matches.next()) {
        (Some(node), None) => Ok(node),
        (None, _) => Err(SignatureError::Malformed(format!("missing ds:{local}"))),
        (Some(_), Some(_)) => Err(SignatureError::Malformed(format!(
            "expected exactly one ds:{local}"
        ))),
    }
}

fn algorithm_uri<'a>(method: Node<'a, '_>) -> Result<&'a str, SignatureError> {
    method.attribute("Algorithm").ok_or_else(|| {
        SignatureError::Malformed(format!(
            "ds:{} has no Algorithm",
            method.tag_name().name()
        ))
    })
}

/// Builds the canonicalizer named by a `CanonicalizationMethod` or
/// `Transform` element; only exclusive C14N is accepted.
fn canonicalizer(method: Node<'_, '_>) -> Result<ExclusiveC14n, SignatureError> {
    let uri = algorithm_uri(method)?;
    let algorithm = CanonicalizationAlgorithm::from_uri(uri)
        .filter(CanonicalizationAlgorithm::is_exclusive)
        .ok_or_else(|| SignatureError::UnsupportedTransform(uri.to_string()))?;

    let prefixes = children_named(method, EXC_C14N_NS, "InclusiveNamespaces")
        .next()
        .and_then(|n| n.attribute("PrefixList"))
        .map(|list| list.split_whitespace().map(ToString::to_string).collect())
        .unwrap_or_else(Vec::<String>::new);

    Ok(ExclusiveC14n::new(algorithm.with_comments()).with_inclusive_prefixes(prefixes))
}

/// The reference must name the document root by an ID that occurs once.
fn check_reference(
    doc: &Document<'_>,
    root: Node<'_, '_>,
    assertion_id: &str,
    reference: Node<'_, '_>,
) -> Result<(), SignatureError> {
    let expected = format!("#{assertion_id}");
    let found = reference.attribute("URI").unwrap_or_default();
    if found != expected || root.attribute("ID") != Some(assertion_id) {
        return Err(SignatureError::ReferenceMismatch {
            expected,
            found: found.to_string(),
        });
    }

    let occurrences = doc
        .descendants()
        .filter(Node::is_element)
        .filter(|n| {
            ["ID", "Id", "id"]
                .iter()
                .any(|name| n.attribute(*name) == Some(assertion_id))
        })
        .count();
    if occurrences != 1 {
        return Err(SignatureError::DuplicateId(assertion_id.to_string()));
    }
    Ok(())
}

/// Accepts exactly the enveloped-signature transform followed by exclusive
/// C14N and returns the canonicalizer for the referenced content.
fn reference_transforms(reference: Node<'_, '_>) -> Result<ExclusiveC14n, SignatureError> {
    let transforms_node = single(reference, "Transforms")?;
    let mut enveloped = false;
    let mut c14n = None;

    for transform in element_children(transforms_node) {
        if !is_element(transform, XMLDSIG_NS, "Transform") {
            return Err(SignatureError::Malformed(format!(
                "unexpected {} in ds:Transforms",
                transform.tag_name().name()
            )));
        }
        let uri = algorithm_uri(transform)?;
        if uri == transforms::ENVELOPED_SIGNATURE {
            if enveloped {
                return Err(SignatureError::Malformed(
                    "repeated enveloped-signature transform".to_string(),
                ));
            }
            enveloped = true;
        } else if c14n.is_none() {
            c14n = Some(canonicalizer(transform)?);
        } else {
            return Err(SignatureError::UnsupportedTransform(uri.to_string()));
        }
    }

    if !enveloped {
        return Err(SignatureError::Malformed(
            "enveloped-signature transform missing".to_string(),
        ));
    }
    c14n.ok_or_else(|| {
        SignatureError::Malformed("exclusive canonicalization transform missing".to_string())
    })
}

fn decode(element: &'static str, node: Node<'_, '_>) -> Result<Vec<u8>, SignatureError> {
    let text: String = text_content(node)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|e| SignatureError::Encoding {
            element,
            reason: e.to_string(),
        })
}

/// Finds a trusted certificate whose key verifies the signature value.
///
/// Embedded `X509Certificate`s form the chain, leaf first. Without them the
/// trust provider's certificates for the issuer are tried in turn.
fn verify_signing_key(
    assertion: &Assertion,
    signature: Node<'_, '_>,
    trust: &dyn TrustProvider,
    now: DateTime<Utc>,
    algorithm: SignatureAlgorithm,
    signed_bytes: &[u8],
    signature_value: &[u8],
) -> Result<(), SignatureError> {
    let embedded = x509_certificates(signature)
        .map(|cert| decode("X509Certificate", cert))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(leaf) = embedded.first() {
        trust.verify_chain(&embedded, now)?;
        wss_crypto::verify_with_certificate(algorithm, leaf, signed_bytes, signature_value)?;
        return Ok(());
    }

    let issuer = &assertion.issuer.value;
    let mut last_error = None;
    for cert in trust.certificates_for_issuer(issuer) {
        let attempt = trust
            .verify_chain(std::slice::from_ref(&cert), now)
            .map_err(SignatureError::from)
            .and_then(|()| {
                wss_crypto::verify_with_certificate(algorithm, &cert, signed_bytes, signature_value)
                    .map_err(SignatureError::from)
            });
        match attempt {
            Ok(()) => return Ok(()),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| SignatureError::NoSigningKey(issuer.clone())))
}
