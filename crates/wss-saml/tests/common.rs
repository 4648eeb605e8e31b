//! Common test utilities and fixtures.

use anyhow::Context;
use aws_lc_rs::digest::{digest, SHA256};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use base64::Engine;
use rcgen::{BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyPair};
use roxmltree::Document;
use wss_crypto::TrustStore;
use wss_saml::ExclusiveC14n;

pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
pub const DS_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const EXC_C14N_WITH_COMMENTS: &str = "http://www.w3.org/2001/10/xml-exc-c14n#WithComments";

/// RSA-SHA256 assertion signed outside this crate, with its signing certificate.
pub const EXTERNAL_RSA_ASSERTION: &str = include_str!("fixtures/rsa_sha256_assertion.xml");
pub const EXTERNAL_RSA_SIGNER_PEM: &str = include_str!("fixtures/rsa_sha256_signer.pem");

const DIGEST_PLACEHOLDER: &str = "@DIGEST@";
const SIGNATURE_PLACEHOLDER: &str = "@SIGNATURE@";

/// Initializes tracing once for the test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("wss_saml=debug,wss=info")
        .with_test_writer()
        .try_init();
}

/// Builds an unsigned assertion.
pub fn assertion(id: &str, issuer: &str, body: &str) -> String {
    format!(
        r#"<saml:Assertion xmlns:saml="{SAML_NS}" ID="{id}" Version="2.0" IssueInstant="2024-01-01T00:00:00Z"><saml:Issuer>{issuer}</saml:Issuer>{body}</saml:Assertion>"#
    )
}

/// Subject, bounded conditions and a single `role=admin` attribute.
pub fn standard_body() -> &'static str {
    r#"<saml:Subject><saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified">alice</saml:NameID><saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer"/></saml:Subject><saml:Conditions NotBefore="2024-01-01T00:00:00Z" NotOnOrAfter="2024-01-01T01:00:00Z"><saml:AudienceRestriction><saml:Audience>https://sp.example</saml:Audience></saml:AudienceRestriction></saml:Conditions><saml:AttributeStatement><saml:Attribute Name="role"><saml:AttributeValue>admin</saml:AttributeValue></saml:Attribute></saml:AttributeStatement>"#
}

/// Key info placement for signed fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInfo {
    /// Embed the signing certificate.
    Embedded,
    /// Leave key resolution to the trust provider.
    Omitted,
}

/// A test identity provider signing with a P-256 key.
pub struct TestIdp {
    pub issuer: String,
    pub certificate: Vec<u8>,
    /// Issuing CAs embedded after the signing certificate, nearest first.
    pub intermediates: Vec<Vec<u8>>,
    /// Root the chain ends at; `None` for a self-signed signing certificate.
    pub anchor: Option<Vec<u8>>,
    signing_key: EcdsaKeyPair,
}

impl TestIdp {
    /// Creates an identity provider with a fresh self-signed certificate.
    pub fn new(issuer: &str) -> anyhow::Result<Self> {
        let key = KeyPair::generate()?;
        let cert = signing_params(issuer).self_signed(&key)?;
        Self::from_parts(issuer, &cert, &key, Vec::new(), None)
    }

    /// Creates an identity provider whose certificate is issued by an
    /// intermediate CA under a root CA.
    pub fn chained(issuer: &str) -> anyhow::Result<Self> {
        let root_key = KeyPair::generate()?;
        let root = ca_params("Test Root CA").self_signed(&root_key)?;
        let intermediate_key = KeyPair::generate()?;
        let intermediate =
            ca_params("Test Issuing CA").signed_by(&intermediate_key, &root, &root_key)?;
        let key = KeyPair::generate()?;
        let cert = signing_params(issuer).signed_by(&key, &intermediate, &intermediate_key)?;

        Self::from_parts(
            issuer,
            &cert,
            &key,
            vec![intermediate.der().to_vec()],
            Some(root.der().to_vec()),
        )
    }

    fn from_parts(
        issuer: &str,
        cert: &Certificate,
        key: &KeyPair,
        intermediates: Vec<Vec<u8>>,
        anchor: Option<Vec<u8>>,
    ) -> anyhow::Result<Self> {
        let signing_key =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &key.serialize_der())?;
        Ok(Self {
            issuer: issuer.to_string(),
            certificate: cert.der().to_vec(),
            intermediates,
            anchor,
            signing_key,
        })
    }

    /// Returns a trust store holding this provider's root, or its signing
    /// certificate when there is no root.
    pub fn trust_store(&self) -> anyhow::Result<TrustStore> {
        let mut store = TrustStore::new();
        match &self.anchor {
            Some(anchor) => store.add_certificate_der(anchor.clone())?,
            None => store.add_issuer_certificate(self.issuer.clone(), self.certificate.clone())?,
        }
        Ok(store)
    }

    /// Inserts an enveloped signature after the `Issuer` of `unsigned`.
    pub fn sign(&self, unsigned: &str, key_info: KeyInfo) -> anyhow::Result<String> {
        self.sign_with(unsigned, key_info, EXC_C14N)
    }

    /// Like [`TestIdp::sign`], naming `content_c14n` as the reference's
    /// canonicalization transform.
    ///
    /// The digest always covers the content without comments, as a
    /// same-document reference requires.
    pub fn sign_with(
        &self,
        unsigned: &str,
        key_info: KeyInfo,
        content_c14n: &str,
    ) -> anyhow::Result<String> {
        let id = Document::parse(unsigned)?
            .root_element()
            .attribute("ID")
            .context("assertion has no ID")?
            .to_string();

        let key_info = match key_info {
            KeyInfo::Embedded => {
                let certificates: String = std::iter::once(&self.certificate)
                    .chain(&self.intermediates)
                    .map(|der| format!("<ds:X509Certificate>{}</ds:X509Certificate>", encode(der)))
                    .collect();
                format!("<ds:KeyInfo><ds:X509Data>{certificates}</ds:X509Data></ds:KeyInfo>")
            }
            KeyInfo::Omitted => String::new(),
        };
        let signature = format!(
            concat!(
                r#"<ds:Signature xmlns:ds="{ds}"><ds:SignedInfo>"#,
                r#"<ds:CanonicalizationMethod Algorithm="{exc}"/>"#,
                r#"<ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256"/>"#,
                r##"<ds:Reference URI="#{id}"><ds:Transforms>"##,
                r#"<ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/>"#,
                r#"<ds:Transform Algorithm="{content_c14n}"/>"#,
                r#"</ds:Transforms><ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/>"#,
                r#"<ds:DigestValue>{digest}</ds:DigestValue></ds:Reference></ds:SignedInfo>"#,
                r#"<ds:SignatureValue>{value}</ds:SignatureValue>{key_info}</ds:Signature>"#,
            ),
            ds = DS_NS,
            exc = EXC_C14N,
            id = id,
            content_c14n = content_c14n,
            digest = DIGEST_PLACEHOLDER,
            value = SIGNATURE_PLACEHOLDER,
            key_info = key_info,
        );
        let template = unsigned.replacen(
            "</saml:Issuer>",
            &format!("</saml:Issuer>{signature}"),
            1,
        );

        let digest_value = {
            let doc = Document::parse(&template)?;
            let root = doc.root_element();
            let sig = root
                .children()
                .find(|n| n.has_tag_name((DS_NS, "Signature")))
                .context("signature not inserted")?;
            let content = ExclusiveC14n::new(false).canonicalize(root, Some(sig))?;
            encode(digest(&SHA256, &content).as_ref())
        };
        let with_digest = template.replace(DIGEST_PLACEHOLDER, &digest_value);

        let signature_value = {
            let doc = Document::parse(&with_digest)?;
            let signed_info = doc
                .descendants()
                .find(|n| n.has_tag_name((DS_NS, "SignedInfo")))
                .context("no SignedInfo")?;
            let bytes = ExclusiveC14n::new(false).canonicalize(signed_info, None)?;
            let sig = self.signing_key.sign(&SystemRandom::new(), &bytes)?;
            encode(sig.as_ref())
        };
        Ok(with_digest.replace(SIGNATURE_PLACEHOLDER, &signature_value))
    }
}

fn signing_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, common_name);
    params
}

fn ca_params(common_name: &str) -> CertificateParams {
    let mut params = signing_params(common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
