//! Certificate trust decisions.
//!
//! [`TrustProvider`] is the seam the assertion validator calls into: given the
//! certificates a signature carries (leaf first), it says whether the signing
//! key is trusted. [`TrustStore`] is an in-memory implementation backed by a
//! list of trusted certificates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

/// Error type for trust evaluation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrustError {
    /// No certificate was supplied.
    #[error("certificate chain is empty")]
    EmptyChain,

    /// A certificate could not be decoded.
    #[error("invalid certificate: {0}")]
    Certificate(String),

    /// A certificate in the path is outside its validity period.
    #[error("certificate '{subject}' is not valid at {at}")]
    OutsideValidity {
        /// Subject of the offending certificate.
        subject: String,
        /// Evaluation time.
        at: DateTime<Utc>,
    },

    /// The chain does not lead to a trusted certificate.
    #[error("certificate '{0}' does not chain to a trusted certificate")]
    Untrusted(String),
}

/// Resolves whether signing certificates are trusted.
pub trait TrustProvider: Send + Sync {
    /// Checks that `chain` (DER, leaf first, then any intermediates) leads to
    /// a trusted certificate and that every certificate on the path is valid
    /// at `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrustError`] describing why the chain was refused.
    fn verify_chain(&self, chain: &[Vec<u8>], now: DateTime<Utc>) -> Result<(), TrustError>;

    /// Returns signing certificates registered for `issuer`, used when a
    /// signature carries no certificate of its own.
    fn certificates_for_issuer(&self, issuer: &str) -> Vec<Vec<u8>>;
}

/// In-memory trust store.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    /// Trusted certificates (DER).
    anchors: Vec<Vec<u8>>,
    /// Signing certificates per issuer entity ID (DER).
    issuers: HashMap<String, Vec<Vec<u8>>>,
}

impl TrustStore {
    /// Creates an empty store that trusts nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trusted DER certificate.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Certificate`] if the bytes are not a certificate.
    pub fn add_certificate_der(&mut self, der: Vec<u8>) -> Result<(), TrustError> {
        parse(&der)?;
        self.anchors.push(der);
        Ok(())
    }

    /// Adds a trusted PEM certificate.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Certificate`] if the PEM block cannot be decoded.
    pub fn add_certificate_pem(&mut self, pem: &str) -> Result<(), TrustError> {
        let (_, pem) = x509_parser::pem::parse_x509_pem(pem.as_bytes())
            .map_err(|e| TrustError::Certificate(format!("invalid PEM: {e}")))?;
        self.add_certificate_der(pem.contents)
    }

    /// Registers a signing certificate for an issuer and trusts it.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Certificate`] if the bytes are not a certificate.
    pub fn add_issuer_certificate(
        &mut self,
        issuer: impl Into<String>,
        der: Vec<u8>,
    ) -> Result<(), TrustError> {
        self.add_certificate_der(der.clone())?;
        self.issuers.entry(issuer.into()).or_default().push(der);
        Ok(())
    }

    /// Returns the number of trusted certificates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns true if nothing is trusted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl TrustProvider for TrustStore {
    fn verify_chain(&self, chain: &[Vec<u8>], now: DateTime<Utc>) -> Result<(), TrustError> {
        let Some(leaf_der) = chain.first() else {
            return Err(TrustError::EmptyChain);
        };
        let certs = chain
            .iter()
            .map(|der| parse(der))
            .collect::<Result<Vec<_>, _>>()?;
        let anchors = self
            .anchors
            .iter()
            .map(|der| parse(der))
            .collect::<Result<Vec<_>, _>>()?;

        let leaf = &certs[0];
        check_validity(leaf, now)?;

        if self.anchors.iter().any(|anchor| anchor == leaf_der) {
            return Ok(());
        }

        // Each step either reaches an anchor or consumes one intermediate.
        let mut current = leaf;
        for _ in 0..certs.len() {
            if let Some(anchor) = anchors.iter().find(|a| issued_by(current, a)) {
                check_validity(anchor, now)?;
                return Ok(());
            }

            let Some(next) = certs[1..].iter().find(|c| issued_by(current, c)) else {
                break;
            };
            check_validity(next, now)?;
            current = next;
        }

        tracing::debug!(subject = %leaf.subject(), "Certificate chain not trusted");
        Err(TrustError::Untrusted(leaf.subject().to_string()))
    }

    fn certificates_for_issuer(&self, issuer: &str) -> Vec<Vec<u8>> {
        self.issuers.get(issuer).cloned().unwrap_or_default()
    }
}

fn parse(der: &[u8]) -> Result<X509Certificate<'_>, TrustError> {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert)
        .map_err(|e| TrustError::Certificate(e.to_string()))
}

fn issued_by(cert: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> bool {
    cert.issuer().as_raw() == issuer.subject().as_raw()
        && issuer.is_ca()
        && cert.verify_signature(Some(issuer.public_key())).is_ok()
}

fn check_validity(cert: &X509Certificate<'_>, now: DateTime<Utc>) -> Result<(), TrustError> {
    let at = now.timestamp();
    let validity = cert.validity();
    if validity.not_before.timestamp() <= at && at <= validity.not_after.timestamp() {
        Ok(())
    } else {
        Err(TrustError::OutsideValidity {
            subject: cert.subject().to_string(),
            at: now,
        })
    }
}
