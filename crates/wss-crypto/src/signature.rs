//! Digital signature verification.
//!
//! Keys are taken from the `subjectPublicKey` bit string of a certificate:
//! PKCS#1 `RSAPublicKey` for RSA, an uncompressed SEC1 point for ECDSA.
//! XML-DSig encodes ECDSA signatures as fixed-width `r || s`.

use aws_lc_rs::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use thiserror::Error;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

use crate::algorithm::{KeyFamily, SignatureAlgorithm};

/// Error type for cryptographic operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Verification failed.
    #[error("signature verification failed")]
    Verification,

    /// Invalid key format.
    #[error("invalid key format: {0}")]
    InvalidKey(String),

    /// Algorithm not supported for this key.
    #[error("algorithm not supported: {0}")]
    UnsupportedAlgorithm(String),
}

/// Verifies `sig` over `data` with a raw public key.
///
/// # Errors
///
/// Returns [`CryptoError::Verification`] if the signature does not match and
/// [`CryptoError::UnsupportedAlgorithm`] if the key does not fit the
/// algorithm.
pub fn verify(
    algorithm: SignatureAlgorithm,
    public_key: &[u8],
    data: &[u8],
    sig: &[u8],
) -> Result<(), CryptoError> {
    let verification_alg = verification_algorithm(algorithm, public_key)?;

    UnparsedPublicKey::new(verification_alg, public_key)
        .verify(data, sig)
        .map_err(|_| CryptoError::Verification)
}

/// Verifies `sig` over `data` with the public key of a DER certificate.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKey`] if the certificate cannot be decoded,
/// otherwise the errors of [`verify`].
pub fn verify_with_certificate(
    algorithm: SignatureAlgorithm,
    certificate_der: &[u8],
    data: &[u8],
    sig: &[u8],
) -> Result<(), CryptoError> {
    let (_, cert) = X509Certificate::from_der(certificate_der)
        .map_err(|e| CryptoError::InvalidKey(format!("invalid certificate: {e}")))?;
    verify(algorithm, &cert.public_key().subject_public_key.data, data, sig)
}

fn verification_algorithm(
    algorithm: SignatureAlgorithm,
    public_key: &[u8],
) -> Result<&'static dyn VerificationAlgorithm, CryptoError> {
    match algorithm.key_family() {
        KeyFamily::Rsa => {
            let rsa: &'static dyn VerificationAlgorithm = match algorithm {
                SignatureAlgorithm::RsaSha1 => {
                    &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY
                }
                SignatureAlgorithm::RsaSha384 => &signature::RSA_PKCS1_2048_8192_SHA384,
                SignatureAlgorithm::RsaSha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
                _ => &signature::RSA_PKCS1_2048_8192_SHA256,
            };
            Ok(rsa)
        }
        KeyFamily::Ecdsa => {
            let curve = EcCurve::from_point_len(public_key.len()).ok_or_else(|| {
                CryptoError::InvalidKey(format!(
                    "unexpected EC public key length: {}",
                    public_key.len()
                ))
            })?;
            match (curve, algorithm) {
                (EcCurve::P256, SignatureAlgorithm::EcdsaSha256) => {
                    Ok(&signature::ECDSA_P256_SHA256_FIXED)
                }
                (EcCurve::P384, SignatureAlgorithm::EcdsaSha384) => {
                    Ok(&signature::ECDSA_P384_SHA384_FIXED)
                }
                (EcCurve::P521, SignatureAlgorithm::EcdsaSha512) => {
                    Ok(&signature::ECDSA_P521_SHA512_FIXED)
                }
                (curve, algorithm) => Err(CryptoError::UnsupportedAlgorithm(format!(
                    "{} with a {curve:?} key",
                    algorithm.uri()
                ))),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    // Uncompressed points: 0x04 || X || Y
    const fn from_point_len(len: usize) -> Option<Self> {
        match len {
            65 => Some(Self::P256),
            97 => Some(Self::P384),
            133 => Some(Self::P521),
            _ => None,
        }
    }
}
