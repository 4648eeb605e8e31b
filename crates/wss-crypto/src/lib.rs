//! # wss-crypto
//!
//! Cryptographic primitives for XML signature validation using aws-lc-rs.
//!
//! - [`algorithm`] - XML-DSig digest and signature algorithm URIs
//! - [`hash`] - reference digests and constant-time comparison
//! - [`signature`] - RSA and ECDSA signature verification
//! - [`trust`] - the [`TrustProvider`] seam and an in-memory [`TrustStore`]
//!
//! SHA-1 is implemented for interoperability with older identity providers;
//! callers decide whether to accept it via [`algorithm::enforce_sha1_policy`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod hash;
pub mod signature;
pub mod trust;

pub use algorithm::{AlgorithmError, DigestAlgorithm, KeyFamily, SignatureAlgorithm};
pub use hash::{digest_matches, hash};
pub use signature::{verify, verify_with_certificate, CryptoError};
pub use trust::{TrustError, TrustProvider, TrustStore};
