//! XML-DSig algorithm identifiers.
//!
//! Maps the algorithm URIs found in `ds:DigestMethod` and
//! `ds:SignatureMethod` to typed values. SHA-1 variants are recognized so
//! they can be rejected with a precise error instead of "unknown algorithm".

use thiserror::Error;

/// Error type for algorithm lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlgorithmError {
    /// Algorithm URI is not recognized.
    #[error("unknown algorithm: {0}")]
    Unknown(String),

    /// Algorithm uses SHA-1 and the policy forbids it.
    #[error("algorithm '{0}' uses SHA-1, which is not permitted")]
    Sha1Forbidden(&'static str),
}

/// Digest algorithms usable in `ds:DigestMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// Legacy SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// SHA-1 digest URI.
    pub const SHA1_URI: &'static str = "http://www.w3.org/2000/09/xmldsig#sha1";
    /// SHA-256 digest URI.
    pub const SHA256_URI: &'static str = "http://www.w3.org/2001/04/xmlenc#sha256";
    /// SHA-384 digest URI.
    pub const SHA384_URI: &'static str = "http://www.w3.org/2001/04/xmldsig-more#sha384";
    /// SHA-512 digest URI.
    pub const SHA512_URI: &'static str = "http://www.w3.org/2001/04/xmlenc#sha512";

    /// Returns the URI for this digest algorithm.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Sha1 => Self::SHA1_URI,
            Self::Sha256 => Self::SHA256_URI,
            Self::Sha384 => Self::SHA384_URI,
            Self::Sha512 => Self::SHA512_URI,
        }
    }

    /// Parses a digest algorithm from its URI.
    ///
    /// # Errors
    ///
    /// Returns [`AlgorithmError::Unknown`] for unrecognized URIs.
    pub fn from_uri(uri: &str) -> Result<Self, AlgorithmError> {
        match uri {
            Self::SHA1_URI => Ok(Self::Sha1),
            Self::SHA256_URI => Ok(Self::Sha256),
            Self::SHA384_URI => Ok(Self::Sha384),
            Self::SHA512_URI => Ok(Self::Sha512),
            other => Err(AlgorithmError::Unknown(other.to_string())),
        }
    }

    /// Returns the output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Returns true if this is the deprecated SHA-1.
    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        matches!(self, Self::Sha1)
    }
}

/// Key family of a signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// RSA PKCS#1 v1.5.
    Rsa,
    /// ECDSA with fixed-width `r || s` signature encoding.
    Ecdsa,
}

/// Signature algorithms usable in `ds:SignatureMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureAlgorithm {
    /// Legacy RSA with SHA-1.
    RsaSha1,
    /// RSA with SHA-256.
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// ECDSA with SHA-256.
    EcdsaSha256,
    /// ECDSA with SHA-384.
    EcdsaSha384,
    /// ECDSA with SHA-512.
    EcdsaSha512,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::RsaSha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            Self::RsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            Self::RsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            Self::RsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            Self::EcdsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            Self::EcdsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
            Self::EcdsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512",
        }
    }

    /// Parses a signature algorithm from its URI.
    ///
    /// # Errors
    ///
    /// Returns [`AlgorithmError::Unknown`] for unrecognized URIs.
    pub fn from_uri(uri: &str) -> Result<Self, AlgorithmError> {
        [
            Self::RsaSha1,
            Self::RsaSha256,
            Self::RsaSha384,
            Self::RsaSha512,
            Self::EcdsaSha256,
            Self::EcdsaSha384,
            Self::EcdsaSha512,
        ]
        .into_iter()
        .find(|alg| alg.uri() == uri)
        .ok_or_else(|| AlgorithmError::Unknown(uri.to_string()))
    }

    /// Returns the digest used inside the signature.
    #[must_use]
    pub const fn digest(self) -> DigestAlgorithm {
        match self {
            Self::RsaSha1 => DigestAlgorithm::Sha1,
            Self::RsaSha256 | Self::EcdsaSha256 => DigestAlgorithm::Sha256,
            Self::RsaSha384 | Self::EcdsaSha384 => DigestAlgorithm::Sha384,
            Self::RsaSha512 | Self::EcdsaSha512 => DigestAlgorithm::Sha512,
        }
    }

    /// Returns the key family.
    #[must_use]
    pub const fn key_family(self) -> KeyFamily {
        match self {
            Self::RsaSha1 | Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 => KeyFamily::Rsa,
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512 => KeyFamily::Ecdsa,
        }
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        self.digest().is_deprecated()
    }
}

/// Refuses SHA-1 unless `allow_sha1` is set.
///
/// # Errors
///
/// Returns [`AlgorithmError::Sha1Forbidden`] with the algorithm URI.
pub const fn enforce_sha1_policy(uri: &'static str, deprecated: bool, allow_sha1: bool) -> Result<(), AlgorithmError> {
    if deprecated && !allow_sha1 {
        Err(AlgorithmError::Sha1Forbidden(uri))
    } else {
        Ok(())
    }
}
