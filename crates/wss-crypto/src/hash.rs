//! Hash functions for XML-DSig reference digests.

use aws_lc_rs::{constant_time, digest};

use crate::algorithm::DigestAlgorithm;

/// Computes a hash of the input data.
#[must_use]
pub fn hash(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    let alg = match algorithm {
        DigestAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
        DigestAlgorithm::Sha256 => &digest::SHA256,
        DigestAlgorithm::Sha384 => &digest::SHA384,
        DigestAlgorithm::Sha512 => &digest::SHA512,
    };

    digest::digest(alg, data).as_ref().to_vec()
}

/// Compares a computed digest against an expected value in constant time.
#[must_use]
pub fn digest_matches(computed: &[u8], expected: &[u8]) -> bool {
    constant_time::verify_slices_are_equal(computed, expected).is_ok()
}
