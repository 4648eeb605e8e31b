//! Namespace and algorithm URIs used by SAML assertion tokens.

/// SAML 2.0 assertion namespace URI.
pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// XML Digital Signature namespace URI.
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Exclusive canonicalization namespace, home of `InclusiveNamespaces`.
pub const EXC_C14N_NS: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

/// SAML 2.0 subject confirmation methods.
pub mod confirmation_methods {
    /// Bearer confirmation method URI.
    pub const BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";

    /// Holder of key confirmation method URI.
    pub const HOLDER_OF_KEY: &str = "urn:oasis:names:tc:SAML:2.0:cm:holder-of-key";

    /// Sender vouches confirmation method URI.
    pub const SENDER_VOUCHES: &str = "urn:oasis:names:tc:SAML:2.0:cm:sender-vouches";
}

/// Canonicalization algorithm URIs.
pub mod canonicalization_algorithms {
    /// C14N 1.0 without comments.
    pub const C14N: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";

    /// C14N 1.0 with comments.
    pub const C14N_WITH_COMMENTS: &str =
        "http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments";

    /// Exclusive C14N without comments.
    pub const EXCLUSIVE_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

    /// Exclusive C14N with comments.
    pub const EXCLUSIVE_C14N_WITH_COMMENTS: &str =
        "http://www.w3.org/2001/10/xml-exc-c14n#WithComments";
}

/// Reference transform URIs.
pub mod transforms {
    /// Enveloped signature transform.
    pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
}

/// WS-Security SOAP fault codes.
pub mod fault_codes {
    /// The token could not be understood.
    pub const INVALID_SECURITY_TOKEN: &str = "wsse:InvalidSecurityToken";

    /// A signature or integrity check failed.
    pub const FAILED_CHECK: &str = "wsse:FailedCheck";
}
