//! SAML 2.0 token processing.
//!
//! [`Saml2TokenProcessor`] is the entry point a security-header pipeline
//! calls for each `saml2:Assertion` it meets. It parses the token, verifies
//! the signature if one is present, derives claims and the validity window,
//! and returns the result entries most recent first.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use roxmltree::Node;
use wss_core::{ProcessorConfig, TokenEvent, TokenEventType};
use wss_crypto::TrustProvider;

use crate::bootstrap::Bootstrap;
use crate::error::{SecurityError, SecurityResult};
use crate::extract::{derive_claims, derive_issuer, derive_timestamp};
use crate::parser::AssertionParser;
use crate::result::{self, EngineResult};
use crate::signature::SignatureValidator;
use crate::types::Assertion;

const TOKEN_KIND: &str = "saml2";

/// Callback resolving key material by name.
///
/// Accepted for signature and decryption key lookup; the SAML core does not
/// consult it.
pub trait KeyResolver: Send + Sync {
    /// Returns the DER-encoded key or certificate registered under `name`.
    fn resolve(&self, name: &str) -> Option<Vec<u8>>;
}

/// Per-call collaborators supplied by the pipeline.
#[derive(Clone, Copy)]
pub struct ProcessingContext<'a> {
    /// Trust provider for signature certificates.
    pub signature_trust: &'a dyn TrustProvider,
    /// Trust provider for decryption keys.
    pub decryption_trust: Option<&'a dyn TrustProvider>,
    /// Key resolution callback.
    pub key_resolver: Option<&'a dyn KeyResolver>,
    /// Instant used for certificate validity; the current time if unset.
    pub now: Option<DateTime<Utc>>,
}

impl<'a> ProcessingContext<'a> {
    /// Creates a context with a signature trust provider only.
    #[must_use]
    pub const fn new(signature_trust: &'a dyn TrustProvider) -> Self {
        Self {
            signature_trust,
            decryption_trust: None,
            key_resolver: None,
            now: None,
        }
    }

    /// Sets the decryption trust provider.
    #[must_use]
    pub const fn with_decryption_trust(mut self, trust: &'a dyn TrustProvider) -> Self {
        self.decryption_trust = Some(trust);
        self
    }

    /// Sets the key resolution callback.
    #[must_use]
    pub const fn with_key_resolver(mut self, resolver: &'a dyn KeyResolver) -> Self {
        self.key_resolver = Some(resolver);
        self
    }

    /// Pins the evaluation instant.
    #[must_use]
    pub const fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

impl std::fmt::Debug for ProcessingContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingContext")
            .field("decryption_trust", &self.decryption_trust.is_some())
            .field("key_resolver", &self.key_resolver.is_some())
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

/// A processor for one kind of security token.
pub trait TokenProcessor: Send + Sync {
    /// Returns the token kind handled, e.g. `saml2`.
    fn token_kind(&self) -> &'static str;

    /// Processes a token element from the security header.
    ///
    /// # Errors
    ///
    /// Returns a [`SecurityError`] if the token is refused.
    fn handle_token(
        &self,
        element: Node<'_, '_>,
        context: &ProcessingContext<'_>,
    ) -> SecurityResult<Vec<EngineResult>>;
}

/// Processor for SAML 2.0 assertions.
#[derive(Debug, Clone)]
pub struct Saml2TokenProcessor<'b> {
    parser: AssertionParser<'b>,
    validator: SignatureValidator,
}

impl Saml2TokenProcessor<'static> {
    /// Creates a processor backed by the process-wide bootstrap.
    #[must_use]
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            parser: AssertionParser::new(config.xml.clone()),
            validator: SignatureValidator::new(&config.signature),
        }
    }
}

impl Default for Saml2TokenProcessor<'static> {
    fn default() -> Self {
        Self::new(&ProcessorConfig::default())
    }
}

impl<'b> Saml2TokenProcessor<'b> {
    /// Creates a processor backed by a specific bootstrap.
    #[must_use]
    pub fn with_bootstrap(config: &ProcessorConfig, bootstrap: &'b Bootstrap) -> Self {
        Self {
            parser: AssertionParser::with_bootstrap(config.xml.clone(), bootstrap),
            validator: SignatureValidator::new(&config.signature),
        }
    }

    /// Runs bootstrap ahead of the first token.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::Bootstrap`] if initialization fails.
    pub fn warm_up(&self) -> SecurityResult<()> {
        self.parser.bootstrap().ensure_initialized()?;
        Ok(())
    }

    /// Processes a serialized assertion.
    ///
    /// # Errors
    ///
    /// See [`TokenProcessor::handle_token`].
    pub fn handle_token_str(
        &self,
        xml: &str,
        context: &ProcessingContext<'_>,
    ) -> SecurityResult<Vec<EngineResult>> {
        let parsed = self.parser.parse_str(xml).map_err(SecurityError::from);
        self.finish(parsed, context)
    }

    fn finish(
        &self,
        parsed: SecurityResult<Assertion>,
        context: &ProcessingContext<'_>,
    ) -> SecurityResult<Vec<EngineResult>> {
        let outcome = parsed.and_then(|assertion| self.validate(assertion, context));
        match &outcome {
            Ok(results) => {
                if let Some(EngineResult::SamlToken(token)) = results.last() {
                    TokenEvent::builder(TokenEventType::TokenProcessed, TOKEN_KIND)
                        .success()
                        .token_id(token.token_id.as_str())
                        .issuer(token.issuer.as_str())
                        .signed(token.signed)
                        .build()
                        .emit();
                }
            }
            Err(e) => TokenEvent::builder(TokenEventType::TokenRejected, TOKEN_KIND)
                .failure(e.to_string())
                .build()
                .emit(),
        }
        outcome
    }

    fn validate(
        &self,
        assertion: Assertion,
        context: &ProcessingContext<'_>,
    ) -> SecurityResult<Vec<EngineResult>> {
        let assertion = if assertion.signature_present() {
            let now = context.now.unwrap_or_else(Utc::now);
            match self
                .validator
                .verify_at(&assertion, context.signature_trust, now)
            {
                Ok(true) => assertion.into_verified(),
                Ok(false) => assertion,
                Err(e) => {
                    tracing::warn!(
                        id = %assertion.id,
                        issuer = %assertion.issuer.value,
                        error = %e,
                        "SAML2 assertion signature rejected"
                    );
                    return Err(e.into());
                }
            }
        } else {
            assertion
        };

        let issuer = derive_issuer(&assertion);
        let claims = derive_claims(&assertion);
        let validity = derive_timestamp(&assertion);
        let signed = assertion.signed();
        let token = result::build(Arc::new(assertion), signed, issuer, claims, validity);

        tracing::debug!(
            id = %token.token_id,
            issuer = %token.issuer,
            signed,
            "SAML2 token was validated successfully"
        );

        let mut results = Vec::with_capacity(2);
        if !validity.is_unbounded() {
            results.push(EngineResult::SamlTimestamp(validity));
        }
        results.push(EngineResult::SamlToken(Box::new(token)));
        Ok(results)
    }
}

impl TokenProcessor for Saml2TokenProcessor<'_> {
    fn token_kind(&self) -> &'static str {
        TOKEN_KIND
    }

    fn handle_token(
        &self,
        element: Node<'_, '_>,
        context: &ProcessingContext<'_>,
    ) -> SecurityResult<Vec<EngineResult>> {
        let parsed = self.parser.parse(element).map_err(SecurityError::from);
        self.finish(parsed, context)
    }
}
