//! Claims, issuer and validity window derived from a parsed assertion.
//!
//! Pure projections: nothing here fails and nothing touches the signature.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::Assertion;

/// A subject attribute asserted by the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    /// Attribute name.
    pub name: String,
    /// Attribute name format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    /// Values, in document order.
    pub values: Vec<String>,
}

/// Validity interval taken from `saml:Conditions`.
///
/// Either bound may be absent; with both absent the window is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidityWindow {
    /// Earliest instant at which the assertion is valid.
    pub not_before: Option<DateTime<Utc>>,
    /// Instant from which the assertion is no longer valid.
    pub not_on_or_after: Option<DateTime<Utc>>,
}

/// Outcome of checking a [`ValidityWindow`] against a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    /// Inside the window.
    Valid,
    /// Before `not_before`.
    NotYetValid,
    /// At or after `not_on_or_after`.
    Expired,
}

impl ValidityWindow {
    /// Returns true if neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.not_before.is_none() && self.not_on_or_after.is_none()
    }

    /// Evaluates the window at `now`, widening both bounds by `clock_skew`.
    ///
    /// A skew that reaches past the representable range saturates.
    #[must_use]
    pub fn evaluate(&self, now: DateTime<Utc>, clock_skew: Duration) -> WindowStatus {
        if let Some(not_before) = self.not_before {
            let latest = now
                .checked_add_signed(clock_skew)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if latest < not_before {
                return WindowStatus::NotYetValid;
            }
        }
        if let Some(not_on_or_after) = self.not_on_or_after {
            let earliest = now
                .checked_sub_signed(clock_skew)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            if earliest >= not_on_or_after {
                return WindowStatus::Expired;
            }
        }
        WindowStatus::Valid
    }
}

/// Flattens every attribute of every attribute statement, in document order.
/// Repeated attribute names are kept as separate claims.
pub fn derive_claims(assertion: &Assertion) -> Vec<Claim> {
    assertion
        .attribute_statements
        .iter()
        .flat_map(|statement| statement.attributes.iter())
        .map(|attribute| Claim {
            name: attribute.name.clone(),
            name_format: attribute.name_format.clone(),
            friendly_name: attribute.friendly_name.clone(),
            values: attribute.values.clone(),
        })
        .collect()
}

/// Returns the issuer identifier.
pub fn derive_issuer(assertion: &Assertion) -> String {
    assertion.issuer.value.clone()
}

/// Returns the validity window from `Conditions`, unbounded if absent.
pub fn derive_timestamp(assertion: &Assertion) -> ValidityWindow {
    assertion
        .conditions
        .as_ref()
        .map(|c| ValidityWindow {
            not_before: c.not_before,
            not_on_or_after: c.not_on_or_after,
        })
        .unwrap_or_default()
}
