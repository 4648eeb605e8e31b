//! Element-to-type binding registry.

use std::collections::HashMap;
use std::fmt;

use crate::error::{BootstrapError, ParseError};
use crate::types::Assertion;

/// Binds an element and its subtree into a typed assertion.
pub type Unmarshaller = fn(roxmltree::Node<'_, '_>) -> Result<Assertion, ParseError>;

/// Namespace-qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Namespace URI, empty for no namespace.
    pub namespace: String,
    /// Local name.
    pub local_name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Returns the qualified name of an element node.
    #[must_use]
    pub fn of(node: roxmltree::Node<'_, '_>) -> Self {
        let tag = node.tag_name();
        Self::new(tag.namespace().unwrap_or_default(), tag.name())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

/// Registry of unmarshallers keyed by element name.
#[derive(Clone, Default)]
pub struct UnmarshallerRegistry {
    entries: HashMap<QualifiedName, Unmarshaller>,
}

impl UnmarshallerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an unmarshaller.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::DuplicateUnmarshaller`] if `name` is taken.
    pub fn register(
        &mut self,
        name: QualifiedName,
        unmarshaller: Unmarshaller,
    ) -> Result<(), BootstrapError> {
        if self.entries.contains_key(&name) {
            return Err(BootstrapError::DuplicateUnmarshaller {
                namespace: name.namespace,
                local_name: name.local_name,
            });
        }
        self.entries.insert(name, unmarshaller);
        Ok(())
    }

    /// Looks up the unmarshaller for an element.
    #[must_use]
    pub fn get(&self, name: &QualifiedName) -> Option<Unmarshaller> {
        self.entries.get(name).copied()
    }

    /// Iterates over registered element names.
    pub fn keys(&self) -> impl Iterator<Item = &QualifiedName> {
        self.entries.keys()
    }

    /// Returns the number of registered elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for UnmarshallerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
