//! Exclusive XML Canonicalization 1.0 over a `roxmltree` subtree.
//!
//! Rendering is delegated to `bergshamra-c14n`, which works on its own parse
//! of the same document text. Elements are matched across the two trees by
//! the byte offset of their start tag.

use bergshamra_c14n::C14nMode;
use bergshamra_xml::uppsala::{self, Document, NodeId};
use bergshamra_xml::NodeSet;
use roxmltree::Node;

use crate::error::SignatureError;

/// Exclusive canonicalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusiveC14n {
    with_comments: bool,
    inclusive_prefixes: Vec<String>,
}

impl ExclusiveC14n {
    /// Creates a canonicalizer.
    #[must_use]
    pub const fn new(with_comments: bool) -> Self {
        Self {
            with_comments,
            inclusive_prefixes: Vec::new(),
        }
    }

    /// Sets the `InclusiveNamespaces` prefix list; `#default` names the
    /// default namespace.
    #[must_use]
    pub fn with_inclusive_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inclusive_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Drops comments from the output.
    ///
    /// A same-document `#id` reference selects its node set without
    /// comments, even under the `WithComments` algorithm.
    #[must_use]
    pub fn without_comments(mut self) -> Self {
        self.with_comments = false;
        self
    }

    /// Canonicalizes the subtree rooted at `apex`, leaving out `exclude` and
    /// its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Canonicalization`] if the document text
    /// cannot be rendered.
    pub fn canonicalize(
        &self,
        apex: Node<'_, '_>,
        exclude: Option<Node<'_, '_>>,
    ) -> Result<Vec<u8>, SignatureError> {
        let doc = uppsala::parse(apex.document().input_text())
            .map_err(|e| SignatureError::Canonicalization(e.to_string()))?;

        let apex_id = locate(&doc, apex)?;
        let mut selection = if self.with_comments {
            NodeSet::tree_with_comments(apex_id, &doc)
        } else {
            NodeSet::tree_without_comments(apex_id, &doc)
        };
        if let Some(excluded) = exclude {
            let excluded_id = locate(&doc, excluded)?;
            selection = selection.subtract(&NodeSet::tree_with_comments(excluded_id, &doc));
        }

        let mode = if self.with_comments {
            C14nMode::ExclusiveWithComments
        } else {
            C14nMode::Exclusive
        };
        bergshamra_c14n::canonicalize_doc(&doc, mode, Some(&selection), &self.inclusive_prefixes)
            .map_err(|e| SignatureError::Canonicalization(e.to_string()))
    }
}

/// Finds the element of `doc` whose start tag begins where `node`'s does.
fn locate(doc: &Document<'_>, node: Node<'_, '_>) -> Result<NodeId, SignatureError> {
    let start = node.range().start;
    doc.descendants(doc.root())
        .into_iter()
        .find(|&id| {
            doc.element(id).is_some() && doc.node_range(id).is_some_and(|r| r.start == start)
        })
        .ok_or_else(|| {
            SignatureError::Canonicalization(format!(
                "element {} not found",
                node.tag_name().name()
            ))
        })
}
