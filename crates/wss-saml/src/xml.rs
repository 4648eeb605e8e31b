//! Small DOM helpers shared by the unmarshaller and the signature validator.

use roxmltree::Node;

/// Returns true if `node` is the element `{namespace}local`.
pub(crate) fn is_element(node: Node<'_, '_>, namespace: &str, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace() == Some(namespace)
}

/// Iterates over the element children of `node`.
pub(crate) fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

/// Iterates over the `{namespace}local` element children of `node`.
pub(crate) fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    namespace: &'a str,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    element_children(node).filter(move |n| is_element(*n, namespace, local))
}

/// Concatenated text of all descendants, trimmed.
pub(crate) fn text_content(node: Node<'_, '_>) -> String {
    let text: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    text.trim().to_string()
}

/// Returns the qualified name of an element exactly as written in the input.
pub(crate) fn source_qname<'input>(node: Node<'_, 'input>) -> &'input str {
    let input = node.document().input_text();
    let start = node.range().start + 1;
    let tail = input.get(start..).unwrap_or_default();
    let end = tail
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(tail.len());
    &tail[..end]
}
