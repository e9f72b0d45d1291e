//! Optional reading of XML response bodies.
//!
//! The client hands back raw bodies. Callers that want to look inside one
//! can turn it into an owned [`XmlElement`] tree here; nothing is validated
//! against a schema.

use crate::error::ApiError;

/// An owned XML element: name, attributes in document order, the
/// concatenated direct text content, and child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed direct text content.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut text = String::new();
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(XmlElement::from_node(child));
            } else if child.is_text() {
                text.push_str(child.text().unwrap_or_default());
            }
        }
        XmlElement {
            name: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text,
            children,
        }
    }
}

/// Parse a response body into its root element.
pub fn parse_response(body: &str) -> Result<XmlElement, ApiError> {
    let doc = roxmltree::Document::parse(body).map_err(|e| {
        tracing::warn!(error = %e, "response body is not well-formed XML");
        ApiError::Parse(e.to_string())
    })?;
    Ok(XmlElement::from_node(doc.root_element()))
}

/// Outcome of a contact add or update: `<result><status>…</status>
/// <contact id="…">…</contact></result>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactReceipt {
    pub status: String,
    pub contact_id: Option<String>,
}

impl ContactReceipt {
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        let root = parse_response(body)?;
        Ok(Self::from_element(&root))
    }

    /// Read status and id from a parsed tree. A root without a `<status>`
    /// child contributes its own text, which is how the service reports
    /// errors such as bad credentials.
    pub fn from_element(root: &XmlElement) -> Self {
        let status = match root.child("status") {
            Some(status) => status.text().to_string(),
            None => root.text().to_string(),
        };
        let contact_id = root
            .child("contact")
            .and_then(|c| c.attr("id"))
            .map(str::to_string);
        ContactReceipt { status, contact_id }
    }

    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}
