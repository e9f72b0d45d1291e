//! Payload builders for the `data` form field.
//!
//! All builders are pure. XML is emitted one element per line with tab
//! indentation. Every interpolated value, element text and attribute alike,
//! goes through [`escape`], so the same input renders the same way whichever
//! resource it is sent to.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::types::{Equation, Sections};

/// Replace the HTML special characters `& < > " '` with entities.
pub fn escape(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 16);
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Percent-encode twice, as the remote service expects for XML payloads.
pub fn double_encode(payload: &str) -> String {
    let once = urlencoding::encode(payload);
    urlencoding::encode(&once).into_owned()
}

/// `<contact>` document for create, or `<contact id="…">` for update.
pub fn contact_xml(sections: &Sections, id: Option<&str>) -> String {
    let mut xml = match id {
        Some(id) => format!("<contact id=\"{}\">\n", escape(id)),
        None => "<contact>\n".to_string(),
    };
    for section in sections.iter() {
        xml.push_str(&format!("\t<Group_Tag name=\"{}\">\n", escape(&section.name)));
        for (name, value) in &section.fields {
            xml.push_str(&format!(
                "\t\t<field name=\"{}\">{}</field>\n",
                escape(name),
                escape(value)
            ));
        }
        xml.push_str("\t</Group_Tag>\n");
    }
    xml.push_str("</contact>\n");
    xml
}

/// One `<contact_id>` line per id.
pub fn contact_ids_xml<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter()
        .map(|id| format!("<contact_id>{}</contact_id>\n", escape(id.as_ref())))
        .collect()
}

pub fn search_xml(equations: &[Equation]) -> String {
    let mut xml = "<search>\n".to_string();
    for eq in equations {
        xml.push_str("\t<equation>\n");
        xml.push_str(&format!("\t\t<field>{}</field>\n", escape(&eq.field)));
        xml.push_str(&format!("\t\t<op>{}</op>\n", escape(&eq.op)));
        xml.push_str(&format!("\t\t<value>{}</value>\n", escape(&eq.value)));
        xml.push_str("\t</equation>\n");
    }
    xml.push_str("</search>\n");
    xml
}

/// `<purchases>` document recording one product sale.
pub fn sale_xml(contact_id: &str, product_id: &str, fields: &[(String, String)]) -> String {
    let mut xml = format!(
        "<purchases contact_id=\"{}\" product_id=\"{}\">\n",
        escape(contact_id),
        escape(product_id)
    );
    for (name, value) in fields {
        xml.push_str(&format!("\t<field name=\"{}\">{}</field>\n", escape(name), escape(value)));
    }
    xml.push_str("</purchases>\n");
    xml
}

#[derive(Serialize)]
struct TransactionLog<'a> {
    contact_id: &'a str,
    date: i64,
    products: &'a Value,
}

/// JSON body for `products_log_transaction`.
///
/// `products` must be a JSON array; `date` is a unix timestamp in seconds
/// and defaults to now.
pub fn transaction_json(contact_id: &str, products: &Value, date: Option<i64>) -> Result<String, ApiError> {
    if contact_id.is_empty() {
        return Err(ApiError::validation("contact id is empty"));
    }
    if !products.is_array() {
        return Err(ApiError::validation("products must be an array"));
    }
    let log = TransactionLog {
        contact_id,
        date: date.unwrap_or_else(|| chrono::Utc::now().timestamp()),
        products,
    };
    serde_json::to_string(&log).map_err(|e| ApiError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unescape(escaped: &str) -> String {
        escaped
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#039;", "'")
            .replace("&amp;", "&")
    }

    #[test]
    fn escape_leaves_plain_text_borrowed() {
        assert!(matches!(escape("John Smith"), Cow::Borrowed("John Smith")));
    }

    #[test]
    fn escape_replaces_special_characters() {
        assert_eq!(escape(r#"Tom & "Jerry" <cat's>"#), "Tom &amp; &quot;Jerry&quot; &lt;cat&#039;s&gt;");
    }

    #[test]
    fn escaped_values_decode_back() {
        for raw in ["a&b", "<tag>", "&amp;", "O'Brien \"quoted\"", "*/*3*/*8*/*", ""] {
            assert_eq!(unescape(&escape(raw)), raw);
        }
    }

    #[test]
    fn contact_xml_layout() {
        let sections = Sections::new()
            .group("Contact Information", [("First Name", "John"), ("Email", "johnsmith@example.com")])
            .group("Sequences and Tags", [("Sequences", "*/*3*/*8*/*")]);
        let expected = "<contact>\n\
            \t<Group_Tag name=\"Contact Information\">\n\
            \t\t<field name=\"First Name\">John</field>\n\
            \t\t<field name=\"Email\">johnsmith@example.com</field>\n\
            \t</Group_Tag>\n\
            \t<Group_Tag name=\"Sequences and Tags\">\n\
            \t\t<field name=\"Sequences\">*/*3*/*8*/*</field>\n\
            \t</Group_Tag>\n\
            </contact>\n";
        assert_eq!(contact_xml(&sections, None), expected);
    }

    #[test]
    fn contact_xml_update_carries_id() {
        let xml = contact_xml(&Sections::new(), Some("42"));
        assert_eq!(xml, "<contact id=\"42\">\n</contact>\n");
    }

    #[test]
    fn contact_xml_escapes_values() {
        let sections = Sections::new().field("Contact Information", "Company", "Smith & Sons <Ltd>");
        let xml = contact_xml(&sections, None);
        assert!(xml.contains("<field name=\"Company\">Smith &amp; Sons &lt;Ltd&gt;</field>"));
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let field = doc.descendants().find(|n| n.has_tag_name("field")).unwrap();
        assert_eq!(field.text(), Some("Smith & Sons <Ltd>"));
    }

    #[test]
    fn contact_ids_one_line_each() {
        assert_eq!(
            contact_ids_xml(&["1", "2"]),
            "<contact_id>1</contact_id>\n<contact_id>2</contact_id>\n"
        );
    }

    #[test]
    fn search_xml_escapes_every_part() {
        let xml = search_xml(&[Equation::new("Last Name", "<>", "O'Neil & Co")]);
        let expected = "<search>\n\
            \t<equation>\n\
            \t\t<field>Last Name</field>\n\
            \t\t<op>&lt;&gt;</op>\n\
            \t\t<value>O&#039;Neil &amp; Co</value>\n\
            \t</equation>\n\
            </search>\n";
        assert_eq!(xml, expected);
        assert!(roxmltree::Document::parse(&xml).is_ok());
    }

    #[test]
    fn search_xml_without_equations() {
        assert_eq!(search_xml(&[]), "<search>\n</search>\n");
    }

    #[test]
    fn sale_xml_is_closed() {
        let xml = sale_xml("7", "3", &[("price".to_string(), "19.99".to_string())]);
        assert_eq!(
            xml,
            "<purchases contact_id=\"7\" product_id=\"3\">\n\t<field name=\"price\">19.99</field>\n</purchases>\n"
        );
        assert!(roxmltree::Document::parse(&xml).is_ok());
    }

    #[test]
    fn double_encoding_decodes_back_exactly() {
        let xml = contact_xml(
            &Sections::new().field("Contact Information", "Email", "a+b@example.com & more"),
            None,
        );
        let encoded = double_encode(&xml);
        assert!(!encoded.contains('<'));
        assert!(!encoded.contains('&'));
        let once = urlencoding::decode(&encoded).unwrap();
        let twice = urlencoding::decode(&once).unwrap();
        assert_eq!(twice, xml);
    }

    #[test]
    fn transaction_json_fields() {
        let products = json!([{"id": "3", "quantity": "1", "price": "10.00"}]);
        let body = transaction_json("42", &products, Some(1_400_000_000)).unwrap();
        assert_eq!(
            body,
            r#"{"contact_id":"42","date":1400000000,"products":[{"id":"3","price":"10.00","quantity":"1"}]}"#
        );
    }

    #[test]
    fn transaction_json_defaults_date_to_now() {
        let before = chrono::Utc::now().timestamp();
        let body = transaction_json("42", &json!([]), None).unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        let date = value["date"].as_i64().unwrap();
        assert!(date >= before && date <= chrono::Utc::now().timestamp());
    }

    #[test]
    fn transaction_json_rejects_non_array_products() {
        let err = transaction_json("42", &json!({"id": "3"}), None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = transaction_json("42", &json!("3"), None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn transaction_json_rejects_empty_contact() {
        let err = transaction_json("", &json!([]), None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
