use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Form, Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::RwLock};

pub const DEFAULT_APPID: &str = "test-app";
pub const DEFAULT_KEY: &str = "test-key";
pub const BAD_CREDENTIALS: &str = "Invalid AppId / Key Combination";

pub type Fields = Vec<(String, String)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contact {
    pub id: u64,
    pub groups: Vec<(String, Fields)>,
}

impl Contact {
    fn flat_fields(&self) -> impl Iterator<Item = &(String, String)> + Clone {
        self.groups.iter().flat_map(|(_, fields)| fields.iter())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub id: u64,
    pub fields: Fields,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Purchase {
    pub id: u64,
    pub contact_id: String,
    pub product_id: u64,
    pub fields: Fields,
}

/// One request as the mock saw it, with `data` fully decoded.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub endpoint: String,
    pub req_type: String,
    pub return_id: Option<String>,
    pub payload: String,
}

#[derive(Debug)]
pub struct MockState {
    appid: String,
    key: String,
    pub contacts: BTreeMap<u64, Contact>,
    pub products: Vec<Product>,
    pub purchases: Vec<Purchase>,
    pub transactions: Vec<serde_json::Value>,
    pub calls: Vec<RecordedCall>,
    next_contact_id: u64,
    next_purchase_id: u64,
}

impl MockState {
    pub fn new(appid: &str, key: &str) -> Self {
        let product = |id: u64, name: &str, price: &str| Product {
            id,
            fields: vec![
                ("id".to_string(), id.to_string()),
                ("name".to_string(), name.to_string()),
                ("price".to_string(), price.to_string()),
            ],
        };
        Self {
            appid: appid.to_string(),
            key: key.to_string(),
            contacts: BTreeMap::new(),
            products: vec![product(1, "Widget", "10.00"), product(2, "Gadget & Co", "25.00")],
            purchases: Vec::new(),
            transactions: Vec::new(),
            calls: Vec::new(),
            next_contact_id: 1,
            next_purchase_id: 1,
        }
    }
}

pub type Db = Arc<RwLock<MockState>>;

pub fn new_db(appid: &str, key: &str) -> Db {
    Arc::new(RwLock::new(MockState::new(appid, key)))
}

pub fn app() -> Router {
    router(new_db(DEFAULT_APPID, DEFAULT_KEY))
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/cdata.php", post(contacts_endpoint))
        .route("/pdata.php", post(products_endpoint))
        .route("/fdata.php", post(forms_endpoint))
        .with_state(db)
}

/// Serve the mock endpoints on `listener` until the process exits.
pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, router(db)).await
}

type FormFields = HashMap<String, String>;

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

fn failure(message: &str) -> String {
    format!("<result>\n<status>Failure</status>\n<error>{}</error>\n</result>\n", escape(message))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Authenticate and record a call. Returns the request type and the payload
/// after the extra decode round XML actions need, or the body to answer
/// with when the call is rejected.
async fn accept(
    db: &Db,
    endpoint: &str,
    form: &FormFields,
    decode_data: bool,
) -> Result<(String, String), String> {
    let mut state = db.write().await;
    let appid = form.get("appid").map(String::as_str).unwrap_or_default();
    let key = form.get("key").map(String::as_str).unwrap_or_default();
    if appid != state.appid || key != state.key {
        tracing::info!(endpoint, appid, "rejected credentials");
        return Err(format!("<result>{BAD_CREDENTIALS}</result>\n"));
    }

    let req_type = form.get("reqType").cloned().unwrap_or_default();
    let raw = form.get("data").map(String::as_str).unwrap_or_default();
    let payload = if decode_data {
        urlencoding::decode(raw)
            .map(|p| p.into_owned())
            .map_err(|_| failure("data is not percent-encoded"))?
    } else {
        raw.to_string()
    };
    tracing::info!(endpoint, req_type = %req_type, "accepted call");
    state.calls.push(RecordedCall {
        endpoint: endpoint.to_string(),
        req_type: req_type.clone(),
        return_id: form.get("return_id").cloned(),
        payload: payload.clone(),
    });
    Ok((req_type, payload))
}

fn parse_fields(node: roxmltree::Node<'_, '_>) -> Fields {
    node.children()
        .filter(|n| n.has_tag_name("field"))
        .map(|n| {
            (
                n.attribute("name").unwrap_or_default().to_string(),
                n.text().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn parse_groups(contact: roxmltree::Node<'_, '_>) -> Vec<(String, Fields)> {
    contact
        .children()
        .filter(|n| n.has_tag_name("Group_Tag"))
        .map(|n| (n.attribute("name").unwrap_or_default().to_string(), parse_fields(n)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    pub field: String,
    pub op: String,
    pub value: String,
}

fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> String {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .unwrap_or_default()
        .to_string()
}

fn parse_equations(payload: &str) -> Result<Vec<Equation>, String> {
    let doc = roxmltree::Document::parse(payload).map_err(|e| e.to_string())?;
    Ok(doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("equation"))
        .map(|eq| Equation {
            field: child_text(eq, "field"),
            op: child_text(eq, "op"),
            value: child_text(eq, "value"),
        })
        .collect())
}

/// Supports `=`, `<>` and `LIKE` with leading or trailing `%` wildcards.
/// Field names compare case-insensitively. Every equation must hold.
pub fn matches_all<'a, I>(fields: I, equations: &[Equation]) -> bool
where
    I: IntoIterator<Item = &'a (String, String)> + Clone,
{
    equations.iter().all(|eq| {
        let Some((_, actual)) = fields
            .clone()
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&eq.field))
        else {
            return false;
        };
        match eq.op.to_ascii_uppercase().as_str() {
            "=" => *actual == eq.value,
            "<>" => *actual != eq.value,
            "LIKE" => like(actual, &eq.value),
            _ => false,
        }
    })
}

fn like(actual: &str, pattern: &str) -> bool {
    let actual = actual.to_lowercase();
    let pattern = pattern.to_lowercase();
    match (pattern.strip_prefix('%'), pattern.strip_suffix('%')) {
        (Some(rest), Some(_)) => actual.contains(rest.trim_end_matches('%')),
        (Some(rest), None) => actual.ends_with(rest),
        (None, Some(rest)) => actual.starts_with(rest),
        (None, None) => actual == pattern,
    }
}

fn render_fields(out: &mut String, indent: &str, fields: &Fields) {
    for (name, value) in fields {
        out.push_str(&format!(
            "{indent}<field name=\"{}\">{}</field>\n",
            escape(name),
            escape(value)
        ));
    }
}

fn render_contact(contact: &Contact) -> String {
    let mut out = format!("<contact id=\"{}\">\n", contact.id);
    for (name, fields) in &contact.groups {
        out.push_str(&format!("<Group_Tag name=\"{}\">\n", escape(name)));
        render_fields(&mut out, "", fields);
        out.push_str("</Group_Tag>\n");
    }
    out.push_str("</contact>\n");
    out
}

fn render_result(status: bool, items: impl IntoIterator<Item = String>) -> String {
    let mut out = "<result>\n".to_string();
    if status {
        out.push_str("<status>Success</status>\n");
    }
    for item in items {
        out.push_str(&item);
    }
    out.push_str("</result>\n");
    out
}

async fn contacts_endpoint(State(db): State<Db>, Form(form): Form<FormFields>) -> Response {
    let (req_type, payload) = match accept(&db, "cdata.php", &form, true).await {
        Ok(call) => call,
        Err(body) => return xml(body),
    };
    let mut state = db.write().await;
    let body = match req_type.as_str() {
        "add" => match roxmltree::Document::parse(&payload) {
            Ok(doc) => {
                let id = state.next_contact_id;
                state.next_contact_id += 1;
                let contact = Contact {
                    id,
                    groups: parse_groups(doc.root_element()),
                };
                let rendered = render_contact(&contact);
                state.contacts.insert(id, contact);
                render_result(true, [rendered])
            }
            Err(e) => failure(&e.to_string()),
        },
        "fetch" => match roxmltree::Document::parse(&format!("<ids>{payload}</ids>")) {
            Ok(doc) => {
                let found: Vec<String> = doc
                    .root_element()
                    .children()
                    .filter(|n| n.has_tag_name("contact_id"))
                    .filter_map(|n| n.text()?.trim().parse::<u64>().ok())
                    .filter_map(|id| state.contacts.get(&id))
                    .map(render_contact)
                    .collect();
                render_result(false, found)
            }
            Err(e) => failure(&e.to_string()),
        },
        "update" => match roxmltree::Document::parse(&payload) {
            Ok(doc) => {
                let root = doc.root_element();
                let id = root.attribute("id").and_then(|id| id.parse::<u64>().ok());
                match id.and_then(|id| state.contacts.get_mut(&id)) {
                    Some(contact) => {
                        for (group, fields) in parse_groups(root) {
                            merge_group(contact, group, fields);
                        }
                        render_result(true, [render_contact(contact)])
                    }
                    None => failure("contact not found"),
                }
            }
            Err(e) => failure(&e.to_string()),
        },
        "search" => match parse_equations(&payload) {
            Ok(equations) => {
                let found: Vec<String> = state
                    .contacts
                    .values()
                    .filter(|c| matches_all(c.flat_fields(), &equations))
                    .map(render_contact)
                    .collect();
                render_result(false, found)
            }
            Err(e) => failure(&e),
        },
        other => failure(&format!("unknown reqType {other}")),
    };
    xml(body)
}

fn merge_group(contact: &mut Contact, group: String, fields: Fields) {
    let idx = match contact.groups.iter().position(|(name, _)| *name == group) {
        Some(idx) => idx,
        None => {
            contact.groups.push((group, Vec::new()));
            contact.groups.len() - 1
        }
    };
    let existing = &mut contact.groups[idx].1;
    for (name, value) in fields {
        match existing.iter_mut().find(|(n, _)| *n == name) {
            Some(field) => field.1 = value,
            None => existing.push((name, value)),
        }
    }
}

fn render_product(product: &Product) -> String {
    let mut out = format!("<product id=\"{}\">\n", product.id);
    render_fields(&mut out, "\t", &product.fields);
    out.push_str("</product>\n");
    out
}

fn purchase_fields(purchase: &Purchase) -> Fields {
    let mut fields = vec![
        ("id".to_string(), purchase.id.to_string()),
        ("contact_id".to_string(), purchase.contact_id.clone()),
        ("product_id".to_string(), purchase.product_id.to_string()),
    ];
    fields.extend(purchase.fields.iter().cloned());
    fields
}

fn render_purchase(purchase: &Purchase) -> String {
    let mut out = format!(
        "<purchase id=\"{}\" contact_id=\"{}\" product_id=\"{}\">\n",
        purchase.id,
        escape(&purchase.contact_id),
        purchase.product_id
    );
    render_fields(&mut out, "\t", &purchase.fields);
    out.push_str("</purchase>\n");
    out
}

#[derive(Deserialize)]
struct TransactionLog {
    contact_id: serde_json::Value,
    #[serde(default)]
    date: Option<i64>,
    products: Vec<serde_json::Value>,
}

async fn products_endpoint(State(db): State<Db>, Form(form): Form<FormFields>) -> Response {
    let is_transaction = form.get("reqType").map(String::as_str) == Some("log_transaction");
    let (req_type, payload) = match accept(&db, "pdata.php", &form, !is_transaction).await {
        Ok(call) => call,
        Err(body) => return xml(body),
    };
    let mut state = db.write().await;
    let body = match req_type.as_str() {
        "search" => match parse_equations(&payload) {
            Ok(equations) => {
                let found: Vec<String> = state
                    .products
                    .iter()
                    .filter(|p| matches_all(&p.fields, &equations))
                    .map(render_product)
                    .collect();
                render_result(false, found)
            }
            Err(e) => failure(&e),
        },
        "search_purchase" => match parse_equations(&payload) {
            Ok(equations) => {
                let found: Vec<String> = state
                    .purchases
                    .iter()
                    .filter(|p| matches_all(&purchase_fields(p), &equations))
                    .map(render_purchase)
                    .collect();
                render_result(false, found)
            }
            Err(e) => failure(&e),
        },
        "sale" => match record_sale(&mut state, &payload) {
            Ok(purchase) => render_result(true, [render_purchase(&purchase)]),
            Err(e) => failure(&e),
        },
        "log_transaction" => {
            let response = match serde_json::from_str::<TransactionLog>(&payload) {
                Ok(log) => {
                    let invoice_id = state.transactions.len() as u64 + 1;
                    state.transactions.push(serde_json::json!({
                        "contact_id": log.contact_id,
                        "date": log.date,
                        "products": log.products,
                    }));
                    serde_json::json!({"status": "Success", "invoice_id": invoice_id})
                }
                Err(e) => serde_json::json!({"status": "Failure", "error": e.to_string()}),
            };
            return ([(header::CONTENT_TYPE, "application/json")], response.to_string()).into_response();
        }
        other => failure(&format!("unknown reqType {other}")),
    };
    xml(body)
}

fn record_sale(state: &mut MockState, payload: &str) -> Result<Purchase, String> {
    let doc = roxmltree::Document::parse(payload).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    let contact_id = root.attribute("contact_id").unwrap_or_default().to_string();
    let product_id = root
        .attribute("product_id")
        .and_then(|id| id.parse::<u64>().ok())
        .ok_or_else(|| "missing product_id".to_string())?;
    if !state.products.iter().any(|p| p.id == product_id) {
        return Err(format!("unknown product {product_id}"));
    }
    let purchase = Purchase {
        id: state.next_purchase_id,
        contact_id,
        product_id,
        fields: parse_fields(root),
    };
    state.next_purchase_id += 1;
    state.purchases.push(purchase.clone());
    Ok(purchase)
}

async fn forms_endpoint(State(db): State<Db>, Form(form): Form<FormFields>) -> Response {
    let (req_type, _) = match accept(&db, "fdata.php", &form, true).await {
        Ok(call) => call,
        Err(body) => return xml(body),
    };
    let body = match req_type.as_str() {
        "fetch" => render_result(false, ["<form id=\"1\">Newsletter signup</form>\n".to_string()]),
        other => failure(&format!("unknown reqType {other}")),
    };
    xml(body)
}
