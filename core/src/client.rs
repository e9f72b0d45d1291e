//! Request construction and dispatch for the Ontraport API.
//!
//! # Design
//! Every operation is split in two. `build_*` validates its arguments,
//! renders the payload and returns an `HttpRequest` without touching the
//! network. The operation of the same name without the prefix feeds that
//! request to the client's `Transport` and returns a `Reply`: the raw body
//! plus diagnostics about the call. The client holds no per-call state, so a
//! single instance can be shared between threads.

use std::time::Instant;

use serde_json::Value;

use crate::config::{ClientConfig, Credentials, Endpoints};
use crate::endpoint::{self, Action};
use crate::error::ApiError;
use crate::http::{Diagnostics, HttpMethod, HttpRequest, Reply};
use crate::payload;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Equation, Sections};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous client for the contact, product and purchase endpoints.
#[derive(Debug, Clone)]
pub struct OntraportClient<T = UreqTransport> {
    credentials: Credentials,
    endpoints: Endpoints,
    transport: T,
}

impl OntraportClient<UreqTransport> {
    /// Client against the production endpoints with default settings.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(credentials, ClientConfig::default())
    }

    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Self {
        let transport = UreqTransport::new(&config);
        Self {
            credentials,
            endpoints: config.endpoints,
            transport,
        }
    }
}

impl<T: Transport> OntraportClient<T> {
    pub fn with_transport(credentials: Credentials, endpoints: Endpoints, transport: T) -> Self {
        Self {
            credentials,
            endpoints,
            transport,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Build the request for an arbitrary action.
    ///
    /// `data` is placed in the form body verbatim, so it must already be
    /// encoded the way the target action expects.
    pub fn build_request(&self, action: &str, method: HttpMethod, data: &str) -> HttpRequest {
        let resolved = endpoint::resolve(action);
        let body = format!(
            "appid={}&key={}&return_id=1&reqType={}&data={}",
            urlencoding::encode(self.credentials.app_id()),
            urlencoding::encode(self.credentials.api_key()),
            urlencoding::encode(&resolved.req_type),
            data
        );
        HttpRequest {
            method,
            url: self.endpoints.url(resolved.family).to_string(),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(body),
        }
    }

    /// Send `data` for `action` and return the raw body.
    pub fn send(&self, action: &str, method: HttpMethod, data: &str) -> Result<Reply, ApiError> {
        tracing::debug!(%action, "dispatching action");
        self.execute(self.build_request(action, method, data))
    }

    /// Execute a request produced by one of the `build_*` methods.
    pub fn execute(&self, request: HttpRequest) -> Result<Reply, ApiError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let started = Instant::now();
        let response = self.transport.execute(&request)?;
        let elapsed = started.elapsed();
        tracing::debug!(status = response.status, ?elapsed, "response received");

        let posted_data = request.body.as_deref().map(redact_key);
        let content_type = response
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone());
        Ok(Reply {
            body: response.body,
            diagnostics: Diagnostics {
                http_method: request.method,
                request_url: request.url,
                posted_data,
                status: response.status,
                content_type,
                response_headers: response.headers,
                elapsed,
            },
        })
    }

    fn build_xml(&self, action: Action, xml: &str) -> HttpRequest {
        self.build_request(action.as_str(), HttpMethod::Post, &payload::double_encode(xml))
    }

    pub fn build_add_contact(&self, sections: &Sections) -> HttpRequest {
        self.build_xml(Action::ContactsAdd, &payload::contact_xml(sections, None))
    }

    pub fn build_get_contact(&self, contact_id: &str) -> Result<HttpRequest, ApiError> {
        if contact_id.is_empty() {
            return Err(ApiError::validation("contact id is empty"));
        }
        Ok(self.build_xml(Action::ContactsFetch, &payload::contact_ids_xml(&[contact_id])))
    }

    pub fn build_get_contacts<S: AsRef<str>>(&self, contact_ids: &[S]) -> Result<HttpRequest, ApiError> {
        if contact_ids.is_empty() {
            return Err(ApiError::validation("no contact ids given"));
        }
        if contact_ids.iter().any(|id| id.as_ref().is_empty()) {
            return Err(ApiError::validation("contact id is empty"));
        }
        Ok(self.build_xml(Action::ContactsFetch, &payload::contact_ids_xml(contact_ids)))
    }

    pub fn build_update_contact(&self, contact_id: &str, sections: &Sections) -> Result<HttpRequest, ApiError> {
        if contact_id.is_empty() {
            return Err(ApiError::validation("contact id is empty"));
        }
        Ok(self.build_xml(
            Action::ContactsUpdate,
            &payload::contact_xml(sections, Some(contact_id)),
        ))
    }

    pub fn build_search_contacts(&self, equations: &[Equation]) -> HttpRequest {
        self.build_xml(Action::ContactsSearch, &payload::search_xml(equations))
    }

    pub fn build_search_products(&self, equations: &[Equation]) -> HttpRequest {
        self.build_xml(Action::ProductsSearch, &payload::search_xml(equations))
    }

    pub fn build_search_purchases(&self, equations: &[Equation]) -> HttpRequest {
        self.build_xml(Action::ProductsSearchPurchase, &payload::search_xml(equations))
    }

    pub fn build_sale_product(
        &self,
        contact_id: &str,
        product_id: &str,
        fields: &[(String, String)],
    ) -> Result<HttpRequest, ApiError> {
        if contact_id.is_empty() {
            return Err(ApiError::validation("contact id is empty"));
        }
        if product_id.is_empty() {
            return Err(ApiError::validation("product id is empty"));
        }
        Ok(self.build_xml(
            Action::ProductsSale,
            &payload::sale_xml(contact_id, product_id, fields),
        ))
    }

    /// The JSON document is percent-encoded once, so a single form decode
    /// on the server side yields it unchanged.
    pub fn build_log_transaction(
        &self,
        contact_id: &str,
        products: &Value,
        date: Option<i64>,
    ) -> Result<HttpRequest, ApiError> {
        let json = payload::transaction_json(contact_id, products, date)?;
        Ok(self.build_request(
            Action::ProductsLogTransaction.as_str(),
            HttpMethod::Post,
            &urlencoding::encode(&json),
        ))
    }

    pub fn add_contact(&self, sections: &Sections) -> Result<Reply, ApiError> {
        self.execute(self.build_add_contact(sections))
    }

    pub fn get_contact(&self, contact_id: &str) -> Result<Reply, ApiError> {
        self.execute(self.build_get_contact(contact_id)?)
    }

    pub fn get_contacts<S: AsRef<str>>(&self, contact_ids: &[S]) -> Result<Reply, ApiError> {
        self.execute(self.build_get_contacts(contact_ids)?)
    }

    pub fn update_contact(&self, contact_id: &str, sections: &Sections) -> Result<Reply, ApiError> {
        self.execute(self.build_update_contact(contact_id, sections)?)
    }

    pub fn search_contacts(&self, equations: &[Equation]) -> Result<Reply, ApiError> {
        self.execute(self.build_search_contacts(equations))
    }

    pub fn search_products(&self, equations: &[Equation]) -> Result<Reply, ApiError> {
        self.execute(self.build_search_products(equations))
    }

    pub fn search_purchases(&self, equations: &[Equation]) -> Result<Reply, ApiError> {
        self.execute(self.build_search_purchases(equations))
    }

    pub fn sale_product(
        &self,
        contact_id: &str,
        product_id: &str,
        fields: &[(String, String)],
    ) -> Result<Reply, ApiError> {
        self.execute(self.build_sale_product(contact_id, product_id, fields)?)
    }

    pub fn log_transaction(&self, contact_id: &str, products: &Value, date: Option<i64>) -> Result<Reply, ApiError> {
        self.execute(self.build_log_transaction(contact_id, products, date)?)
    }
}

/// Replace the value of the `key` form field with `***`.
fn redact_key(body: &str) -> String {
    body.split('&')
        .map(|pair| if pair.starts_with("key=") { "key=***" } else { pair })
        .collect::<Vec<_>>()
        .join("&")
}
