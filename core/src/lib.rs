//! Synchronous client for the Ontraport contact, product and purchase API.
//!
//! # Overview
//! Each operation renders an XML (or, for transaction logs, JSON) payload,
//! picks one of three endpoint scripts from the action's resource family,
//! and posts a form body of `appid`, `key`, `return_id`, `reqType` and
//! `data`. The response body is returned unparsed; [`parse_response`] and
//! [`ContactReceipt`] are there for callers who want to look inside.
//!
//! # Design
//! - `build_*` methods produce plain-data `HttpRequest` values, so payloads
//!   can be inspected without a server.
//! - I/O goes through the [`Transport`] trait; [`UreqTransport`] is the
//!   default.
//! - Call diagnostics are returned in [`Reply`] instead of being stored on
//!   the client.
//!
//! ```no_run
//! use ontraport_core::{ContactReceipt, Credentials, OntraportClient, Sections};
//!
//! # fn main() -> Result<(), ontraport_core::ApiError> {
//! let client = OntraportClient::new(Credentials::from_env()?);
//! let reply = client.add_contact(
//!     &Sections::new()
//!         .group("Contact Information", [("First Name", "John"), ("Email", "john@example.com")])
//!         .group("Sequences and Tags", [("Contact Tags", "test")]),
//! )?;
//! let receipt = ContactReceipt::from_body(&reply.body)?;
//! println!("{} {:?}", receipt.status, receipt.contact_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod payload;
pub mod response;
pub mod transport;
pub mod types;

pub use client::OntraportClient;
pub use config::{ClientConfig, Credentials, Endpoints};
pub use endpoint::{resolve, Action, Family, ResolvedAction};
pub use error::ApiError;
pub use http::{Diagnostics, HttpMethod, HttpRequest, HttpResponse, Reply};
pub use response::{parse_response, ContactReceipt, XmlElement};
pub use transport::{Transport, UreqTransport};
pub use types::{Equation, Section, Sections};
