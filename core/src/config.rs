//! Credentials and client configuration.

use std::fmt;
use std::time::Duration;

use crate::endpoint::Family;
use crate::error::ApiError;

pub const DEFAULT_API_BASE: &str = "https://api.ontraport.com";
pub const APPID_ENV: &str = "ONTRAPORT_APPID";
pub const KEY_ENV: &str = "ONTRAPORT_KEY";

/// Application id and API key sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    api_key: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Read credentials from `ONTRAPORT_APPID` and `ONTRAPORT_KEY`.
    pub fn from_env() -> Result<Self, ApiError> {
        let app_id = read_env(APPID_ENV)?;
        let api_key = read_env(KEY_ENV)?;
        Ok(Self::new(app_id, api_key))
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("api_key", &"***")
            .finish()
    }
}

fn read_env(name: &str) -> Result<String, ApiError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(ApiError::Config(format!("{name} is empty"))),
        Err(e) => Err(ApiError::Config(format!("{name}: {e}"))),
    }
}

/// Absolute URLs of the three endpoint scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub contacts: String,
    pub forms: String,
    pub products: String,
}

impl Endpoints {
    /// Derive all three endpoint URLs from a single API host.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            contacts: format!("{base}/{}", Family::Contacts.script()),
            forms: format!("{base}/{}", Family::Forms.script()),
            products: format!("{base}/{}", Family::Products.script()),
        }
    }

    pub fn url(&self, family: Family) -> &str {
        match family {
            Family::Contacts => &self.contacts,
            Family::Forms => &self.forms,
            Family::Products => &self.products,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_base(DEFAULT_API_BASE)
    }
}

/// Settings for `OntraportClient` beyond the credentials.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    /// Overall deadline for one request. `None` leaves the transport default.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            timeout: None,
            user_agent: concat!("ontraport-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_base_url(self, base: &str) -> Self {
        self.with_endpoints(Endpoints::with_base(base))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
