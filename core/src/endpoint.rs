//! Action names and their mapping onto endpoints.
//!
//! An action string has the shape `family_operation`. The family picks
//! one of three endpoint scripts and the operation travels upstream as the
//! `reqType` form field.

use std::fmt;

/// Resource family. Selects which endpoint script receives the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Contacts,
    Forms,
    Products,
}

impl Family {
    /// Map an action prefix to its family. Unknown prefixes fall back to
    /// the contact endpoint.
    pub fn from_prefix(prefix: &str) -> Family {
        match prefix {
            "forms" => Family::Forms,
            "products" => Family::Products,
            _ => Family::Contacts,
        }
    }

    /// Script name of this family's endpoint, relative to the API host.
    pub fn script(&self) -> &'static str {
        match self {
            Family::Contacts => "cdata.php",
            Family::Forms => "fdata.php",
            Family::Products => "pdata.php",
        }
    }
}

/// An action string split into its endpoint family and `reqType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    pub family: Family,
    pub req_type: String,
}

/// Resolve an action name. The name is lowercased and split on the first
/// `_`; without a separator the whole name is the `reqType` and the contact
/// endpoint is used.
pub fn resolve(action: &str) -> ResolvedAction {
    let action = action.to_lowercase();
    match action.split_once('_') {
        Some((prefix, operation)) => ResolvedAction {
            family: Family::from_prefix(prefix),
            req_type: operation.to_string(),
        },
        None => ResolvedAction {
            family: Family::Contacts,
            req_type: action,
        },
    }
}

/// Every action the client issues on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ContactsAdd,
    ContactsFetch,
    ContactsUpdate,
    ContactsSearch,
    ProductsSale,
    ProductsLogTransaction,
    ProductsSearch,
    ProductsSearchPurchase,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ContactsAdd => "contacts_add",
            Action::ContactsFetch => "contacts_fetch",
            Action::ContactsUpdate => "contacts_update",
            Action::ContactsSearch => "contacts_search",
            Action::ProductsSale => "products_sale",
            Action::ProductsLogTransaction => "products_log_transaction",
            Action::ProductsSearch => "products_search",
            Action::ProductsSearchPurchase => "products_search_purchase",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
