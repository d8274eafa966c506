#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types produced by the account-portal extraction engine.
//!
//! Every extracted value is a [`FieldValue`]: either a cleaned, non-empty
//! string or the "unknown" sentinel. Page-level records are flat bags of
//! field values assembled once per scrape into a [`CollectedRecord`].

use std::fmt;

use serde::Serialize;

/// Marker rendered in place of a value that no extraction strategy found.
pub const SENTINEL: &str = "—";

/// A single extracted value.
///
/// Never holds an empty string: constructing one from blank input (or from
/// the sentinel text itself) yields [`FieldValue::unknown`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldValue(Option<String>);

impl FieldValue {
    /// Wraps a value, collapsing blank or sentinel input to unknown.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == SENTINEL {
            return Self(None);
        }
        if trimmed.len() == value.len() {
            Self(Some(value))
        } else {
            Self(Some(trimmed.to_owned()))
        }
    }

    /// The "not found" value.
    #[must_use]
    pub const fn unknown() -> Self {
        Self(None)
    }

    /// Returns `true` if no strategy produced a value.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the found value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Returns the value as displayed: the found text or [`SENTINEL`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or(SENTINEL)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for FieldValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// One row of the services table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRow {
    /// Product name (e.g. "Домашний интернет").
    pub product: FieldValue,
    /// Tariff plan name.
    pub tariff: FieldValue,
}

/// Fields read from the request-detail ("main") page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MainPageData {
    /// Request number, e.g. `Req123456`.
    pub request_number: FieldValue,
    /// Personal account number.
    pub account_number: FieldValue,
    /// Connection address.
    pub address: FieldValue,
    /// Temporary password issued for the account.
    pub temp_password: FieldValue,
    /// Services attached to the request, in table order.
    pub services: Vec<ServiceRow>,
}

/// Fields read from the client-data tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    /// Subscriber number.
    pub abonent_number: FieldValue,
    /// Contact mobile phone.
    pub contact_mobile: FieldValue,
    /// Client's own mobile phone.
    pub client_mobile: FieldValue,
    /// Last name.
    pub lastname: FieldValue,
    /// First name.
    pub firstname: FieldValue,
    /// Middle name (patronymic).
    pub middlename: FieldValue,
}

/// PPPoE credentials read from the service settings tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PppoeData {
    /// PPPoE login.
    pub login: FieldValue,
    /// PPPoE password.
    pub password: FieldValue,
}

/// Everything gathered by one scrape, handed to the renderer as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedRecord {
    /// Main page fields and services.
    pub main: MainPageData,
    /// Client-data tab fields.
    pub client: ClientData,
    /// PPPoE tab fields.
    pub pppoe: PppoeData,
}
