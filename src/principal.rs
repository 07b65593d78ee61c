//! Opaque account identifiers supplied by the hosting ledger

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a transaction submitter or an assigned technician
///
/// The hosting ledger owns the identifier format. This crate only requires
/// that the identifier is non-empty and otherwise treats it as plain text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Create a principal from a ledger account identifier
    ///
    /// # Errors
    /// Returns `Error::Validation` if the identifier is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::Validation(
                "principal identifier cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Principal {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
