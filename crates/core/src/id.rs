//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Number of digits in a customer identifier.
pub const CUSTOMER_ID_LEN: usize = 9;

/// Number of characters in a generated account identifier.
pub const ACCOUNT_ID_LEN: usize = 8;

/// Identifier of a customer: exactly nine ASCII digits.
///
/// Construction always goes through validation, including deserialization, so
/// a `CustomerId` value is well-formed by type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

/// Identifier of an account.
///
/// Opaque to callers. The ledger generates fresh ones with [`AccountId::generate`];
/// parsing only rejects empty or whitespace-bearing strings so ids persisted by
/// older versions stay loadable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl CustomerId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.len() != CUSTOMER_ID_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::invalid_id(format!(
                "CustomerId: expected {CUSTOMER_ID_LEN} digits, got {raw:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }
}

impl AccountId {
    /// Generate a candidate identifier from a random v4 UUID.
    ///
    /// Uniqueness within a ledger is not guaranteed here; callers must check
    /// for collisions against the ids already in use.
    pub fn generate() -> Self {
        let mut simple = Uuid::new_v4().simple().to_string();
        simple.truncate(ACCOUNT_ID_LEN);
        Self(simple)
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(DomainError::invalid_id(format!("AccountId: {raw:?}")));
        }
        Ok(Self(raw.to_string()))
    }
}

macro_rules! impl_string_newtype {
    ($t:ty) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

impl_string_newtype!(CustomerId);
impl_string_newtype!(AccountId);
