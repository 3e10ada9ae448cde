use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of address a handle carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleType {
    PhoneNumber,
    EmailAddress,
    Generic,
}

impl fmt::Display for HandleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PhoneNumber => "phone_number",
            Self::EmailAddress => "email_address",
            Self::Generic => "generic",
        })
    }
}

/// The far party of a call, e.g. a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    pub kind: HandleType,
    pub value: String,
}

impl Handle {
    pub fn new(kind: HandleType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn phone_number(value: impl Into<String>) -> Self {
        Self::new(HandleType::PhoneNumber, value)
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
