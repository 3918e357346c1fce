// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Symbol names and addresses cross the harness boundary as newtypes so that
//! the probe path only ever handles values that were validated once, at
//! resolution time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Longest symbol name accepted from configuration.
const MAX_SYMBOL_LEN: usize = 128;

/// Validated exported-symbol name.
/// Must be a C identifier: non-empty, `[A-Za-z_][A-Za-z0-9_]*`, max 128 chars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolName(String);

impl SymbolName {
    /// Create a new SymbolName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidSymbol {
                name,
                reason: "Symbol name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_SYMBOL_LEN {
            let len = name.len();
            return Err(HardValidationError::InvalidSymbol {
                name,
                reason: format!("Symbol name too long: {} chars (max {})", len, MAX_SYMBOL_LEN),
            });
        }

        let mut chars = name.chars();
        let head_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(HardValidationError::InvalidSymbol {
                name,
                reason: "Symbol name must be a C identifier".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SymbolName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SymbolName> for String {
    fn from(name: SymbolName) -> Self {
        name.0
    }
}

/// Opaque code address of a resolved callable.
/// Never null. Displayed as `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Address(usize);

impl Address {
    /// Create a new Address, rejecting null.
    pub fn new(raw: usize) -> Result<Self, HardValidationError> {
        if raw == 0 {
            return Err(HardValidationError::NullAddress {
                symbol: "<unknown>".to_string(),
            });
        }
        Ok(Self(raw))
    }

    /// Address of a function pointer or any other non-null pointer.
    pub fn from_ptr<T>(ptr: *const T) -> Result<Self, HardValidationError> {
        Self::new(ptr as usize)
    }

    /// Create an Address without the null check.
    /// Only for values known to be non-null, such as function pointers.
    pub(crate) fn new_unchecked(raw: usize) -> Self {
        debug_assert!(raw != 0);
        Self(raw)
    }

    /// Get the raw address value.
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl TryFrom<usize> for Address {
    type Error = HardValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for usize {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

/// How a probe rewrites a target's return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnKind {
    /// Integer sentinel.
    Int,
    /// Pointer to an interned marker string.
    String,
    /// Left untouched.
    #[serde(rename = "none")]
    Void,
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::String => write!(f, "string"),
            Self::Void => write!(f, "none"),
        }
    }
}

/// Validated process ID.
/// Must be positive (non-zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Create a new ProcessId with validation.
    pub fn new(pid: u32) -> Result<Self, HardValidationError> {
        if pid == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "process_id",
                value: "0".to_string(),
                reason: "Process ID 0 is reserved".to_string(),
            });
        }
        Ok(Self(pid))
    }

    /// The ID of the calling process.
    pub fn current() -> Self {
        Self(std::process::id())
    }

    /// Get the inner PID value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ProcessId> for u32 {
    fn from(pid: ProcessId) -> Self {
        pid.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_name_valid() {
        assert!(SymbolName::new("compute_sum").is_ok());
        assert!(SymbolName::new("_start").is_ok());
        assert!(SymbolName::new("f2").is_ok());
    }

    #[test]
    fn test_symbol_name_invalid() {
        assert!(SymbolName::new("").is_err());
        assert!(SymbolName::new("a".repeat(129)).is_err());
        assert!(SymbolName::new("2fast").is_err());
        assert!(SymbolName::new("compute-sum").is_err());
        assert!(SymbolName::new("compute sum").is_err());
    }

    #[test]
    fn test_address_rejects_null() {
        assert!(Address::new(0).is_err());
        assert!(Address::from_ptr(std::ptr::null::<u8>()).is_err());
    }

    #[test]
    fn test_address_display() {
        let addr = Address::new(0xdead_beef).unwrap();
        assert_eq!(addr.to_string(), "0xdeadbeef");
        assert_eq!(addr.value(), 0xdead_beef);
    }

    #[test]
    fn test_return_kind_serde() {
        let kind: ReturnKind = serde_yaml::from_str("none").unwrap();
        assert_eq!(kind, ReturnKind::Void);
        let kind: ReturnKind = serde_yaml::from_str("string").unwrap();
        assert_eq!(kind.to_string(), "string");
    }

    #[test]
    fn test_process_id() {
        assert!(ProcessId::new(0).is_err());
        assert_eq!(ProcessId::new(42).unwrap().value(), 42);
        assert!(ProcessId::current().value() > 0);
    }
}
