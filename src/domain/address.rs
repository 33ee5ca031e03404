use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PropdeskError;

/// A ledger account address.
///
/// 42 characters, `0x` prefix, hex body. Addresses are case-insensitive on
/// the wire but canonicalized to lower case here so they can be used
/// directly as map keys and compared for identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

pub const ADDRESS_LEN: usize = 42;

impl Address {
    pub fn parse(raw: &str) -> Result<Self, PropdeskError> {
        let trimmed = raw.trim();
        if trimmed.len() != ADDRESS_LEN {
            return Err(PropdeskError::Validation(format!(
                "address must be {} characters, got {}",
                ADDRESS_LEN,
                trimmed.len()
            )));
        }
        if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
            return Err(PropdeskError::Validation(format!(
                "address must start with 0x: {}",
                trimmed
            )));
        }
        let hex_part = &trimmed[2..];
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PropdeskError::Validation(format!(
                "address contains non-hex characters: {}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = PropdeskError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for Address {
    type Error = PropdeskError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn parse_canonicalizes_to_lowercase() {
        let mixed = "0xAbCd111111111111111111111111111111111111";
        let addr = Address::parse(mixed).expect("mixed-case address should parse");
        assert_eq!(addr.as_str(), mixed.to_ascii_lowercase());
    }

    #[test]
    fn equal_addresses_differ_only_in_case() {
        let a = Address::parse(VALID).unwrap();
        let b = Address::parse(&VALID.to_ascii_uppercase().replace("0X", "0x")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse(&format!("{}ff", VALID)).is_err());
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        assert!(Address::parse("1x1111111111111111111111111111111111111111").is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!(Address::parse("0xzz11111111111111111111111111111111111111").is_err());
    }
}
