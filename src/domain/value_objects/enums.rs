//! # Domain Enums
//!
//! Enumeration types for domain concepts.
//!
//! - [`Region`] - Currency region selecting the active quote sources
//!
//! Enums implement `Display`, `FromStr` and Serde traits. Parsing is
//! case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency region.
///
/// Selects which set of quote sources is active and which currency pair the
/// quotes refer to.
///
/// # Examples
///
/// ```
/// use quote_consensus::domain::value_objects::enums::Region;
///
/// let region: Region = "brl".parse().unwrap();
/// assert_eq!(region, Region::Brl);
/// assert_eq!(region.to_string(), "BRL");
/// assert_eq!(region.currency_pair(), "USD/BRL");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[repr(u8)]
pub enum Region {
    /// Argentine peso.
    #[default]
    Ars = 0,
    /// Brazilian real.
    Brl = 1,
}

impl Region {
    /// Every supported region, in declaration order.
    pub const ALL: [Region; 2] = [Region::Ars, Region::Brl];

    /// Returns the ISO currency code of the region.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ars => "ARS",
            Self::Brl => "BRL",
        }
    }

    /// Returns the quoted currency pair, always against the US dollar.
    #[inline]
    #[must_use]
    pub const fn currency_pair(self) -> &'static str {
        match self {
            Self::Ars => "USD/ARS",
            Self::Brl => "USD/BRL",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ARS" => Ok(Self::Ars),
            "BRL" => Ok(Self::Brl),
            _ => Err(ParseEnumError::InvalidValue("Region", s.to_string())),
        }
    }
}

impl TryFrom<String> for Region {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Error type for parsing enum values from strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    /// The provided string value is not valid for the enum.
    InvalidValue(&'static str, String),
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(enum_name, value) => {
                write!(f, "invalid {} value: '{}'", enum_name, value)
            }
        }
    }
}

impl std::error::Error for ParseEnumError {}
