//! Symbol type
//!
//! A symbol identifies one tradable instrument on the upstream, e.g.
//! `USDT_BTC`. Each symbol owns exactly one archive series, so the symbol is
//! also the series name; validation keeps it safe to use as a collection or
//! file name.
//!
//! ## Validation
//!
//! Symbols must:
//! - Be 1-32 characters after uppercasing
//! - Contain only `A-Z`, `0-9` and `_`
//! - Not start or end with `_`
//!
//! Lowercase input is accepted and uppercased (the upstream ticker mixes
//! cases).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a symbol
pub const MAX_SYMBOL_LENGTH: usize = 32;

/// Validated instrument identifier
///
/// ## Examples
///
/// Valid: `USDT_BTC`, `BTC_ETH`, `usdt_xmr` (uppercased on parse)
///
/// Invalid: `""`, `_BTC`, `BTC-USD`, `BTC/USD`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

/// Error when validating a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// Symbol is empty
    Empty,
    /// Symbol exceeds maximum length
    TooLong {
        /// Actual length
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// Symbol contains an invalid character
    InvalidChar {
        /// The invalid character
        char: char,
        /// Position of the invalid character
        position: usize,
    },
    /// Symbol starts or ends with an underscore
    EdgeUnderscore,
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::Empty => write!(f, "symbol cannot be empty"),
            SymbolError::TooLong { length, max } => {
                write!(f, "symbol too long: {} chars (max {})", length, max)
            }
            SymbolError::InvalidChar { char, position } => {
                write!(
                    f,
                    "invalid character '{}' at position {} (only A-Z, 0-9, underscore allowed)",
                    char, position
                )
            }
            SymbolError::EdgeUnderscore => {
                write!(f, "symbol cannot start or end with an underscore")
            }
        }
    }
}

impl std::error::Error for SymbolError {}

impl Symbol {
    /// Create a new Symbol, uppercasing and validating the input
    ///
    /// # Errors
    ///
    /// Returns `SymbolError` if the name is invalid.
    pub fn new(name: impl AsRef<str>) -> Result<Self, SymbolError> {
        let name = name.as_ref().to_ascii_uppercase();
        Self::validate(&name)?;
        Ok(Symbol(name))
    }

    /// Get the symbol as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), SymbolError> {
        if name.is_empty() {
            return Err(SymbolError::Empty);
        }
        if name.len() > MAX_SYMBOL_LENGTH {
            return Err(SymbolError::TooLong {
                length: name.len(),
                max: MAX_SYMBOL_LENGTH,
            });
        }
        if name.starts_with('_') || name.ends_with('_') {
            return Err(SymbolError::EdgeUnderscore);
        }
        for (position, char) in name.chars().enumerate() {
            if !(char.is_ascii_uppercase() || char.is_ascii_digit() || char == '_') {
                return Err(SymbolError::InvalidChar { char, position });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_valid() {
        let s = Symbol::new("USDT_BTC").unwrap();
        assert_eq!(s.as_str(), "USDT_BTC");
        assert_eq!(format!("{}", s), "USDT_BTC");
    }

    #[test]
    fn test_symbol_uppercases() {
        let s = Symbol::new("usdt_xmr").unwrap();
        assert_eq!(s.as_str(), "USDT_XMR");
    }

    #[test]
    fn test_symbol_empty() {
        assert_eq!(Symbol::new(""), Err(SymbolError::Empty));
    }

    #[test]
    fn test_symbol_too_long() {
        let long = "A".repeat(MAX_SYMBOL_LENGTH + 1);
        assert!(matches!(
            Symbol::new(long),
            Err(SymbolError::TooLong { .. })
        ));
    }

    #[test]
    fn test_symbol_invalid_char() {
        assert!(matches!(
            Symbol::new("BTC-USD"),
            Err(SymbolError::InvalidChar { char: '-', .. })
        ));
        assert!(matches!(
            Symbol::new("BTC/USD"),
            Err(SymbolError::InvalidChar { char: '/', .. })
        ));
    }

    #[test]
    fn test_symbol_edge_underscore() {
        assert_eq!(Symbol::new("_BTC"), Err(SymbolError::EdgeUnderscore));
        assert_eq!(Symbol::new("BTC_"), Err(SymbolError::EdgeUnderscore));
    }

    #[test]
    fn test_symbol_from_str() {
        let s: Symbol = "usdt_eth".parse().unwrap();
        assert_eq!(s.as_str(), "USDT_ETH");
        assert!("BTC USD".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_symbol_ordering_and_hash() {
        use std::collections::HashSet;

        let a = Symbol::new("BTC_ETH").unwrap();
        let b = Symbol::new("btc_eth").unwrap();
        let c = Symbol::new("USDT_BTC").unwrap();

        assert_eq!(a, b);
        assert!(a < c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }
}
