//! Logical column-type catalog
//!
//! Every attribute carries one of these logical types. A type is either
//! plain, length-bearing (`VARCHAR(255)`) or precision-bearing
//! (`DECIMAL(10,2)`), never both.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Logical type of a table column.
///
/// Serialized and displayed as the uppercase SQL spelling.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    #[display("VARCHAR")]
    Varchar,
    #[display("CHAR")]
    Char,
    #[display("INTEGER")]
    Integer,
    #[display("TEXT")]
    Text,
    #[display("BOOLEAN")]
    Boolean,
    #[display("DATE")]
    Date,
    #[display("TIMESTAMP")]
    Timestamp,
    #[display("DECIMAL")]
    Decimal,
    #[display("NUMERIC")]
    Numeric,
    #[display("FLOAT")]
    Float,
    #[display("DOUBLE")]
    Double,
    #[display("BINARY")]
    Binary,
    #[display("VARBINARY")]
    Varbinary,
}

/// Default type offered for a freshly added attribute.
pub const DEFAULT_ATTRIBUTE_TYPE: AttributeType = AttributeType::Integer;

impl AttributeType {
    /// All catalog entries, in presentation order.
    pub const ALL: [AttributeType; 13] = [
        AttributeType::Varchar,
        AttributeType::Char,
        AttributeType::Integer,
        AttributeType::Text,
        AttributeType::Boolean,
        AttributeType::Date,
        AttributeType::Timestamp,
        AttributeType::Decimal,
        AttributeType::Numeric,
        AttributeType::Float,
        AttributeType::Double,
        AttributeType::Binary,
        AttributeType::Varbinary,
    ];

    /// Whether the type takes a `(length)` suffix.
    pub fn supports_length(self) -> bool {
        matches!(
            self,
            AttributeType::Varchar
                | AttributeType::Char
                | AttributeType::Binary
                | AttributeType::Varbinary
        )
    }

    /// Whether the type takes a `(precision)` or `(precision,scale)` suffix.
    pub fn supports_precision(self) -> bool {
        matches!(
            self,
            AttributeType::Decimal
                | AttributeType::Numeric
                | AttributeType::Float
                | AttributeType::Double
        )
    }

    /// Default length pre-filled when the user picks a length-bearing type.
    pub fn default_length(self) -> Option<u32> {
        match self {
            AttributeType::Varchar | AttributeType::Varbinary => Some(255),
            AttributeType::Char | AttributeType::Binary => Some(1),
            _ => None,
        }
    }

    /// Default `(precision, scale)` pre-filled for precision-bearing types.
    /// Scale is `None` for the floating types, which take a single figure.
    pub fn default_precision(self) -> Option<(u32, Option<u32>)> {
        match self {
            AttributeType::Decimal | AttributeType::Numeric => Some((10, Some(2))),
            AttributeType::Float => Some((24, None)),
            AttributeType::Double => Some((53, None)),
            _ => None,
        }
    }
}

impl Default for AttributeType {
    fn default() -> Self {
        DEFAULT_ATTRIBUTE_TYPE
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.to_string() == upper)
            .ok_or_else(|| format!("unknown attribute type '{}'", s))
    }
}
