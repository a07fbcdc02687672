use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value:?}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Variant order mirrors classifier evaluation order.
str_enum!(LabStatus {
    Unknown => "unknown",
    NoReference => "no_reference",
    CriticalHigh => "critical_high",
    CriticalLow => "critical_low",
    Normal => "normal",
    Low => "low",
    High => "high",
});

str_enum!(RiskLevel {
    Low => "low",
    Moderate => "moderate",
    High => "high",
    Unknown => "unknown",
});

str_enum!(Urgency {
    Routine => "routine",
    Urgent => "urgent",
});

impl LabStatus {
    /// Statuses that land in a report's `flags`.
    pub fn is_flagged(&self) -> bool {
        !matches!(self, Self::Normal | Self::NoReference)
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Self::CriticalHigh | Self::CriticalLow)
    }
}
