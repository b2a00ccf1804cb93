//! Logical measured quantities.
//!
//! A `Quantity` identifies one value type that providers report, e.g. the
//! BTC/USD exchange rate. The set is closed and known at configuration time;
//! its declaration order is the stable enumeration order used for output.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical measured value type.
///
/// Multiple providers may report the same quantity; the aggregator groups
/// provider observations by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Bitcoin to USD exchange rate.
    BtcUsd,
    /// Bitcoin to EUR exchange rate.
    BtcEur,
    /// EUR to USD exchange rate.
    EurUsd,
}

impl Quantity {
    /// Display label used in aggregated output lines.
    pub fn label(&self) -> &'static str {
        match self {
            Quantity::BtcUsd => "BTC/USD",
            Quantity::BtcEur => "BTC/EUR",
            Quantity::EurUsd => "EUR/USD",
        }
    }

    /// All quantities in stable enumeration order.
    pub fn all() -> &'static [Quantity] {
        &[Quantity::BtcUsd, Quantity::BtcEur, Quantity::EurUsd]
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quantity {
    type Err = CoreError;

    /// Parse the snake_case configuration name (e.g. `btc_usd`).
    ///
    /// An unrecognized name is a configuration defect and fails loudly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "btc_usd" => Ok(Quantity::BtcUsd),
            "btc_eur" => Ok(Quantity::BtcEur),
            "eur_usd" => Ok(Quantity::EurUsd),
            other => Err(CoreError::UnknownQuantity(other.to_string())),
        }
    }
}
