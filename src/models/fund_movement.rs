use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::JournalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundMovementType {
    StartingBalance,
    Addition,
    Withdrawal,
}

impl FundMovementType {
    /// +1 for money coming into the account, -1 for money leaving it.
    pub fn sign(&self) -> f64 {
        match self {
            FundMovementType::StartingBalance | FundMovementType::Addition => 1.0,
            FundMovementType::Withdrawal => -1.0,
        }
    }

    pub fn is_deposit(&self) -> bool {
        self.sign() > 0.0
    }
}

impl fmt::Display for FundMovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundMovementType::StartingBalance => write!(f, "StartingBalance"),
            FundMovementType::Addition => write!(f, "Addition"),
            FundMovementType::Withdrawal => write!(f, "Withdrawal"),
        }
    }
}

impl FromStr for FundMovementType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "startingbalance" | "initial" => Ok(FundMovementType::StartingBalance),
            "addition" | "deposit" => Ok(FundMovementType::Addition),
            "withdrawal" => Ok(FundMovementType::Withdrawal),
            _ => Err(JournalError::validation(format!(
                "Unknown fund movement type '{}'",
                s.trim()
            ))),
        }
    }
}

/// Money moved into or out of the account. `amount` is always a positive
/// magnitude; the direction comes from `movement_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundMovement {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub movement_type: FundMovementType,
    #[serde(default)]
    pub comments: String,
}

impl FundMovement {
    pub fn signed_amount(&self) -> f64 {
        self.amount * self.movement_type.sign()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FundMovementInput {
    pub date: Option<NaiveDate>,
    pub amount: f64,
    #[serde(rename = "type")]
    pub movement_type: String,
    pub comments: String,
}
