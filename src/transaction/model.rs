use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A transfer of `amount` from one address to another.
///
/// `from` is `None` only for mining rewards. The field order here is part of
/// the block hash preimage and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Option<String>,
    pub to: String,
    pub amount: i64,
}

impl Transaction {
    /// Build a transaction verbatim. No checks are performed here.
    pub fn new(from: Option<String>, to: impl Into<String>, amount: i64) -> Self {
        Self {
            from,
            to: to.into(),
            amount,
        }
    }

    /// Reward transaction crediting `to` (no sender).
    pub fn reward(to: impl Into<String>, amount: i64) -> Self {
        Self::new(None, to, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.from.is_none()
    }

    /// Rules applied to caller-submitted transactions before they enter the pool.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.to.trim().is_empty() {
            return Err(ValidationError::MissingRecipient);
        }
        if self.is_reward() || self.from.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(ValidationError::MissingSender);
        }
        if self.amount <= 0 {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }
}
