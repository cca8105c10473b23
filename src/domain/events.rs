//! Domain Events
//!
//! Immutable facts published after the unit of work that produced them has committed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wallet events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WalletEvent {
    /// Funds were moved between two accounts
    TransactionCreated {
        transaction_id: Uuid,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Decimal,
        created_at: DateTime<Utc>,
    },
}

impl WalletEvent {
    pub const TRANSACTION_CREATED: &'static str = "TransactionCreated";

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            WalletEvent::TransactionCreated { .. } => Self::TRANSACTION_CREATED,
        }
    }

    /// When the underlying fact happened
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WalletEvent::TransactionCreated { created_at, .. } => *created_at,
        }
    }

    /// Payload as JSON, for handlers that forward events elsewhere
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_created_serialization() {
        let event = WalletEvent::TransactionCreated {
            transaction_id: Uuid::new_v4(),
            from_account_id: Uuid::new_v4(),
            to_account_id: Uuid::new_v4(),
            amount: Decimal::new(1000, 0),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("TransactionCreated"));

        let deserialized: WalletEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
        assert_eq!(deserialized.event_type(), WalletEvent::TRANSACTION_CREATED);
    }

    #[test]
    fn test_payload_carries_type_tag() {
        let created_at = Utc::now();
        let event = WalletEvent::TransactionCreated {
            transaction_id: Uuid::new_v4(),
            from_account_id: Uuid::new_v4(),
            to_account_id: Uuid::new_v4(),
            amount: Decimal::new(5, 1),
            created_at,
        };

        assert_eq!(event.payload()["type"], "TransactionCreated");
        assert_eq!(event.occurred_at(), created_at);
    }
}
