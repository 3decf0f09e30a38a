//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// Created ──► Pending ──┬──► Accepted ──► Completed
///                │      └──► Rejected
///                └──► Canceled
/// ```
/// `Rejected`, `Completed` and `Canceled` are terminal. Cancellation is
/// only reachable from `Pending` (a paid order awaiting fulfillment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed from a basket, payment not yet completed.
    #[default]
    Created,

    /// Payment approved, awaiting the store's decision.
    Pending,

    /// The store accepted the order and is preparing it.
    Accepted,

    /// The store rejected the order (terminal state).
    Rejected,

    /// Order delivered/fulfilled (terminal state).
    Completed,

    /// Order refunded and canceled before fulfillment (terminal state).
    Canceled,
}

impl OrderStatus {
    /// Returns true if a gateway payment may be initiated in this status.
    pub fn can_initiate_payment(&self) -> bool {
        matches!(self, OrderStatus::Created)
    }

    /// Returns true if the order can record an approved payment.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::Pending)
    }

    /// Returns true if the order can be canceled (refund flow).
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the store can accept the order.
    pub fn can_accept(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the store can reject the order.
    pub fn can_reject(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be completed.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Accepted)
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Rejected | OrderStatus::Completed | OrderStatus::Canceled
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Pending => "Pending",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Completed => "Completed",
            OrderStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(OrderStatus::Created),
            "Pending" => Ok(OrderStatus::Pending),
            "Accepted" => Ok(OrderStatus::Accepted),
            "Rejected" => Ok(OrderStatus::Rejected),
            "Completed" => Ok(OrderStatus::Completed),
            "Canceled" => Ok(OrderStatus::Canceled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}
