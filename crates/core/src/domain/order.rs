use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::ProductId;
use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Paid => "paid",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending_payment" => Some(Self::PendingPayment),
            "paid" => Some(Self::Paid),
            "fulfilled" => Some(Self::Fulfilled),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: u64,
    pub quantity: u32,
}

impl OrderItem {
    pub fn subtotal(&self) -> u64 {
        self.price.saturating_mul(u64::from(self.quantity))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_name: String,
    pub items: Vec<OrderItem>,
    pub total: u64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Places a new order awaiting payment. The total is recomputed from the lines.
    pub fn place(
        id: OrderId,
        user_id: UserId,
        user_name: impl Into<String>,
        items: Vec<OrderItem>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::InvariantViolation(
                "an order needs at least one item".to_string(),
            ));
        }
        if items.iter().any(|item| item.quantity == 0) {
            return Err(DomainError::InvariantViolation(
                "order item quantity must be positive".to_string(),
            ));
        }

        let total = items.iter().map(OrderItem::subtotal).sum();
        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            user_name: user_name.into(),
            items,
            total,
            status: OrderStatus::PendingPayment,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self.status, next),
            (OrderStatus::PendingPayment, OrderStatus::Paid)
                | (OrderStatus::Paid, OrderStatus::Fulfilled)
                | (OrderStatus::PendingPayment, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            self.updated_at = Utc::now();
            return Ok(());
        }

        Err(DomainError::InvalidOrderTransition { from: self.status, to: next })
    }
}
