use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cart::{CartLine, Customer};

/// Order lifecycle. Only `Pending` is mutable; `Completed` and `Canceled`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELED" => Some(OrderStatus::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order holds an immutable snapshot of the cart it was created from:
/// the customer reference and the cart lines with their cost snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer: Customer,
    pub lines: Vec<CartLine>,
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Sum of the line cost snapshots, rounded up to two decimals.
pub fn order_total(lines: &[CartLine]) -> BigDecimal {
    let sum: BigDecimal = lines.iter().map(|line| &line.line_total).sum();
    sum.with_scale_round(2, RoundingMode::Ceiling)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn line(total: &str) -> CartLine {
        CartLine {
            product_id: 1,
            product_name: "widget".to_string(),
            quantity: 1,
            line_total: BigDecimal::from_str(total).expect("valid decimal"),
        }
    }

    #[test]
    fn total_rounds_up_to_two_decimals() {
        let total = order_total(&[line("3.333"), line("1.111")]);
        assert_eq!(total, BigDecimal::from_str("4.45").expect("valid decimal"));
    }

    #[test]
    fn total_of_exact_amounts_is_unchanged() {
        let total = order_total(&[line("9.99"), line("0.01")]);
        assert_eq!(total, BigDecimal::from_str("10.00").expect("valid decimal"));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }

    #[test]
    fn only_pending_is_mutable() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }
}
