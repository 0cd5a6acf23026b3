use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer snapshot stored on a cart (and carried onto the order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub email: String,
}

/// A single cart line. Name and total cost are snapshots taken at the time
/// the item was added; repeated adds of the same product create separate
/// lines rather than merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub customer: Customer,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One requested line of an `add_items` batch.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemRequest {
    pub product_id: i64,
    pub quantity: i32,
}
