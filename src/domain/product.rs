use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// A stock item. `quantity` is the quantity on hand, before any cart or
/// pending-order claims are subtracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub category: String,
    pub image_url: Option<String>,
}

/// Input for registering a new stock item; the id is issued by the store.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub category: String,
    pub image_url: Option<String>,
}

/// Descriptive fields of a product, updated together.
#[derive(Debug, Clone)]
pub struct ProductInfo {
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
}
