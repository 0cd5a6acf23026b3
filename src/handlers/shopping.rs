use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::batch::BatchOutcome;
use crate::domain::cart::{Cart, CartItemRequest};
use crate::errors::AppError;

use super::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemsRequest {
    pub items: Vec<CartItemDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemDto {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveCartItemsRequest {
    pub product_ids: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub product_id: i64,
    pub available_quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    /// Decimal cost snapshot as a string, e.g. "19.98"
    pub line_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: uuid::Uuid,
    pub customer_id: i64,
    pub customer_email: String,
    pub lines: Vec<CartLineResponse>,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        CartResponse {
            id: cart.id,
            customer_id: cart.customer.id,
            customer_email: cart.customer.email,
            lines: cart
                .lines
                .into_iter()
                .map(|line| CartLineResponse {
                    product_id: line.product_id,
                    product_name: line.product_name,
                    quantity: line.quantity,
                    line_total: line.line_total.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchItemResponse {
    pub value: i64,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchOutcomeResponse {
    pub success_rate: f32,
    pub successful: Vec<BatchItemResponse>,
    pub failed: Vec<BatchItemResponse>,
}

impl From<BatchOutcome> for BatchOutcomeResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let map = |items: Vec<crate::domain::batch::BatchItem>| {
            items
                .into_iter()
                .map(|item| BatchItemResponse {
                    value: item.value,
                    message: item.message,
                })
                .collect()
        };
        BatchOutcomeResponse {
            success_rate: outcome.success_rate,
            successful: map(outcome.successful),
            failed: map(outcome.failed),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /shopping/products/{product_id}/availability
///
/// Quantity on hand reconciled against cart and pending-order claims.
#[utoipa::path(
    get,
    path = "/shopping/products/{product_id}/availability",
    params(("product_id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Available balance of the item", body = AvailabilityResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "shopping"
)]
pub async fn availability(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let shopping = state.shopping.clone();

    let available = web::block(move || shopping.available_quantity(product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(AvailabilityResponse {
        product_id,
        available_quantity: available,
    }))
}

/// GET /shopping/customers/{customer_id}/cart
#[utoipa::path(
    get,
    path = "/shopping/customers/{customer_id}/cart",
    params(("customer_id" = i64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "The customer's cart", body = CartResponse),
        (status = 404, description = "Customer has no cart"),
    ),
    tag = "shopping"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let shopping = state.shopping.clone();

    let cart = web::block(move || shopping.get_cart(customer_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// POST /shopping/customers/{customer_id}/cart/items
///
/// Batched add; items are accepted or rejected individually and the
/// response carries the per-item outcomes.
#[utoipa::path(
    post,
    path = "/shopping/customers/{customer_id}/cart/items",
    params(("customer_id" = i64, Path, description = "Customer id")),
    request_body = AddCartItemsRequest,
    responses(
        (status = 200, description = "Per-item outcomes", body = BatchOutcomeResponse),
        (status = 400, description = "Empty batch"),
        (status = 404, description = "Unknown customer"),
    ),
    tag = "shopping"
)]
pub async fn add_cart_items(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<AddCartItemsRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let items: Vec<CartItemRequest> = body
        .into_inner()
        .items
        .into_iter()
        .map(|item| CartItemRequest {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();
    let shopping = state.shopping.clone();

    let outcome = web::block(move || shopping.add_items(customer_id, items))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(BatchOutcomeResponse::from(outcome)))
}

/// DELETE /shopping/customers/{customer_id}/cart/items
///
/// Batched remove; the cart update is persisted only when every requested
/// item was removed.
#[utoipa::path(
    delete,
    path = "/shopping/customers/{customer_id}/cart/items",
    params(("customer_id" = i64, Path, description = "Customer id")),
    request_body = RemoveCartItemsRequest,
    responses(
        (status = 200, description = "Per-item outcomes", body = BatchOutcomeResponse),
        (status = 400, description = "Empty batch"),
        (status = 404, description = "No cart, or the cart is empty"),
    ),
    tag = "shopping"
)]
pub async fn remove_cart_items(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<RemoveCartItemsRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let product_ids = body.into_inner().product_ids;
    let shopping = state.shopping.clone();

    let outcome = web::block(move || shopping.remove_items(customer_id, product_ids))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(BatchOutcomeResponse::from(outcome)))
}
