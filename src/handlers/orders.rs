use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};
use crate::domain::page::PageRequest;
use crate::errors::AppError;

use super::shopping::CartLineResponse;
use super::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: i64,
    pub customer_email: String,
    /// Decimal total as a string, e.g. "59.99"
    pub total_amount: String,
    pub status: String,
    pub created_at: String,
    pub lines: Vec<CartLineResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id,
            customer_id: order.customer.id,
            customer_email: order.customer.email,
            total_amount: order.total_amount.to_string(),
            status: order.status.as_str().to_string(),
            created_at: order.created_at.to_rfc3339(),
            lines: order
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

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Optional search param matched against customer email, status and
    /// line product names.
    pub param: Option<String>,
    /// Restricts the listing to one customer.
    pub customer_id: Option<i64>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub total_pages: i64,
    pub items: Vec<OrderResponse>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders/customers/{customer_id}
///
/// Drains the customer's cart into a new PENDING order and deletes the
/// cart.
#[utoipa::path(
    post,
    path = "/orders/customers/{customer_id}",
    params(("customer_id" = i64, Path, description = "Customer id")),
    responses(
        (status = 201, description = "Order created from the cart", body = OrderResponse),
        (status = 404, description = "No cart, or the cart is empty"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let orders = state.orders.clone();

    let order = web::block(move || orders.create_order(customer_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let orders = state.orders.clone();

    let order = web::block(move || orders.by_id(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Paginated listing, globally or per customer, optionally filtered.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("param" = Option<String>, Query, description = "Search param"),
        ("customer_id" = Option<i64>, Query, description = "Restrict to one customer"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Invalid search param"),
        (status = 404, description = "No orders found"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = PageRequest::new(params.page, params.limit);
    let orders = state.orders.clone();

    let paged = web::block(move || {
        orders.list(params.customer_id, params.param.as_deref(), page)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        total_pages: paged.total_pages,
        items: paged.data.into_iter().map(OrderResponse::from).collect(),
    }))
}

/// PATCH /orders/{id}/complete
///
/// Completes a PENDING order, decrementing stock for every line.
#[utoipa::path(
    patch,
    path = "/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order completed", body = OrderResponse),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn complete_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    transition(state, path.into_inner(), OrderStatus::Completed).await
}

/// PATCH /orders/{id}/cancel
///
/// Cancels a PENDING order; stock is never touched.
#[utoipa::path(
    patch,
    path = "/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order canceled", body = OrderResponse),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    transition(state, path.into_inner(), OrderStatus::Canceled).await
}

async fn transition(
    state: web::Data<AppState>,
    order_id: Uuid,
    target: OrderStatus,
) -> Result<HttpResponse, AppError> {
    let orders = state.orders.clone();

    let order = web::block(move || orders.transition(order_id, target))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
