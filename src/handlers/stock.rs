use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::page::PageRequest;
use crate::domain::product::{NewProduct, Product, ProductInfo};
use crate::errors::AppError;

use super::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub quantity: i32,
    pub category: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductInfoRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePriceRequest {
    /// Decimal price as a string, e.g. "9.99"
    pub price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListProductsParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub param: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub quantity: i32,
    pub category: String,
    pub image_url: Option<String>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price.to_string(),
            quantity: product.quantity,
            category: product.category,
            image_url: product.image_url,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListProductsResponse {
    pub total_pages: i64,
    pub items: Vec<ProductResponse>,
}

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("Invalid price '{raw}'")))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /stock/{id}
#[utoipa::path(
    get,
    path = "/stock/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Stock item found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "stock"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let stock = state.stock.clone();

    let product = web::block(move || stock.by_id(product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// GET /stock
#[utoipa::path(
    get,
    path = "/stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("param" = Option<String>, Query, description = "Search param"),
    ),
    responses(
        (status = 200, description = "Paginated list of products", body = ListProductsResponse),
    ),
    tag = "stock"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = PageRequest::new(params.page, params.limit);
    let stock = state.stock.clone();

    let paged = web::block(move || stock.list(page, params.param.as_deref()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        total_pages: paged.total_pages,
        items: paged.data.into_iter().map(ProductResponse::from).collect(),
    }))
}

/// POST /stock
#[utoipa::path(
    post,
    path = "/stock",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Stock item saved", body = ProductResponse),
        (status = 400, description = "Invalid price or quantity"),
    ),
    tag = "stock"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let price = parse_price(&body.price)?;
    let stock = state.stock.clone();

    let product = web::block(move || {
        stock.create(NewProduct {
            name: body.name,
            description: body.description,
            price,
            quantity: body.quantity,
            category: body.category,
            image_url: body.image_url,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// PATCH /stock/{id}
#[utoipa::path(
    patch,
    path = "/stock/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = UpdateProductInfoRequest,
    responses(
        (status = 200, description = "Stock item updated", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "stock"
)]
pub async fn update_product_info(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateProductInfoRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let body = body.into_inner();
    let stock = state.stock.clone();

    let product = web::block(move || {
        stock.update_info(
            product_id,
            ProductInfo {
                name: body.name,
                description: body.description,
                category: body.category,
                image_url: body.image_url,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// PATCH /stock/{id}/quantity
#[utoipa::path(
    patch,
    path = "/stock/{id}/quantity",
    params(("id" = i64, Path, description = "Product id")),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ProductResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product not found"),
    ),
    tag = "stock"
)]
pub async fn update_quantity(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    let stock = state.stock.clone();

    let product = web::block(move || stock.update_quantity(product_id, quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// PATCH /stock/{id}/price
#[utoipa::path(
    patch,
    path = "/stock/{id}/price",
    params(("id" = i64, Path, description = "Product id")),
    request_body = UpdatePriceRequest,
    responses(
        (status = 200, description = "Price updated", body = ProductResponse),
        (status = 400, description = "Invalid price"),
        (status = 404, description = "Product not found"),
    ),
    tag = "stock"
)]
pub async fn update_price(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdatePriceRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let price = parse_price(&body.into_inner().price)?;
    let stock = state.stock.clone();

    let product = web::block(move || stock.update_price(product_id, price))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /stock/{id}
#[utoipa::path(
    delete,
    path = "/stock/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deleted stock item", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "stock"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let stock = state.stock.clone();

    let product = web::block(move || stock.delete(product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
