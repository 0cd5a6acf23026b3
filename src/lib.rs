pub mod application;
pub mod cache;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cache::{CacheSettings, ResponseCache};
use handlers::AppState;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::shopping::availability,
        handlers::shopping::get_cart,
        handlers::shopping::add_cart_items,
        handlers::shopping::remove_cart_items,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::orders::complete_order,
        handlers::orders::cancel_order,
        handlers::stock::get_product,
        handlers::stock::list_products,
        handlers::stock::create_product,
        handlers::stock::update_product_info,
        handlers::stock::update_quantity,
        handlers::stock::update_price,
        handlers::stock::delete_product,
    ),
    components(schemas(
        handlers::shopping::AddCartItemsRequest,
        handlers::shopping::CartItemDto,
        handlers::shopping::RemoveCartItemsRequest,
        handlers::shopping::AvailabilityResponse,
        handlers::shopping::CartLineResponse,
        handlers::shopping::CartResponse,
        handlers::shopping::BatchItemResponse,
        handlers::shopping::BatchOutcomeResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
        handlers::stock::CreateProductRequest,
        handlers::stock::UpdateProductInfoRequest,
        handlers::stock::UpdateQuantityRequest,
        handlers::stock::UpdatePriceRequest,
        handlers::stock::ProductResponse,
        handlers::stock::ListProductsResponse,
    )),
    tags(
        (name = "shopping", description = "Availability and cart operations"),
        (name = "orders", description = "Order lifecycle"),
        (name = "stock", description = "Stock ledger"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or spawning) the returned
/// server.
pub fn build_server(
    pool: DbPool,
    cache: CacheSettings,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(AppState::new(pool, Arc::new(ResponseCache::new(cache))));

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/stock")
                    .route("", web::get().to(handlers::stock::list_products))
                    .route("", web::post().to(handlers::stock::create_product))
                    .route("/{id}", web::get().to(handlers::stock::get_product))
                    .route("/{id}", web::patch().to(handlers::stock::update_product_info))
                    .route("/{id}", web::delete().to(handlers::stock::delete_product))
                    .route(
                        "/{id}/quantity",
                        web::patch().to(handlers::stock::update_quantity),
                    )
                    .route("/{id}/price", web::patch().to(handlers::stock::update_price)),
            )
            .service(
                web::scope("/shopping")
                    .route(
                        "/products/{product_id}/availability",
                        web::get().to(handlers::shopping::availability),
                    )
                    .route(
                        "/customers/{customer_id}/cart",
                        web::get().to(handlers::shopping::get_cart),
                    )
                    .route(
                        "/customers/{customer_id}/cart/items",
                        web::post().to(handlers::shopping::add_cart_items),
                    )
                    .route(
                        "/customers/{customer_id}/cart/items",
                        web::delete().to(handlers::shopping::remove_cart_items),
                    ),
            )
            .service(
                web::scope("/orders")
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route(
                        "/customers/{customer_id}",
                        web::post().to(handlers::orders::create_order),
                    )
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route(
                        "/{id}/complete",
                        web::patch().to(handlers::orders::complete_order),
                    )
                    .route(
                        "/{id}/cancel",
                        web::patch().to(handlers::orders::cancel_order),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
