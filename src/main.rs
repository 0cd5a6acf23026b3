use std::env;
use std::time::Duration;

use commerce_service::cache::CacheSettings;
use commerce_service::{build_server, create_pool, run_migrations};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("PORT must be a valid number");

    let cache_ttl: u64 = env::var("CACHE_TTL_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .expect("CACHE_TTL_SECS must be a valid number");
    let cache_capacity: usize = env::var("CACHE_CAPACITY")
        .unwrap_or_else(|_| "1024".to_string())
        .parse()
        .expect("CACHE_CAPACITY must be a valid number");

    let pool = create_pool(&database_url);
    run_migrations(&pool);

    log::info!("Starting server at http://{}:{}", host, port);

    build_server(
        pool,
        CacheSettings {
            ttl: Duration::from_secs(cache_ttl),
            capacity_per_region: cache_capacity,
        },
        &host,
        port,
    )?
    .await
}
