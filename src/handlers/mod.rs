pub mod orders;
pub mod shopping;
pub mod stock;

use std::sync::Arc;

use crate::application::orders_service::OrdersService;
use crate::application::shopping_service::ShoppingService;
use crate::application::stock_service::StockService;
use crate::infrastructure::account_repo::DieselAccountStore;
use crate::infrastructure::cart_repo::DieselCartStore;
use crate::infrastructure::order_repo::DieselOrderStore;
use crate::infrastructure::product_repo::DieselProductStore;

pub type AppShoppingService =
    ShoppingService<DieselAccountStore, DieselProductStore, DieselCartStore, DieselOrderStore>;
pub type AppOrdersService =
    OrdersService<DieselAccountStore, DieselProductStore, DieselCartStore, DieselOrderStore>;
pub type AppStockService = StockService<DieselProductStore>;

/// Shared handler state: the three services over the Diesel-backed stores,
/// all wired to one response cache.
pub struct AppState {
    pub shopping: Arc<AppShoppingService>,
    pub orders: Arc<AppOrdersService>,
    pub stock: Arc<AppStockService>,
}

impl AppState {
    pub fn new(pool: crate::db::DbPool, cache: Arc<crate::cache::ResponseCache>) -> Self {
        let shopping = ShoppingService::new(
            DieselAccountStore::new(pool.clone()),
            DieselProductStore::new(pool.clone()),
            DieselCartStore::new(pool.clone()),
            DieselOrderStore::new(pool.clone()),
            cache.clone(),
        );
        let orders = OrdersService::new(
            DieselAccountStore::new(pool.clone()),
            DieselProductStore::new(pool.clone()),
            DieselCartStore::new(pool.clone()),
            DieselOrderStore::new(pool.clone()),
            cache.clone(),
        );
        let stock = StockService::new(DieselProductStore::new(pool), cache);

        Self {
            shopping: Arc::new(shopping),
            orders: Arc::new(orders),
            stock: Arc::new(stock),
        }
    }
}
