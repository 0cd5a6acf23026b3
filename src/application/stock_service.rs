use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::cache::{cache_key, regions, ResponseCache};
use crate::domain::errors::DomainError;
use crate::domain::page::{PageRequest, Paged};
use crate::domain::ports::ProductStore;
use crate::domain::product::{NewProduct, Product, ProductInfo};

/// Stock ledger operations: product reads plus the explicit info, price
/// and quantity updates. Quantity on hand is only ever decremented by
/// order completion; this service sets it outright.
pub struct StockService<P> {
    products: P,
    cache: Arc<ResponseCache>,
}

impl<P: ProductStore> StockService<P> {
    pub fn new(products: P, cache: Arc<ResponseCache>) -> Self {
        Self { products, cache }
    }

    pub fn by_id(&self, product_id: i64) -> Result<Product, DomainError> {
        self.cache
            .get_or_load(regions::PRODUCT, &cache_key(&product_id), || {
                self.products
                    .find_by_id(product_id)?
                    .ok_or_else(|| DomainError::not_found("No such product found"))
            })
    }

    pub fn list(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Paged<Product>, DomainError> {
        let search = match search.map(str::trim) {
            None | Some("") => None,
            Some(param) => Some(param.to_string()),
        };
        let key = cache_key(&(page.page, page.limit, search.clone()));
        self.cache.get_or_load(regions::PRODUCTS, &key, || {
            self.products.list(page, search.as_deref())
        })
    }

    pub fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        log::info!("create product: name={}", product.name);
        if product.price < BigDecimal::from(0) {
            return Err(DomainError::bad_request("Invalid price"));
        }
        if product.quantity < 0 {
            return Err(DomainError::bad_request("Invalid quantity"));
        }

        let created = self.products.insert(product).map_err(|e| {
            log::error!("failed to save stock item: {e}");
            DomainError::failure("The stock item couldn't be saved")
        })?;

        self.cache.evict_region(regions::PRODUCTS);
        Ok(created)
    }

    pub fn update_info(&self, product_id: i64, info: ProductInfo) -> Result<Product, DomainError> {
        self.ensure_exists(product_id)?;
        let updated = self
            .products
            .update_info(product_id, info)?
            .ok_or_else(|| DomainError::failure("The stock item couldn't be updated"))?;
        self.evict_product(product_id, false);
        Ok(updated)
    }

    pub fn update_quantity(&self, product_id: i64, quantity: i32) -> Result<Product, DomainError> {
        if quantity < 0 {
            return Err(DomainError::bad_request("Invalid quantity"));
        }
        self.ensure_exists(product_id)?;
        let updated = self
            .products
            .update_quantity(product_id, quantity)?
            .ok_or_else(|| {
                DomainError::failure("The stock item quantity couldn't be updated")
            })?;
        // Quantity on hand feeds the availability computation.
        self.evict_product(product_id, true);
        Ok(updated)
    }

    pub fn update_price(&self, product_id: i64, price: BigDecimal) -> Result<Product, DomainError> {
        if price < BigDecimal::from(0) {
            return Err(DomainError::bad_request("Invalid price"));
        }
        self.ensure_exists(product_id)?;
        let updated = self
            .products
            .update_price(product_id, price)?
            .ok_or_else(|| DomainError::failure("The stock item price couldn't be updated"))?;
        self.evict_product(product_id, false);
        Ok(updated)
    }

    /// Deletes a stock item and returns it. Carts and pending orders that
    /// still reference the product are left alone; their lines are treated
    /// as claims on nothing and skipped at completion time.
    pub fn delete(&self, product_id: i64) -> Result<Product, DomainError> {
        let product = self
            .products
            .find_by_id(product_id)?
            .ok_or_else(|| DomainError::not_found("No such product found"))?;
        if !self.products.delete(product_id)? {
            return Err(DomainError::failure("The stock item couldn't be deleted"));
        }
        self.evict_product(product_id, true);
        Ok(product)
    }

    fn ensure_exists(&self, product_id: i64) -> Result<(), DomainError> {
        if !self.products.exists(product_id)? {
            return Err(DomainError::not_found("No such product found"));
        }
        Ok(())
    }

    fn evict_product(&self, product_id: i64, quantity_changed: bool) {
        self.cache
            .evict_key(regions::PRODUCT, &cache_key(&product_id));
        self.cache.evict_region(regions::PRODUCTS);
        if quantity_changed {
            self.cache
                .evict_key(regions::AVAILABILITY, &cache_key(&product_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use bigdecimal::BigDecimal;

    use super::StockService;
    use crate::application::memory::{product, Fixture, MemoryProducts};
    use crate::domain::errors::DomainError;
    use crate::domain::page::PageRequest;
    use crate::domain::product::NewProduct;

    fn service(fixture: &Fixture) -> StockService<Arc<MemoryProducts>> {
        StockService::new(fixture.products.clone(), fixture.cache.clone())
    }

    fn fixture() -> Fixture {
        Fixture::new(
            vec![],
            vec![
                product(10, "keyboard", "25.00", 10),
                product(11, "mouse", "9.99", 3),
            ],
        )
    }

    #[test]
    fn unknown_product_is_not_found() {
        let stock = service(&fixture());
        assert!(matches!(
            stock.by_id(999).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let stock = service(&fixture());
        assert!(matches!(
            stock.update_quantity(10, -1).unwrap_err(),
            DomainError::BadRequest(_)
        ));
    }

    #[test]
    fn negative_price_is_rejected() {
        let stock = service(&fixture());
        let price = BigDecimal::from_str("-0.01").expect("valid decimal");
        assert!(matches!(
            stock.update_price(10, price).unwrap_err(),
            DomainError::BadRequest(_)
        ));
    }

    #[test]
    fn quantity_update_is_visible_through_the_cache() {
        let fixture = fixture();
        let stock = service(&fixture);

        assert_eq!(stock.by_id(10).expect("product").quantity, 10);
        stock.update_quantity(10, 7).expect("update");
        assert_eq!(
            stock.by_id(10).expect("product").quantity,
            7,
            "product cache entry was evicted"
        );
    }

    #[test]
    fn listing_pages_are_cached_until_a_write() {
        let fixture = fixture();
        let stock = service(&fixture);

        let page = PageRequest::default();
        assert_eq!(stock.list(page, None).expect("list").data.len(), 2);

        stock
            .create(NewProduct {
                name: "monitor".to_string(),
                description: "a monitor".to_string(),
                price: BigDecimal::from_str("199.90").expect("valid decimal"),
                quantity: 5,
                category: "general".to_string(),
                image_url: None,
            })
            .expect("create");

        assert_eq!(
            stock.list(page, None).expect("list").data.len(),
            3,
            "listing region was evicted by the write"
        );
    }

    #[test]
    fn listing_filters_by_search_param() {
        let fixture = fixture();
        let stock = service(&fixture);

        let page = PageRequest::default();
        let hits = stock.list(page, Some("mouse")).expect("list");
        assert_eq!(hits.data.len(), 1);
        assert_eq!(hits.data[0].id, 11);
    }

    #[test]
    fn delete_returns_the_removed_item() {
        let fixture = fixture();
        let stock = service(&fixture);

        let removed = stock.delete(11).expect("delete");
        assert_eq!(removed.id, 11);
        assert!(matches!(
            stock.by_id(11).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }
}
