use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::cache::{cache_key, regions, ResponseCache};
use crate::domain::account::Account;
use crate::domain::batch::BatchOutcome;
use crate::domain::cart::{Cart, CartItemRequest, CartLine, Customer};
use crate::domain::errors::DomainError;
use crate::domain::ports::{AccountStore, CartStore, OrderStore, ProductStore};

/// Availability calculation and cart mutation.
///
/// Availability reconciles the stock ledger against the two claim sources:
/// lines sitting in shopping carts and lines locked into PENDING orders.
/// Both aggregations are scans of the authoritative collections rather than
/// a maintained reservation counter, so a computed balance is always
/// consistent with the stores it was read from; staleness is bounded by the
/// availability cache.
pub struct ShoppingService<A, P, C, O> {
    accounts: A,
    products: P,
    carts: C,
    orders: O,
    cache: Arc<ResponseCache>,
}

impl<A, P, C, O> ShoppingService<A, P, C, O>
where
    A: AccountStore,
    P: ProductStore,
    C: CartStore,
    O: OrderStore,
{
    pub fn new(accounts: A, products: P, carts: C, orders: O, cache: Arc<ResponseCache>) -> Self {
        Self {
            accounts,
            products,
            carts,
            orders,
            cache,
        }
    }

    /// Quantity on hand minus every cart and pending-order claim, floored
    /// at zero. Served through the availability cache.
    pub fn available_quantity(&self, product_id: i64) -> Result<i64, DomainError> {
        self.cache
            .get_or_load(regions::AVAILABILITY, &cache_key(&product_id), || {
                let product = self
                    .products
                    .find_by_id(product_id)?
                    .ok_or_else(|| DomainError::not_found("No such product found"))?;
                let claimed = self.carts.claimed_quantity(product_id)?
                    + self.orders.pending_claimed_quantity(product_id)?;
                Ok((i64::from(product.quantity) - claimed).max(0))
            })
    }

    pub fn get_cart(&self, customer_id: i64) -> Result<Cart, DomainError> {
        self.cache
            .get_or_load(regions::CART, &cache_key(&customer_id), || {
                self.carts.find_by_customer(customer_id)?.ok_or_else(|| {
                    DomainError::not_found("You don't have a shopping cart with us")
                })
            })
    }

    /// Applies a batch of add operations. Items are validated and rejected
    /// individually; the accepted lines are appended to the customer's
    /// cart, which is created on first use.
    pub fn add_items(
        &self,
        customer_id: i64,
        items: Vec<CartItemRequest>,
    ) -> Result<BatchOutcome, DomainError> {
        log::info!(
            "add_items: customer={} requested={}",
            customer_id,
            items.len()
        );
        if items.is_empty() {
            return Err(DomainError::bad_request(
                "One or more product items are required to proceed",
            ));
        }
        let account = self.account(customer_id)?;

        let mut outcome = BatchOutcome::new();
        let mut staged: Vec<CartLine> = Vec::new();
        for item in &items {
            if item.quantity < 1 {
                outcome.failure(item.product_id, "A quantity of at least 1 is required");
                continue;
            }
            let Some(product) = self.products.find_by_id(item.product_id)? else {
                outcome.failure(item.product_id, "No such product found");
                continue;
            };
            let available = match self.available_quantity(item.product_id) {
                Ok(quantity) => quantity,
                Err(DomainError::NotFound(_)) => {
                    outcome.failure(item.product_id, "No such product found");
                    continue;
                }
                Err(other) => return Err(other),
            };
            if i64::from(item.quantity) > available {
                outcome.failure(
                    item.product_id,
                    "This product is currently out of stock at the moment. Please try again later",
                );
                continue;
            }

            let line_total = &product.price * BigDecimal::from(item.quantity);
            staged.push(CartLine {
                product_id: product.id,
                product_name: product.name,
                quantity: item.quantity,
                line_total,
            });
            outcome.success(item.product_id, "Product added to shopping cart");
        }

        if !staged.is_empty() {
            let touched: Vec<i64> = staged.iter().map(|line| line.product_id).collect();
            match self.carts.find_by_customer(customer_id)? {
                None => {
                    let customer = Customer {
                        id: account.id,
                        email: account.email,
                    };
                    self.carts.create(&customer, staged).map_err(|e| {
                        log::error!("failed to create cart for customer {customer_id}: {e}");
                        DomainError::failure("Couldn't create a shopping cart for your items")
                    })?;
                }
                Some(cart) => {
                    self.carts.append_lines(cart.id, staged).map_err(|e| {
                        log::error!("failed to update cart for customer {customer_id}: {e}");
                        DomainError::failure(
                            "Couldn't update your shopping cart with your desired items",
                        )
                    })?;
                }
            }

            self.cache.evict_key(regions::CART, &cache_key(&customer_id));
            for product_id in touched {
                self.cache
                    .evict_key(regions::AVAILABILITY, &cache_key(&product_id));
            }
        }

        Ok(outcome.finish())
    }

    /// Applies a batch of remove operations. Unlike `add_items`, the
    /// persisted update is all-or-nothing: any failed item blocks the
    /// write so the stored cart never reflects a partial removal.
    pub fn remove_items(
        &self,
        customer_id: i64,
        product_ids: Vec<i64>,
    ) -> Result<BatchOutcome, DomainError> {
        log::info!(
            "remove_items: customer={} requested={}",
            customer_id,
            product_ids.len()
        );
        if product_ids.is_empty() {
            return Err(DomainError::bad_request(
                "One or more product items are required to proceed",
            ));
        }
        self.account(customer_id)?;

        let cart = self
            .carts
            .find_by_customer(customer_id)?
            .ok_or_else(|| DomainError::not_found("You don't have a shopping cart with us"))?;
        if cart.is_empty() {
            return Err(DomainError::not_found(
                "Your cart is empty at the moment. Add one or more items to continue",
            ));
        }

        let mut product_ids = product_ids;
        product_ids.sort_unstable();
        product_ids.dedup();

        let mut outcome = BatchOutcome::new();
        let mut remaining = cart.lines.clone();
        for product_id in product_ids {
            if !remaining.iter().any(|line| line.product_id == product_id) {
                outcome.failure(product_id, "This item isn't included in your shopping cart");
                continue;
            }
            if !self.products.exists(product_id)? {
                outcome.failure(product_id, "No such product found");
                continue;
            }
            remaining.retain(|line| line.product_id != product_id);
            outcome.success(product_id, "Product removed from shopping cart");
        }

        if !outcome.has_failures() {
            self.carts.replace_lines(cart.id, remaining).map_err(|e| {
                log::error!("failed to update cart for customer {customer_id}: {e}");
                DomainError::failure("Couldn't update your shopping cart with your desired items")
            })?;

            self.cache.evict_key(regions::CART, &cache_key(&customer_id));
            for item in &outcome.successful {
                self.cache
                    .evict_key(regions::AVAILABILITY, &cache_key(&item.value));
            }
        }

        Ok(outcome.finish())
    }

    fn account(&self, customer_id: i64) -> Result<Account, DomainError> {
        self.cache
            .get_or_load(regions::USER, &cache_key(&customer_id), || {
                self.accounts
                    .find_by_id(customer_id)?
                    .ok_or_else(|| DomainError::not_found("No such account found"))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use bigdecimal::BigDecimal;

    use super::ShoppingService;
    use crate::application::memory::{account, product, Fixture, MemoryAccounts, MemoryCarts, MemoryOrders, MemoryProducts};
    use crate::domain::cart::CartItemRequest;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::ProductStore;

    type Service = ShoppingService<
        Arc<MemoryAccounts>,
        Arc<MemoryProducts>,
        Arc<MemoryCarts>,
        Arc<MemoryOrders>,
    >;

    fn service(fixture: &Fixture) -> Service {
        ShoppingService::new(
            fixture.accounts.clone(),
            fixture.products.clone(),
            fixture.carts.clone(),
            fixture.orders.clone(),
            fixture.cache.clone(),
        )
    }

    fn fixture() -> Fixture {
        Fixture::new(
            vec![account(1, "alice@example.com"), account(2, "bob@example.com")],
            vec![
                product(10, "keyboard", "25.00", 10),
                product(11, "mouse", "9.99", 3),
            ],
        )
    }

    fn item(product_id: i64, quantity: i32) -> CartItemRequest {
        CartItemRequest {
            product_id,
            quantity,
        }
    }

    #[test]
    fn availability_of_unknown_product_is_not_found() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let err = shopping.available_quantity(999).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn availability_with_no_claims_is_quantity_on_hand() {
        let fixture = fixture();
        let shopping = service(&fixture);

        assert_eq!(shopping.available_quantity(10).expect("available"), 10);
    }

    #[test]
    fn availability_subtracts_cart_claims() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let outcome = shopping.add_items(1, vec![item(10, 4)]).expect("add");
        assert_eq!(outcome.success_rate, 100.0);
        assert_eq!(shopping.available_quantity(10).expect("available"), 6);
    }

    #[test]
    fn empty_add_batch_is_rejected_whole() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let err = shopping.add_items(1, vec![]).unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
    }

    #[test]
    fn unknown_customer_is_not_found() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let err = shopping.add_items(42, vec![item(10, 1)]).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn unknown_product_fails_only_that_item() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let outcome = shopping
            .add_items(1, vec![item(10, 2), item(999, 1)])
            .expect("add");
        assert_eq!(outcome.successful.len(), 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].value, 999);
        assert!((outcome.success_rate - 50.0).abs() < f32::EPSILON);

        let lines = fixture.carts.cart_lines(1).expect("cart exists");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, 10);
    }

    #[test]
    fn oversized_add_fails_with_stock_message_and_leaves_no_cart() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let outcome = shopping.add_items(1, vec![item(11, 4)]).expect("add");
        assert_eq!(outcome.success_rate, 0.0);
        assert!(outcome.failed[0].message.contains("out of stock"));
        assert!(fixture.carts.cart_lines(1).is_none(), "no cart was created");
    }

    #[test]
    fn non_positive_quantity_fails_that_item() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let outcome = shopping.add_items(1, vec![item(10, 0)]).expect("add");
        assert_eq!(outcome.success_rate, 0.0);
        assert!(fixture.carts.cart_lines(1).is_none());
    }

    #[test]
    fn line_total_snapshots_current_price() {
        let fixture = fixture();
        let shopping = service(&fixture);

        shopping.add_items(1, vec![item(11, 3)]).expect("add");
        let lines = fixture.carts.cart_lines(1).expect("cart exists");
        assert_eq!(
            lines[0].line_total,
            BigDecimal::from_str("29.97").expect("valid decimal")
        );
    }

    #[test]
    fn repeated_adds_create_separate_lines() {
        let fixture = fixture();
        let shopping = service(&fixture);

        shopping.add_items(1, vec![item(10, 2)]).expect("add");
        shopping.add_items(1, vec![item(10, 3)]).expect("add");

        let lines = fixture.carts.cart_lines(1).expect("cart exists");
        assert_eq!(lines.len(), 2, "no merge by product id");
        assert_eq!(fixture.carts.cart_count(), 1, "still a single cart");
        assert_eq!(shopping.available_quantity(10).expect("available"), 5);
    }

    #[test]
    fn carts_of_different_customers_both_claim_stock() {
        let fixture = fixture();
        let shopping = service(&fixture);

        shopping.add_items(1, vec![item(10, 4)]).expect("add");
        shopping.add_items(2, vec![item(10, 5)]).expect("add");

        assert_eq!(fixture.carts.cart_count(), 2);
        assert_eq!(shopping.available_quantity(10).expect("available"), 1);
    }

    #[test]
    fn sequential_claims_exhaust_availability() {
        // Two customers each want 6 of 10 on hand; the second is evaluated
        // against the remaining 4 and rejected.
        let fixture = fixture();
        let shopping = service(&fixture);

        let first = shopping.add_items(1, vec![item(10, 6)]).expect("add");
        assert_eq!(first.success_rate, 100.0);

        let second = shopping.add_items(2, vec![item(10, 6)]).expect("add");
        assert_eq!(second.success_rate, 0.0);
        assert!(second.failed[0].message.contains("out of stock"));
        assert!(fixture.carts.cart_lines(2).is_none());
    }

    #[test]
    fn add_evicts_stale_availability() {
        let fixture = fixture();
        let shopping = service(&fixture);

        // Prime the availability cache, then mutate the claims.
        assert_eq!(shopping.available_quantity(10).expect("available"), 10);
        shopping.add_items(1, vec![item(10, 4)]).expect("add");
        assert_eq!(
            shopping.available_quantity(10).expect("available"),
            6,
            "cached value was evicted by the mutation"
        );
    }

    #[test]
    fn get_cart_of_cartless_customer_is_not_found() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let err = shopping.get_cart(1).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn get_cart_reflects_mutations_through_the_cache() {
        let fixture = fixture();
        let shopping = service(&fixture);

        shopping.add_items(1, vec![item(10, 2)]).expect("add");
        assert_eq!(shopping.get_cart(1).expect("cart").lines.len(), 1);

        shopping.add_items(1, vec![item(11, 1)]).expect("add");
        assert_eq!(
            shopping.get_cart(1).expect("cart").lines.len(),
            2,
            "cart cache entry was evicted by the second add"
        );
    }

    #[test]
    fn empty_remove_batch_is_rejected_whole() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let err = shopping.remove_items(1, vec![]).unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
    }

    #[test]
    fn remove_without_cart_is_not_found() {
        let fixture = fixture();
        let shopping = service(&fixture);

        let err = shopping.remove_items(1, vec![10]).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn remove_with_unknown_item_persists_nothing() {
        let fixture = fixture();
        let shopping = service(&fixture);

        shopping.add_items(1, vec![item(10, 2), item(11, 1)]).expect("add");
        let before = fixture.carts.cart_lines(1).expect("cart exists");

        let outcome = shopping.remove_items(1, vec![10, 999]).expect("remove");
        assert_eq!(outcome.successful.len(), 1);
        assert_eq!(outcome.failed.len(), 1);
        assert!((outcome.success_rate - 50.0).abs() < f32::EPSILON);

        let after = fixture.carts.cart_lines(1).expect("cart exists");
        assert_eq!(before, after, "partial failure blocks the whole update");
    }

    #[test]
    fn remove_of_vanished_product_blocks_the_update() {
        let fixture = fixture();
        let shopping = service(&fixture);

        shopping.add_items(1, vec![item(10, 2), item(11, 1)]).expect("add");
        fixture.products.delete(11).expect("delete");

        let outcome = shopping.remove_items(1, vec![10, 11]).expect("remove");
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].value, 11);

        let lines = fixture.carts.cart_lines(1).expect("cart exists");
        assert_eq!(lines.len(), 2, "nothing was removed");
    }

    #[test]
    fn full_remove_success_persists_and_releases_claims() {
        let fixture = fixture();
        let shopping = service(&fixture);

        shopping.add_items(1, vec![item(10, 4), item(11, 1)]).expect("add");
        assert_eq!(shopping.available_quantity(10).expect("available"), 6);

        let outcome = shopping.remove_items(1, vec![10]).expect("remove");
        assert_eq!(outcome.success_rate, 100.0);

        let lines = fixture.carts.cart_lines(1).expect("cart exists");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, 11);
        assert_eq!(
            shopping.available_quantity(10).expect("available"),
            10,
            "claim released and availability cache evicted"
        );
    }

    #[test]
    fn remove_drops_every_line_of_the_product() {
        let fixture = fixture();
        let shopping = service(&fixture);

        shopping.add_items(1, vec![item(10, 2)]).expect("add");
        shopping.add_items(1, vec![item(10, 3)]).expect("add");

        let outcome = shopping.remove_items(1, vec![10]).expect("remove");
        assert_eq!(outcome.success_rate, 100.0);
        assert!(fixture.carts.cart_lines(1).expect("cart exists").is_empty());
    }
}
