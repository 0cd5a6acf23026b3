use std::sync::Arc;

use uuid::Uuid;

use crate::cache::{cache_key, regions, ResponseCache};
use crate::domain::account::Account;
use crate::domain::errors::DomainError;
use crate::domain::order::{order_total, Order, OrderStatus};
use crate::domain::page::{PageRequest, Paged};
use crate::domain::ports::{AccountStore, CartStore, OrderStore, ProductStore};

const READ_ONLY_STATUS: &str =
    "Sorry, only pending orders can be handled. Your target order has a read only status.";

/// Order lifecycle: creation from a cart, the single legal transition out
/// of PENDING, and the order listings.
pub struct OrdersService<A, P, C, O> {
    accounts: A,
    products: P,
    carts: C,
    orders: O,
    cache: Arc<ResponseCache>,
}

impl<A, P, C, O> OrdersService<A, P, C, O>
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

    /// Drains the customer's cart into a new PENDING order. The cart is
    /// deleted only after the order save is confirmed, so a failed save
    /// can never lose the cart; a failed delete leaves a doubled claim,
    /// which under-reports availability instead of overselling.
    pub fn create_order(&self, customer_id: i64) -> Result<Order, DomainError> {
        log::info!("create_order: customer={customer_id}");
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

        let total = order_total(&cart.lines);
        let order = self.orders.create_from_cart(&cart, total).map_err(|e| {
            log::error!("failed to create order for customer {customer_id}: {e}");
            DomainError::failure("We couldn't create an order from your shopping cart at this time")
        })?;

        if let Err(e) = self.carts.delete(cart.id) {
            log::error!(
                "order {} created but cart {} could not be deleted: {e}",
                order.id,
                cart.id
            );
        }

        self.cache.evict_region(regions::ORDERS);
        self.cache.evict_region(regions::CUSTOMER_ORDERS);
        self.cache.evict_key(regions::CART, &cache_key(&customer_id));

        Ok(order)
    }

    pub fn by_id(&self, order_id: Uuid) -> Result<Order, DomainError> {
        self.orders
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found("You are yet to make an order with us"))
    }

    /// Moves a PENDING order to COMPLETED or CANCELED. Completion
    /// decrements stock for every snapshot line; cancellation releases the
    /// claim simply by leaving the PENDING state. The status flip is an
    /// optimistic check-and-set, and only the winning transition performs
    /// the decrements.
    pub fn transition(&self, order_id: Uuid, target: OrderStatus) -> Result<Order, DomainError> {
        log::info!("transition: order={order_id} target={target}");
        if !target.is_terminal() {
            return Err(DomainError::bad_request(
                "An order can only be completed or canceled",
            ));
        }

        let order = self.by_id(order_id)?;
        if order.status != OrderStatus::Pending {
            return Err(DomainError::bad_request(READ_ONLY_STATUS));
        }

        let Some(updated) = self.orders.transition_from_pending(order_id, target)? else {
            // Beaten by a concurrent transition between the read and the
            // write; the order is read-only now.
            return Err(DomainError::bad_request(READ_ONLY_STATUS));
        };

        if target == OrderStatus::Completed {
            for line in &updated.lines {
                match self
                    .products
                    .decrement_quantity(line.product_id, line.quantity)
                {
                    Ok(Some(_)) => {}
                    Ok(None) => log::warn!(
                        "product {} vanished before completion of order {order_id}; line skipped",
                        line.product_id
                    ),
                    Err(e) => {
                        log::error!(
                            "failed to decrement product {} for order {order_id}: {e}",
                            line.product_id
                        );
                        return Err(DomainError::failure("We are unable to process this order"));
                    }
                }
            }
        }

        self.cache.evict_region(regions::ORDERS);
        self.cache.evict_region(regions::CUSTOMER_ORDERS);
        if target == OrderStatus::Completed {
            self.cache.evict_region(regions::PRODUCTS);
            for line in &updated.lines {
                self.cache
                    .evict_key(regions::PRODUCT, &cache_key(&line.product_id));
                self.cache
                    .evict_key(regions::AVAILABILITY, &cache_key(&line.product_id));
            }
        }

        Ok(updated)
    }

    /// Paged order listing, globally or for one customer, optionally
    /// filtered by a search param. Served through the order listing
    /// caches.
    pub fn list(
        &self,
        customer_id: Option<i64>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paged<Order>, DomainError> {
        let search = match search.map(str::trim) {
            None | Some("") => None,
            Some(param) => {
                if param
                    .chars()
                    .any(|c| c != ' ' && !c.is_ascii_alphanumeric())
                {
                    return Err(DomainError::bad_request("Invalid search param"));
                }
                Some(param.to_string())
            }
        };

        let (region, key) = match customer_id {
            Some(id) => (
                regions::CUSTOMER_ORDERS,
                cache_key(&(id, page.page, page.limit, search.clone())),
            ),
            None => (
                regions::ORDERS,
                cache_key(&(page.page, page.limit, search.clone())),
            ),
        };

        self.cache.get_or_load(region, &key, || {
            let paged = self.orders.list(customer_id, search.as_deref(), page)?;
            if paged.total_pages == 0 {
                return Err(DomainError::not_found("No orders found"));
            }
            Ok(paged)
        })
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
    use uuid::Uuid;

    use super::OrdersService;
    use crate::application::memory::{account, product, Fixture, MemoryAccounts, MemoryCarts, MemoryOrders, MemoryProducts};
    use crate::application::shopping_service::ShoppingService;
    use crate::domain::cart::CartItemRequest;
    use crate::domain::errors::DomainError;
    use crate::domain::order::OrderStatus;
    use crate::domain::page::PageRequest;
    use crate::domain::ports::ProductStore;

    type Orders = OrdersService<
        Arc<MemoryAccounts>,
        Arc<MemoryProducts>,
        Arc<MemoryCarts>,
        Arc<MemoryOrders>,
    >;
    type Shopping = ShoppingService<
        Arc<MemoryAccounts>,
        Arc<MemoryProducts>,
        Arc<MemoryCarts>,
        Arc<MemoryOrders>,
    >;

    fn services(fixture: &Fixture) -> (Shopping, Orders) {
        let shopping = ShoppingService::new(
            fixture.accounts.clone(),
            fixture.products.clone(),
            fixture.carts.clone(),
            fixture.orders.clone(),
            fixture.cache.clone(),
        );
        let orders = OrdersService::new(
            fixture.accounts.clone(),
            fixture.products.clone(),
            fixture.carts.clone(),
            fixture.orders.clone(),
            fixture.cache.clone(),
        );
        (shopping, orders)
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
    fn create_order_without_cart_is_not_found() {
        let fixture = fixture();
        let (_, orders) = services(&fixture);

        let err = orders.create_order(1).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn create_order_snapshots_cart_and_deletes_it() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping
            .add_items(1, vec![item(10, 2), item(11, 1)])
            .expect("add");
        let order = orders.create_order(1).expect("order");

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.customer.email, "alice@example.com");
        assert_eq!(
            order.total_amount,
            BigDecimal::from_str("59.99").expect("valid decimal")
        );
        assert!(
            fixture.carts.cart_lines(1).is_none(),
            "cart destroyed on order creation"
        );
    }

    #[test]
    fn order_total_is_rounded_up() {
        let fixture = Fixture::new(
            vec![account(1, "alice@example.com")],
            vec![product(10, "bolt", "0.333", 100)],
        );
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(10, 10)]).expect("add");
        let order = orders.create_order(1).expect("order");
        // 10 × 0.333 = 3.33 exactly; ceiling keeps it.
        assert_eq!(
            order.total_amount,
            BigDecimal::from_str("3.33").expect("valid decimal")
        );

        shopping.add_items(1, vec![item(10, 1)]).expect("add");
        let order = orders.create_order(1).expect("order");
        // 0.333 rounds up to 0.34.
        assert_eq!(
            order.total_amount,
            BigDecimal::from_str("0.34").expect("valid decimal")
        );
    }

    #[test]
    fn pending_order_still_claims_stock() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(10, 4)]).expect("add");
        assert_eq!(shopping.available_quantity(10).expect("available"), 6);

        orders.create_order(1).expect("order");
        assert_eq!(
            shopping.available_quantity(10).expect("available"),
            6,
            "claim moved from cart to pending order"
        );
        assert_eq!(fixture.products.quantity_on_hand(10), 10);
    }

    #[test]
    fn completion_decrements_stock_and_is_terminal() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(10, 4)]).expect("add");
        let order = orders.create_order(1).expect("order");

        let completed = orders
            .transition(order.id, OrderStatus::Completed)
            .expect("complete");
        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(fixture.products.quantity_on_hand(10), 6);
        assert_eq!(
            shopping.available_quantity(10).expect("available"),
            6,
            "claim released, stock reduced"
        );

        let err = orders
            .transition(order.id, OrderStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
        assert_eq!(
            fixture.products.quantity_on_hand(10),
            6,
            "second attempt does not decrement again"
        );
    }

    #[test]
    fn completion_floors_stock_at_zero() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(11, 3)]).expect("add");
        let order = orders.create_order(1).expect("order");

        // Stock was reduced elsewhere after the order was placed.
        fixture.products.update_quantity(11, 1).expect("update");

        orders
            .transition(order.id, OrderStatus::Completed)
            .expect("complete");
        assert_eq!(fixture.products.quantity_on_hand(11), 0, "floored, not negative");
    }

    #[test]
    fn completion_skips_vanished_products() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping
            .add_items(1, vec![item(10, 2), item(11, 1)])
            .expect("add");
        let order = orders.create_order(1).expect("order");

        fixture.products.delete(11).expect("delete");

        let completed = orders
            .transition(order.id, OrderStatus::Completed)
            .expect("complete");
        assert_eq!(completed.status, OrderStatus::Completed);
        assert_eq!(fixture.products.quantity_on_hand(10), 8);
    }

    #[test]
    fn cancellation_never_touches_stock() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(10, 4)]).expect("add");
        let order = orders.create_order(1).expect("order");

        let canceled = orders
            .transition(order.id, OrderStatus::Canceled)
            .expect("cancel");
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(fixture.products.quantity_on_hand(10), 10);
        assert_eq!(
            shopping.available_quantity(10).expect("available"),
            10,
            "cancellation released the claim"
        );

        let err = orders
            .transition(order.id, OrderStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
    }

    #[test]
    fn transition_to_pending_is_rejected() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(10, 1)]).expect("add");
        let order = orders.create_order(1).expect("order");

        let err = orders.transition(order.id, OrderStatus::Pending).unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
        assert_eq!(
            fixture.orders.status_of(order.id),
            Some(OrderStatus::Pending)
        );
    }

    #[test]
    fn transition_of_unknown_order_is_not_found() {
        let fixture = fixture();
        let (_, orders) = services(&fixture);

        let err = orders
            .transition(Uuid::new_v4(), OrderStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn full_lifecycle_keeps_availability_consistent() {
        // The §8-style walkthrough: 10 on hand, add 4, order, complete.
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        assert_eq!(shopping.available_quantity(10).expect("available"), 10);

        shopping.add_items(1, vec![item(10, 4)]).expect("add");
        assert_eq!(shopping.available_quantity(10).expect("available"), 6);

        let order = orders.create_order(1).expect("order");
        assert_eq!(shopping.available_quantity(10).expect("available"), 6);
        assert_eq!(fixture.products.quantity_on_hand(10), 10);

        orders
            .transition(order.id, OrderStatus::Completed)
            .expect("complete");
        assert_eq!(fixture.products.quantity_on_hand(10), 6);
        assert_eq!(shopping.available_quantity(10).expect("available"), 6);

        let err = orders
            .transition(order.id, OrderStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
    }

    #[test]
    fn listing_with_no_orders_is_not_found() {
        let fixture = fixture();
        let (_, orders) = services(&fixture);

        let err = orders.list(None, None, PageRequest::default()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn listing_filters_by_customer() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(10, 1)]).expect("add");
        orders.create_order(1).expect("order");
        shopping.add_items(2, vec![item(11, 1)]).expect("add");
        orders.create_order(2).expect("order");

        let all = orders
            .list(None, None, PageRequest::default())
            .expect("list");
        assert_eq!(all.data.len(), 2);

        let mine = orders
            .list(Some(1), None, PageRequest::default())
            .expect("list");
        assert_eq!(mine.data.len(), 1);
        assert_eq!(mine.data[0].customer.id, 1);
    }

    #[test]
    fn listing_search_param_with_special_characters_is_rejected() {
        let fixture = fixture();
        let (_, orders) = services(&fixture);

        let err = orders
            .list(None, Some("rm -rf;"), PageRequest::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(_)));
    }

    #[test]
    fn listing_search_matches_product_name() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(10, 1)]).expect("add");
        orders.create_order(1).expect("order");
        shopping.add_items(2, vec![item(11, 1)]).expect("add");
        orders.create_order(2).expect("order");

        let hits = orders
            .list(None, Some("keyboard"), PageRequest::default())
            .expect("list");
        assert_eq!(hits.data.len(), 1);
        assert_eq!(hits.data[0].lines[0].product_id, 10);
    }

    #[test]
    fn listing_cache_is_evicted_by_order_creation() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        shopping.add_items(1, vec![item(10, 1)]).expect("add");
        orders.create_order(1).expect("order");
        assert_eq!(
            orders
                .list(None, None, PageRequest::default())
                .expect("list")
                .data
                .len(),
            1
        );

        shopping.add_items(2, vec![item(11, 1)]).expect("add");
        orders.create_order(2).expect("order");
        assert_eq!(
            orders
                .list(None, None, PageRequest::default())
                .expect("list")
                .data
                .len(),
            2,
            "cached page was dropped when the second order was created"
        );
    }

    #[test]
    fn failed_listing_is_not_cached() {
        let fixture = fixture();
        let (shopping, orders) = services(&fixture);

        assert!(orders.list(None, None, PageRequest::default()).is_err());

        shopping.add_items(1, vec![item(10, 1)]).expect("add");
        orders.create_order(1).expect("order");
        assert_eq!(
            orders
                .list(None, None, PageRequest::default())
                .expect("list")
                .data
                .len(),
            1,
            "the earlier NotFound was not cached"
        );
    }
}
