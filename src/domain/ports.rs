use std::sync::Arc;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::account::Account;
use super::cart::{Cart, CartLine, Customer};
use super::errors::DomainError;
use super::order::{Order, OrderStatus};
use super::page::{PageRequest, Paged};
use super::product::{NewProduct, Product, ProductInfo};

/// Read access to customer accounts. Account CRUD itself belongs to the
/// identity collaborator; the core only resolves ids to snapshots.
pub trait AccountStore: Send + Sync + 'static {
    fn find_by_id(&self, id: i64) -> Result<Option<Account>, DomainError>;
}

/// The stock ledger: point reads and writes of per-product quantity on
/// hand. Absence is reported as `Ok(None)` / `Ok(false)`, never an error.
pub trait ProductStore: Send + Sync + 'static {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError>;

    fn exists(&self, id: i64) -> Result<bool, DomainError>;

    fn list(&self, page: PageRequest, search: Option<&str>)
        -> Result<Paged<Product>, DomainError>;

    fn insert(&self, product: NewProduct) -> Result<Product, DomainError>;

    fn update_info(&self, id: i64, info: ProductInfo) -> Result<Option<Product>, DomainError>;

    fn update_quantity(&self, id: i64, quantity: i32) -> Result<Option<Product>, DomainError>;

    fn update_price(&self, id: i64, price: BigDecimal) -> Result<Option<Product>, DomainError>;

    /// Atomically decrements quantity on hand by `by`, floored at zero.
    /// Concurrent decrements against the same product must not lose
    /// updates. Returns the updated product, or `None` if it is gone.
    fn decrement_quantity(&self, id: i64, by: i32) -> Result<Option<Product>, DomainError>;

    fn delete(&self, id: i64) -> Result<bool, DomainError>;
}

/// Shopping carts, customer-scoped. At most one cart per customer.
pub trait CartStore: Send + Sync + 'static {
    fn find_by_customer(&self, customer_id: i64) -> Result<Option<Cart>, DomainError>;

    fn create(&self, customer: &Customer, lines: Vec<CartLine>) -> Result<Cart, DomainError>;

    fn append_lines(&self, cart_id: Uuid, lines: Vec<CartLine>) -> Result<(), DomainError>;

    fn replace_lines(&self, cart_id: Uuid, lines: Vec<CartLine>) -> Result<(), DomainError>;

    fn delete(&self, cart_id: Uuid) -> Result<(), DomainError>;

    /// Cart-side claim aggregation: total quantity of `product_id` across
    /// every cart line in every cart. Zero matches is 0, not an error.
    fn claimed_quantity(&self, product_id: i64) -> Result<i64, DomainError>;
}

/// Orders: append-only until their single legal transition out of PENDING.
pub trait OrderStore: Send + Sync + 'static {
    fn create_from_cart(&self, cart: &Cart, total_amount: BigDecimal)
        -> Result<Order, DomainError>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;

    /// Optimistic transition: persists `target` only if the stored status
    /// is still PENDING at write time. Returns `None` when the order is
    /// missing or the pending check failed.
    fn transition_from_pending(
        &self,
        id: Uuid,
        target: OrderStatus,
    ) -> Result<Option<Order>, DomainError>;

    fn list(
        &self,
        customer_id: Option<i64>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paged<Order>, DomainError>;

    /// Order-side claim aggregation: total quantity of `product_id` across
    /// the lines of every PENDING order.
    fn pending_claimed_quantity(&self, product_id: i64) -> Result<i64, DomainError>;
}

impl<T: AccountStore> AccountStore for Arc<T> {
    fn find_by_id(&self, id: i64) -> Result<Option<Account>, DomainError> {
        (**self).find_by_id(id)
    }
}

impl<T: ProductStore> ProductStore for Arc<T> {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        (**self).find_by_id(id)
    }

    fn exists(&self, id: i64) -> Result<bool, DomainError> {
        (**self).exists(id)
    }

    fn list(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Paged<Product>, DomainError> {
        (**self).list(page, search)
    }

    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        (**self).insert(product)
    }

    fn update_info(&self, id: i64, info: ProductInfo) -> Result<Option<Product>, DomainError> {
        (**self).update_info(id, info)
    }

    fn update_quantity(&self, id: i64, quantity: i32) -> Result<Option<Product>, DomainError> {
        (**self).update_quantity(id, quantity)
    }

    fn update_price(&self, id: i64, price: BigDecimal) -> Result<Option<Product>, DomainError> {
        (**self).update_price(id, price)
    }

    fn decrement_quantity(&self, id: i64, by: i32) -> Result<Option<Product>, DomainError> {
        (**self).decrement_quantity(id, by)
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        (**self).delete(id)
    }
}

impl<T: CartStore> CartStore for Arc<T> {
    fn find_by_customer(&self, customer_id: i64) -> Result<Option<Cart>, DomainError> {
        (**self).find_by_customer(customer_id)
    }

    fn create(&self, customer: &Customer, lines: Vec<CartLine>) -> Result<Cart, DomainError> {
        (**self).create(customer, lines)
    }

    fn append_lines(&self, cart_id: Uuid, lines: Vec<CartLine>) -> Result<(), DomainError> {
        (**self).append_lines(cart_id, lines)
    }

    fn replace_lines(&self, cart_id: Uuid, lines: Vec<CartLine>) -> Result<(), DomainError> {
        (**self).replace_lines(cart_id, lines)
    }

    fn delete(&self, cart_id: Uuid) -> Result<(), DomainError> {
        (**self).delete(cart_id)
    }

    fn claimed_quantity(&self, product_id: i64) -> Result<i64, DomainError> {
        (**self).claimed_quantity(product_id)
    }
}

impl<T: OrderStore> OrderStore for Arc<T> {
    fn create_from_cart(
        &self,
        cart: &Cart,
        total_amount: BigDecimal,
    ) -> Result<Order, DomainError> {
        (**self).create_from_cart(cart, total_amount)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        (**self).find_by_id(id)
    }

    fn transition_from_pending(
        &self,
        id: Uuid,
        target: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        (**self).transition_from_pending(id, target)
    }

    fn list(
        &self,
        customer_id: Option<i64>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paged<Order>, DomainError> {
        (**self).list(customer_id, search, page)
    }

    fn pending_claimed_quantity(&self, product_id: i64) -> Result<i64, DomainError> {
        (**self).pending_claimed_quantity(product_id)
    }
}
