//! In-memory port implementations for service-level tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::cache::{CacheSettings, ResponseCache};
use crate::domain::account::Account;
use crate::domain::cart::{Cart, CartLine, Customer};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::page::{PageRequest, Paged};
use crate::domain::ports::{AccountStore, CartStore, OrderStore, ProductStore};
use crate::domain::product::{NewProduct, Product, ProductInfo};

#[derive(Default)]
pub struct MemoryAccounts {
    accounts: Mutex<HashMap<i64, Account>>,
}

impl MemoryAccounts {
    pub fn with(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts.into_iter().map(|a| (a.id, a)).collect()),
        }
    }
}

impl AccountStore for MemoryAccounts {
    fn find_by_id(&self, id: i64) -> Result<Option<Account>, DomainError> {
        Ok(self.accounts.lock().expect("lock poisoned").get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryProducts {
    products: Mutex<HashMap<i64, Product>>,
    next_id: AtomicI64,
}

impl MemoryProducts {
    pub fn with(products: Vec<Product>) -> Self {
        let max_id = products.iter().map(|p| p.id).max().unwrap_or(0);
        Self {
            products: Mutex::new(products.into_iter().map(|p| (p.id, p)).collect()),
            next_id: AtomicI64::new(max_id),
        }
    }

    pub fn quantity_on_hand(&self, id: i64) -> i32 {
        self.products
            .lock()
            .expect("lock poisoned")
            .get(&id)
            .map(|p| p.quantity)
            .expect("unknown product")
    }
}

impl ProductStore for MemoryProducts {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        Ok(self.products.lock().expect("lock poisoned").get(&id).cloned())
    }

    fn exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.products.lock().expect("lock poisoned").contains_key(&id))
    }

    fn list(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Paged<Product>, DomainError> {
        let products = self.products.lock().expect("lock poisoned");
        let needle = search.map(str::to_lowercase);
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| match needle.as_deref() {
                Some(n) => {
                    p.name.to_lowercase().contains(n)
                        || p.description.to_lowercase().contains(n)
                        || p.category.to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.id);

        let total = matching.len() as i64;
        let data = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Paged::new(total, page.limit, data))
    }

    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let product = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            quantity: product.quantity,
            category: product.category,
            image_url: product.image_url,
        };
        self.products
            .lock()
            .expect("lock poisoned")
            .insert(id, product.clone());
        Ok(product)
    }

    fn update_info(&self, id: i64, info: ProductInfo) -> Result<Option<Product>, DomainError> {
        let mut products = self.products.lock().expect("lock poisoned");
        Ok(products.get_mut(&id).map(|p| {
            p.name = info.name;
            p.description = info.description;
            p.category = info.category;
            p.image_url = info.image_url;
            p.clone()
        }))
    }

    fn update_quantity(&self, id: i64, quantity: i32) -> Result<Option<Product>, DomainError> {
        let mut products = self.products.lock().expect("lock poisoned");
        Ok(products.get_mut(&id).map(|p| {
            p.quantity = quantity;
            p.clone()
        }))
    }

    fn update_price(&self, id: i64, price: BigDecimal) -> Result<Option<Product>, DomainError> {
        let mut products = self.products.lock().expect("lock poisoned");
        Ok(products.get_mut(&id).map(|p| {
            p.price = price;
            p.clone()
        }))
    }

    fn decrement_quantity(&self, id: i64, by: i32) -> Result<Option<Product>, DomainError> {
        let mut products = self.products.lock().expect("lock poisoned");
        Ok(products.get_mut(&id).map(|p| {
            p.quantity = (p.quantity - by).max(0);
            p.clone()
        }))
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self
            .products
            .lock()
            .expect("lock poisoned")
            .remove(&id)
            .is_some())
    }
}

#[derive(Default)]
pub struct MemoryCarts {
    carts: Mutex<HashMap<Uuid, Cart>>,
}

impl MemoryCarts {
    pub fn cart_lines(&self, customer_id: i64) -> Option<Vec<CartLine>> {
        self.carts
            .lock()
            .expect("lock poisoned")
            .values()
            .find(|c| c.customer.id == customer_id)
            .map(|c| c.lines.clone())
    }

    pub fn cart_count(&self) -> usize {
        self.carts.lock().expect("lock poisoned").len()
    }
}

impl CartStore for MemoryCarts {
    fn find_by_customer(&self, customer_id: i64) -> Result<Option<Cart>, DomainError> {
        Ok(self
            .carts
            .lock()
            .expect("lock poisoned")
            .values()
            .find(|c| c.customer.id == customer_id)
            .cloned())
    }

    fn create(&self, customer: &Customer, lines: Vec<CartLine>) -> Result<Cart, DomainError> {
        let mut carts = self.carts.lock().expect("lock poisoned");
        if carts.values().any(|c| c.customer.id == customer.id) {
            return Err(DomainError::Internal(
                "customer already has a cart".to_string(),
            ));
        }
        let cart = Cart {
            id: Uuid::new_v4(),
            customer: customer.clone(),
            lines,
        };
        carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    fn append_lines(&self, cart_id: Uuid, lines: Vec<CartLine>) -> Result<(), DomainError> {
        let mut carts = self.carts.lock().expect("lock poisoned");
        let cart = carts
            .get_mut(&cart_id)
            .ok_or_else(|| DomainError::Internal("no such cart".to_string()))?;
        cart.lines.extend(lines);
        Ok(())
    }

    fn replace_lines(&self, cart_id: Uuid, lines: Vec<CartLine>) -> Result<(), DomainError> {
        let mut carts = self.carts.lock().expect("lock poisoned");
        let cart = carts
            .get_mut(&cart_id)
            .ok_or_else(|| DomainError::Internal("no such cart".to_string()))?;
        cart.lines = lines;
        Ok(())
    }

    fn delete(&self, cart_id: Uuid) -> Result<(), DomainError> {
        self.carts.lock().expect("lock poisoned").remove(&cart_id);
        Ok(())
    }

    fn claimed_quantity(&self, product_id: i64) -> Result<i64, DomainError> {
        let carts = self.carts.lock().expect("lock poisoned");
        Ok(carts
            .values()
            .flat_map(|c| c.lines.iter())
            .filter(|l| l.product_id == product_id)
            .map(|l| i64::from(l.quantity))
            .sum())
    }
}

#[derive(Default)]
pub struct MemoryOrders {
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl MemoryOrders {
    pub fn status_of(&self, id: Uuid) -> Option<OrderStatus> {
        self.orders
            .lock()
            .expect("lock poisoned")
            .get(&id)
            .map(|o| o.status)
    }
}

impl OrderStore for MemoryOrders {
    fn create_from_cart(
        &self,
        cart: &Cart,
        total_amount: BigDecimal,
    ) -> Result<Order, DomainError> {
        let order = Order {
            id: Uuid::new_v4(),
            customer: cart.customer.clone(),
            lines: cart.lines.clone(),
            total_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        self.orders
            .lock()
            .expect("lock poisoned")
            .insert(order.id, order.clone());
        Ok(order)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.lock().expect("lock poisoned").get(&id).cloned())
    }

    fn transition_from_pending(
        &self,
        id: Uuid,
        target: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        let mut orders = self.orders.lock().expect("lock poisoned");
        match orders.get_mut(&id) {
            Some(order) if order.status == OrderStatus::Pending => {
                order.status = target;
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    fn list(
        &self,
        customer_id: Option<i64>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paged<Order>, DomainError> {
        let orders = self.orders.lock().expect("lock poisoned");
        let needle = search.map(str::to_lowercase);
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| customer_id.map_or(true, |id| o.customer.id == id))
            .filter(|o| match needle.as_deref() {
                Some(n) => {
                    o.customer.email.to_lowercase().contains(n)
                        || o.status.as_str().to_lowercase().contains(n)
                        || o.lines.iter().any(|l| l.product_name.to_lowercase().contains(n))
                }
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let data = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Paged::new(total, page.limit, data))
    }

    fn pending_claimed_quantity(&self, product_id: i64) -> Result<i64, DomainError> {
        let orders = self.orders.lock().expect("lock poisoned");
        Ok(orders
            .values()
            .filter(|o| o.status == OrderStatus::Pending)
            .flat_map(|o| o.lines.iter())
            .filter(|l| l.product_id == product_id)
            .map(|l| i64::from(l.quantity))
            .sum())
    }
}

// ── Shared fixture ───────────────────────────────────────────────────────────

pub struct Fixture {
    pub accounts: Arc<MemoryAccounts>,
    pub products: Arc<MemoryProducts>,
    pub carts: Arc<MemoryCarts>,
    pub orders: Arc<MemoryOrders>,
    pub cache: Arc<ResponseCache>,
}

impl Fixture {
    pub fn new(accounts: Vec<Account>, products: Vec<Product>) -> Self {
        Self {
            accounts: Arc::new(MemoryAccounts::with(accounts)),
            products: Arc::new(MemoryProducts::with(products)),
            carts: Arc::new(MemoryCarts::default()),
            orders: Arc::new(MemoryOrders::default()),
            cache: Arc::new(ResponseCache::new(CacheSettings::default())),
        }
    }
}

pub fn account(id: i64, email: &str) -> Account {
    Account {
        id,
        name: format!("customer-{id}"),
        email: email.to_string(),
    }
}

pub fn product(id: i64, name: &str, price: &str, quantity: i32) -> Product {
    use std::str::FromStr;
    Product {
        id,
        name: name.to_string(),
        description: format!("{name} description"),
        price: BigDecimal::from_str(price).expect("valid decimal"),
        quantity,
        category: "general".to_string(),
        image_url: None,
    }
}
