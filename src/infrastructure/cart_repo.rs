use chrono::Utc;
use diesel::dsl::sum;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{Cart, CartLine, Customer};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartStore;
use crate::schema::{cart_lines, carts};

use super::models::{CartLineRow, CartRow, NewCartLineRow, NewCartRow};

pub struct DieselCartStore {
    pool: DbPool,
}

impl DieselCartStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn new_line_rows(cart_id: Uuid, lines: Vec<CartLine>) -> Vec<NewCartLineRow> {
    lines
        .into_iter()
        .map(|line| NewCartLineRow {
            id: Uuid::new_v4(),
            cart_id,
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            line_total: line.line_total,
        })
        .collect()
}

fn load_cart(conn: &mut PgConnection, row: CartRow) -> Result<Cart, DomainError> {
    let lines: Vec<CartLineRow> = cart_lines::table
        .filter(cart_lines::cart_id.eq(row.id))
        .order(cart_lines::created_at.asc())
        .select(CartLineRow::as_select())
        .load(conn)?;

    Ok(Cart {
        id: row.id,
        customer: Customer {
            id: row.customer_id,
            email: row.customer_email,
        },
        lines: lines.into_iter().map(CartLine::from).collect(),
    })
}

impl CartStore for DieselCartStore {
    fn find_by_customer(&self, customer_id: i64) -> Result<Option<Cart>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = carts::table
            .filter(carts::customer_id.eq(customer_id))
            .select(CartRow::as_select())
            .first(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(Some(load_cart(&mut conn, row)?)),
            None => Ok(None),
        }
    }

    fn create(&self, customer: &Customer, lines: Vec<CartLine>) -> Result<Cart, DomainError> {
        let mut conn = self.pool.get()?;
        let cart_id = Uuid::new_v4();
        let customer = customer.clone();

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(carts::table)
                .values(&NewCartRow {
                    id: cart_id,
                    customer_id: customer.id,
                    customer_email: customer.email.clone(),
                })
                .execute(conn)?;

            diesel::insert_into(cart_lines::table)
                .values(&new_line_rows(cart_id, lines.clone()))
                .execute(conn)?;

            Ok(Cart {
                id: cart_id,
                customer,
                lines,
            })
        })
    }

    fn append_lines(&self, cart_id: Uuid, lines: Vec<CartLine>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(cart_lines::table)
                .values(&new_line_rows(cart_id, lines))
                .execute(conn)?;
            diesel::update(carts::table.filter(carts::id.eq(cart_id)))
                .set(carts::updated_at.eq(Utc::now()))
                .execute(conn)?;
            Ok(())
        })
    }

    fn replace_lines(&self, cart_id: Uuid, lines: Vec<CartLine>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::delete(cart_lines::table.filter(cart_lines::cart_id.eq(cart_id)))
                .execute(conn)?;
            if !lines.is_empty() {
                diesel::insert_into(cart_lines::table)
                    .values(&new_line_rows(cart_id, lines))
                    .execute(conn)?;
            }
            diesel::update(carts::table.filter(carts::id.eq(cart_id)))
                .set(carts::updated_at.eq(Utc::now()))
                .execute(conn)?;
            Ok(())
        })
    }

    fn delete(&self, cart_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        // cart_lines go with the cart via ON DELETE CASCADE
        diesel::delete(carts::table.filter(carts::id.eq(cart_id))).execute(&mut conn)?;
        Ok(())
    }

    fn claimed_quantity(&self, product_id: i64) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        let total: Option<i64> = cart_lines::table
            .filter(cart_lines::product_id.eq(product_id))
            .select(sum(cart_lines::quantity))
            .first(&mut conn)?;
        Ok(total.unwrap_or(0))
    }
}
