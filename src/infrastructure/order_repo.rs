use std::collections::HashMap;

use bigdecimal::BigDecimal;
use diesel::dsl::sum;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{Cart, CartLine, Customer};
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::page::{PageRequest, Paged};
use crate::domain::ports::OrderStore;
use crate::schema::{order_lines, orders};

use super::models::{NewOrderLineRow, NewOrderRow, OrderLineRow, OrderRow};

pub struct DieselOrderStore {
    pool: DbPool,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_order(row: OrderRow, lines: Vec<CartLine>) -> Result<Order, DomainError> {
    let status = OrderStatus::parse(&row.status).ok_or_else(|| {
        DomainError::Internal(format!("unknown order status '{}'", row.status))
    })?;
    Ok(Order {
        id: row.id,
        customer: Customer {
            id: row.customer_id,
            email: row.customer_email,
        },
        lines,
        total_amount: row.total_amount,
        status,
        created_at: row.created_at,
    })
}

fn load_lines(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
    let rows: Vec<OrderLineRow> = order_lines::table
        .filter(order_lines::order_id.eq(order_id))
        .order(order_lines::created_at.asc())
        .select(OrderLineRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(CartLine::from).collect())
}

/// Order ids whose line product names match the search pattern; feeds the
/// name leg of the listing filter without a correlated subquery.
fn ids_matching_line_name(
    conn: &mut PgConnection,
    pattern: &str,
) -> Result<Vec<Uuid>, DomainError> {
    let ids = order_lines::table
        .filter(order_lines::product_name.ilike(pattern.to_string()))
        .select(order_lines::order_id)
        .distinct()
        .load(conn)?;
    Ok(ids)
}

fn filtered(
    customer_id: Option<i64>,
    search_pattern: Option<&str>,
    name_matches: &[Uuid],
) -> orders::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(id) = customer_id {
        query = query.filter(orders::customer_id.eq(id));
    }
    if let Some(pattern) = search_pattern {
        query = query.filter(
            orders::customer_email
                .ilike(pattern.to_string())
                .or(orders::status.ilike(pattern.to_string()))
                .or(orders::id.eq_any(name_matches.to_vec())),
        );
    }
    query
}

impl OrderStore for DieselOrderStore {
    fn create_from_cart(
        &self,
        cart: &Cart,
        total_amount: BigDecimal,
    ) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;
        let order_id = Uuid::new_v4();

        let row = conn.transaction::<_, DomainError, _>(|conn| {
            let inserted: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    customer_id: cart.customer.id,
                    customer_email: cart.customer.email.clone(),
                    total_amount,
                    status: OrderStatus::Pending.as_str().to_string(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            let line_rows: Vec<NewOrderLineRow> = cart
                .lines
                .iter()
                .map(|line| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    line_total: line.line_total.clone(),
                })
                .collect();
            diesel::insert_into(order_lines::table)
                .values(&line_rows)
                .execute(conn)?;

            Ok(inserted)
        })?;

        to_order(row, cart.lines.clone())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        let lines = load_lines(&mut conn, row.id)?;
        Ok(Some(to_order(row, lines)?))
    }

    fn transition_from_pending(
        &self,
        id: Uuid,
        target: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        // The WHERE clause is the optimistic pending check: a concurrent
        // transition that already won leaves zero rows to update.
        let row = diesel::update(
            orders::table
                .filter(orders::id.eq(id))
                .filter(orders::status.eq(OrderStatus::Pending.as_str())),
        )
        .set(orders::status.eq(target.as_str()))
        .returning(OrderRow::as_returning())
        .get_result(&mut conn)
        .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        let lines = load_lines(&mut conn, row.id)?;
        Ok(Some(to_order(row, lines)?))
    }

    fn list(
        &self,
        customer_id: Option<i64>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paged<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let pattern = search.map(|param| format!("%{}%", param.trim()));
        let name_matches = match pattern.as_deref() {
            Some(p) => ids_matching_line_name(&mut conn, p)?,
            None => Vec::new(),
        };

        let total: i64 = filtered(customer_id, pattern.as_deref(), &name_matches)
            .count()
            .get_result(&mut conn)?;
        let rows: Vec<OrderRow> = filtered(customer_id, pattern.as_deref(), &name_matches)
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .limit(page.limit)
            .offset(page.offset())
            .load(&mut conn)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let line_rows: Vec<OrderLineRow> = order_lines::table
            .filter(order_lines::order_id.eq_any(&ids))
            .order(order_lines::created_at.asc())
            .select(OrderLineRow::as_select())
            .load(&mut conn)?;
        let mut lines_by_order: HashMap<Uuid, Vec<CartLine>> = HashMap::new();
        for line in line_rows {
            lines_by_order
                .entry(line.order_id)
                .or_default()
                .push(CartLine::from(line));
        }

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = lines_by_order.remove(&row.id).unwrap_or_default();
            data.push(to_order(row, lines)?);
        }
        Ok(Paged::new(total, page.limit, data))
    }

    fn pending_claimed_quantity(&self, product_id: i64) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;
        let total: Option<i64> = order_lines::table
            .inner_join(orders::table)
            .filter(orders::status.eq(OrderStatus::Pending.as_str()))
            .filter(order_lines::product_id.eq(product_id))
            .select(sum(order_lines::quantity))
            .first(&mut conn)?;
        Ok(total.unwrap_or(0))
    }
}
