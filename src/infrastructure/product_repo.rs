use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::dsl::{exists, sql};
use diesel::prelude::*;
use diesel::sql_types::Integer;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::page::{PageRequest, Paged};
use crate::domain::ports::ProductStore;
use crate::domain::product::{NewProduct, Product, ProductInfo};
use crate::schema::products;

use super::models::{NewProductRow, ProductRow};

pub struct DieselProductStore {
    pool: DbPool,
}

impl DieselProductStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn search_filter<'a>(
    query: products::BoxedQuery<'a, diesel::pg::Pg>,
    param: &str,
) -> products::BoxedQuery<'a, diesel::pg::Pg> {
    let pattern = format!("%{}%", param.trim());
    query.filter(
        products::name
            .ilike(pattern.clone())
            .or(products::description.ilike(pattern.clone()))
            .or(products::category.ilike(pattern)),
    )
}

impl ProductStore for DieselProductStore {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn exists(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let found = diesel::select(exists(products::table.filter(products::id.eq(id))))
            .get_result(&mut conn)?;
        Ok(found)
    }

    fn list(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Paged<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut count_query = products::table.into_boxed();
        let mut page_query = products::table.into_boxed();
        if let Some(param) = search {
            count_query = search_filter(count_query, param);
            page_query = search_filter(page_query, param);
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;
        let rows = page_query
            .select(ProductRow::as_select())
            .order(products::id.asc())
            .limit(page.limit)
            .offset(page.offset())
            .load(&mut conn)?;

        Ok(Paged::new(
            total,
            page.limit,
            rows.into_iter().map(Product::from).collect(),
        ))
    }

    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                name: product.name,
                description: product.description,
                price: product.price,
                quantity: product.quantity,
                category: product.category,
                image_url: product.image_url,
            })
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Ok(Product::from(row))
    }

    fn update_info(&self, id: i64, info: ProductInfo) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.filter(products::id.eq(id)))
            .set((
                products::name.eq(info.name),
                products::description.eq(info.description),
                products::category.eq(info.category),
                products::image_url.eq(info.image_url),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn update_quantity(&self, id: i64, quantity: i32) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.filter(products::id.eq(id)))
            .set((
                products::quantity.eq(quantity),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn update_price(&self, id: i64, price: BigDecimal) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.filter(products::id.eq(id)))
            .set((
                products::price.eq(price),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn decrement_quantity(&self, id: i64, by: i32) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        // Single-statement decrement so concurrent completions against the
        // same product cannot lose updates; floored at zero in the database.
        let row = diesel::update(products::table.filter(products::id.eq(id)))
            .set((
                products::quantity.eq(sql::<Integer>("GREATEST(quantity - ")
                    .bind::<Integer, _>(by)
                    .sql(", 0)")),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(products::table.filter(products::id.eq(id)))
            .execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
