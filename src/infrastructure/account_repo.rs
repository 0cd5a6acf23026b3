use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::account::Account;
use crate::domain::errors::DomainError;
use crate::domain::ports::AccountStore;
use crate::schema::accounts;

use super::models::AccountRow;

pub struct DieselAccountStore {
    pool: DbPool,
}

impl DieselAccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl AccountStore for DieselAccountStore {
    fn find_by_id(&self, id: i64) -> Result<Option<Account>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = accounts::table
            .filter(accounts::id.eq(id))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Account::from))
    }
}
