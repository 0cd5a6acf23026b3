use serde::{Deserialize, Serialize};

/// A customer account as resolved by the identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
}
