//! Bank model — the issuer that owns [`crate::models::asset::Asset`]s.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    id: Uuid,
    name: String,
    code: String,
    admin_user_id: Option<Uuid>,
}

impl Bank {
    pub fn new(name: String, code: String, admin_user_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            code,
            admin_user_id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn admin_user_id(&self) -> Option<Uuid> {
        self.admin_user_id
    }
}
