use serde::{Deserialize, Serialize};

use super::ids::{ClientId, CompanyId};

/// The caller of a message query. Its `company_id` scopes every room lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub company_id: CompanyId,
    pub display_name: String,
}

impl Client {
    pub fn new(id: ClientId, company_id: CompanyId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            company_id,
            display_name: display_name.into(),
        }
    }
}
