//! Message rooms.
//!
//! 呼び出し側は project / customer の組（`RoomTarget`）しか知りません。
//! company は呼び出し元の client から解決し、3 つ揃えて `MessageRoomId` にします。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CompanyId, CustomerId, ProjectId};

/// A room as named by the caller, before tenant scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomTarget {
    pub project_id: ProjectId,
    pub customer_id: CustomerId,
}

impl RoomTarget {
    pub fn new(project_id: ProjectId, customer_id: CustomerId) -> Self {
        Self {
            project_id,
            customer_id,
        }
    }

    /// company スコープを合成して room ID にする
    pub fn scoped(&self, company_id: CompanyId) -> MessageRoomId {
        MessageRoomId::new(self.project_id, self.customer_id, company_id)
    }
}

/// Fully scoped room identifier. This is the fan-out key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageRoomId {
    pub project_id: ProjectId,
    pub customer_id: CustomerId,
    pub company_id: CompanyId,
}

impl MessageRoomId {
    pub fn new(project_id: ProjectId, customer_id: CustomerId, company_id: CompanyId) -> Self {
        Self {
            project_id,
            customer_id,
            company_id,
        }
    }
}

impl fmt::Display for MessageRoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "room({}/{}/{})",
            self.company_id, self.project_id, self.customer_id
        )
    }
}
