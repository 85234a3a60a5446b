//! Domain identifiers (strongly-typed IDs).
//!
//! すべての ID は ULID を内部に持つ `Id<T>` で表現します。
//! `T` は PhantomData のマーカー型で、`ProjectId` と `CustomerId` のような
//! 同じ形の ID をコンパイル時に区別するためだけに使います。
//!
//! room の組み立てでは project / customer / company の 3 つを並べて渡すので、
//! 取り違えが型エラーになることに意味があります。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"project-", "message-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 新しい ID を発行（現在時刻ベース）
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

macro_rules! id_marker {
    ($(#[$doc:meta])* $marker:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $marker {}

        impl IdMarker for $marker {
            fn prefix() -> &'static str {
                $prefix
            }
        }
    };
}

id_marker!(
    /// Project のマーカー型
    Project,
    "project-"
);
id_marker!(
    /// Customer のマーカー型
    Customer,
    "customer-"
);
id_marker!(
    /// Company のマーカー型（テナント）
    Company,
    "company-"
);
id_marker!(
    /// Client（操作者）のマーカー型
    Client,
    "client-"
);
id_marker!(
    /// Message のマーカー型
    Message,
    "message-"
);

// ========================================
// Type Alias
// ========================================

pub type ProjectId = Id<Project>;

pub type CustomerId = Id<Customer>;

/// Tenant scope. Resolved from the caller, never supplied by them.
pub type CompanyId = Id<Company>;

/// Identifier of the executing client (the caller of `MessageApp`).
pub type ClientId = Id<Client>;

pub type MessageId = Id<Message>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_prefix() {
        let ulid = Ulid::new();

        assert_eq!(ProjectId::from_ulid(ulid).to_string(), format!("project-{ulid}"));
        assert!(CustomerId::generate().to_string().starts_with("customer-"));
        assert!(CompanyId::generate().to_string().starts_with("company-"));
        assert!(ClientId::generate().to_string().starts_with("client-"));
        assert!(MessageId::generate().to_string().starts_with("message-"));

        // let _: ProjectId = CustomerId::generate(); // <- does not compile
    }

    #[test]
    fn ids_serialize_as_bare_ulid() {
        let ulid = Ulid::new();
        let id = MessageId::from_ulid(ulid);

        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, format!("\"{ulid}\""));

        let deserialized: MessageId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<ProjectId>(), size_of::<Ulid>());
        assert_eq!(size_of::<MessageId>(), 16);
    }
}
