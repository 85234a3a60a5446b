//! ClientRepository port - 呼び出し元（client）の解決

use async_trait::async_trait;

use crate::domain::{Client, ClientId, StoreError};

/// Resolves "who is calling" into a `Client` with its company scope.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn get(&self, id: ClientId) -> Result<Client, StoreError>;
}
