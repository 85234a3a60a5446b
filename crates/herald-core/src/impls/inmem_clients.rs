//! InMemoryClientRepository - 開発用の client ディレクトリ

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Client, ClientId, StoreError};
use crate::ports::ClientRepository;

#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<HashMap<ClientId, Client>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, client: Client) {
        self.clients.write().await.insert(client.id, client);
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn get(&self, id: ClientId) -> Result<Client, StoreError> {
        self.clients
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::no_such_entity("client", id))
    }
}
