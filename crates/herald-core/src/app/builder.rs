//! AppBuilder - ports を組み合わせて MessageApp を作る
//!
//! # Fail-fast 設計
//! - build() 時に必要な port がすべて揃っているかをチェック
//! - 不足があれば BuildError を返す（実行時に初めて気づくことがない）

use std::sync::Arc;

use super::enrich::Enricher;
use super::message_app::MessageApp;
use crate::domain::ClientId;
use crate::ports::{ClientRepository, MessageRepository, ResourceSigner};

/// AppBuilder は MessageApp を構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(executor_id)
///     .clients(clients)
///     .messages(messages)
///     .signer(signer)
///     .build()?;
/// ```
pub struct AppBuilder {
    executor_id: ClientId,
    clients: Option<Arc<dyn ClientRepository>>,
    messages: Option<Arc<dyn MessageRepository>>,
    signer: Option<Arc<dyn ResourceSigner>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These ports must be set before build().")]
    MissingPorts(Vec<&'static str>),
}

impl AppBuilder {
    pub fn new(executor_id: ClientId) -> Self {
        Self {
            executor_id,
            clients: None,
            messages: None,
            signer: None,
        }
    }

    pub fn clients(mut self, clients: Arc<dyn ClientRepository>) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn messages(mut self, messages: Arc<dyn MessageRepository>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn ResourceSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// 不足している port を全部まとめて報告する
    pub fn build(self) -> Result<MessageApp, BuildError> {
        match (self.clients, self.messages, self.signer) {
            (Some(clients), Some(messages), Some(signer)) => Ok(MessageApp::new(
                self.executor_id,
                clients,
                messages,
                Enricher::new(signer),
            )),
            (clients, messages, signer) => {
                let missing = [
                    ("clients", clients.is_none()),
                    ("messages", messages.is_none()),
                    ("signer", signer.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
                Err(BuildError::MissingPorts(missing))
            }
        }
    }
}
