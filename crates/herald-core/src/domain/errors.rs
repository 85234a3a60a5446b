//! Errors - エラー型と分類
//!
//! # 分類
//! - `StoreError::NoSuchEntity`: 期待された「存在しない」。fan-out では結果が減るだけ
//! - `StoreError::Backend`: それ以外のストア障害。操作全体を失敗させる
//! - `SignError`: 署名失敗。enrichment を中断させる
//! - `FeedError`: 呼び出し側に返す操作レベルのエラー（段階と対象 ID を保持）

use thiserror::Error;

use super::ids::{ClientId, MessageId};
use super::locator::ResourceLocator;
use super::room::MessageRoomId;

/// Error returned by the storage ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no such {entity}: {id}")]
    NoSuchEntity { entity: &'static str, id: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn no_such_entity(entity: &'static str, id: impl ToString) -> Self {
        Self::NoSuchEntity {
            entity,
            id: id.to_string(),
        }
    }

    /// The one expected absence; everything else is a real failure.
    pub fn is_no_such_entity(&self) -> bool {
        matches!(self, Self::NoSuchEntity { .. })
    }
}

/// Error returned by the resource signer port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    #[error("signer refused '{locator}': {reason}")]
    Rejected {
        locator: ResourceLocator,
        reason: String,
    },

    #[error("signer backend error: {0}")]
    Backend(String),
}

/// Which stage of an operation was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Identity,
    Retrieval,
    Enrichment,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Identity => "identity",
            Stage::Retrieval => "retrieval",
            Stage::Enrichment => "enrichment",
        };
        f.write_str(s)
    }
}

/// Operation-level error surfaced to callers of `MessageApp`.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to resolve caller {client_id}")]
    IdentityResolution {
        client_id: ClientId,
        #[source]
        source: StoreError,
    },

    #[error("failed to fetch messages for {room_id}")]
    Retrieval {
        room_id: MessageRoomId,
        #[source]
        source: StoreError,
    },

    #[error("failed to sign {locator} for {message_id}")]
    Signing {
        message_id: MessageId,
        locator: ResourceLocator,
        #[source]
        source: SignError,
    },

    #[error("operation cancelled during {0}")]
    Cancelled(Stage),

    #[error("retrieval task aborted: {0}")]
    TaskAborted(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FeedError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            FeedError::IdentityResolution { .. } => Some(Stage::Identity),
            FeedError::Retrieval { .. } | FeedError::TaskAborted(_) => Some(Stage::Retrieval),
            FeedError::Signing { .. } => Some(Stage::Enrichment),
            FeedError::Cancelled(stage) => Some(*stage),
            FeedError::InvalidRequest(_) => None,
        }
    }
}
