//! MessageRepository port - メッセージの保存先
//!
//! fan-out エンジンが依存するのは `get_last_by_room` のシグネチャと、
//! `StoreError::NoSuchEntity` を他のエラーと区別できることだけです。

use async_trait::async_trait;

use crate::domain::{Message, MessageRoomId, Pager, StoreError};

/// MessageRepository はメッセージの読み取り口
///
/// # Thread Safety
/// - fan-out で room ごとに並行して呼ばれるので `Send + Sync` を要求
/// - 返す future を drop するとそのクエリは中断される（協調キャンセル）
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Newest message of a room, or `StoreError::NoSuchEntity` when the room is empty.
    async fn get_last_by_room(&self, room_id: &MessageRoomId) -> Result<Message, StoreError>;

    /// One page of a room's messages, newest first. An empty page is `Ok(vec![])`.
    async fn get_all_by_room_with_pager(
        &self,
        room_id: &MessageRoomId,
        pager: Pager,
    ) -> Result<Vec<Message>, StoreError>;
}
