//! FanOutEngine - room ごとの最新メッセージを並行取得
//!
//! # フロー
//! 1. キーを重複排除する（同じ room を二度引かない）
//! 2. room ごとに 1 タスクを `JoinSet` に spawn（すべて spawn してから待つ）
//! 3. 各タスクは結果を 3 分類する
//!    - Found: `ResultSet` に書き込む（ロックは insert の間だけ）
//!    - NotFound: 何もしない（エラーではない）
//!    - それ以外: 操作全体の失敗
//! 4. 全タスクの終了を待ってから、最初のエラーを返すか結果を読む
//!
//! # 重要
//! - ストアへの問い合わせ中はロックを持たない
//! - `JoinSet` を drop すると残りのタスクは abort されるので、
//!   呼び出し側が future を捨てても取り残されるタスクはない

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, debug_span, info, warn};

use super::cancel::CancelToken;
use crate::domain::{FeedError, Message, MessageRoomId, Stage, StoreError};
use crate::observability::FanOutReport;
use crate::ports::MessageRepository;

/// Room → newest message, filled concurrently during a fan-out.
///
/// Each slot is written by exactly one task; the map is only read after every
/// task has been joined.
pub struct ResultSet {
    slots: Mutex<HashMap<MessageRoomId, Message>>,
}

impl ResultSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Returns `false` if the slot was already taken (the existing entry is kept).
    pub async fn insert(&self, room_id: MessageRoomId, message: Message) -> bool {
        let mut slots = self.slots.lock().await;
        if slots.contains_key(&room_id) {
            return false;
        }
        slots.insert(room_id, message);
        true
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }

    /// Unordered contents.
    pub fn into_messages(self) -> Vec<Message> {
        self.slots.into_inner().into_values().collect()
    }
}

/// How one per-room task ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Found,
    NotFound,
}

/// Concurrent "newest message per room" retrieval.
#[derive(Clone)]
pub struct FanOutEngine {
    repository: Arc<dyn MessageRepository>,
}

impl FanOutEngine {
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    /// Newest message for every room that has one, in no particular order.
    ///
    /// Rooms without messages are skipped. Any other lookup failure fails the
    /// whole call with the first error observed; no partial result is returned.
    pub async fn fetch_latest_for_keys<I>(
        &self,
        keys: I,
        cancel: &CancelToken,
    ) -> Result<Vec<Message>, FeedError>
    where
        I: IntoIterator<Item = MessageRoomId>,
    {
        self.fetch_latest_with_report(keys, cancel)
            .await
            .map(|(messages, _)| messages)
    }

    /// Same as [`fetch_latest_for_keys`](Self::fetch_latest_for_keys), plus counters.
    pub async fn fetch_latest_with_report<I>(
        &self,
        keys: I,
        cancel: &CancelToken,
    ) -> Result<(Vec<Message>, FanOutReport), FeedError>
    where
        I: IntoIterator<Item = MessageRoomId>,
    {
        let mut requested = 0;
        let unique: BTreeSet<MessageRoomId> = keys.into_iter().inspect(|_| requested += 1).collect();

        let results = Arc::new(ResultSet::with_capacity(unique.len()));
        let mut tasks = JoinSet::new();
        for room_id in unique.iter().copied() {
            let repository = Arc::clone(&self.repository);
            let results = Arc::clone(&results);
            let cancel = cancel.clone();
            tasks.spawn(
                fetch_latest_one(repository, room_id, results, cancel)
                    .instrument(debug_span!("fetch_latest", room = %room_id)),
            );
        }

        // 全タスクの終了を待つ（最初のエラーだけ覚えておく）
        let mut report = FanOutReport {
            requested,
            unique: unique.len(),
            ..FanOutReport::default()
        };
        let mut first_error: Option<FeedError> = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| FeedError::TaskAborted(e.to_string()))
                .and_then(|outcome| outcome);
            match outcome {
                Ok(Slot::Found) => report.found += 1,
                Ok(Slot::NotFound) => report.not_found += 1,
                Err(err) => {
                    if first_error.is_none() {
                        warn!(error = %err, "fan-out task failed; operation will fail");
                        first_error = Some(err);
                    } else {
                        debug!(error = %err, "additional fan-out failure ignored");
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        let messages = match Arc::try_unwrap(results) {
            Ok(results) => results.into_messages(),
            Err(shared) => shared
                .slots
                .lock()
                .await
                .drain()
                .map(|(_, message)| message)
                .collect(),
        };

        info!(
            requested = report.requested,
            unique = report.unique,
            found = report.found,
            not_found = report.not_found,
            "fan-out complete"
        );
        Ok((messages, report))
    }
}

async fn fetch_latest_one(
    repository: Arc<dyn MessageRepository>,
    room_id: MessageRoomId,
    results: Arc<ResultSet>,
    cancel: CancelToken,
) -> Result<Slot, FeedError> {
    // ロックは取らずに問い合わせる。キャンセル時は問い合わせ future を drop する
    let lookup = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FeedError::Cancelled(Stage::Retrieval)),
        lookup = repository.get_last_by_room(&room_id) => lookup,
    };

    match lookup {
        Ok(message) if message.room_id != room_id => Err(FeedError::Retrieval {
            room_id,
            source: StoreError::Backend(format!(
                "store returned {} for {}",
                message.room_id, room_id
            )),
        }),
        Ok(message) => {
            if !results.insert(room_id, message).await {
                return Err(FeedError::Retrieval {
                    room_id,
                    source: StoreError::Backend("result slot written twice".to_string()),
                });
            }
            debug!("found");
            Ok(Slot::Found)
        }
        Err(err) if err.is_no_such_entity() => {
            debug!("no message yet");
            Ok(Slot::NotFound)
        }
        Err(source) => Err(FeedError::Retrieval { room_id, source }),
    }
}
