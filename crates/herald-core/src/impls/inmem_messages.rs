//! InMemoryMessageRepository - 開発・テスト用のメッセージストア
//!
//! # 機能
//! - room ごとの Vec<Message> を Mutex で保持
//! - 任意のランダム遅延（並行性テスト用）
//! - room 単位の障害注入（`fail_room`）
//! - 呼び出し回数 / 実行中クエリ数のカウンタ

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;

use crate::domain::{Message, MessageRoomId, Pager, StoreError};
use crate::ports::MessageRepository;

#[derive(Default)]
struct State {
    rooms: HashMap<MessageRoomId, Vec<Message>>,
    failures: HashMap<MessageRoomId, StoreError>,
}

pub struct InMemoryMessageRepository {
    state: Mutex<State>,
    latency_ms: Option<RangeInclusive<u64>>,
    lookups: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            latency_ms: None,
            lookups: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every lookup sleeps for a random duration in `range` (milliseconds).
    pub fn with_latency_ms(mut self, range: RangeInclusive<u64>) -> Self {
        self.latency_ms = Some(range);
        self
    }

    pub async fn insert(&self, message: Message) {
        let mut state = self.state.lock().await;
        state.rooms.entry(message.room_id).or_default().push(message);
    }

    /// Lookups for `room_id` fail with `error` until the repository is dropped.
    pub async fn fail_room(&self, room_id: MessageRoomId, error: StoreError) {
        let mut state = self.state.lock().await;
        state.failures.insert(room_id, error);
    }

    /// Number of queries started so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of queries currently running (started and not yet finished or dropped).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let Some(range) = &self.latency_ms else {
            return;
        };
        // ThreadRng は Send ではないので await の前に捨てる
        let ms = rand::thread_rng().gen_range(range.clone());
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// 実行中カウンタを増やし、drop で戻すガードを返す
    fn track(&self) -> InFlightGuard {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(&self.in_flight))
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn get_last_by_room(&self, room_id: &MessageRoomId) -> Result<Message, StoreError> {
        let _guard = self.track();
        self.simulate_latency().await;

        let state = self.state.lock().await;
        if let Some(err) = state.failures.get(room_id) {
            return Err(err.clone());
        }
        state
            .rooms
            .get(room_id)
            .and_then(|messages| messages.iter().max_by_key(|m| m.created_at))
            .cloned()
            .ok_or_else(|| StoreError::no_such_entity("message", room_id))
    }

    async fn get_all_by_room_with_pager(
        &self,
        room_id: &MessageRoomId,
        pager: Pager,
    ) -> Result<Vec<Message>, StoreError> {
        let _guard = self.track();
        self.simulate_latency().await;

        let state = self.state.lock().await;
        if let Some(err) = state.failures.get(room_id) {
            return Err(err.clone());
        }
        let mut messages = state.rooms.get(room_id).cloned().unwrap_or_default();
        drop(state);

        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages
            .into_iter()
            .skip(pager.offset())
            .take(pager.limit())
            .collect())
    }
}
