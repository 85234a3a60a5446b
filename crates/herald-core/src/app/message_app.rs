//! MessageApp - client から見たメッセージ取得の入口
//!
//! # フロー（newest）
//! 1. ClientRepository で呼び出し元を解決（company スコープを得る）
//! 2. RoomTarget に company を合成して MessageRoomId にする
//! 3. FanOutEngine で room ごとの最新メッセージを並行取得
//! 4. Enricher で署名付き URL を付与
//!
//! どの段階のエラーも、残りの段階を実行せずにそのまま返します。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, info_span};

use super::cancel::CancelToken;
use super::enrich::Enricher;
use super::fan_out::FanOutEngine;
use crate::domain::{
    Client, ClientId, FeedError, Message, Pager, RoomTarget, Stage,
};
use crate::ports::{ClientRepository, MessageRepository};

/// What `MessageApp::list` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FetchMode {
    /// Newest message of each room.
    Newest,
    /// One page of a single room, newest first.
    Paged(Pager),
}

/// Message queries on behalf of one executing client.
pub struct MessageApp {
    executor_id: ClientId,
    clients: Arc<dyn ClientRepository>,
    messages: Arc<dyn MessageRepository>,
    engine: FanOutEngine,
    enricher: Enricher,
}

impl MessageApp {
    pub(crate) fn new(
        executor_id: ClientId,
        clients: Arc<dyn ClientRepository>,
        messages: Arc<dyn MessageRepository>,
        enricher: Enricher,
    ) -> Self {
        let engine = FanOutEngine::new(Arc::clone(&messages));
        Self {
            executor_id,
            clients,
            messages,
            engine,
            enricher,
        }
    }

    pub fn executor_id(&self) -> ClientId {
        self.executor_id
    }

    /// Single entry point: dispatches on `mode`.
    ///
    /// `Paged` needs exactly one room.
    pub async fn list(
        &self,
        rooms: &[RoomTarget],
        mode: FetchMode,
        cancel: &CancelToken,
    ) -> Result<Vec<Message>, FeedError> {
        match mode {
            FetchMode::Newest => self.get_all_newest_by_rooms(rooms, cancel).await,
            FetchMode::Paged(pager) => match rooms {
                [room] => self.get_all_by_room_with_pager(*room, pager, cancel).await,
                _ => Err(FeedError::InvalidRequest(format!(
                    "paged listing needs exactly one room, got {}",
                    rooms.len()
                ))),
            },
        }
    }

    /// Newest message of every room that has one, enriched. Order is unspecified.
    pub async fn get_all_newest_by_rooms(
        &self,
        rooms: &[RoomTarget],
        cancel: &CancelToken,
    ) -> Result<Vec<Message>, FeedError> {
        let span = info_span!("get_all_newest_by_rooms", executor = %self.executor_id, rooms = rooms.len());
        async {
            let me = self.resolve_caller(cancel).await?;
            let room_ids = rooms.iter().map(|room| room.scoped(me.company_id));

            let messages = self.engine.fetch_latest_for_keys(room_ids, cancel).await?;
            self.enricher.enrich(messages, cancel).await
        }
        .instrument(span)
        .await
    }

    /// One page of one room, newest first, enriched.
    ///
    /// Unlike the fan-out path, every store error is fatal here.
    pub async fn get_all_by_room_with_pager(
        &self,
        room: RoomTarget,
        pager: Pager,
        cancel: &CancelToken,
    ) -> Result<Vec<Message>, FeedError> {
        let span = info_span!(
            "get_all_by_room_with_pager",
            executor = %self.executor_id,
            page = pager.page(),
            per_page = pager.per_page()
        );
        async {
            let me = self.resolve_caller(cancel).await?;
            let room_id = room.scoped(me.company_id);

            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FeedError::Cancelled(Stage::Retrieval)),
                page = self.messages.get_all_by_room_with_pager(&room_id, pager) => page,
            };
            let messages = page.map_err(|source| FeedError::Retrieval { room_id, source })?;
            self.enricher.enrich(messages, cancel).await
        }
        .instrument(span)
        .await
    }

    async fn resolve_caller(&self, cancel: &CancelToken) -> Result<Client, FeedError> {
        let client = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FeedError::Cancelled(Stage::Identity)),
            client = self.clients.get(self.executor_id) => client,
        };
        client.map_err(|source| FeedError::IdentityResolution {
            client_id: self.executor_id,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppBuilder;
    use crate::app::cancel::CancelSource;
    use crate::domain::{CompanyId, CustomerId, MessageId, ProjectId, StoreError};
    use crate::impls::{InMemoryClientRepository, InMemoryMessageRepository, LocalResourceSigner};
    use crate::ports::SystemClock;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::collections::HashSet;
    use std::time::Duration;

    struct Fixture {
        me: Client,
        clients: Arc<InMemoryClientRepository>,
        messages: Arc<InMemoryMessageRepository>,
        signer: Arc<LocalResourceSigner>,
    }

    impl Fixture {
        async fn new() -> Self {
            let me = Client::new(ClientId::generate(), CompanyId::generate(), "operator");
            let clients = Arc::new(InMemoryClientRepository::new());
            clients.insert(me.clone()).await;
            Self {
                me,
                clients,
                messages: Arc::new(InMemoryMessageRepository::new()),
                signer: Arc::new(LocalResourceSigner::new(
                    "https://storage.local",
                    Duration::from_secs(300),
                    Arc::new(SystemClock),
                )),
            }
        }

        fn app(&self) -> MessageApp {
            self.app_for(self.me.id)
        }

        fn app_for(&self, executor_id: ClientId) -> MessageApp {
            AppBuilder::new(executor_id)
                .clients(self.clients.clone())
                .messages(self.messages.clone())
                .signer(self.signer.clone())
                .build()
                .unwrap()
        }

        /// Room target with one message carrying both resources.
        async fn room_with_message(&self) -> RoomTarget {
            let target = RoomTarget::new(ProjectId::generate(), CustomerId::generate());
            let room_id = target.scoped(self.me.company_id);
            let tag = room_id.project_id;
            self.messages
                .insert(
                    Message::new(MessageId::generate(), room_id, self.me.id, "hi", Utc::now())
                        .with_image(format!("gs://img/{tag}.png").parse().unwrap())
                        .with_file(format!("gs://files/{tag}.pdf").parse().unwrap()),
                )
                .await;
            target
        }
    }

    #[tokio::test]
    async fn newest_skips_empty_rooms_and_signs_the_rest() {
        let fx = Fixture::new().await;
        let a = fx.room_with_message().await;
        let b = RoomTarget::new(ProjectId::generate(), CustomerId::generate());
        let c = fx.room_with_message().await;

        let out = fx
            .app()
            .list(&[a, b, c], FetchMode::Newest, &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        let projects: HashSet<_> = out.iter().map(|m| m.room_id.project_id).collect();
        assert_eq!(projects, HashSet::from([a.project_id, c.project_id]));
        for message in &out {
            assert_eq!(message.room_id.company_id, fx.me.company_id);
            assert!(message.signed_image_url.is_some());
            assert!(message.signed_file_url.is_some());
        }
        assert_eq!(fx.signer.calls(), 4);
    }

    #[tokio::test]
    async fn rooms_of_other_companies_are_invisible() {
        let fx = Fixture::new().await;
        let target = RoomTarget::new(ProjectId::generate(), CustomerId::generate());
        fx.messages
            .insert(Message::new(
                MessageId::generate(),
                target.scoped(CompanyId::generate()),
                ClientId::generate(),
                "someone else's",
                Utc::now(),
            ))
            .await;

        let out = fx
            .app()
            .get_all_newest_by_rooms(&[target], &CancelToken::never())
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn unknown_caller_fails_before_fan_out() {
        let fx = Fixture::new().await;
        let a = fx.room_with_message().await;
        let stranger = ClientId::generate();

        let err = fx
            .app_for(stranger)
            .get_all_newest_by_rooms(&[a], &CancelToken::never())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FeedError::IdentityResolution { client_id, .. } if client_id == stranger
        ));
        assert_eq!(fx.messages.lookups(), 0);
        assert_eq!(fx.signer.calls(), 0);
    }

    #[tokio::test]
    async fn retrieval_failure_skips_enrichment() {
        let fx = Fixture::new().await;
        let a = fx.room_with_message().await;
        let b = fx.room_with_message().await;
        fx.messages
            .fail_room(b.scoped(fx.me.company_id), StoreError::Backend("timeout".into()))
            .await;

        let err = fx
            .app()
            .get_all_newest_by_rooms(&[a, b], &CancelToken::never())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Retrieval));
        assert_eq!(fx.signer.calls(), 0);
    }

    #[tokio::test]
    async fn signing_failure_returns_no_messages() {
        let fx = Fixture::new().await;
        let a = fx.room_with_message().await;
        let room_id = a.scoped(fx.me.company_id);
        let message = fx.messages.get_last_by_room(&room_id).await.unwrap();
        fx.signer.fail_on(message.file_locator.unwrap()).await;

        let err = fx
            .app()
            .get_all_newest_by_rooms(&[a], &CancelToken::never())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Signing { .. }));
    }

    #[tokio::test]
    async fn paged_listing_is_newest_first_and_enriched() {
        let fx = Fixture::new().await;
        let target = RoomTarget::new(ProjectId::generate(), CustomerId::generate());
        let room_id = target.scoped(fx.me.company_id);
        let base = Utc::now();
        for i in 0..5 {
            fx.messages
                .insert(
                    Message::new(
                        MessageId::generate(),
                        room_id,
                        fx.me.id,
                        format!("#{i}"),
                        base + ChronoDuration::seconds(i),
                    )
                    .with_image(format!("gs://img/{i}.png").parse().unwrap()),
                )
                .await;
        }

        let out = fx
            .app()
            .list(
                &[target],
                FetchMode::Paged(Pager::new(1, 3).unwrap()),
                &CancelToken::never(),
            )
            .await
            .unwrap();

        let bodies: Vec<_> = out.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["#4", "#3", "#2"]);
        assert!(out.iter().all(|m| m.signed_image_url.is_some()));
        assert_eq!(fx.signer.calls(), 3);
    }

    #[tokio::test]
    async fn paged_listing_of_empty_room_is_empty() {
        let fx = Fixture::new().await;
        let target = RoomTarget::new(ProjectId::generate(), CustomerId::generate());

        let out = fx
            .app()
            .get_all_by_room_with_pager(target, Pager::new(1, 10).unwrap(), &CancelToken::never())
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn paged_store_failure_is_fatal() {
        let fx = Fixture::new().await;
        let target = fx.room_with_message().await;
        fx.messages
            .fail_room(target.scoped(fx.me.company_id), StoreError::Backend("down".into()))
            .await;

        let err = fx
            .app()
            .get_all_by_room_with_pager(target, Pager::new(1, 10).unwrap(), &CancelToken::never())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Retrieval { .. }));
    }

    #[tokio::test]
    async fn paged_mode_requires_exactly_one_room() {
        let fx = Fixture::new().await;
        let pager = Pager::new(1, 10).unwrap();

        for rooms in [Vec::new(), vec![fx.room_with_message().await, fx.room_with_message().await]] {
            let err = fx
                .app()
                .list(&rooms, FetchMode::Paged(pager), &CancelToken::never())
                .await
                .unwrap_err();
            assert!(matches!(err, FeedError::InvalidRequest(_)));
        }
    }

    #[tokio::test]
    async fn cancelled_before_start_reports_identity_stage() {
        let fx = Fixture::new().await;
        let a = fx.room_with_message().await;
        let source = CancelSource::new();
        source.cancel();

        let err = fx
            .app()
            .get_all_newest_by_rooms(&[a], &source.token())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Cancelled(Stage::Identity)));
        assert_eq!(fx.messages.lookups(), 0);
    }

    #[test]
    fn fetch_mode_serializes_with_tag() {
        let json = serde_json::to_value(FetchMode::Paged(Pager::new(2, 20).unwrap())).unwrap();
        assert_eq!(json["mode"], "paged");
        assert_eq!(json["page"], 2);
        assert_eq!(serde_json::to_value(FetchMode::Newest).unwrap()["mode"], "newest");
    }

    #[test]
    fn invalid_pager_is_rejected_before_reaching_the_app() {
        let zero = serde_json::json!({ "mode": "paged", "page": 0, "per_page": 10 });
        assert!(serde_json::from_value::<FetchMode>(zero).is_err());

        let ok = serde_json::json!({ "mode": "paged", "page": 3, "per_page": 10 });
        assert_eq!(
            serde_json::from_value::<FetchMode>(ok).unwrap(),
            FetchMode::Paged(Pager::new(3, 10).unwrap())
        );
    }
}
