//! herald-core
//!
//! Message feed core: newest-message-per-room retrieval with signed resource URLs.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, room, message, locator, pager, errors）
//! - **ports**: 抽象化レイヤー（MessageRepository, ClientRepository, ResourceSigner, Clock）
//! - **app**: アプリケーションロジック（FanOutEngine, Enricher, MessageApp, AppBuilder）
//! - **impls**: ports の実装（InMemory 系, LocalResourceSigner）
//! - **config** / **observability**: 設定の読み込みと tracing の初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{AppBuilder, CancelSource, CancelToken, FetchMode, MessageApp};
pub use config::FeedConfig;
pub use domain::FeedError;
