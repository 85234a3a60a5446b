//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryMessageRepository**: 遅延・障害注入つきのメッセージストア
//! - **InMemoryClientRepository**: client ディレクトリ
//! - **LocalResourceSigner**: ローカルで検証できる署名付き URL
//!
//! 本番用の実装（Datastore, GCS 署名など）は別クレートに置きます。

pub mod inmem_clients;
pub mod inmem_messages;
pub mod local_signer;

pub use self::inmem_clients::InMemoryClientRepository;
pub use self::inmem_messages::InMemoryMessageRepository;
pub use self::local_signer::{LocalResourceSigner, MAX_SIGNED_URL_TTL};
