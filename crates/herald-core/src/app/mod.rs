//! App - アプリケーション層
//!
//! ports を組み合わせてメッセージ取得のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **FanOutEngine**: room ごとの最新メッセージを並行取得・集約
//! - **Enricher**: locator を署名付き URL に解決
//! - **MessageApp**: 呼び出し元の解決 → 取得 → enrichment の合成
//! - **AppBuilder**: ワイヤリングと起動時検証
//! - **CancelSource / CancelToken**: 操作全体のキャンセルと期限

pub mod builder;
pub mod cancel;
pub mod enrich;
pub mod fan_out;
pub mod message_app;

pub use self::builder::{AppBuilder, BuildError};
pub use self::cancel::{CancelSource, CancelToken};
pub use self::enrich::Enricher;
pub use self::fan_out::{FanOutEngine, ResultSet};
pub use self::message_app::{FetchMode, MessageApp};
