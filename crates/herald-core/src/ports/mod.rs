//! Ports - 抽象化レイヤー
//!
//! 外部システム（メッセージストア、client ディレクトリ、オブジェクトストレージの署名）
//! へのインターフェースを定義します。実装は `impls` か別クレートに置きます。

pub mod client_repository;
pub mod clock;
pub mod message_repository;
pub mod resource_signer;

pub use self::client_repository::ClientRepository;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::message_repository::MessageRepository;
pub use self::resource_signer::ResourceSigner;
