//! Domain model (IDs, rooms, messages, locators, errors).
//!
//! ここにある型は I/O を持ちません。ports / app から共通に使われます。

pub mod client;
pub mod errors;
pub mod ids;
pub mod locator;
pub mod message;
pub mod pager;
pub mod room;

pub use client::Client;
pub use errors::{FeedError, SignError, Stage, StoreError};
pub use ids::{ClientId, CompanyId, CustomerId, MessageId, ProjectId};
pub use locator::{LocatorError, ResourceLocator, Scheme, SignedUrl};
pub use message::Message;
pub use pager::{Pager, PagerError};
pub use room::{MessageRoomId, RoomTarget};
