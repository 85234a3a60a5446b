//! Message record: what the store returns per room, plus signed URLs after enrichment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ids::{ClientId, MessageId};
use super::locator::{ResourceLocator, SignedUrl};
use super::room::MessageRoomId;

/// A chat message in a room.
///
/// Design:
/// - `room_id` is the back-reference used when aggregating fan-out results.
/// - `signed_*_url` are never persisted; they are filled by the enrichment
///   step and are `None` whenever the matching locator is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: MessageRoomId,
    pub sender: ClientId,
    pub body: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_locator"
    )]
    pub image_locator: Option<ResourceLocator>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_locator"
    )]
    pub file_locator: Option<ResourceLocator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_image_url: Option<SignedUrl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_file_url: Option<SignedUrl>,

    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Text-only message with no attached resources.
    pub fn new(
        id: MessageId,
        room_id: MessageRoomId,
        sender: ClientId,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            room_id,
            sender,
            body: body.into(),
            image_locator: None,
            file_locator: None,
            signed_image_url: None,
            signed_file_url: None,
            created_at,
        }
    }

    pub fn with_image(mut self, locator: ResourceLocator) -> Self {
        self.image_locator = Some(locator);
        self
    }

    pub fn with_file(mut self, locator: ResourceLocator) -> Self {
        self.file_locator = Some(locator);
        self
    }
}

/// 保存済みの行では空文字列が「リソースなし」を意味する
fn optional_locator<'de, D>(deserializer: D) -> Result<Option<ResourceLocator>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => ResourceLocator::parse_optional(&raw).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
