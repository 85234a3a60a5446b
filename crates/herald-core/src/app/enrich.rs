//! Enricher - 画像・ファイルの locator を署名付き URL に解決する
//!
//! 1 件ずつ順番に処理します（メッセージ間に依存はないが、並列化の必要もない）。
//! どこかで署名に失敗したら、それまでに署名した分も含めて何も返しません。

use std::sync::Arc;

use tracing::{debug, warn};

use super::cancel::CancelToken;
use crate::domain::{FeedError, Message, MessageId, ResourceLocator, SignedUrl, Stage};
use crate::ports::ResourceSigner;

#[derive(Clone)]
pub struct Enricher {
    signer: Arc<dyn ResourceSigner>,
}

impl Enricher {
    pub fn new(signer: Arc<dyn ResourceSigner>) -> Self {
        Self { signer }
    }

    /// Resolve every present locator of every message, in iteration order.
    ///
    /// Messages without locators pass through untouched and cost no signer call.
    pub async fn enrich(
        &self,
        messages: Vec<Message>,
        cancel: &CancelToken,
    ) -> Result<Vec<Message>, FeedError> {
        let mut enriched = Vec::with_capacity(messages.len());
        for mut message in messages {
            if cancel.is_cancelled() {
                return Err(FeedError::Cancelled(Stage::Enrichment));
            }
            message.signed_image_url = self
                .sign_optional(message.id, message.image_locator.as_ref())
                .await?;
            message.signed_file_url = self
                .sign_optional(message.id, message.file_locator.as_ref())
                .await?;
            enriched.push(message);
        }
        debug!(count = enriched.len(), "enriched messages");
        Ok(enriched)
    }

    async fn sign_optional(
        &self,
        message_id: MessageId,
        locator: Option<&ResourceLocator>,
    ) -> Result<Option<SignedUrl>, FeedError> {
        let Some(locator) = locator else {
            return Ok(None);
        };
        match self.signer.sign(locator).await {
            Ok(signed) => Ok(Some(signed)),
            Err(source) => {
                warn!(message_id = %message_id, locator = %locator, error = %source, "signing failed");
                Err(FeedError::Signing {
                    message_id,
                    locator: locator.clone(),
                    source,
                })
            }
        }
    }
}
