//! ResourceSigner port - 署名付き URL の発行
//!
//! 実装（GCS / S3 / ローカル）は外部サービス扱いで、
//! ここでは「locator を渡すと期限付き URL かエラーが返る」ことだけを前提にします。

use async_trait::async_trait;

use crate::domain::{ResourceLocator, SignError, SignedUrl};

/// ResourceSigner は locator から期限付き URL を発行
///
/// # 設計原則
/// - ステートレス（呼び出し順に意味はない）
/// - 並行呼び出しに安全（`Send + Sync`）
#[async_trait]
pub trait ResourceSigner: Send + Sync {
    async fn sign(&self, locator: &ResourceLocator) -> Result<SignedUrl, SignError>;
}
