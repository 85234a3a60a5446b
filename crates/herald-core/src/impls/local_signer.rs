//! LocalResourceSigner - 開発用の署名付き URL 発行
//!
//! 本物の GCS / S3 署名は行いません。`<base_url>/<bucket>/<object>?expires=..&signature=..`
//! 形式の URL を組み立て、発行したトークンを覚えておくことで `verify` できるようにします。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::domain::{ResourceLocator, SignError, SignedUrl};
use crate::ports::{Clock, ResourceSigner};

/// Upper bound for any signed URL lifetime.
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

#[derive(Default)]
struct Issued {
    tokens: HashMap<String, (ResourceLocator, DateTime<Utc>)>,
    failing: HashSet<ResourceLocator>,
}

pub struct LocalResourceSigner {
    base_url: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    issued: Mutex<Issued>,
    calls: AtomicUsize,
}

impl LocalResourceSigner {
    /// `ttl` is capped at [`MAX_SIGNED_URL_TTL`].
    pub fn new(base_url: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ttl: ttl.min(MAX_SIGNED_URL_TTL),
            clock,
            issued: Mutex::new(Issued::default()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Every later `sign(locator)` is rejected.
    pub async fn fail_on(&self, locator: ResourceLocator) {
        self.issued.lock().await.failing.insert(locator);
    }

    /// Number of `sign` calls, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 発行済みで、`at` の時点でまだ有効な URL かどうか
    pub async fn verify(&self, signed: &SignedUrl, at: DateTime<Utc>) -> bool {
        let Some(token) = signed.url.rsplit("signature=").next() else {
            return false;
        };
        let issued = self.issued.lock().await;
        matches!(
            issued.tokens.get(token),
            Some((locator, expires_at)) if *locator == signed.locator && at < *expires_at
        )
    }
}

#[async_trait]
impl ResourceSigner for LocalResourceSigner {
    async fn sign(&self, locator: &ResourceLocator) -> Result<SignedUrl, SignError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut issued = self.issued.lock().await;
        if issued.failing.contains(locator) {
            return Err(SignError::Rejected {
                locator: locator.clone(),
                reason: "signing disabled for this object".to_string(),
            });
        }

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| SignError::Backend(format!("ttl out of range: {e}")))?;
        let expires_at = self.clock.now() + ttl;
        let token = Ulid::new().to_string();
        let url = format!(
            "{}/{}/{}?expires={}&signature={}",
            self.base_url,
            locator.bucket(),
            locator.object(),
            expires_at.timestamp(),
            token
        );
        issued
            .tokens
            .insert(token, (locator.clone(), expires_at));

        Ok(SignedUrl {
            locator: locator.clone(),
            url,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::TimeZone;

    fn signer(ttl: Duration) -> (LocalResourceSigner, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let signer = LocalResourceSigner::new(
            "https://storage.local/",
            ttl,
            Arc::new(FixedClock::new(now)),
        );
        (signer, now)
    }

    #[tokio::test]
    async fn sign_builds_url_with_expiry() {
        let (signer, now) = signer(Duration::from_secs(600));
        let locator: ResourceLocator = "gs://chat-images/a/b.png".parse().unwrap();

        let signed = signer.sign(&locator).await.unwrap();

        assert_eq!(signed.locator, locator);
        assert_eq!(signed.expires_at, now + chrono::Duration::seconds(600));
        assert!(signed
            .url
            .starts_with("https://storage.local/chat-images/a/b.png?expires="));
        assert!(signer.verify(&signed, now).await);
        assert!(!signer.verify(&signed, signed.expires_at).await);
        assert_eq!(signer.calls(), 1);
    }

    #[tokio::test]
    async fn ttl_is_capped() {
        let (signer, _) = signer(Duration::from_secs(24 * 3600));
        assert_eq!(signer.ttl(), MAX_SIGNED_URL_TTL);
    }

    #[tokio::test]
    async fn fail_on_rejects_only_that_locator() {
        let (signer, _) = signer(Duration::from_secs(60));
        let bad: ResourceLocator = "gs://b/bad".parse().unwrap();
        let good: ResourceLocator = "gs://b/good".parse().unwrap();
        signer.fail_on(bad.clone()).await;

        assert!(matches!(
            signer.sign(&bad).await,
            Err(SignError::Rejected { locator, .. }) if locator == bad
        ));
        assert!(signer.sign(&good).await.is_ok());
        assert_eq!(signer.calls(), 2);
    }

    #[tokio::test]
    async fn verify_rejects_foreign_urls() {
        let (signer, now) = signer(Duration::from_secs(60));
        let locator: ResourceLocator = "gs://b/o".parse().unwrap();
        let forged = SignedUrl {
            locator,
            url: "https://storage.local/b/o?expires=0&signature=nope".to_string(),
            expires_at: now,
        };
        assert!(!signer.verify(&forged, now).await);
    }
}
