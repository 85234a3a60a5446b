//! Resource locators and signed URLs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Object storage schemes a locator may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Gs,
    S3,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Gs => "gs",
            Scheme::S3 => "s3",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("unsupported locator scheme in '{0}' (expected gs:// or s3://)")]
    UnsupportedScheme(String),

    #[error("locator '{0}' is missing a bucket or object name")]
    MissingPart(String),
}

/// `gs://<bucket>/<object>` 形式のリソース参照
///
/// 空文字列は「リソースなし」であり、ここでは表現しません
/// （`Message` 側で `Option<ResourceLocator>` の `None` になります）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceLocator {
    scheme: Scheme,
    bucket: String,
    object: String,
}

impl ResourceLocator {
    /// Parses an optional locator column: empty means "no resource".
    pub fn parse_optional(raw: &str) -> Result<Option<Self>, LocatorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn object(&self) -> &str {
        &self.object
    }
}

impl FromStr for ResourceLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = if let Some(rest) = s.strip_prefix("gs://") {
            (Scheme::Gs, rest)
        } else if let Some(rest) = s.strip_prefix("s3://") {
            (Scheme::S3, rest)
        } else {
            return Err(LocatorError::UnsupportedScheme(s.to_string()));
        };

        let Some((bucket, object)) = rest.split_once('/') else {
            return Err(LocatorError::MissingPart(s.to_string()));
        };
        if bucket.is_empty() || object.is_empty() {
            return Err(LocatorError::MissingPart(s.to_string()));
        }

        Ok(Self {
            scheme,
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
    }
}

impl TryFrom<String> for ResourceLocator {
    type Error = LocatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceLocator> for String {
    fn from(value: ResourceLocator) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme.as_str(), self.bucket, self.object)
    }
}

/// A time-limited URL for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub locator: ResourceLocator,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl SignedUrl {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
