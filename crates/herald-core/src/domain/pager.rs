//! Pager: page-number based slicing for the single-room listing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PagerError {
    #[error("page numbers start at 1")]
    ZeroPage,

    #[error("per_page must be between 1 and {max} (got {got})")]
    PerPageOutOfRange { got: u32, max: u32 },
}

/// 1-based page + page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PagerParts")]
pub struct Pager {
    page: u32,
    per_page: u32,
}

/// Unvalidated wire form; deserialization goes through `Pager::new`.
#[derive(Deserialize)]
struct PagerParts {
    page: u32,
    per_page: u32,
}

impl TryFrom<PagerParts> for Pager {
    type Error = PagerError;

    fn try_from(parts: PagerParts) -> Result<Self, Self::Error> {
        Pager::new(parts.page, parts.per_page)
    }
}

impl Pager {
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: u32, per_page: u32) -> Result<Self, PagerError> {
        if page == 0 {
            return Err(PagerError::ZeroPage);
        }
        if per_page == 0 || per_page > Self::MAX_PER_PAGE {
            return Err(PagerError::PerPageOutOfRange {
                got: per_page,
                max: Self::MAX_PER_PAGE,
            });
        }
        Ok(Self { page, per_page })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of items to skip before this page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }

    pub fn limit(&self) -> usize {
        self.per_page as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 20, 0)]
    #[case(2, 20, 20)]
    #[case(5, 10, 40)]
    fn offset_skips_previous_pages(#[case] page: u32, #[case] per_page: u32, #[case] offset: usize) {
        let pager = Pager::new(page, per_page).unwrap();
        assert_eq!(pager.offset(), offset);
        assert_eq!(pager.limit(), per_page as usize);
    }

    #[test]
    fn deserialization_is_validated() {
        let ok: Pager = serde_json::from_str(r#"{"page":2,"per_page":10}"#).unwrap();
        assert_eq!(ok.offset(), 10);
        assert!(serde_json::from_str::<Pager>(r#"{"page":0,"per_page":10}"#).is_err());
    }

    #[test]
    fn rejects_zero_page() {
        assert_eq!(Pager::new(0, 10), Err(PagerError::ZeroPage));
    }

    #[rstest]
    #[case(0)]
    #[case(Pager::MAX_PER_PAGE + 1)]
    fn rejects_page_size_out_of_range(#[case] per_page: u32) {
        assert!(matches!(
            Pager::new(1, per_page),
            Err(PagerError::PerPageOutOfRange { got, .. }) if got == per_page
        ));
    }
}
