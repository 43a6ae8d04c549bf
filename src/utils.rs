use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;

// Default page size, matches what the web client requests
const DEFAULT_PAGE_LIMIT: u64 = 9;
// Max limit to prevent excessive requests
const MAX_PAGE_LIMIT: u64 = 100;

/// Query string accepted by the post listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsParams {
    #[serde(default)]
    page: Option<u64>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ListPostsParams {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self { page, limit, ..Default::default() }
    }

    pub fn limit(&self) -> u64 {
        match self.limit {
            None | Some(0) => DEFAULT_PAGE_LIMIT,
            Some(limit) => limit.min(MAX_PAGE_LIMIT),
        }
    }

    /// 1-based page number.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit())
    }

    /// The search pattern, if one was given. The web client sends empty strings for "no filter".
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Current time, truncated to the microsecond precision `TIMESTAMPTZ` stores, so a
/// record returned on write compares equal to the same record read back later.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Trims `value` and checks it is non-empty and at most `max_chars` characters long.
pub fn normalize_text(value: &str, max_chars: usize) -> Result<String, TextError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TextError::Empty);
    }
    if trimmed.chars().count() > max_chars {
        return Err(TextError::TooLong(max_chars));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, PartialEq, Eq)]
pub enum TextError {
    Empty,
    TooLong(usize),
}
