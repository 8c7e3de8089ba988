/// Default page for paginated question fetches (1-based)
pub const DEFAULT_PAGE: usize = 1;

/// Default page size for paginated question fetches
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Upper bound applied to page sizes requested over HTTP
pub const MAX_PAGE_SIZE: usize = 500;

/// Default number of questions drawn by random sampling
pub const DEFAULT_RANDOM_COUNT: usize = 10;

/// Key under which the persisted UI state lives
pub const APP_STATE_KEY: &str = "japanese-app-store";

pub const DEFAULT_THEME: &str = "light";

pub const DEFAULT_LANGUAGE: &str = "ja";

pub const DEFAULT_CURRENT_PAGE: &str = "home";

/// Default daily question goal
pub const DEFAULT_DAILY_GOAL: u32 = 20;

/// Longest interval between reviews of a correctly answered question
pub const MAX_REVIEW_INTERVAL_DAYS: i64 = 60;

/// Retry delay after a wrong answer
pub const RETRY_AFTER_WRONG_MINUTES: i64 = 10;
