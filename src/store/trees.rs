pub const QUESTIONS: &str = "questions";
pub const USER_PROGRESS: &str = "user_progress";
pub const STATISTICS: &str = "statistics";
pub const GRAMMAR_RULES: &str = "grammar_rules";
pub const USER_SETTINGS: &str = "user_settings";
pub const REVIEW_QUEUE: &str = "review_queue";

// Secondary index trees, one per collection
pub const QUESTIONS_IDX: &str = "questions_idx";
pub const USER_PROGRESS_IDX: &str = "user_progress_idx";
pub const STATISTICS_IDX: &str = "statistics_idx";
pub const GRAMMAR_RULES_IDX: &str = "grammar_rules_idx";
pub const USER_SETTINGS_IDX: &str = "user_settings_idx";
pub const REVIEW_QUEUE_IDX: &str = "review_queue_idx";

// Schema version and id sequences
pub const META: &str = "meta";
pub const APP_STATE: &str = "app_state";
pub const WRONG_ANSWERS: &str = "wrong_answers";
