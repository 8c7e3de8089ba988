pub mod app_state;
pub mod grammar_rules;
pub mod maintenance;
pub mod progress;
pub mod questions;
pub mod review_queue;
pub mod settings;
pub mod snapshot;
pub mod statistics;
pub mod wrong_answers;
