use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use jp_study_store::config::{Config, PaginationConfig, WorkerConfig};
use jp_study_store::routes::build_router;
use jp_study_store::state::AppState;
use jp_study_store::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

async fn spawn_with_pagination(pagination: PaginationConfig) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("study-test.sled");

    let config = Config {
        sled_path: sled_path.to_string_lossy().to_string(),
        seed_grammar_rules: false,
        pagination,
        worker: WorkerConfig {
            is_leader: false,
            enable_statistics_rollup: false,
        },
        ..Config::default()
    };

    let (store, _report) = Store::initialize(&config.sled_path).expect("initialize store");
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(Arc::new(store), &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with_pagination(PaginationConfig::default()).await
}

pub async fn spawn_test_app_with_max_page(max_page_size: usize) -> TestApp {
    spawn_with_pagination(PaginationConfig {
        default_page_size: max_page_size,
        max_page_size,
    })
    .await
}
