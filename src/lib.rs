pub mod accounting;
pub mod app;
pub mod config;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod lookup;
pub mod models;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::{load_data, prepare_data_dir};
