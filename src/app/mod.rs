mod app;
mod runtime_config;

pub use app::{App, AppError};
pub use runtime_config::RuntimeConfig;
