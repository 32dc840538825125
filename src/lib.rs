pub mod audio;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod synthesis;
pub mod transcript;
pub mod voices;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use session::{Orchestrator, SessionState};
