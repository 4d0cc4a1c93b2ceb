pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod logging;
pub mod render;
pub mod session;
pub mod shell;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{GenerationError, OrchestratorError, RenderFailure, ValidationError};
pub use session::{Session, SessionOrchestrator};
pub use shell::launch;
