pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod storage;
pub mod store;
pub mod templates;

// Re-export common items for convenience
pub use config::{db_file_exists, get_config_dir, get_db_file_path};
pub use error::{CmdbarError, Result};
pub use execution::{run_in_terminal, CommandRunner, RunEvent, RunHandle};
pub use models::Snippet;
pub use store::{SnippetStore, StoreEvent};
pub use templates::TemplateId;
