mod browser;
mod common;
mod editor;

// Public API
pub use browser::display_snippet_browser;
pub use editor::{interactive_add, AddResult};
